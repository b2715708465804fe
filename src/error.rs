//! Error type shared by the segmentation and quality analysis components.

use std::fmt;
use thiserror::Error;

/// Everything that can abort a segmentation, classification or analysis call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VinylError {
    /// Empty or invalid input buffer, or a failure handed up by a collaborator.
    #[error("{}", Detailed(.message, .details))]
    Processing {
        message: String,
        details: Option<String>,
    },

    /// The quality analyzer could not measure the buffer.
    #[error("{}", Detailed(.message, .details))]
    QualityAnalysis {
        message: String,
        details: Option<String>,
    },

    /// A setting is outside its valid range, or the config file is unusable.
    #[error("invalid configuration for '{parameter}': {message}")]
    Configuration { parameter: String, message: String },
}

pub type Result<T> = std::result::Result<T, VinylError>;

impl VinylError {
    pub fn processing(message: impl Into<String>) -> Self {
        VinylError::Processing {
            message: message.into(),
            details: None,
        }
    }

    pub fn quality_analysis(message: impl Into<String>) -> Self {
        VinylError::QualityAnalysis {
            message: message.into(),
            details: None,
        }
    }

    pub fn configuration(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        VinylError::Configuration {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Attach the underlying cause. Has no effect on configuration errors.
    pub fn with_details(mut self, cause: impl fmt::Display) -> Self {
        match &mut self {
            VinylError::Processing { details, .. }
            | VinylError::QualityAnalysis { details, .. } => {
                *details = Some(cause.to_string());
            }
            VinylError::Configuration { .. } => {}
        }
        self
    }

    pub fn message(&self) -> &str {
        match self {
            VinylError::Processing { message, .. }
            | VinylError::QualityAnalysis { message, .. }
            | VinylError::Configuration { message, .. } => message,
        }
    }

    pub fn details(&self) -> Option<&str> {
        match self {
            VinylError::Processing { details, .. }
            | VinylError::QualityAnalysis { details, .. } => details.as_deref(),
            VinylError::Configuration { .. } => None,
        }
    }
}

/// Renders `message` or `message: details`.
struct Detailed<'a>(&'a String, &'a Option<String>);

impl fmt::Display for Detailed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.1 {
            Some(details) => write!(f, "{}: {}", self.0, details),
            None => write!(f, "{}", self.0),
        }
    }
}
