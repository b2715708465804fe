//! Transfer quality metrics for a recorded buffer.
//!
//! All level fields are dBFS (or LUFS for loudness). A level of exactly zero
//! signal is reported as negative infinity rather than an error.

use crate::decibel::{self, SILENCE_DB};
use crate::error::{Result, VinylError};
use crate::loudness;
use crate::waveform::Waveform;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_CLIPPING_THRESHOLD: f64 = 0.99;
pub const DEFAULT_LOUDNESS_FALLBACK_LUFS: f64 = -23.0;

pub const PEAK_WARNING_DB: f64 = -1.0;
pub const PEAK_GOOD_DB: f64 = -3.0;
pub const DYNAMIC_RANGE_LOW_DB: f64 = 8.0;
pub const DYNAMIC_RANGE_GOOD_DB: f64 = 14.0;
pub const CLIPPING_MINOR_PERCENT: f64 = 0.0;
pub const CLIPPING_SIGNIFICANT_PERCENT: f64 = 0.1;

/// Quality metrics of one analysis call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioQuality {
    pub peak_db: f64,
    pub rms_db: f64,
    /// Peak minus RMS. This is a crest-factor style approximation, not a
    /// loudness-range statistic; it is kept this way so reports stay comparable.
    pub dynamic_range_db: f64,
    pub loudness_lufs: f64,
    pub clipping_percent: f64,
    pub sample_rate: u32,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeakAssessment {
    VeryHigh,
    High,
    Good,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicRangeAssessment {
    Low,
    Moderate,
    Good,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClippingAssessment {
    Significant,
    Minor,
    None,
}

impl fmt::Display for PeakAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PeakAssessment::VeryHigh => "Peak level is very high (may be clipped)",
            PeakAssessment::High => "Peak level is high",
            PeakAssessment::Good => "Peak level is good",
        })
    }
}

impl fmt::Display for DynamicRangeAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DynamicRangeAssessment::Low => "Low dynamic range (heavily compressed)",
            DynamicRangeAssessment::Moderate => "Moderate dynamic range",
            DynamicRangeAssessment::Good => "Good dynamic range",
        })
    }
}

impl fmt::Display for ClippingAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClippingAssessment::Significant => "Significant clipping detected",
            ClippingAssessment::Minor => "Minor clipping detected",
            ClippingAssessment::None => "No clipping detected",
        })
    }
}

impl AudioQuality {
    pub fn peak_assessment(&self) -> PeakAssessment {
        if self.peak_db > PEAK_WARNING_DB {
            PeakAssessment::VeryHigh
        } else if self.peak_db > PEAK_GOOD_DB {
            PeakAssessment::High
        } else {
            PeakAssessment::Good
        }
    }

    pub fn dynamic_range_assessment(&self) -> DynamicRangeAssessment {
        if self.dynamic_range_db < DYNAMIC_RANGE_LOW_DB {
            DynamicRangeAssessment::Low
        } else if self.dynamic_range_db < DYNAMIC_RANGE_GOOD_DB {
            DynamicRangeAssessment::Moderate
        } else {
            DynamicRangeAssessment::Good
        }
    }

    pub fn clipping_assessment(&self) -> ClippingAssessment {
        if self.clipping_percent > CLIPPING_SIGNIFICANT_PERCENT {
            ClippingAssessment::Significant
        } else if self.clipping_percent > CLIPPING_MINOR_PERCENT {
            ClippingAssessment::Minor
        } else {
            ClippingAssessment::None
        }
    }

    /// True if any assessment is worse than good
    pub fn has_warnings(&self) -> bool {
        self.peak_assessment() != PeakAssessment::Good
            || self.dynamic_range_assessment() != DynamicRangeAssessment::Good
            || self.clipping_assessment() != ClippingAssessment::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualitySettings {
    /// Fraction of full scale at which a sample counts as clipped
    pub clipping_threshold: f64,
    /// Loudness reported when the meter cannot measure the buffer
    pub loudness_fallback_lufs: f64,
}

impl Default for QualitySettings {
    fn default() -> Self {
        QualitySettings {
            clipping_threshold: DEFAULT_CLIPPING_THRESHOLD,
            loudness_fallback_lufs: DEFAULT_LOUDNESS_FALLBACK_LUFS,
        }
    }
}

impl QualitySettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.clipping_threshold > 0.0 && self.clipping_threshold <= 1.0) {
            return Err(VinylError::configuration(
                "clipping_threshold",
                format!("must be in (0, 1], got {}", self.clipping_threshold),
            ));
        }
        if !self.loudness_fallback_lufs.is_finite() {
            return Err(VinylError::configuration("loudness_fallback_lufs", "must be finite"));
        }
        Ok(())
    }
}

pub struct QualityAnalyzer {
    settings: QualitySettings,
}

impl QualityAnalyzer {
    pub fn new(settings: QualitySettings) -> Result<Self> {
        settings.validate()?;
        Ok(QualityAnalyzer { settings })
    }

    pub fn settings(&self) -> &QualitySettings {
        &self.settings
    }

    /// Measure peak, RMS, dynamic range, loudness and clipping of the buffer
    pub fn analyze(&self, waveform: &Waveform) -> Result<AudioQuality> {
        let mono = waveform.downmix();
        if mono.is_empty() {
            return Err(VinylError::quality_analysis("Failed to analyze audio quality")
                .with_details("Audio data is empty"));
        }
        if waveform.sample_rate() == 0 {
            return Err(VinylError::quality_analysis("Failed to analyze audio quality")
                .with_details("sample rate must be greater than 0"));
        }

        let mut peak = 0.0_f64;
        let mut sum_squares = 0.0_f64;
        let mut clipped = 0usize;
        for channel in waveform.channels() {
            peak = peak.max(decibel::calculate_peak(channel));
            sum_squares += decibel::sum_of_squares(channel);
            clipped += decibel::count_clipped(channel, self.settings.clipping_threshold);
        }
        let total_samples = mono.len() * waveform.num_channels();

        let peak_db = decibel::amplitude_to_db(peak);
        let rms_db = decibel::mean_square_to_db(sum_squares / total_samples as f64);
        let dynamic_range_db = if peak_db == SILENCE_DB || rms_db == SILENCE_DB {
            0.0
        } else {
            peak_db - rms_db
        };
        let clipping_percent = clipped as f64 / total_samples as f64 * 100.0;

        let loudness_lufs = match loudness::integrated_loudness(waveform) {
            Ok(lufs) => lufs,
            Err(e) => {
                warn!(
                    "Loudness measurement failed ({}), using {:.1} LUFS",
                    e, self.settings.loudness_fallback_lufs
                );
                self.settings.loudness_fallback_lufs
            }
        };

        let quality = AudioQuality {
            peak_db: decibel::round_to(peak_db, 2),
            rms_db: decibel::round_to(rms_db, 2),
            dynamic_range_db: decibel::round_to(dynamic_range_db, 2),
            loudness_lufs: decibel::round_to(loudness_lufs, 2),
            clipping_percent: decibel::round_to(clipping_percent, 4),
            sample_rate: waveform.sample_rate(),
            duration_seconds: waveform.duration_seconds(),
        };
        debug!(
            "Quality: peak {:.2} dB, RMS {:.2} dB, loudness {:.2} LUFS, clipping {:.4}%",
            quality.peak_db, quality.rms_db, quality.loudness_lufs, quality.clipping_percent
        );
        Ok(quality)
    }
}
