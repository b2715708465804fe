use crate::classifier::ClassifierSettings;
use crate::error::{Result, VinylError};
use crate::quality::QualitySettings;
use crate::segmenter::SegmenterSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Analysis defaults that can be saved to a file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub silence_threshold_db: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_silence_len_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_track_len_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_silence_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub side_break_threshold_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub clipping_threshold: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub loudness_fallback_lufs: Option<f64>,
}

/// Validated settings for all three components
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Settings {
    pub segmenter: SegmenterSettings,
    pub classifier: ClassifierSettings,
    pub quality: QualitySettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.segmenter.validate()?;
        self.classifier.validate()?;
        self.quality.validate()
    }
}

impl Config {
    /// Create a new empty config
    pub fn new() -> Self {
        Config::default()
    }

    /// Get the config file path (~/.state/vinylsplit/defaults.toml)
    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").map_err(|_| {
            VinylError::configuration("HOME", "environment variable not set")
        })?;

        let config_dir = Path::new(&home).join(".state").join("vinylsplit");
        Ok(config_dir.join("defaults.toml"))
    }

    /// Load config from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Load config from a file; a missing file is an empty config
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::new());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| file_error(path, "could not be read", e))?;
        toml::from_str(&content).map_err(|e| file_error(path, "is not valid", e))
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| file_error(parent, "could not be created", e))?;
        }

        let toml_string =
            toml::to_string_pretty(self).map_err(|e| file_error(path, "could not be encoded", e))?;
        fs::write(path, toml_string).map_err(|e| file_error(path, "could not be written", e))
    }

    /// Merge this config with another, preferring values from other
    pub fn merge(&mut self, other: &Config) {
        if other.silence_threshold_db.is_some() {
            self.silence_threshold_db = other.silence_threshold_db;
        }
        if other.min_silence_len_ms.is_some() {
            self.min_silence_len_ms = other.min_silence_len_ms;
        }
        if other.min_track_len_ms.is_some() {
            self.min_track_len_ms = other.min_track_len_ms;
        }
        if other.keep_silence_ms.is_some() {
            self.keep_silence_ms = other.keep_silence_ms;
        }
        if other.side_break_threshold_ms.is_some() {
            self.side_break_threshold_ms = other.side_break_threshold_ms;
        }
        if other.frame_ms.is_some() {
            self.frame_ms = other.frame_ms;
        }
        if other.clipping_threshold.is_some() {
            self.clipping_threshold = other.clipping_threshold;
        }
        if other.loudness_fallback_lufs.is_some() {
            self.loudness_fallback_lufs = other.loudness_fallback_lufs;
        }
    }

    /// Fill unset values from the defaults and validate the result
    pub fn settings(&self) -> Result<Settings> {
        let defaults = Settings::default();
        let settings = Settings {
            segmenter: SegmenterSettings {
                silence_threshold_db: self
                    .silence_threshold_db
                    .unwrap_or(defaults.segmenter.silence_threshold_db),
                min_silence_len_ms: self
                    .min_silence_len_ms
                    .unwrap_or(defaults.segmenter.min_silence_len_ms),
                keep_silence_ms: self.keep_silence_ms.unwrap_or(defaults.segmenter.keep_silence_ms),
                frame_ms: self.frame_ms.unwrap_or(defaults.segmenter.frame_ms),
            },
            classifier: ClassifierSettings {
                min_track_len_ms: self
                    .min_track_len_ms
                    .unwrap_or(defaults.classifier.min_track_len_ms),
                side_break_threshold_ms: self
                    .side_break_threshold_ms
                    .unwrap_or(defaults.classifier.side_break_threshold_ms),
            },
            quality: QualitySettings {
                clipping_threshold: self
                    .clipping_threshold
                    .unwrap_or(defaults.quality.clipping_threshold),
                loudness_fallback_lufs: self
                    .loudness_fallback_lufs
                    .unwrap_or(defaults.quality.loudness_fallback_lufs),
            },
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Print the config in a human-readable format
    pub fn print(&self, title: &str) {
        println!("{}:", title);

        if let Some(threshold) = self.silence_threshold_db {
            println!("  Silence threshold:  {} dB", threshold);
        }
        if let Some(len) = self.min_silence_len_ms {
            println!("  Min silence:        {} ms", len);
        }
        if let Some(len) = self.min_track_len_ms {
            println!("  Min track length:   {} ms", len);
        }
        if let Some(keep) = self.keep_silence_ms {
            println!("  Keep silence:       {} ms", keep);
        }
        if let Some(side_break) = self.side_break_threshold_ms {
            println!("  Side break gap:     {} ms", side_break);
        }
        if let Some(frame) = self.frame_ms {
            println!("  Analysis frame:     {} ms", frame);
        }
        if let Some(clip) = self.clipping_threshold {
            println!("  Clipping threshold: {:.1}% of full scale", clip * 100.0);
        }
        if let Some(fallback) = self.loudness_fallback_lufs {
            println!("  Loudness fallback:  {} LUFS", fallback);
        }
    }
}

fn file_error(path: &Path, what: &str, cause: impl std::fmt::Display) -> VinylError {
    VinylError::configuration(
        path.display().to_string(),
        format!("config file {}: {}", what, cause),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let settings = Config::new().settings().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.segmenter.silence_threshold_db, -50.0);
        assert_eq!(settings.segmenter.min_silence_len_ms, 2000);
        assert_eq!(settings.segmenter.keep_silence_ms, 500);
        assert_eq!(settings.classifier.min_track_len_ms, 10_000);
        assert_eq!(settings.classifier.side_break_threshold_ms, 10_000);
        assert_eq!(settings.quality.loudness_fallback_lufs, -23.0);
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base = Config {
            silence_threshold_db: Some(-45.0),
            keep_silence_ms: Some(250),
            ..Config::new()
        };
        let overrides = Config {
            silence_threshold_db: Some(-60.0),
            min_track_len_ms: Some(5000),
            ..Config::new()
        };
        base.merge(&overrides);

        assert_eq!(base.silence_threshold_db, Some(-60.0));
        assert_eq!(base.keep_silence_ms, Some(250));
        assert_eq!(base.min_track_len_ms, Some(5000));
        assert_eq!(base.frame_ms, None);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("defaults.toml");
        let config = Config {
            silence_threshold_db: Some(-42.5),
            side_break_threshold_ms: Some(8000),
            ..Config::new()
        };

        config.save_to(&path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("silence_threshold_db = -42.5"));
        assert!(!written.contains("frame_ms"));

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_empty_config() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_malformed_file_is_configuration_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("defaults.toml");
        fs::write(&path, "min_track_len_ms = \"long\"\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(VinylError::Configuration { .. })
        ));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let cases = [
            Config {
                silence_threshold_db: Some(0.0),
                ..Config::new()
            },
            Config {
                min_silence_len_ms: Some(0),
                ..Config::new()
            },
            Config {
                min_track_len_ms: Some(0),
                ..Config::new()
            },
            Config {
                side_break_threshold_ms: Some(0),
                ..Config::new()
            },
            Config {
                clipping_threshold: Some(0.0),
                ..Config::new()
            },
            Config {
                loudness_fallback_lufs: Some(f64::NAN),
                ..Config::new()
            },
        ];
        for config in cases {
            assert!(
                matches!(config.settings(), Err(VinylError::Configuration { .. })),
                "{:?} should be rejected",
                config
            );
        }

        let zero_keep = Config {
            keep_silence_ms: Some(0),
            ..Config::new()
        };
        assert_eq!(zero_keep.settings().unwrap().segmenter.keep_silence_ms, 0);
    }
}
