pub mod classifier;
pub mod config;
pub mod decibel;
pub mod error;
pub mod loudness;
pub mod quality;
pub mod segmenter;
pub mod track_detect;
pub mod waveform;

#[cfg(test)]
mod test_signals;

pub use classifier::{ClassifierSettings, Side, Track, TrackClassifier};
pub use config::{Config, Settings};
pub use error::{Result, VinylError};
pub use quality::{
    AudioQuality, ClippingAssessment, DynamicRangeAssessment, PeakAssessment, QualityAnalyzer,
    QualitySettings,
};
pub use segmenter::{Segment, SegmenterSettings, SilenceSegmenter};
pub use track_detect::{detect_tracks, detect_vinyl_tracks};
pub use waveform::{SampleFormat, Waveform};
