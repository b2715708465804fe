//! Synthetic signals for unit tests.

use crate::waveform::Waveform;
use std::f64::consts::PI;

/// Sine tone at `amplitude` (fraction of full scale)
pub fn tone(seconds: f64, sample_rate: u32, frequency: f64, amplitude: f64) -> Vec<f32> {
    let count = (seconds * sample_rate as f64).round() as usize;
    (0..count)
        .map(|i| (amplitude * (2.0 * PI * frequency * i as f64 / sample_rate as f64).sin()) as f32)
        .collect()
}

pub fn silence(seconds: f64, sample_rate: u32) -> Vec<f32> {
    vec![0.0; (seconds * sample_rate as f64).round() as usize]
}

/// Piece together a mono recording from `(seconds, is_tone)` parts
pub fn recording(parts: &[(f64, bool)], sample_rate: u32) -> Waveform {
    let mut samples = Vec::new();
    for &(seconds, is_tone) in parts {
        if is_tone {
            samples.extend(tone(seconds, sample_rate, 440.0, 0.5));
        } else {
            samples.extend(silence(seconds, sample_rate));
        }
    }
    Waveform::from_mono(samples, sample_rate)
}
