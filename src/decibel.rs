/// Decibel conversion utilities for normalized floating-point audio

/// Level reported for a signal with zero energy.
pub const SILENCE_DB: f64 = f64::NEG_INFINITY;

/// Calculate RMS (Root Mean Square) value from audio samples
pub fn calculate_rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    (sum_of_squares(samples) / samples.len() as f64).sqrt()
}

/// Sum of squared sample values, accumulated in f64
pub fn sum_of_squares(samples: &[f32]) -> f64 {
    samples.iter().map(|&s| (s as f64).powi(2)).sum()
}

/// Calculate peak (maximum absolute) value from audio samples
pub fn calculate_peak(samples: &[f32]) -> f64 {
    samples
        .iter()
        .map(|&s| (s as f64).abs())
        .fold(0.0, f64::max)
}

/// Convert a linear amplitude (relative to full scale 1.0) to dBFS
///
/// # Returns
/// Decibel value, or [`SILENCE_DB`] if the amplitude is zero
pub fn amplitude_to_db(amplitude: f64) -> f64 {
    if amplitude <= 0.0 {
        return SILENCE_DB;
    }

    20.0 * amplitude.log10()
}

/// Convert a mean square value to dBFS
///
/// Equivalent to `amplitude_to_db(mean_square.sqrt())` without the square root.
pub fn mean_square_to_db(mean_square: f64) -> f64 {
    if mean_square <= 0.0 {
        return SILENCE_DB;
    }

    10.0 * mean_square.log10()
}

/// Count samples whose magnitude reaches the clipping threshold
///
/// # Arguments
/// * `samples` - Audio samples to check
/// * `threshold` - Clipping threshold as a fraction of full scale (e.g. 0.99)
pub fn count_clipped(samples: &[f32], threshold: f64) -> usize {
    samples
        .iter()
        .filter(|&&s| (s as f64).abs() >= threshold)
        .count()
}

/// Round to a fixed number of decimal places; infinities pass through
pub fn round_to(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_rms() {
        assert_eq!(calculate_rms(&[0.0; 100]), 0.0);
        assert_eq!(calculate_rms(&[]), 0.0);
        assert!((calculate_rms(&[0.5; 100]) - 0.5).abs() < 1e-9);

        // Sign does not matter, only energy
        let square = [0.25, -0.25, 0.25, -0.25];
        assert!((calculate_rms(&square) - 0.25).abs() < 1e-9);

        let uneven = [0.3, -0.4];
        assert!((calculate_rms(&uneven) - 0.125f64.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_calculate_peak() {
        assert_eq!(calculate_peak(&[0.0; 16]), 0.0);
        assert!((calculate_peak(&[0.1, 0.25, 0.2]) - 0.25).abs() < 1e-7);
        assert!((calculate_peak(&[0.1, -0.75, 0.2]) - 0.75).abs() < 1e-7);
        assert_eq!(calculate_peak(&[]), 0.0);
    }

    #[test]
    fn test_amplitude_to_db() {
        assert!((amplitude_to_db(1.0) - 0.0).abs() < 1e-9);
        assert!((amplitude_to_db(0.5) - (-6.02)).abs() < 0.01);
        assert!((amplitude_to_db(0.1) - (-20.0)).abs() < 1e-9);
        assert_eq!(amplitude_to_db(0.0), SILENCE_DB);
    }

    #[test]
    fn test_mean_square_matches_amplitude() {
        for amplitude in [1.0, 0.5, 0.1, 0.003_162] {
            let from_ms = mean_square_to_db(amplitude * amplitude);
            assert!((from_ms - amplitude_to_db(amplitude)).abs() < 1e-9);
        }
        assert_eq!(mean_square_to_db(0.0), SILENCE_DB);
    }

    #[test]
    fn test_count_clipped() {
        let samples = [0.5, 0.99, -0.995, 1.0, -0.98];
        assert_eq!(count_clipped(&samples, 0.99), 3);
        assert_eq!(count_clipped(&samples, 1.0), 1);
        assert_eq!(count_clipped(&[], 0.99), 0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(-6.020_599, 2), -6.02);
        assert_eq!(round_to(0.123_456, 4), 0.1235);
        assert_eq!(round_to(f64::NEG_INFINITY, 2), f64::NEG_INFINITY);
    }

    #[test]
    fn test_silence_is_not_clamped() {
        // Quiet but non-zero signals keep falling, only true zero reaches the floor
        let quiet = amplitude_to_db(1e-6);
        assert!((quiet - (-120.0)).abs() < 1e-9);
        assert!(amplitude_to_db(1e-12) < quiet);
        assert!(mean_square_to_db(1e-24) < mean_square_to_db(1e-12));

        let zero_rms = amplitude_to_db(calculate_rms(&[0.0; 8]));
        assert_eq!(zero_rms, SILENCE_DB);
        assert!(zero_rms.is_infinite() && zero_rms.is_sign_negative());
        assert_eq!(amplitude_to_db(-0.5), SILENCE_DB);
        assert_eq!(mean_square_to_db(sum_of_squares(&[])), SILENCE_DB);
        assert_eq!(round_to(zero_rms, 2), SILENCE_DB);
    }
}
