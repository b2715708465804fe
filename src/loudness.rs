//! Integrated loudness (ITU-R BS.1770 / EBU R128) of a whole buffer.

use crate::error::{Result, VinylError};
use crate::waveform::Waveform;
use ebur128::{EbuR128, Mode};

/// Length of one BS.1770 gating block
pub const GATING_BLOCK_MS: u64 = 400;

/// Measure K-weighted, gated integrated loudness in LUFS.
///
/// Fails if the buffer is shorter than one gating block or the meter rejects
/// the input. A buffer that never rises above the absolute gate (-70 LUFS)
/// measures as negative infinity.
pub fn integrated_loudness(waveform: &Waveform) -> Result<f64> {
    let gating_frames = GATING_BLOCK_MS * waveform.sample_rate() as u64 / 1000;
    if waveform.sample_rate() == 0 || (waveform.num_frames() as u64) < gating_frames.max(1) {
        return Err(VinylError::quality_analysis("Audio is too short for loudness gating")
            .with_details(format!(
                "{:.3} s is shorter than one {} ms block",
                waveform.duration_seconds(),
                GATING_BLOCK_MS
            )));
    }

    let meter_error = |e: ebur128::Error| {
        VinylError::quality_analysis("Loudness meter failed").with_details(e)
    };

    let mut meter = EbuR128::new(waveform.num_channels() as u32, waveform.sample_rate(), Mode::I)
        .map_err(meter_error)?;
    meter
        .add_frames_f32(&waveform.interleaved())
        .map_err(meter_error)?;
    meter.loudness_global().map_err(meter_error)
}
