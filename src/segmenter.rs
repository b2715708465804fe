//! Silence-based segmentation of a continuous recording.
//!
//! The buffer is cut into short analysis frames and each frame's RMS level is
//! compared against an absolute dBFS threshold. Runs of quiet frames that last
//! at least `min_silence_len_ms` are gaps; everything between two gaps (or a
//! gap and the start/end of the buffer) is a segment.

use crate::decibel;
use crate::error::{Result, VinylError};
use crate::waveform::Waveform;
use log::debug;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SILENCE_THRESH_DB: f64 = -50.0;
pub const DEFAULT_MIN_SILENCE_LEN_MS: u64 = 2000;
pub const DEFAULT_KEEP_SILENCE_MS: u64 = 500;
pub const DEFAULT_FRAME_MS: u64 = 10;

/// Half-open millisecond interval `[start_ms, end_ms)` within the source buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl Segment {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }

    pub fn contains_ms(&self, ms: u64) -> bool {
        ms >= self.start_ms && ms < self.end_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmenterSettings {
    /// Frames below this level (dBFS) are silent
    pub silence_threshold_db: f64,
    /// Shortest silence run that counts as a gap
    pub min_silence_len_ms: u64,
    /// Silence kept on each side of a segment
    pub keep_silence_ms: u64,
    /// Analysis frame length
    pub frame_ms: u64,
}

impl Default for SegmenterSettings {
    fn default() -> Self {
        SegmenterSettings {
            silence_threshold_db: DEFAULT_SILENCE_THRESH_DB,
            min_silence_len_ms: DEFAULT_MIN_SILENCE_LEN_MS,
            keep_silence_ms: DEFAULT_KEEP_SILENCE_MS,
            frame_ms: DEFAULT_FRAME_MS,
        }
    }
}

impl SegmenterSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.silence_threshold_db < 0.0) {
            return Err(VinylError::configuration(
                "silence_threshold_db",
                format!("must be a negative dB value, got {}", self.silence_threshold_db),
            ));
        }
        if self.min_silence_len_ms == 0 {
            return Err(VinylError::configuration("min_silence_len_ms", "must be greater than 0"));
        }
        if self.frame_ms == 0 {
            return Err(VinylError::configuration("frame_ms", "must be greater than 0"));
        }
        Ok(())
    }
}

pub struct SilenceSegmenter {
    settings: SegmenterSettings,
}

impl SilenceSegmenter {
    pub fn new(settings: SegmenterSettings) -> Result<Self> {
        settings.validate()?;
        Ok(SilenceSegmenter { settings })
    }

    pub fn settings(&self) -> &SegmenterSettings {
        &self.settings
    }

    /// Find the qualifying silence runs (gaps), in chronological order
    pub fn detect_silence(&self, waveform: &Waveform) -> Result<Vec<Segment>> {
        check_input(waveform)?;

        let frame_len = self.frame_len(waveform.sample_rate());
        let levels = frame_levels_db(waveform, frame_len);
        let threshold = self.settings.silence_threshold_db;

        let mut gaps = Vec::new();
        let mut run_start: Option<usize> = None;
        for (index, &level) in levels.iter().enumerate() {
            let silent = level < threshold;
            match (silent, run_start) {
                (true, None) => run_start = Some(index),
                (false, Some(start)) => {
                    self.push_gap(&mut gaps, waveform, frame_len, start, index);
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            self.push_gap(&mut gaps, waveform, frame_len, start, levels.len());
        }

        debug!(
            "Scanned {} frames of {} ms, found {} gaps below {:.1} dB",
            levels.len(),
            self.settings.frame_ms,
            gaps.len(),
            threshold
        );
        Ok(gaps)
    }

    /// Split the waveform into ordered, non-overlapping non-silent segments.
    ///
    /// A buffer without any gap yields one segment covering all of it; a buffer
    /// that is one long gap yields no segments.
    pub fn segment(&self, waveform: &Waveform) -> Result<Vec<Segment>> {
        let gaps = self.detect_silence(waveform)?;
        let total_ms = waveform.duration_ms();

        let mut spans = Vec::with_capacity(gaps.len() + 1);
        let mut cursor = 0;
        for gap in &gaps {
            if gap.start_ms > cursor {
                spans.push(Segment {
                    start_ms: cursor,
                    end_ms: gap.start_ms,
                });
            }
            cursor = gap.end_ms;
        }
        if cursor < total_ms {
            spans.push(Segment {
                start_ms: cursor,
                end_ms: total_ms,
            });
        }

        let segments = pad_segments(spans, self.settings.keep_silence_ms, total_ms);
        debug!(
            "Segmented {} ms into {} segments (keep_silence {} ms)",
            total_ms,
            segments.len(),
            self.settings.keep_silence_ms
        );
        Ok(segments)
    }

    fn frame_len(&self, sample_rate: u32) -> usize {
        let samples = (sample_rate as u64).saturating_mul(self.settings.frame_ms) / 1000;
        usize::try_from(samples).unwrap_or(usize::MAX).max(1)
    }

    fn push_gap(
        &self,
        gaps: &mut Vec<Segment>,
        waveform: &Waveform,
        frame_len: usize,
        first_frame: usize,
        end_frame: usize,
    ) {
        let start_ms = waveform.frame_to_ms(first_frame.saturating_mul(frame_len));
        let end_frame = end_frame.saturating_mul(frame_len).min(waveform.num_frames());
        let end_ms = waveform.frame_to_ms(end_frame);
        if end_ms - start_ms >= self.settings.min_silence_len_ms {
            gaps.push(Segment { start_ms, end_ms });
        }
    }
}

fn check_input(waveform: &Waveform) -> Result<()> {
    if waveform.is_empty() {
        return Err(VinylError::processing("Audio buffer is empty"));
    }
    if waveform.sample_rate() == 0 {
        return Err(VinylError::processing("Invalid sample rate")
            .with_details("sample rate must be greater than 0"));
    }
    if waveform.duration_ms() == 0 {
        return Err(VinylError::processing("Audio buffer is too short to segment")
            .with_details(format!(
                "{} frames at {} Hz is under one millisecond",
                waveform.num_frames(),
                waveform.sample_rate()
            )));
    }
    Ok(())
}

/// RMS level of each analysis frame over all channels, in dBFS
fn frame_levels_db(waveform: &Waveform, frame_len: usize) -> Vec<f64> {
    let num_frames = waveform.num_frames();
    let num_channels = waveform.num_channels();

    (0..num_frames)
        .step_by(frame_len)
        .map(|start| {
            let end = start.saturating_add(frame_len).min(num_frames);
            let sum_squares: f64 = waveform
                .channels()
                .iter()
                .map(|c| decibel::sum_of_squares(&c[start..end]))
                .sum();
            let count = ((end - start) * num_channels) as f64;
            decibel::mean_square_to_db(sum_squares / count)
        })
        .collect()
}

/// Extend each span by `keep_ms` on both sides, clamped to the buffer. Where
/// two extended spans would overlap they meet at the middle of their gap.
fn pad_segments(spans: Vec<Segment>, keep_ms: u64, total_ms: u64) -> Vec<Segment> {
    let mut padded: Vec<Segment> = spans
        .iter()
        .map(|s| Segment {
            start_ms: s.start_ms.saturating_sub(keep_ms),
            end_ms: s.end_ms.saturating_add(keep_ms).min(total_ms),
        })
        .collect();

    // Overlap is judged on the unclamped padding so the cut always falls in the real gap
    for (i, pair) in spans.windows(2).enumerate() {
        let (last, next) = (pair[0], pair[1]);
        if next.start_ms.saturating_sub(keep_ms) < last.end_ms.saturating_add(keep_ms) {
            let middle = last.end_ms + (next.start_ms - last.end_ms) / 2;
            padded[i].end_ms = middle;
            padded[i + 1].start_ms = middle;
        }
    }

    padded
}
