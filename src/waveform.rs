//! Decoded audio buffer handed in by the decoding collaborator.
//!
//! Samples are stored channel-major (outer vec = channels, inner vec = samples)
//! as normalized `f32` in `[-1.0, 1.0]`, the same layout the capture code uses
//! for its integer chunks.

use crate::classifier::Track;
use crate::error::{Result, VinylError};
use std::str::FromStr;

/// Integer PCM layouts produced by capture devices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    S16,
    S32,
}

impl FromStr for SampleFormat {
    type Err = VinylError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "s16" | "s16le" => Ok(SampleFormat::S16),
            "s32" | "s32le" => Ok(SampleFormat::S32),
            _ => Err(VinylError::processing(format!("Unsupported format: {}", s))),
        }
    }
}

impl SampleFormat {
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            SampleFormat::S16 => 2,
            SampleFormat::S32 => 4,
        }
    }

    /// Full-scale value used to normalize integer samples
    pub fn max_value(&self) -> f64 {
        match self {
            SampleFormat::S16 => 32768.0,
            SampleFormat::S32 => 2147483648.0,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SampleFormat::S16 => "s16",
            SampleFormat::S32 => "s32",
        }
    }
}

/// A decoded multi-channel sample buffer and its sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl Waveform {
    /// Build a waveform from planar channels. All channels must have the same length.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if let Some(first) = channels.first() {
            let frames = first.len();
            if let Some((index, channel)) = channels
                .iter()
                .enumerate()
                .find(|(_, c)| c.len() != frames)
            {
                return Err(VinylError::processing("Channels have different lengths")
                    .with_details(format!(
                        "channel 0 has {} samples, channel {} has {}",
                        frames,
                        index,
                        channel.len()
                    )));
            }
        }

        Ok(Waveform {
            channels,
            sample_rate,
        })
    }

    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Waveform {
            channels: vec![samples],
            sample_rate,
        }
    }

    /// Split interleaved samples (`L R L R ...`) into planar channels
    pub fn from_interleaved(
        samples: &[f32],
        num_channels: usize,
        sample_rate: u32,
    ) -> Result<Self> {
        if num_channels == 0 {
            return Err(VinylError::processing("Interleaved audio needs at least one channel"));
        }
        if samples.len() % num_channels != 0 {
            return Err(VinylError::processing("Interleaved audio has a partial frame")
                .with_details(format!(
                    "{} samples is not a multiple of {} channels",
                    samples.len(),
                    num_channels
                )));
        }

        let frames = samples.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(frames); num_channels];
        for frame in samples.chunks_exact(num_channels) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }

        Ok(Waveform {
            channels,
            sample_rate,
        })
    }

    /// Normalize integer PCM chunks by the format's full-scale value
    pub fn from_pcm(audio: &[Vec<i32>], format: SampleFormat, sample_rate: u32) -> Result<Self> {
        let max_value = format.max_value();
        let channels = audio
            .iter()
            .map(|channel| {
                channel
                    .iter()
                    .map(|&s| (s as f64 / max_value) as f32)
                    .collect()
            })
            .collect();
        Waveform::new(channels, sample_rate)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn num_frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// True if there is no channel or no frame to measure
    pub fn is_empty(&self) -> bool {
        self.num_frames() == 0
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// All samples of all channels, channel after channel
    pub fn samples(&self) -> impl Iterator<Item = f32> + '_ {
        self.channels.iter().flat_map(|c| c.iter().copied())
    }

    pub fn interleaved(&self) -> Vec<f32> {
        let frames = self.num_frames();
        let mut out = Vec::with_capacity(frames * self.num_channels());
        for i in 0..frames {
            for channel in &self.channels {
                out.push(channel[i]);
            }
        }
        out
    }

    /// Average all channels into one measurement channel
    pub fn downmix(&self) -> Vec<f32> {
        let num_channels = self.num_channels();
        if num_channels == 1 {
            return self.channels[0].clone();
        }

        (0..self.num_frames())
            .map(|i| {
                let sum: f64 = self.channels.iter().map(|c| c[i] as f64).sum();
                (sum / num_channels as f64) as f32
            })
            .collect()
    }

    /// Millisecond position of a frame index (floored)
    pub fn frame_to_ms(&self, frame: usize) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        frame as u64 * 1000 / self.sample_rate as u64
    }

    /// First frame at or after a millisecond position, clamped to the buffer
    pub fn ms_to_frame(&self, ms: u64) -> usize {
        let frame = (ms * self.sample_rate as u64).div_ceil(1000);
        (frame as usize).min(self.num_frames())
    }

    pub fn duration_ms(&self) -> u64 {
        self.frame_to_ms(self.num_frames())
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_frames() as f64 / self.sample_rate as f64
    }

    /// Copy the half-open range `[start_ms, end_ms)` into a new waveform
    pub fn slice_ms(&self, start_ms: u64, end_ms: u64) -> Waveform {
        let start = self.ms_to_frame(start_ms);
        let end = self.ms_to_frame(end_ms).max(start);
        Waveform {
            channels: self
                .channels
                .iter()
                .map(|c| c[start..end].to_vec())
                .collect(),
            sample_rate: self.sample_rate,
        }
    }

    /// Cut out the audio of one detected track
    pub fn slice_track(&self, track: &Track) -> Waveform {
        let start_ms = (track.start_time * 1000.0).round() as u64;
        let end_ms = (track.end_time * 1000.0).round() as u64;
        self.slice_ms(start_ms, end_ms)
    }
}
