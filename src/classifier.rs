//! Turns segments into numbered tracks and infers record sides from long gaps.

use crate::error::{Result, VinylError};
use crate::segmenter::Segment;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_MIN_TRACK_LEN_MS: u64 = 10_000;
pub const DEFAULT_SIDE_BREAK_THRESHOLD_MS: u64 = 10_000;

/// Physical record side. A double album has at most four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
    C,
    D,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::A, Side::B, Side::C, Side::D];

    /// The following side, or `None` after D
    pub fn next(self) -> Option<Side> {
        match self {
            Side::A => Some(Side::B),
            Side::B => Some(Side::C),
            Side::C => Some(Side::D),
            Side::D => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Side::A => 'A',
            Side::B => 'B',
            Side::C => 'C',
            Side::D => 'D',
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A numbered, side-assigned track. Times are seconds from the start of the recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub number: u32,
    pub side: Side,
    /// 1-based position within its side
    pub position_on_side: u32,
    pub start_time: f64,
    pub end_time: f64,
    pub duration_ms: u64,
}

impl Track {
    pub fn duration_seconds(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }

    /// Duration as `m:ss`
    pub fn duration_str(&self) -> String {
        let minutes = self.duration_ms / 60_000;
        let seconds = (self.duration_ms % 60_000) / 1000;
        format!("{}:{:02}", minutes, seconds)
    }

    /// Vinyl-style label such as `A1` or `B3`
    pub fn label(&self) -> String {
        format!("{}{}", self.side, self.position_on_side)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierSettings {
    /// Segments shorter than this are not tracks
    pub min_track_len_ms: u64,
    /// A gap longer than this before a track starts a new side
    pub side_break_threshold_ms: u64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        ClassifierSettings {
            min_track_len_ms: DEFAULT_MIN_TRACK_LEN_MS,
            side_break_threshold_ms: DEFAULT_SIDE_BREAK_THRESHOLD_MS,
        }
    }
}

impl ClassifierSettings {
    pub fn validate(&self) -> Result<()> {
        if self.min_track_len_ms == 0 {
            return Err(VinylError::configuration("min_track_len_ms", "must be greater than 0"));
        }
        if self.side_break_threshold_ms == 0 {
            return Err(VinylError::configuration(
                "side_break_threshold_ms",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

pub struct TrackClassifier {
    settings: ClassifierSettings,
}

/// Accumulator threaded through the ordered scan over segments
#[derive(Debug)]
struct ScanState {
    /// End of the previously scanned segment, kept or not
    cursor_ms: Option<u64>,
    side: Side,
    next_number: u32,
    next_position: u32,
    tracks: Vec<Track>,
}

impl ScanState {
    fn new() -> Self {
        ScanState {
            cursor_ms: None,
            side: Side::A,
            next_number: 1,
            next_position: 1,
            tracks: Vec::new(),
        }
    }

    fn scan(mut self, segment: &Segment, settings: &ClassifierSettings) -> Self {
        let gap_before = self
            .cursor_ms
            .map_or(0, |cursor| segment.start_ms.saturating_sub(cursor));
        self.cursor_ms = Some(segment.end_ms);

        if segment.duration_ms() < settings.min_track_len_ms {
            debug!(
                "Skipping {} ms segment at {} ms (shorter than {} ms)",
                segment.duration_ms(),
                segment.start_ms,
                settings.min_track_len_ms
            );
            return self;
        }

        if gap_before > settings.side_break_threshold_ms && !self.tracks.is_empty() {
            self.advance_side(gap_before);
        }

        self.tracks.push(Track {
            number: self.next_number,
            side: self.side,
            position_on_side: self.next_position,
            start_time: segment.start_ms as f64 / 1000.0,
            end_time: segment.end_ms as f64 / 1000.0,
            duration_ms: segment.duration_ms(),
        });
        self.next_number += 1;
        self.next_position += 1;
        self
    }

    fn advance_side(&mut self, gap_before: u64) {
        match self.side.next() {
            Some(next) => {
                debug!(
                    "{} ms gap before track {}: side {} -> {}",
                    gap_before, self.next_number, self.side, next
                );
                self.side = next;
                self.next_position = 1;
            }
            None => {
                warn!(
                    "{} ms gap before track {} would start a fifth side; keeping it on side {}",
                    gap_before, self.next_number, self.side
                );
            }
        }
    }
}

impl TrackClassifier {
    pub fn new(settings: ClassifierSettings) -> Result<Self> {
        settings.validate()?;
        Ok(TrackClassifier { settings })
    }

    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }

    /// Number the segments long enough to be tracks and assign each one a side.
    ///
    /// An empty segment list yields no tracks. A non-empty list in which no
    /// segment reaches `min_track_len_ms` is an error.
    pub fn classify(&self, segments: &[Segment]) -> Result<Vec<Track>> {
        if segments.is_empty() {
            return Ok(Vec::new());
        }

        let state = segments
            .iter()
            .fold(ScanState::new(), |state, segment| state.scan(segment, &self.settings));

        if state.tracks.is_empty() {
            let longest = segments.iter().map(Segment::duration_ms).max().unwrap_or(0);
            return Err(VinylError::processing("No segment is long enough to be a track")
                .with_details(format!(
                    "{} segments, longest {} ms, minimum track length {} ms",
                    segments.len(),
                    longest,
                    self.settings.min_track_len_ms
                )));
        }

        Ok(state.tracks)
    }
}
