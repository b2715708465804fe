//! Track detection pipeline: silence segmentation followed by classification.

use crate::classifier::{Track, TrackClassifier};
use crate::config::Settings;
use crate::error::Result;
use crate::segmenter::{SegmenterSettings, SilenceSegmenter};
use crate::waveform::Waveform;
use log::info;

/// Minimum silence used by the vinyl preset, short enough to catch every track gap
pub const VINYL_MIN_SILENCE_LEN_MS: u64 = 500;

/// Detect tracks with the given settings
pub fn detect_tracks(waveform: &Waveform, settings: &Settings) -> Result<Vec<Track>> {
    let segmenter = SilenceSegmenter::new(settings.segmenter)?;
    let classifier = TrackClassifier::new(settings.classifier)?;

    let segments = segmenter.segment(waveform)?;
    let tracks = classifier.classify(&segments)?;

    let sides = tracks.last().map_or(0, |t| t.side as usize + 1);
    info!(
        "Detected {} tracks on {} sides from {} segments ({:.1} s of audio)",
        tracks.len(),
        sides,
        segments.len(),
        waveform.duration_seconds()
    );
    Ok(tracks)
}

/// Detect tracks on a vinyl transfer.
///
/// Keeps the caller's threshold and keep-silence values but looks for much
/// shorter gaps, since songs on a side are often separated by a second or less.
pub fn detect_vinyl_tracks(waveform: &Waveform, settings: &Settings) -> Result<Vec<Track>> {
    let vinyl = Settings {
        segmenter: SegmenterSettings {
            min_silence_len_ms: VINYL_MIN_SILENCE_LEN_MS,
            ..settings.segmenter
        },
        ..*settings
    };
    detect_tracks(waveform, &vinyl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Side;
    use crate::error::VinylError;
    use crate::segmenter::Segment;
    use crate::test_signals::recording;

    const RATE: u32 = 44100;

    /// 180 s: 4 s lead-in, two 80 s tone bursts around a gap, silence to the end
    fn two_track_record(gap_seconds: f64) -> Waveform {
        let tail = 180.0 - 4.0 - 80.0 - gap_seconds - 80.0;
        recording(
            &[
                (4.0, false),
                (80.0, true),
                (gap_seconds, false),
                (80.0, true),
                (tail, false),
            ],
            RATE,
        )
    }

    #[test]
    fn test_twelve_second_gap_starts_side_b() {
        let wave = two_track_record(12.0);
        assert_eq!(wave.duration_ms(), 180_000);
        let settings = Settings::default();

        let segments = SilenceSegmenter::new(settings.segmenter)
            .unwrap()
            .segment(&wave)
            .unwrap();
        assert_eq!(
            segments,
            vec![
                Segment {
                    start_ms: 3500,
                    end_ms: 84_500,
                },
                Segment {
                    start_ms: 95_500,
                    end_ms: 176_500,
                },
            ]
        );

        let tracks = detect_tracks(&wave, &settings).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].number, 1);
        assert_eq!(tracks[1].number, 2);
        assert_eq!(tracks[0].side, Side::A);
        assert_eq!(tracks[1].side, Side::B);
        assert_eq!(tracks[1].start_time, 95.5);
    }

    #[test]
    fn test_five_second_gap_stays_on_side_a() {
        let wave = two_track_record(5.0);
        let tracks = detect_tracks(&wave, &Settings::default()).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].side, Side::A);
        assert_eq!(tracks[1].side, Side::A);
        assert_eq!(tracks[1].label(), "A2");
    }

    #[test]
    fn test_silent_recording_has_no_tracks() {
        let wave = recording(&[(30.0, false)], RATE);
        assert!(detect_tracks(&wave, &Settings::default()).unwrap().is_empty());
    }

    #[test]
    fn test_only_short_segments_is_an_error() {
        let wave = recording(&[(3.0, true), (3.0, false), (3.0, true), (3.0, false)], RATE);
        assert!(matches!(
            detect_tracks(&wave, &Settings::default()),
            Err(VinylError::Processing { .. })
        ));
    }

    #[test]
    fn test_empty_recording_is_an_error() {
        let wave = Waveform::from_mono(Vec::new(), RATE);
        assert!(detect_tracks(&wave, &Settings::default()).is_err());
    }

    #[test]
    fn test_vinyl_preset_catches_short_gaps() {
        // Two songs a second apart, then a side change
        let wave = recording(
            &[(20.0, true), (1.0, false), (20.0, true), (15.0, false), (20.0, true)],
            8000,
        );
        let settings = Settings::default();

        let general = detect_tracks(&wave, &settings).unwrap();
        assert_eq!(general.len(), 2);

        let vinyl = detect_vinyl_tracks(&wave, &settings).unwrap();
        let labels: Vec<String> = vinyl.iter().map(Track::label).collect();
        assert_eq!(labels, vec!["A1", "A2", "B1"]);
    }
}
