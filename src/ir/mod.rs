// Intermediate representation: the statistics every feature formula reads
//
// One IR is built per window from the event stream and never mutated afterwards.
// Histograms documented as "normalized" sum to 1 when they summarize at least one event
// and are all zero otherwise; "raw" histograms hold plain counts or quarter-note totals.

pub mod beat;
pub mod chords;
pub mod histograms;
pub mod polyphony;

pub use beat::{BEAT_HISTOGRAM_BINS, TEMPO_FLOOR_BPM};
pub use chords::{ChordType, CHORD_TYPE_COUNT};
pub use polyphony::{PolyphonyMap, PolyphonySegment};

use serde::Serialize;

use crate::events::{EventStream, NoteEvent, PERCUSSION_CHANNEL};
use crate::windows::Window;
use beat::Onset;
use histograms::{l1_normalize, normalized_counts, rhythmic_value_bin, RHYTHMIC_VALUES};
use polyphony::Span;

/// Rests shorter than this many quarter notes are ignored
pub const MIN_REST_QUARTER_NOTES: f64 = 0.1;

pub const PITCH_BINS: usize = 128;
pub const PITCH_CLASS_BINS: usize = 12;
pub const RHYTHMIC_VALUE_BINS: usize = RHYTHMIC_VALUES.len();

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntermediateRepresentation {
    pub window: Window,
    pub duration_seconds: f64,
    pub duration_quarter_notes: f64,

    /// Onsets in the window, all channels
    pub note_count: usize,
    /// Onsets in the window on pitched channels
    pub pitched_note_count: usize,

    /// Normalized pitched onsets per MIDI pitch (128 bins)
    pub pitch_histogram: Vec<f64>,
    /// Raw sounding duration per MIDI pitch in quarter notes, clipped to the window
    pub pitch_duration_histogram: Vec<f64>,
    /// Normalized pitched onsets per pitch class (12 bins)
    pub pitch_class_histogram: Vec<f64>,

    /// Signed semitone steps along each channel's highest-note line, indexed by channel
    pub melodic_intervals: Vec<Vec<i32>>,
    /// Normalized absolute melodic intervals (128 bins)
    pub melodic_interval_histogram: Vec<f64>,
    /// Normalized melodic intervals mod 12
    pub wrapped_melodic_interval_histogram: Vec<f64>,

    /// Normalized absolute intervals between notes struck together (128 bins)
    pub vertical_interval_histogram: Vec<f64>,
    /// Normalized vertical intervals mod 12
    pub wrapped_vertical_interval_histogram: Vec<f64>,

    /// Raw quarter notes spent in each chord archetype, in [`ChordType::ALL`] order
    pub chord_type_durations: Vec<f64>,
    /// Normalized form of `chord_type_durations`
    pub chord_type_histogram: Vec<f64>,

    /// Normalized periodicity strength per BPM (201 bins)
    pub beat_histogram: Vec<f64>,
    /// Normalized note-value classes (12 bins)
    pub rhythmic_value_histogram: Vec<f64>,

    /// Rests in quarter notes, window edges included
    pub rest_durations: Vec<f64>,
    pub polyphony: PolyphonyMap,

    /// Raw pitched onsets per General MIDI program
    pub pitched_instrument_counts: Vec<u32>,
    /// Raw percussion onsets per key
    pub unpitched_instrument_counts: Vec<u32>,

    /// Pitched note lengths in quarter notes (not clipped)
    pub note_durations: Vec<f64>,
    /// Velocities of all onsets
    pub loudness: Vec<f64>,
    /// Pitched onset pitches in onset order
    pub pitches: Vec<u8>,

    pub initial_tempo_bpm: f64,
    /// (numerator, denominator) in effect at the window start
    pub time_signature: (u8, u8),
}

impl IntermediateRepresentation {
    pub fn is_empty(&self) -> bool {
        self.note_count == 0
    }

    /// Total rest length in quarter notes
    pub fn rest_total(&self) -> f64 {
        self.rest_durations.iter().sum()
    }
}

/// Build the IR for one window. Never fails: an empty window yields zeroed statistics.
pub fn build(stream: &EventStream, window: &Window) -> IntermediateRepresentation {
    let notes = stream.notes();
    let first = notes.partition_point(|n| n.start_tick < window.start_tick);
    let last = notes.partition_point(|n| n.start_tick < window.end_tick);
    let onsets: Vec<&NoteEvent> = notes[first..last].iter().collect();
    let pitched: Vec<&NoteEvent> = onsets.iter().copied().filter(|n| n.is_pitched()).collect();

    // Anything that started before the window end may still sound inside it
    let spans: Vec<Span> = notes[..last]
        .iter()
        .filter_map(|n| {
            window.clip(n.start_tick, n.end_tick).map(|(start_tick, end_tick)| Span {
                start_tick,
                end_tick,
                channel: n.channel,
                pitch: n.pitch,
            })
        })
        .collect();

    let mut pitch_duration_histogram = vec![0.0; PITCH_BINS];
    for span in spans.iter().filter(|s| s.channel != PERCUSSION_CHANNEL) {
        pitch_duration_histogram[span.pitch as usize] +=
            stream.quarter_notes(span.end_tick - span.start_tick);
    }

    let melodic_intervals = histograms::melodic_intervals_by_channel(&onsets);
    let melodic_steps: Vec<usize> = melodic_intervals
        .iter()
        .flatten()
        .map(|d| d.unsigned_abs() as usize)
        .collect();
    let vertical = histograms::vertical_intervals(&onsets);

    let polyphony = PolyphonyMap::build(&spans);

    let mut chord_type_durations = vec![0.0; CHORD_TYPE_COUNT];
    for seg in polyphony.segments().iter().filter(|s| s.pitched_notes() >= 2) {
        if let Some(chord_type) = chords::classify(seg.pitch_classes) {
            chord_type_durations[chord_type.index()] += stream.quarter_notes(seg.len_ticks());
        }
    }
    let mut chord_type_histogram = chord_type_durations.clone();
    l1_normalize(&mut chord_type_histogram);

    let rest_durations: Vec<f64> = polyphony
        .rests(window.start_tick, window.end_tick)
        .into_iter()
        .map(|(start, end)| stream.quarter_notes(end - start))
        .filter(|&qn| qn >= MIN_REST_QUARTER_NOTES)
        .collect();

    let window_start_seconds = stream.tick_to_seconds(window.start_tick);
    let duration_seconds = stream.tick_to_seconds(window.end_tick) - window_start_seconds;
    let beat_onsets: Vec<Onset> = onsets
        .iter()
        .map(|n| Onset {
            seconds: stream.tick_to_seconds(n.start_tick) - window_start_seconds,
            weight: n.velocity as f64 / 127.0,
        })
        .collect();

    let mut pitched_instrument_counts = vec![0u32; PITCH_BINS];
    let mut unpitched_instrument_counts = vec![0u32; PITCH_BINS];
    for note in &onsets {
        if note.is_pitched() {
            let program = stream.program_at(note.channel, note.start_tick) as usize % PITCH_BINS;
            pitched_instrument_counts[program] += 1;
        } else {
            unpitched_instrument_counts[note.pitch as usize] += 1;
        }
    }

    let note_durations: Vec<f64> = pitched
        .iter()
        .map(|n| stream.quarter_notes(n.duration_ticks()))
        .collect();

    IntermediateRepresentation {
        window: *window,
        duration_seconds,
        duration_quarter_notes: stream.quarter_notes(window.len_ticks()),
        note_count: onsets.len(),
        pitched_note_count: pitched.len(),
        pitch_histogram: normalized_counts(pitched.iter().map(|n| n.pitch as usize), PITCH_BINS),
        pitch_duration_histogram,
        pitch_class_histogram: normalized_counts(
            pitched.iter().map(|n| (n.pitch % 12) as usize),
            PITCH_CLASS_BINS,
        ),
        melodic_interval_histogram: normalized_counts(melodic_steps.iter().copied(), PITCH_BINS),
        wrapped_melodic_interval_histogram: normalized_counts(
            melodic_steps.iter().map(|d| d % 12),
            PITCH_CLASS_BINS,
        ),
        vertical_interval_histogram: normalized_counts(vertical.iter().map(|&d| d as usize), PITCH_BINS),
        wrapped_vertical_interval_histogram: normalized_counts(
            vertical.iter().map(|&d| (d % 12) as usize),
            PITCH_CLASS_BINS,
        ),
        melodic_intervals,
        chord_type_durations,
        chord_type_histogram,
        beat_histogram: beat::beat_histogram(&beat_onsets, duration_seconds),
        rhythmic_value_histogram: normalized_counts(
            note_durations.iter().map(|&qn| rhythmic_value_bin(qn)),
            RHYTHMIC_VALUE_BINS,
        ),
        rest_durations,
        polyphony,
        pitched_instrument_counts,
        unpitched_instrument_counts,
        note_durations,
        loudness: onsets.iter().map(|n| n.velocity as f64).collect(),
        pitches: pitched.iter().map(|n| n.pitch).collect(),
        initial_tempo_bpm: 60_000_000.0 / stream.tempo_at(window.start_tick) as f64,
        time_signature: stream.time_signature_at(window.start_tick),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const TPB: u64 = 480;

    /// C major triad for a quarter, two quarters of rest, then a single C
    pub(crate) fn worked_example() -> EventStream {
        EventStream::new(
            vec![
                NoteEvent::new(60, 100, 0, 0, TPB),
                NoteEvent::new(64, 100, 0, 0, TPB),
                NoteEvent::new(67, 100, 0, 0, TPB),
                NoteEvent::new(60, 100, 0, 3 * TPB, 4 * TPB),
            ],
            TPB as u16,
        )
    }

    fn assert_normalized(histogram: &[f64]) {
        let total: f64 = histogram.iter().sum();
        assert!((total - 1.0).abs() < 1e-9, "histogram sums to {}", total);
    }

    fn nonzero_bins(histogram: &[f64]) -> Vec<usize> {
        histogram.iter().enumerate().filter(|(_, v)| **v != 0.0).map(|(i, _)| i).collect()
    }

    #[test]
    fn worked_example_overall_window() {
        let stream = worked_example();
        let ir = build(&stream, &Window::overall(&stream));

        assert_eq!(nonzero_bins(&ir.pitch_histogram), vec![60, 64, 67]);
        assert_eq!(ir.pitch_histogram[60], 0.5);
        assert_eq!(nonzero_bins(&ir.pitch_duration_histogram), vec![60, 64, 67]);
        assert_eq!(ir.pitch_duration_histogram[60], 2.0);
        assert_eq!(ir.pitch_duration_histogram[64], 1.0);

        assert_eq!(ir.chord_type_durations[ChordType::MajorTriad.index()], 1.0);
        assert_eq!(ir.chord_type_durations.iter().sum::<f64>(), 1.0);
        assert_eq!(ir.rest_durations, vec![2.0]);

        assert_eq!(ir.note_count, 4);
        assert_eq!(ir.duration_quarter_notes, 4.0);
        assert!((ir.duration_seconds - 2.0).abs() < 1e-12);
    }

    #[test]
    fn worked_example_histograms_are_normalized() {
        let stream = worked_example();
        let ir = build(&stream, &Window::overall(&stream));
        assert_normalized(&ir.pitch_histogram);
        assert_normalized(&ir.pitch_class_histogram);
        assert_normalized(&ir.melodic_interval_histogram);
        assert_normalized(&ir.wrapped_melodic_interval_histogram);
        assert_normalized(&ir.vertical_interval_histogram);
        assert_normalized(&ir.wrapped_vertical_interval_histogram);
        assert_normalized(&ir.chord_type_histogram);
        assert_normalized(&ir.beat_histogram);
        assert_normalized(&ir.rhythmic_value_histogram);
    }

    #[test]
    fn melodic_and_vertical_intervals() {
        let stream = worked_example();
        let ir = build(&stream, &Window::overall(&stream));
        // Skyline of channel 0 is 67 then 60
        assert_eq!(ir.melodic_intervals[0], vec![-7]);
        assert_eq!(ir.melodic_interval_histogram[7], 1.0);
        assert_eq!(nonzero_bins(&ir.vertical_interval_histogram), vec![3, 4, 7]);
    }

    #[test]
    fn empty_piece_is_all_zero() {
        let stream = EventStream::new(Vec::new(), 480);
        let ir = build(&stream, &Window::overall(&stream));
        assert!(ir.is_empty());
        for histogram in [
            &ir.pitch_histogram,
            &ir.pitch_duration_histogram,
            &ir.pitch_class_histogram,
            &ir.melodic_interval_histogram,
            &ir.vertical_interval_histogram,
            &ir.chord_type_durations,
            &ir.chord_type_histogram,
            &ir.beat_histogram,
            &ir.rhythmic_value_histogram,
        ] {
            assert!(histogram.iter().all(|&v| v == 0.0));
        }
        assert!(ir.rest_durations.is_empty());
        assert!(ir.polyphony.segments().is_empty());
        assert_eq!(ir.duration_seconds, 0.0);
    }

    #[test]
    fn window_clips_sounding_notes() {
        let stream = worked_example();
        // Second quarter through the end: only the final C starts inside
        let ir = build(&stream, &Window::sequential(0, TPB / 2, 4 * TPB));
        assert_eq!(ir.note_count, 1);
        assert_eq!(ir.pitch_duration_histogram[64], 0.5);
        assert_eq!(ir.chord_type_durations[ChordType::MajorTriad.index()], 0.5);
        assert_eq!(ir.rest_durations, vec![2.0]);
    }

    #[test]
    fn rest_split_by_a_window_boundary_counts_in_both_halves() {
        let stream = worked_example();
        let first = build(&stream, &Window::sequential(0, 0, 2 * TPB));
        let second = build(&stream, &Window::sequential(1, 2 * TPB, 4 * TPB));
        assert_eq!(first.rest_durations, vec![1.0]);
        assert_eq!(second.rest_durations, vec![1.0]);
    }

    #[test]
    fn silent_window_is_one_rest() {
        let stream = worked_example();
        let ir = build(&stream, &Window::sequential(0, TPB, 3 * TPB));
        assert!(ir.is_empty());
        assert_eq!(ir.rest_durations, vec![2.0]);
    }

    #[test]
    fn leading_silence_is_a_rest() {
        let stream = EventStream::new(vec![NoteEvent::new(60, 100, 0, 4 * TPB, 5 * TPB)], TPB as u16);
        let ir = build(&stream, &Window::overall(&stream));
        assert_eq!(ir.rest_durations, vec![4.0]);
    }

    #[test]
    fn short_rests_are_dropped() {
        let stream = EventStream::new(
            vec![
                NoteEvent::new(60, 100, 0, 0, 480),
                NoteEvent::new(62, 100, 0, 500, 960),
            ],
            480,
        );
        let ir = build(&stream, &Window::overall(&stream));
        assert!(ir.rest_durations.is_empty());
    }

    #[test]
    fn instruments_and_percussion() {
        let stream = EventStream::new(
            vec![
                NoteEvent::new(60, 100, 0, 0, 480),
                NoteEvent::new(36, 120, PERCUSSION_CHANNEL, 0, 60),
                NoteEvent::new(42, 80, PERCUSSION_CHANNEL, 240, 300),
            ],
            480,
        )
        .with_program_changes(vec![crate::events::ProgramChange { tick: 0, channel: 0, program: 24 }]);
        let ir = build(&stream, &Window::overall(&stream));
        assert_eq!(ir.pitched_instrument_counts[24], 1);
        assert_eq!(ir.unpitched_instrument_counts[36], 1);
        assert_eq!(ir.unpitched_instrument_counts[42], 1);
        assert_eq!(ir.pitched_note_count, 1);
        assert_eq!(ir.loudness.len(), 3);
        assert_eq!(ir.pitches, vec![60]);
    }
}
