// Vertical intervals and chord types

use super::stats::{argmax, ratio};
use super::{ExtractorDescriptor, FeatureExtractor, FnExtractor};
use crate::ir::{ChordType, IntermediateRepresentation, CHORD_TYPE_COUNT, PITCH_BINS, PITCH_CLASS_BINS};

pub const VERTICAL_INTERVAL_HISTOGRAM: &str = "Vertical Interval Histogram";
pub const WRAPPED_VERTICAL_INTERVAL_HISTOGRAM: &str = "Wrapped Vertical Interval Histogram";
pub const CHORD_TYPE_HISTOGRAM: &str = "Chord Type Histogram";
pub const MOST_COMMON_VERTICAL_INTERVAL: &str = "Most Common Vertical Interval";
pub const VERTICAL_DISSONANCE_RATIO: &str = "Vertical Dissonance Ratio";
pub const VERTICAL_PERFECT_FIFTHS: &str = "Vertical Perfect Fifths";
pub const PARTIAL_CHORDS: &str = "Partial Chords";
pub const STANDARD_TRIADS: &str = "Standard Triads";
pub const DOMINANT_SEVENTH_CHORDS: &str = "Dominant Seventh Chords";
pub const COMPLEX_CHORDS: &str = "Complex Chords";
pub const AVERAGE_NUMBER_OF_SIMULTANEOUS_PITCH_CLASSES: &str = "Average Number of Simultaneous Pitch Classes";

/// Wrapped intervals heard as dissonant: m2, M2, tritone, m7, M7
const DISSONANT_INTERVALS: [usize; 5] = [1, 2, 6, 10, 11];
/// Wrapped intervals heard as consonant: unison/octave, thirds, fifth, sixths
const CONSONANT_INTERVALS: [usize; 6] = [0, 3, 4, 7, 8, 9];

pub(super) fn harmony_extractors() -> Vec<Box<dyn FeatureExtractor>> {
    vec![
        FnExtractor::boxed(
            ExtractorDescriptor::new(VERTICAL_INTERVAL_HISTOGRAM, "C-1", PITCH_BINS)
                .describe("Fraction of intervals between notes struck together, by semitones"),
            |ir, _| ir.vertical_interval_histogram.clone(),
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(WRAPPED_VERTICAL_INTERVAL_HISTOGRAM, "C-2", PITCH_CLASS_BINS)
                .describe("Vertical interval histogram folded into one octave"),
            |ir, _| ir.wrapped_vertical_interval_histogram.clone(),
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(CHORD_TYPE_HISTOGRAM, "C-3", CHORD_TYPE_COUNT)
                .describe("Share of chord time spent in each chord archetype"),
            |ir, _| ir.chord_type_histogram.clone(),
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(MOST_COMMON_VERTICAL_INTERVAL, "C-4", 1)
                .describe("Most frequent vertical interval in semitones")
                .depends_on(VERTICAL_INTERVAL_HISTOGRAM, 0),
            |_, deps| vec![argmax(deps[0]) as f64],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(VERTICAL_DISSONANCE_RATIO, "C-5", 1)
                .describe("Dissonant wrapped vertical intervals divided by consonant ones")
                .depends_on(WRAPPED_VERTICAL_INTERVAL_HISTOGRAM, 0),
            |_, deps| {
                let dissonant: f64 = DISSONANT_INTERVALS.iter().map(|&i| deps[0][i]).sum();
                let consonant: f64 = CONSONANT_INTERVALS.iter().map(|&i| deps[0][i]).sum();
                vec![ratio(dissonant, consonant)]
            },
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(VERTICAL_PERFECT_FIFTHS, "C-6", 1)
                .describe("Fraction of wrapped vertical intervals that are perfect fifths")
                .depends_on(WRAPPED_VERTICAL_INTERVAL_HISTOGRAM, 0),
            |_, deps| vec![deps[0][7]],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(PARTIAL_CHORDS, "C-7", 1)
                .describe("Share of chord time with only two pitch classes")
                .depends_on(CHORD_TYPE_HISTOGRAM, 0),
            |_, deps| vec![deps[0][ChordType::PartialChord.index()]],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(STANDARD_TRIADS, "C-8", 1)
                .describe("Share of chord time in major or minor triads")
                .depends_on(CHORD_TYPE_HISTOGRAM, 0),
            |_, deps| vec![deps[0][ChordType::MajorTriad.index()] + deps[0][ChordType::MinorTriad.index()]],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(DOMINANT_SEVENTH_CHORDS, "C-9", 1)
                .describe("Share of chord time in dominant seventh chords")
                .depends_on(CHORD_TYPE_HISTOGRAM, 0),
            |_, deps| vec![deps[0][ChordType::DominantSeventh.index()]],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(COMPLEX_CHORDS, "C-10", 1)
                .describe("Share of chord time with five or more pitch classes")
                .depends_on(CHORD_TYPE_HISTOGRAM, 0),
            |_, deps| vec![deps[0][ChordType::Complex.index()]],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(AVERAGE_NUMBER_OF_SIMULTANEOUS_PITCH_CLASSES, "C-11", 1)
                .describe("Time-weighted mean number of pitch classes sounding while anything pitched sounds"),
            average_simultaneous_pitch_classes,
        ),
    ]
}

fn average_simultaneous_pitch_classes(ir: &IntermediateRepresentation, _: &[&[f64]]) -> Vec<f64> {
    let mut weighted = 0.0;
    let mut total = 0.0;
    for seg in ir.polyphony.segments().iter().filter(|s| s.pitched_notes() > 0) {
        let len = seg.len_ticks() as f64;
        weighted += seg.pitch_class_count() as f64 * len;
        total += len;
    }
    vec![ratio(weighted, total)]
}
