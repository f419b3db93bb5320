// Pitch and pitch-class statistics

use super::stats::{argmax, count_nonzero, max, mean, ratio, std_dev, top_two};
use super::{ExtractorDescriptor, FeatureExtractor, FnExtractor};
use crate::ir::{IntermediateRepresentation, PITCH_BINS, PITCH_CLASS_BINS};

pub const BASIC_PITCH_HISTOGRAM: &str = "Basic Pitch Histogram";
pub const PITCH_CLASS_HISTOGRAM: &str = "Pitch Class Histogram";
pub const NUMBER_OF_PITCHES: &str = "Number of Pitches";
pub const NUMBER_OF_PITCH_CLASSES: &str = "Number of Pitch Classes";
pub const RANGE: &str = "Range";
pub const MOST_COMMON_PITCH: &str = "Most Common Pitch";
pub const PREVALENCE_OF_MOST_COMMON_PITCH_CLASS: &str = "Prevalence of Most Common Pitch Class";
pub const MEAN_PITCH: &str = "Mean Pitch";
pub const PITCH_VARIABILITY: &str = "Pitch Variability";
pub const IMPORTANCE_OF_BASS_REGISTER: &str = "Importance of Bass Register";
pub const IMPORTANCE_OF_HIGH_REGISTER: &str = "Importance of High Register";
pub const RELATIVE_PREVALENCE_OF_TOP_PITCH_CLASSES: &str = "Relative Prevalence of Top Pitch Classes";

/// Highest MIDI pitch counted as bass register
const BASS_REGISTER_TOP: usize = 54;
/// Lowest MIDI pitch counted as high register
const HIGH_REGISTER_BOTTOM: usize = 73;

pub(super) fn pitch_extractors() -> Vec<Box<dyn FeatureExtractor>> {
    vec![
        FnExtractor::boxed(
            ExtractorDescriptor::new(BASIC_PITCH_HISTOGRAM, "P-1", PITCH_BINS)
                .describe("Fraction of pitched note onsets on each MIDI pitch"),
            |ir, _| ir.pitch_histogram.clone(),
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(PITCH_CLASS_HISTOGRAM, "P-2", PITCH_CLASS_BINS)
                .describe("Fraction of pitched note onsets on each pitch class, C first"),
            |ir, _| ir.pitch_class_histogram.clone(),
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(NUMBER_OF_PITCHES, "P-3", 1)
                .describe("Number of distinct MIDI pitches used")
                .depends_on(BASIC_PITCH_HISTOGRAM, 0),
            |_, deps| vec![count_nonzero(deps[0])],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(NUMBER_OF_PITCH_CLASSES, "P-4", 1)
                .describe("Number of distinct pitch classes used")
                .depends_on(PITCH_CLASS_HISTOGRAM, 0),
            |_, deps| vec![count_nonzero(deps[0])],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(RANGE, "P-5", 1)
                .describe("Semitones between the lowest and highest pitch")
                .depends_on(BASIC_PITCH_HISTOGRAM, 0),
            range,
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(MOST_COMMON_PITCH, "P-6", 1)
                .describe("MIDI pitch with the most onsets")
                .depends_on(BASIC_PITCH_HISTOGRAM, 0),
            |_, deps| vec![argmax(deps[0]) as f64],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(PREVALENCE_OF_MOST_COMMON_PITCH_CLASS, "P-7", 1)
                .describe("Fraction of onsets on the most common pitch class")
                .depends_on(PITCH_CLASS_HISTOGRAM, 0),
            |_, deps| vec![max(deps[0])],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(MEAN_PITCH, "P-8", 1).describe("Mean MIDI pitch of pitched onsets"),
            |ir, _| vec![mean(&pitches(ir))],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(PITCH_VARIABILITY, "P-9", 1)
                .describe("Standard deviation of the MIDI pitches of pitched onsets"),
            |ir, _| vec![std_dev(&pitches(ir))],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(IMPORTANCE_OF_BASS_REGISTER, "P-10", 1)
                .describe("Fraction of onsets on MIDI pitches 0 to 54")
                .depends_on(BASIC_PITCH_HISTOGRAM, 0),
            |_, deps| vec![deps[0][..=BASS_REGISTER_TOP].iter().sum()],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(IMPORTANCE_OF_HIGH_REGISTER, "P-11", 1)
                .describe("Fraction of onsets on MIDI pitches 73 to 127")
                .depends_on(BASIC_PITCH_HISTOGRAM, 0),
            |_, deps| vec![deps[0][HIGH_REGISTER_BOTTOM..].iter().sum()],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(RELATIVE_PREVALENCE_OF_TOP_PITCH_CLASSES, "P-12", 1)
                .describe("Second most common pitch class share divided by the most common one")
                .depends_on(PITCH_CLASS_HISTOGRAM, 0),
            |_, deps| {
                let (first, second) = top_two(deps[0]);
                vec![ratio(second, first)]
            },
        ),
    ]
}

fn pitches(ir: &IntermediateRepresentation) -> Vec<f64> {
    ir.pitches.iter().map(|&p| p as f64).collect()
}

fn range(_: &IntermediateRepresentation, deps: &[&[f64]]) -> Vec<f64> {
    let histogram = deps[0];
    let lowest = histogram.iter().position(|&v| v > 0.0);
    let highest = histogram.iter().rposition(|&v| v > 0.0);
    match (lowest, highest) {
        (Some(lo), Some(hi)) => vec![(hi - lo) as f64],
        _ => vec![0.0],
    }
}
