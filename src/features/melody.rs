// Melodic interval statistics

use super::stats::{argmax, mean, ratio};
use super::{ExtractorDescriptor, FeatureExtractor, FnExtractor};
use crate::ir::{IntermediateRepresentation, PITCH_BINS};

pub const MELODIC_INTERVAL_HISTOGRAM: &str = "Melodic Interval Histogram";
pub const MOST_COMMON_MELODIC_INTERVAL: &str = "Most Common Melodic Interval";
pub const MEAN_MELODIC_INTERVAL: &str = "Mean Melodic Interval";
pub const NUMBER_OF_COMMON_MELODIC_INTERVALS: &str = "Number of Common Melodic Intervals";
pub const CHROMATIC_MOTION: &str = "Chromatic Motion";
pub const STEPWISE_MOTION: &str = "Stepwise Motion";
pub const MELODIC_THIRDS: &str = "Melodic Thirds";
pub const MELODIC_OCTAVES: &str = "Melodic Octaves";
pub const DIRECTION_OF_MOTION: &str = "Direction of Motion";

/// Share an interval needs to count as "common"
const COMMON_INTERVAL_SHARE: f64 = 0.09;

pub(super) fn melody_extractors() -> Vec<Box<dyn FeatureExtractor>> {
    vec![
        FnExtractor::boxed(
            ExtractorDescriptor::new(MELODIC_INTERVAL_HISTOGRAM, "M-1", PITCH_BINS)
                .describe("Fraction of melodic intervals of each size in semitones"),
            |ir, _| ir.melodic_interval_histogram.clone(),
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(MOST_COMMON_MELODIC_INTERVAL, "M-2", 1)
                .describe("Most frequent melodic interval in semitones")
                .depends_on(MELODIC_INTERVAL_HISTOGRAM, 0),
            |_, deps| vec![argmax(deps[0]) as f64],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(MEAN_MELODIC_INTERVAL, "M-3", 1)
                .describe("Mean absolute melodic interval in semitones"),
            |ir, _| {
                let steps: Vec<f64> = all_intervals(ir).map(|d| d.abs() as f64).collect();
                vec![mean(&steps)]
            },
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(NUMBER_OF_COMMON_MELODIC_INTERVALS, "M-4", 1)
                .describe("Number of interval sizes making up at least 9% of melodic intervals")
                .depends_on(MELODIC_INTERVAL_HISTOGRAM, 0),
            |_, deps| vec![deps[0].iter().filter(|&&v| v >= COMMON_INTERVAL_SHARE).count() as f64],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(CHROMATIC_MOTION, "M-5", 1)
                .describe("Fraction of melodic intervals that are one semitone")
                .depends_on(MELODIC_INTERVAL_HISTOGRAM, 0),
            |_, deps| vec![deps[0][1]],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(STEPWISE_MOTION, "M-6", 1)
                .describe("Fraction of melodic intervals that are one or two semitones")
                .depends_on(MELODIC_INTERVAL_HISTOGRAM, 0),
            |_, deps| vec![deps[0][1] + deps[0][2]],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(MELODIC_THIRDS, "M-7", 1)
                .describe("Fraction of melodic intervals that are minor or major thirds")
                .depends_on(MELODIC_INTERVAL_HISTOGRAM, 0),
            |_, deps| vec![deps[0][3] + deps[0][4]],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(MELODIC_OCTAVES, "M-8", 1)
                .describe("Fraction of melodic intervals that are octaves")
                .depends_on(MELODIC_INTERVAL_HISTOGRAM, 0),
            |_, deps| vec![deps[0][12]],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(DIRECTION_OF_MOTION, "M-9", 1)
                .describe("Fraction of moving melodic intervals that rise"),
            direction_of_motion,
        ),
    ]
}

fn all_intervals(ir: &IntermediateRepresentation) -> impl Iterator<Item = i32> + '_ {
    ir.melodic_intervals.iter().flatten().copied()
}

fn direction_of_motion(ir: &IntermediateRepresentation, _: &[&[f64]]) -> Vec<f64> {
    let rising = all_intervals(ir).filter(|&d| d > 0).count();
    let moving = all_intervals(ir).filter(|&d| d != 0).count();
    vec![ratio(rising as f64, moving as f64)]
}
