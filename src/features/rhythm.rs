// Beat histogram, note values, rests, tempo and meter

use super::stats::{argmax, max, mean, ratio, std_dev, top_two};
use super::{ExtractorDescriptor, FeatureExtractor, FnExtractor};
use crate::ir::{IntermediateRepresentation, BEAT_HISTOGRAM_BINS, RHYTHMIC_VALUE_BINS, TEMPO_FLOOR_BPM};

pub const BEAT_HISTOGRAM: &str = "Beat Histogram";
pub const STRONGEST_RHYTHMIC_PULSE: &str = "Strongest Rhythmic Pulse";
pub const STRENGTH_OF_STRONGEST_RHYTHMIC_PULSE: &str = "Strength of Strongest Rhythmic Pulse";
pub const STRENGTH_RATIO_OF_TWO_STRONGEST_RHYTHMIC_PULSES: &str = "Strength Ratio of Two Strongest Rhythmic Pulses";
pub const RHYTHMIC_VALUE_HISTOGRAM: &str = "Rhythmic Value Histogram";
pub const NOTE_DENSITY: &str = "Note Density";
pub const AVERAGE_NOTE_DURATION: &str = "Average Note Duration";
pub const VARIABILITY_OF_NOTE_DURATIONS: &str = "Variability of Note Durations";
pub const NUMBER_OF_RESTS: &str = "Number of Rests";
pub const AVERAGE_REST_DURATION: &str = "Average Rest Duration";
pub const INITIAL_TEMPO: &str = "Initial Tempo";
pub const INITIAL_TIME_SIGNATURE: &str = "Initial Time Signature";
pub const COMPOUND_OR_SIMPLE_METER: &str = "Compound Or Simple Meter";
pub const TRIPLE_METER: &str = "Triple Meter";

pub(super) fn rhythm_extractors() -> Vec<Box<dyn FeatureExtractor>> {
    vec![
        FnExtractor::boxed(
            ExtractorDescriptor::new(BEAT_HISTOGRAM, "R-1", BEAT_HISTOGRAM_BINS)
                .describe("Onset periodicity strength per BPM"),
            |ir, _| ir.beat_histogram.clone(),
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(STRONGEST_RHYTHMIC_PULSE, "R-2", 1)
                .describe("BPM of the strongest pulse at or above 40 BPM")
                .depends_on(BEAT_HISTOGRAM, 0),
            |_, deps| {
                let pulses = &deps[0][TEMPO_FLOOR_BPM..];
                if max(pulses) > 0.0 {
                    vec![(TEMPO_FLOOR_BPM + argmax(pulses)) as f64]
                } else {
                    vec![0.0]
                }
            },
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(STRENGTH_OF_STRONGEST_RHYTHMIC_PULSE, "R-3", 1)
                .describe("Beat histogram value of the strongest pulse at or above 40 BPM")
                .depends_on(BEAT_HISTOGRAM, 0),
            |_, deps| vec![max(&deps[0][TEMPO_FLOOR_BPM..])],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(STRENGTH_RATIO_OF_TWO_STRONGEST_RHYTHMIC_PULSES, "R-4", 1)
                .describe("Strongest pulse divided by the second strongest, both at or above 40 BPM")
                .depends_on(BEAT_HISTOGRAM, 0),
            |_, deps| {
                let (first, second) = top_two(&deps[0][TEMPO_FLOOR_BPM..]);
                vec![ratio(first, second)]
            },
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(RHYTHMIC_VALUE_HISTOGRAM, "R-5", RHYTHMIC_VALUE_BINS)
                .describe("Fraction of pitched notes nearest each notated duration"),
            |ir, _| ir.rhythmic_value_histogram.clone(),
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(NOTE_DENSITY, "R-6", 1).describe("Note onsets per second"),
            |ir, _| vec![ratio(ir.note_count as f64, ir.duration_seconds)],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(AVERAGE_NOTE_DURATION, "R-7", 1)
                .describe("Mean pitched note length in quarter notes"),
            |ir, _| vec![mean(&ir.note_durations)],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(VARIABILITY_OF_NOTE_DURATIONS, "R-8", 1)
                .describe("Standard deviation of pitched note lengths in quarter notes"),
            |ir, _| vec![std_dev(&ir.note_durations)],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(NUMBER_OF_RESTS, "R-9", 1)
                .describe("Silent gaps between pitched notes"),
            |ir, _| vec![ir.rest_durations.len() as f64],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(AVERAGE_REST_DURATION, "R-10", 1)
                .describe("Mean rest length in quarter notes"),
            |ir, _| vec![mean(&ir.rest_durations)],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(INITIAL_TEMPO, "R-11", 1).describe("Tempo in BPM at the window start"),
            |ir, _| vec![ir.initial_tempo_bpm],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(INITIAL_TIME_SIGNATURE, "R-12", 2)
                .describe("Numerator and denominator in effect at the window start"),
            |ir, _| vec![ir.time_signature.0 as f64, ir.time_signature.1 as f64],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(COMPOUND_OR_SIMPLE_METER, "R-13", 1)
                .describe("1 for compound meter, 0 for simple")
                .depends_on(INITIAL_TIME_SIGNATURE, 0),
            compound_meter,
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(TRIPLE_METER, "R-14", 1)
                .describe("1 when the numerator is 3 or 9")
                .depends_on(INITIAL_TIME_SIGNATURE, 0),
            |_, deps| {
                let numerator = deps[0][0] as u32;
                vec![if numerator == 3 || numerator == 9 { 1.0 } else { 0.0 }]
            },
        ),
    ]
}

fn compound_meter(_: &IntermediateRepresentation, deps: &[&[f64]]) -> Vec<f64> {
    let numerator = deps[0][0] as u32;
    vec![if numerator > 3 && numerator % 3 == 0 { 1.0 } else { 0.0 }]
}
