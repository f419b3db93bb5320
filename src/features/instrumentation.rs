// General MIDI patches and percussion

use super::stats::ratio;
use super::{ExtractorDescriptor, FeatureExtractor, FnExtractor};
use crate::ir::PITCH_BINS;

pub const PITCHED_INSTRUMENTS_PRESENT: &str = "Pitched Instruments Present";
pub const UNPITCHED_INSTRUMENTS_PRESENT: &str = "Unpitched Instruments Present";
pub const NUMBER_OF_PITCHED_INSTRUMENTS: &str = "Number of Pitched Instruments";
pub const NUMBER_OF_UNPITCHED_INSTRUMENTS: &str = "Number of Unpitched Instruments";
pub const PERCUSSION_PREVALENCE: &str = "Percussion Prevalence";

/// General MIDI percussion keys: Acoustic Bass Drum (35) through Open Triangle (81)
pub const FIRST_PERCUSSION_KEY: usize = 35;
pub const LAST_PERCUSSION_KEY: usize = 81;
pub const PERCUSSION_KEY_COUNT: usize = LAST_PERCUSSION_KEY - FIRST_PERCUSSION_KEY + 1;

pub(super) fn instrumentation_extractors() -> Vec<Box<dyn FeatureExtractor>> {
    vec![
        FnExtractor::boxed(
            ExtractorDescriptor::new(PITCHED_INSTRUMENTS_PRESENT, "I-1", PITCH_BINS)
                .describe("1 for every General MIDI patch that plays at least one note")
                .overall_only(),
            |ir, _| presence(&ir.pitched_instrument_counts),
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(UNPITCHED_INSTRUMENTS_PRESENT, "I-2", PERCUSSION_KEY_COUNT)
                .describe("1 for every General MIDI percussion key struck, keys 35 to 81")
                .overall_only(),
            |ir, _| presence(&ir.unpitched_instrument_counts[FIRST_PERCUSSION_KEY..=LAST_PERCUSSION_KEY]),
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(NUMBER_OF_PITCHED_INSTRUMENTS, "I-3", 1)
                .describe("Number of distinct pitched patches used")
                .overall_only()
                .depends_on(PITCHED_INSTRUMENTS_PRESENT, 0),
            |_, deps| vec![deps[0].iter().sum()],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(NUMBER_OF_UNPITCHED_INSTRUMENTS, "I-4", 1)
                .describe("Number of distinct percussion keys struck")
                .overall_only()
                .depends_on(UNPITCHED_INSTRUMENTS_PRESENT, 0),
            |_, deps| vec![deps[0].iter().sum()],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(PERCUSSION_PREVALENCE, "I-5", 1)
                .describe("Fraction of onsets on the percussion channel"),
            |ir, _| {
                let unpitched = ir.note_count - ir.pitched_note_count;
                vec![ratio(unpitched as f64, ir.note_count as f64)]
            },
        ),
    ]
}

fn presence(counts: &[u32]) -> Vec<f64> {
    counts.iter().map(|&c| if c > 0 { 1.0 } else { 0.0 }).collect()
}
