// Voices and polyphony

use super::stats::ratio;
use super::{ExtractorDescriptor, FeatureExtractor, FnExtractor};
use crate::ir::IntermediateRepresentation;

pub const AVERAGE_NUMBER_OF_INDEPENDENT_VOICES: &str = "Average Number of Independent Voices";
pub const MAXIMUM_NUMBER_OF_INDEPENDENT_VOICES: &str = "Maximum Number of Independent Voices";
pub const POLYPHONIC_FRACTION: &str = "Polyphonic Fraction";
pub const REST_FRACTION: &str = "Rest Fraction";

pub(super) fn texture_extractors() -> Vec<Box<dyn FeatureExtractor>> {
    vec![
        FnExtractor::boxed(
            ExtractorDescriptor::new(AVERAGE_NUMBER_OF_INDEPENDENT_VOICES, "T-1", 1)
                .describe("Time-weighted mean number of pitched channels sounding, over pitched sound"),
            average_voices,
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(MAXIMUM_NUMBER_OF_INDEPENDENT_VOICES, "T-2", 1)
                .describe("Most pitched channels sounding at once"),
            |ir, _| {
                let most = ir.polyphony.segments().iter().map(|s| s.pitched_voices()).max();
                vec![most.unwrap_or(0) as f64]
            },
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(POLYPHONIC_FRACTION, "T-3", 1)
                .describe("Share of sounding time with two or more notes at once"),
            polyphonic_fraction,
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(REST_FRACTION, "T-4", 1)
                .describe("Total rest length divided by the window length"),
            |ir, _| vec![ratio(ir.rest_total(), ir.duration_quarter_notes)],
        ),
    ]
}

fn average_voices(ir: &IntermediateRepresentation, _: &[&[f64]]) -> Vec<f64> {
    let mut weighted = 0.0;
    let mut total = 0.0;
    for seg in ir.polyphony.segments().iter().filter(|s| s.pitched_notes() > 0) {
        let len = seg.len_ticks() as f64;
        weighted += seg.pitched_voices() as f64 * len;
        total += len;
    }
    vec![ratio(weighted, total)]
}

fn polyphonic_fraction(ir: &IntermediateRepresentation, _: &[&[f64]]) -> Vec<f64> {
    let segments = ir.polyphony.segments();
    let sounding: u64 = segments.iter().map(|s| s.len_ticks()).sum();
    let polyphonic: u64 = segments
        .iter()
        .filter(|s| s.channel_counts.iter().sum::<u32>() >= 2)
        .map(|s| s.len_ticks())
        .sum();
    vec![ratio(polyphonic as f64, sounding as f64)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{NoteEvent, PERCUSSION_CHANNEL};
    use crate::features::tests::{evaluate, overall_ir};

    #[test]
    fn voices_and_polyphony() {
        // Two channels together for one quarter, then channel 0 alone for one quarter
        let ir = overall_ir(vec![
            NoteEvent::new(60, 90, 0, 0, 960),
            NoteEvent::new(48, 90, 1, 0, 480),
            NoteEvent::new(36, 90, PERCUSSION_CHANNEL, 0, 480),
        ]);
        assert_eq!(evaluate(AVERAGE_NUMBER_OF_INDEPENDENT_VOICES, &ir), vec![1.5]);
        assert_eq!(evaluate(MAXIMUM_NUMBER_OF_INDEPENDENT_VOICES, &ir), vec![2.0]);
        assert_eq!(evaluate(POLYPHONIC_FRACTION, &ir), vec![0.5]);
        assert_eq!(evaluate(REST_FRACTION, &ir), vec![0.0]);
    }

    #[test]
    fn rest_fraction_of_the_worked_example() {
        let stream = crate::ir::tests::worked_example();
        let ir = crate::ir::build(&stream, &crate::windows::Window::overall(&stream));
        assert_eq!(evaluate(REST_FRACTION, &ir), vec![0.5]);
        // Three notes of the chord overlap for one of the two sounding quarters
        assert_eq!(evaluate(POLYPHONIC_FRACTION, &ir), vec![0.5]);
    }

    #[test]
    fn silence_is_zero() {
        let ir = overall_ir(Vec::new());
        assert_eq!(evaluate(AVERAGE_NUMBER_OF_INDEPENDENT_VOICES, &ir), vec![0.0]);
        assert_eq!(evaluate(MAXIMUM_NUMBER_OF_INDEPENDENT_VOICES, &ir), vec![0.0]);
        assert_eq!(evaluate(POLYPHONIC_FRACTION, &ir), vec![0.0]);
        assert_eq!(evaluate(REST_FRACTION, &ir), vec![0.0]);
    }
}
