// Velocities

use super::stats::{mean, std_dev};
use super::{ExtractorDescriptor, FeatureExtractor, FnExtractor};

pub const DYNAMIC_RANGE: &str = "Dynamic Range";
pub const AVERAGE_LOUDNESS: &str = "Average Loudness";
pub const VARIATION_OF_DYNAMICS: &str = "Variation of Dynamics";

pub(super) fn dynamics_extractors() -> Vec<Box<dyn FeatureExtractor>> {
    vec![
        FnExtractor::boxed(
            ExtractorDescriptor::new(DYNAMIC_RANGE, "D-1", 1)
                .describe("Loudest minus softest onset velocity"),
            |ir, _| {
                let loudest = ir.loudness.iter().copied().reduce(f64::max);
                let softest = ir.loudness.iter().copied().reduce(f64::min);
                match (loudest, softest) {
                    (Some(hi), Some(lo)) => vec![hi - lo],
                    _ => vec![0.0],
                }
            },
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(AVERAGE_LOUDNESS, "D-2", 1).describe("Mean onset velocity"),
            |ir, _| vec![mean(&ir.loudness)],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(VARIATION_OF_DYNAMICS, "D-3", 1)
                .describe("Standard deviation of onset velocities"),
            |ir, _| vec![std_dev(&ir.loudness)],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoteEvent;
    use crate::features::tests::{evaluate, overall_ir};

    #[test]
    fn velocity_statistics() {
        let ir = overall_ir(vec![
            NoteEvent::new(60, 40, 0, 0, 480),
            NoteEvent::new(62, 80, 0, 480, 960),
            NoteEvent::new(64, 120, 0, 960, 1440),
        ]);
        assert_eq!(evaluate(DYNAMIC_RANGE, &ir), vec![80.0]);
        assert_eq!(evaluate(AVERAGE_LOUDNESS, &ir), vec![80.0]);
        let expected = (3200.0f64 / 3.0).sqrt();
        assert!((evaluate(VARIATION_OF_DYNAMICS, &ir)[0] - expected).abs() < 1e-9);
    }

    #[test]
    fn silent_window() {
        let ir = overall_ir(Vec::new());
        assert_eq!(evaluate(DYNAMIC_RANGE, &ir), vec![0.0]);
        assert_eq!(evaluate(AVERAGE_LOUDNESS, &ir), vec![0.0]);
    }
}
