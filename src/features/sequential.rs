// Features that read neighbouring windows through dependency offsets

use super::pitch::PITCH_CLASS_HISTOGRAM;
use super::rhythm::NOTE_DENSITY;
use super::{ExtractorDescriptor, FeatureExtractor, FnExtractor};

pub const CHANGE_IN_NOTE_DENSITY: &str = "Change in Note Density";
pub const PITCH_CLASS_DRIFT: &str = "Pitch Class Drift";
pub const NOTE_DENSITY_TREND: &str = "Note Density Trend";
pub const NOTE_DENSITY_ACCELERATION: &str = "Note Density Acceleration";

pub(super) fn sequential_extractors() -> Vec<Box<dyn FeatureExtractor>> {
    vec![
        FnExtractor::boxed(
            ExtractorDescriptor::new(CHANGE_IN_NOTE_DENSITY, "S-1", 1)
                .describe("Note density minus the previous window's")
                .depends_on(NOTE_DENSITY, 0)
                .depends_on(NOTE_DENSITY, -1),
            |_, deps| vec![deps[0][0] - deps[1][0]],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(PITCH_CLASS_DRIFT, "S-2", 1)
                .describe("Half the L1 distance to the previous window's pitch class histogram")
                .depends_on(PITCH_CLASS_HISTOGRAM, 0)
                .depends_on(PITCH_CLASS_HISTOGRAM, -1),
            |_, deps| {
                let distance: f64 = deps[0].iter().zip(deps[1]).map(|(a, b)| (a - b).abs()).sum();
                vec![distance / 2.0]
            },
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(NOTE_DENSITY_TREND, "S-3", 1)
                .describe("Central difference of note density across the neighbouring windows")
                .depends_on(NOTE_DENSITY, -1)
                .depends_on(NOTE_DENSITY, 1),
            |_, deps| vec![(deps[1][0] - deps[0][0]) / 2.0],
        ),
        FnExtractor::boxed(
            ExtractorDescriptor::new(NOTE_DENSITY_ACCELERATION, "S-4", 1)
                .describe("Change in note density minus the previous window's change")
                .depends_on(CHANGE_IN_NOTE_DENSITY, 0)
                .depends_on(CHANGE_IN_NOTE_DENSITY, -1),
            |_, deps| vec![deps[0][0] - deps[1][0]],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::tests::worked_example;
    use crate::windows::Window;

    fn compute(name: &str, deps: &[&[f64]]) -> Vec<f64> {
        let stream = worked_example();
        let ir = crate::ir::build(&stream, &Window::overall(&stream));
        let extractors = sequential_extractors();
        let extractor = extractors
            .iter()
            .find(|e| e.descriptor().name == name)
            .unwrap();
        extractor.compute(&ir, deps)
    }

    #[test]
    fn differences_between_windows() {
        assert_eq!(compute(CHANGE_IN_NOTE_DENSITY, &[&[3.0], &[1.0]]), vec![2.0]);
        assert_eq!(compute(NOTE_DENSITY_TREND, &[&[1.0], &[4.0]]), vec![1.5]);
        assert_eq!(compute(NOTE_DENSITY_ACCELERATION, &[&[2.0], &[0.5]]), vec![1.5]);
    }

    #[test]
    fn drift_between_disjoint_histograms_is_one() {
        let mut c = [0.0; 12];
        c[0] = 1.0;
        let mut g = [0.0; 12];
        g[7] = 1.0;
        assert_eq!(compute(PITCH_CLASS_DRIFT, &[&c, &g]), vec![1.0]);
        assert_eq!(compute(PITCH_CLASS_DRIFT, &[&c, &c]), vec![0.0]);
    }

    #[test]
    fn every_sequential_feature_reads_another_window() {
        for extractor in sequential_extractors() {
            assert!(extractor.descriptor().has_offsets());
            assert!(extractor.descriptor().is_sequential);
        }
    }
}
