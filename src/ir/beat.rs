// Beat histogram: autocorrelation of the onset impulse train per BPM bin

use super::histograms::l1_normalize;

/// Bins 0..=200, bin `b` holding the periodicity strength at `b` BPM
pub const BEAT_HISTOGRAM_BINS: usize = 201;

/// Pulses slower than this are kept in the histogram but ignored by pulse features
pub const TEMPO_FLOOR_BPM: usize = 40;

/// Slowest binned pulse; lags longer than one beat at this tempo carry no energy
const SLOWEST_BPM: f64 = 1.0;

/// Onsets closer than this are one impulse
const COINCIDENT_SECONDS: f64 = 1e-9;

/// Onset at `seconds` from the window start, weighted by loudness
#[derive(Debug, Clone, Copy)]
pub struct Onset {
    pub seconds: f64,
    pub weight: f64,
}

/// Build the normalized beat histogram for onsets spread over `duration_seconds`.
///
/// Every pair of impulses contributes the product of their weights at the lag between them.
/// Lags are exact in seconds, so the energy lands at a fractional BPM and is split linearly
/// between the two neighbouring bins. Returns all zeros when there is no periodic energy
/// (fewer than two distinct onset times).
pub fn beat_histogram(onsets: &[Onset], duration_seconds: f64) -> Vec<f64> {
    let mut histogram = vec![0.0; BEAT_HISTOGRAM_BINS];
    if onsets.len() < 2 || duration_seconds <= 0.0 {
        return histogram;
    }

    let impulses = impulse_train(onsets);
    let fastest = (BEAT_HISTOGRAM_BINS - 1) as f64;
    for (i, &(start, weight)) in impulses.iter().enumerate() {
        for &(later, later_weight) in &impulses[i + 1..] {
            let bpm = 60.0 / (later - start);
            if bpm < SLOWEST_BPM {
                break;
            }
            if bpm > fastest {
                continue;
            }
            let energy = weight * later_weight;
            let lower = bpm.floor();
            let fraction = bpm - lower;
            let bin = lower as usize;
            histogram[bin] += energy * (1.0 - fraction);
            if fraction > 0.0 {
                histogram[bin + 1] += energy * fraction;
            }
        }
    }

    l1_normalize(&mut histogram);
    histogram
}

/// Onsets sorted by time, with coincident onsets merged and their weights summed
fn impulse_train(onsets: &[Onset]) -> Vec<(f64, f64)> {
    let mut sorted: Vec<Onset> = onsets.to_vec();
    sorted.sort_by(|a, b| a.seconds.total_cmp(&b.seconds));

    let mut impulses: Vec<(f64, f64)> = Vec::with_capacity(sorted.len());
    for onset in sorted {
        let seconds = onset.seconds.max(0.0);
        match impulses.last_mut() {
            Some(last) if seconds - last.0 < COINCIDENT_SECONDS => last.1 += onset.weight,
            _ => impulses.push((seconds, onset.weight)),
        }
    }
    impulses
}
