// Histogram helpers shared by the IR builder

use std::collections::BTreeMap;

use crate::events::{NoteEvent, CHANNEL_COUNT};

/// Notated durations, in quarter notes, that note lengths are snapped to:
/// thirty-second through double whole, including dotted values.
pub const RHYTHMIC_VALUES: [f64; 12] = [0.125, 0.25, 0.375, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0, 4.0, 6.0, 8.0];

/// Scale a histogram in place so its bins sum to 1. All-zero input is left untouched.
pub fn l1_normalize(arr: &mut [f64]) {
    let sum: f64 = arr.iter().sum();
    if sum > 0.0 {
        for v in arr.iter_mut() {
            *v /= sum;
        }
    }
}

/// Count occurrences of each bin index and normalize. Out-of-range indices are clamped.
pub fn normalized_counts(bins: impl IntoIterator<Item = usize>, len: usize) -> Vec<f64> {
    let mut histogram = vec![0.0; len];
    if len == 0 {
        return histogram;
    }
    for bin in bins {
        histogram[bin.min(len - 1)] += 1.0;
    }
    l1_normalize(&mut histogram);
    histogram
}

/// Index of the rhythmic value closest to `quarter_notes`
pub fn rhythmic_value_bin(quarter_notes: f64) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, value) in RHYTHMIC_VALUES.iter().enumerate() {
        let distance = (quarter_notes - value).abs();
        if distance < best_distance {
            best = i;
            best_distance = distance;
        }
    }
    best
}

/// Signed melodic intervals per channel, taken over each channel's skyline:
/// at every onset tick only the highest pitch on that channel is kept.
///
/// `onsets` must be sorted by start tick.
pub fn melodic_intervals_by_channel(onsets: &[&NoteEvent]) -> Vec<Vec<i32>> {
    let mut skylines: Vec<BTreeMap<u64, u8>> = vec![BTreeMap::new(); CHANNEL_COUNT];
    for note in onsets.iter().filter(|n| n.is_pitched()) {
        let entry = skylines[note.channel as usize]
            .entry(note.start_tick)
            .or_insert(note.pitch);
        if note.pitch > *entry {
            *entry = note.pitch;
        }
    }

    skylines
        .into_iter()
        .map(|line| {
            let pitches: Vec<i32> = line.into_values().map(i32::from).collect();
            pitches.windows(2).map(|w| w[1] - w[0]).collect()
        })
        .collect()
}

/// Absolute pitch differences between every pair of pitched notes sharing an onset tick.
///
/// `onsets` must be sorted by start tick.
pub fn vertical_intervals(onsets: &[&NoteEvent]) -> Vec<u8> {
    let pitched: Vec<&NoteEvent> = onsets.iter().copied().filter(|n| n.is_pitched()).collect();
    let mut intervals = Vec::new();

    for group in pitched.chunk_by(|a, b| a.start_tick == b.start_tick) {
        for (i, a) in group.iter().enumerate() {
            for b in &group[i + 1..] {
                intervals.push(a.pitch.abs_diff(b.pitch));
            }
        }
    }
    intervals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_sums_to_one_and_keeps_zero() {
        let mut h = vec![1.0, 3.0, 0.0];
        l1_normalize(&mut h);
        assert_eq!(h, vec![0.25, 0.75, 0.0]);

        let mut empty = vec![0.0; 4];
        l1_normalize(&mut empty);
        assert_eq!(empty, vec![0.0; 4]);
    }

    #[test]
    fn rhythmic_values_snap_to_nearest() {
        assert_eq!(rhythmic_value_bin(0.0), 0);
        assert_eq!(rhythmic_value_bin(1.05), 5);
        assert_eq!(rhythmic_value_bin(1.4), 6);
        assert_eq!(rhythmic_value_bin(100.0), 11);
    }

    #[test]
    fn skyline_keeps_highest_note_per_onset() {
        let notes = vec![
            NoteEvent::new(60, 80, 0, 0, 480),
            NoteEvent::new(67, 80, 0, 0, 480),
            NoteEvent::new(65, 80, 0, 480, 960),
            NoteEvent::new(48, 80, 1, 0, 960),
            NoteEvent::new(36, 80, 9, 0, 10),
            NoteEvent::new(38, 80, 9, 480, 490),
        ];
        let refs: Vec<&NoteEvent> = notes.iter().collect();
        let intervals = melodic_intervals_by_channel(&refs);
        assert_eq!(intervals[0], vec![-2]);
        assert!(intervals[1].is_empty());
        assert!(intervals[9].is_empty());
    }

    #[test]
    fn vertical_pairs_share_onsets() {
        let notes = vec![
            NoteEvent::new(60, 80, 0, 0, 480),
            NoteEvent::new(64, 80, 1, 0, 480),
            NoteEvent::new(67, 80, 0, 0, 480),
            NoteEvent::new(72, 80, 0, 480, 960),
        ];
        let refs: Vec<&NoteEvent> = notes.iter().collect();
        let mut intervals = vertical_intervals(&refs);
        intervals.sort_unstable();
        assert_eq!(intervals, vec![3, 4, 7]);
    }
}
