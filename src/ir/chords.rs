// Chord archetype classification of simultaneous pitch-class sets

use serde::Serialize;

pub const CHORD_TYPE_COUNT: usize = 11;

/// Chord archetypes, in histogram bin order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordType {
    /// Two distinct pitch classes
    PartialChord,
    MinorTriad,
    MajorTriad,
    AugmentedTriad,
    DiminishedTriad,
    OtherTriad,
    MinorSeventh,
    DominantSeventh,
    MajorSeventh,
    OtherFourNote,
    /// Five or more distinct pitch classes
    Complex,
}

impl ChordType {
    pub const ALL: [ChordType; CHORD_TYPE_COUNT] = [
        ChordType::PartialChord,
        ChordType::MinorTriad,
        ChordType::MajorTriad,
        ChordType::AugmentedTriad,
        ChordType::DiminishedTriad,
        ChordType::OtherTriad,
        ChordType::MinorSeventh,
        ChordType::DominantSeventh,
        ChordType::MajorSeventh,
        ChordType::OtherFourNote,
        ChordType::Complex,
    ];

    /// Histogram bin of this archetype
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Interval content above the root for every archetype matched by shape
const ARCHETYPES: [(ChordType, &[u8]); 7] = [
    (ChordType::MinorTriad, &[0, 3, 7]),
    (ChordType::MajorTriad, &[0, 4, 7]),
    (ChordType::AugmentedTriad, &[0, 4, 8]),
    (ChordType::DiminishedTriad, &[0, 3, 6]),
    (ChordType::MinorSeventh, &[0, 3, 7, 10]),
    (ChordType::DominantSeventh, &[0, 4, 7, 10]),
    (ChordType::MajorSeventh, &[0, 4, 7, 11]),
];

/// Pitch-class bitmask (bit `pc` set for every pitch class present), octave duplicates collapse.
pub fn pitch_class_set(pitches: impl IntoIterator<Item = u8>) -> u16 {
    pitches.into_iter().fold(0u16, |mask, p| mask | (1 << (p % 12)))
}

/// Classify a pitch-class set. Sets with fewer than two classes are not chords.
pub fn classify(pitch_classes: u16) -> Option<ChordType> {
    let size = pitch_classes.count_ones() as usize;
    match size {
        0 | 1 => None,
        2 => Some(ChordType::PartialChord),
        3 | 4 => {
            for (chord_type, shape) in ARCHETYPES.iter().filter(|(_, s)| s.len() == size) {
                for root in (0..12u8).filter(|r| pitch_classes & (1 << r) != 0) {
                    let mask = shape
                        .iter()
                        .fold(0u16, |m, i| m | (1 << ((root + i) % 12)));
                    if mask == pitch_classes {
                        return Some(*chord_type);
                    }
                }
            }
            Some(if size == 3 { ChordType::OtherTriad } else { ChordType::OtherFourNote })
        }
        _ => Some(ChordType::Complex),
    }
}
