// Event store: parsed notes, tempo map, meter and patch changes for one piece

pub mod midi_parser;
pub mod timing;

pub use midi_parser::{parse_midi, parse_midi_bytes};

use serde::{Deserialize, Serialize};

/// General MIDI percussion channel (0-based). Notes on it are unpitched.
pub const PERCUSSION_CHANNEL: u8 = 9;

/// Number of MIDI channels
pub const CHANNEL_COUNT: usize = 16;

/// Default tempo when a piece carries no tempo events (120 BPM)
pub const DEFAULT_MICROSECONDS_PER_BEAT: u32 = 500_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub pitch: u8,
    pub velocity: u8,
    pub channel: u8,
    pub start_tick: u64,
    pub end_tick: u64,
}

impl NoteEvent {
    pub fn new(pitch: u8, velocity: u8, channel: u8, start_tick: u64, end_tick: u64) -> Self {
        Self {
            pitch: pitch.min(127),
            velocity: velocity.min(127),
            channel: channel.min(15),
            start_tick,
            end_tick: end_tick.max(start_tick),
        }
    }

    pub fn duration_ticks(&self) -> u64 {
        self.end_tick - self.start_tick
    }

    /// Whether the note is on a melodic channel (anything but percussion)
    pub fn is_pitched(&self) -> bool {
        self.channel != PERCUSSION_CHANNEL
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoEvent {
    pub tick: u64,
    pub microseconds_per_beat: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignatureEvent {
    pub tick: u64,
    pub numerator: u8,
    pub denominator: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramChange {
    pub tick: u64,
    pub channel: u8,
    pub program: u8,
}

/// Immutable event stream for one piece.
///
/// Notes are kept sorted by `(start_tick, channel, pitch)` and the tempo map always
/// holds at least one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStream {
    notes: Vec<NoteEvent>,
    tempo_map: Vec<TempoEvent>,
    time_signatures: Vec<TimeSignatureEvent>,
    program_changes: Vec<ProgramChange>,
    ticks_per_beat: u16,
}

impl EventStream {
    /// Notes are re-clamped to MIDI ranges, since `NoteEvent` fields are public
    pub fn new(notes: Vec<NoteEvent>, ticks_per_beat: u16) -> Self {
        let mut notes: Vec<NoteEvent> = notes
            .into_iter()
            .map(|n| NoteEvent::new(n.pitch, n.velocity, n.channel, n.start_tick, n.end_tick))
            .collect();
        notes.sort_by_key(|n| (n.start_tick, n.channel, n.pitch, n.end_tick));
        Self {
            notes,
            tempo_map: vec![TempoEvent {
                tick: 0,
                microseconds_per_beat: DEFAULT_MICROSECONDS_PER_BEAT,
            }],
            time_signatures: Vec::new(),
            program_changes: Vec::new(),
            ticks_per_beat: ticks_per_beat.max(1),
        }
    }

    pub fn with_tempo_map(mut self, mut tempo_map: Vec<TempoEvent>) -> Self {
        // Last valid change at a tick wins
        tempo_map.retain(|t| t.microseconds_per_beat > 0);
        tempo_map.reverse();
        tempo_map.sort_by_key(|t| t.tick);
        tempo_map.dedup_by_key(|t| t.tick);
        if tempo_map.first().map_or(true, |t| t.tick > 0) {
            tempo_map.insert(
                0,
                TempoEvent {
                    tick: 0,
                    microseconds_per_beat: DEFAULT_MICROSECONDS_PER_BEAT,
                },
            );
        }
        self.tempo_map = tempo_map;
        self
    }

    pub fn with_time_signatures(mut self, mut time_signatures: Vec<TimeSignatureEvent>) -> Self {
        time_signatures.sort_by_key(|t| t.tick);
        time_signatures.retain(|t| t.numerator > 0 && t.denominator > 0);
        self.time_signatures = time_signatures;
        self
    }

    pub fn with_program_changes(mut self, mut program_changes: Vec<ProgramChange>) -> Self {
        program_changes.sort_by_key(|p| (p.tick, p.channel));
        self.program_changes = program_changes;
        self
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    pub fn tempo_map(&self) -> &[TempoEvent] {
        &self.tempo_map
    }

    pub fn time_signatures(&self) -> &[TimeSignatureEvent] {
        &self.time_signatures
    }

    pub fn program_changes(&self) -> &[ProgramChange] {
        &self.program_changes
    }

    pub fn ticks_per_beat(&self) -> u16 {
        self.ticks_per_beat
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// First tick after the last sounding note. Zero-length notes still occupy their onset tick.
    pub fn end_tick(&self) -> u64 {
        self.notes
            .iter()
            .map(|n| n.end_tick.max(n.start_tick + 1))
            .max()
            .unwrap_or(0)
    }

    pub fn tick_to_seconds(&self, tick: u64) -> f64 {
        timing::tick_to_seconds(tick, self.ticks_per_beat, &self.tempo_map)
    }

    pub fn seconds_to_tick(&self, seconds: f64) -> u64 {
        timing::seconds_to_tick(seconds, self.ticks_per_beat, &self.tempo_map)
    }

    /// Convert a tick span to quarter notes
    pub fn quarter_notes(&self, ticks: u64) -> f64 {
        ticks as f64 / self.ticks_per_beat as f64
    }

    /// Tempo in effect at `tick`, in microseconds per quarter note
    pub fn tempo_at(&self, tick: u64) -> u32 {
        self.tempo_map
            .iter()
            .take_while(|t| t.tick <= tick)
            .last()
            .map_or(DEFAULT_MICROSECONDS_PER_BEAT, |t| t.microseconds_per_beat)
    }

    /// Time signature in effect at `tick`; 4/4 when none has been set
    pub fn time_signature_at(&self, tick: u64) -> (u8, u8) {
        self.time_signatures
            .iter()
            .take_while(|t| t.tick <= tick)
            .last()
            .map_or((4, 4), |t| (t.numerator, t.denominator))
    }

    /// General MIDI program selected on `channel` at `tick` (program 0 by default)
    pub fn program_at(&self, channel: u8, tick: u64) -> u8 {
        self.program_changes
            .iter()
            .take_while(|p| p.tick <= tick)
            .filter(|p| p.channel == channel)
            .last()
            .map_or(0, |p| p.program)
    }
}
