// Run-length polyphony map: which notes sound on which channel, tick by tick

use serde::Serialize;

use crate::events::{CHANNEL_COUNT, PERCUSSION_CHANNEL};

/// A maximal tick range over which the set of sounding notes does not change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolyphonySegment {
    pub start_tick: u64,
    pub end_tick: u64,
    /// Sounding notes per channel
    pub channel_counts: [u32; CHANNEL_COUNT],
    /// Bitmask of pitch classes sounding on pitched channels
    pub pitch_classes: u16,
}

impl PolyphonySegment {
    pub fn len_ticks(&self) -> u64 {
        self.end_tick - self.start_tick
    }

    /// Number of notes sounding on pitched channels
    pub fn pitched_notes(&self) -> u32 {
        pitched_channels().map(|ch| self.channel_counts[ch]).sum()
    }

    /// Number of pitched channels with at least one note sounding
    pub fn pitched_voices(&self) -> usize {
        pitched_channels().filter(|&ch| self.channel_counts[ch] > 0).count()
    }

    pub fn pitch_class_count(&self) -> u32 {
        self.pitch_classes.count_ones()
    }
}

fn pitched_channels() -> impl Iterator<Item = usize> {
    (0..CHANNEL_COUNT).filter(|&ch| ch != PERCUSSION_CHANNEL as usize)
}

/// A sounding note clipped to the window
#[derive(Debug, Clone, Copy)]
pub struct Span {
    pub start_tick: u64,
    pub end_tick: u64,
    pub channel: u8,
    pub pitch: u8,
}

/// Polyphony over one window. Silent stretches have no segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PolyphonyMap {
    segments: Vec<PolyphonySegment>,
}

impl PolyphonyMap {
    /// Sweep note boundaries in tick order, emitting one segment per stable state.
    pub fn build(spans: &[Span]) -> Self {
        // (tick, +1 / -1, channel, pitch)
        let mut boundaries: Vec<(u64, i32, u8, u8)> = Vec::with_capacity(spans.len() * 2);
        for span in spans.iter().filter(|s| s.end_tick > s.start_tick) {
            boundaries.push((span.start_tick, 1, span.channel, span.pitch));
            boundaries.push((span.end_tick, -1, span.channel, span.pitch));
        }
        boundaries.sort_unstable();

        let mut channel_counts = [0u32; CHANNEL_COUNT];
        let mut pitch_class_counts = [0u32; 12];
        let mut segments = Vec::new();

        let mut i = 0;
        while i < boundaries.len() {
            let tick = boundaries[i].0;
            while i < boundaries.len() && boundaries[i].0 == tick {
                let (_, delta, channel, pitch) = boundaries[i];
                let ch = channel as usize;
                channel_counts[ch] = channel_counts[ch].saturating_add_signed(delta);
                if channel != PERCUSSION_CHANNEL {
                    let pc = (pitch % 12) as usize;
                    pitch_class_counts[pc] = pitch_class_counts[pc].saturating_add_signed(delta);
                }
                i += 1;
            }

            let Some(&(next_tick, ..)) = boundaries.get(i) else {
                break;
            };
            if channel_counts.iter().any(|&c| c > 0) {
                let pitch_classes = pitch_class_counts
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| **c > 0)
                    .fold(0u16, |mask, (pc, _)| mask | (1 << pc));
                segments.push(PolyphonySegment {
                    start_tick: tick,
                    end_tick: next_tick,
                    channel_counts,
                    pitch_classes,
                });
            }
        }

        Self { segments }
    }

    pub fn segments(&self) -> &[PolyphonySegment] {
        &self.segments
    }

    /// Notes sounding on `channel` at `tick`
    pub fn count_at(&self, tick: u64, channel: u8) -> u32 {
        let idx = self.segments.partition_point(|s| s.end_tick <= tick);
        match self.segments.get(idx) {
            Some(seg) if seg.start_tick <= tick => seg.channel_counts[channel as usize % CHANNEL_COUNT],
            _ => 0,
        }
    }

    /// Maximal ranges during which at least one pitched note sounds
    pub fn pitched_activity(&self) -> Vec<(u64, u64)> {
        let mut ranges: Vec<(u64, u64)> = Vec::new();
        for seg in self.segments.iter().filter(|s| s.pitched_notes() > 0) {
            match ranges.last_mut() {
                Some(last) if last.1 == seg.start_tick => last.1 = seg.end_tick,
                _ => ranges.push((seg.start_tick, seg.end_tick)),
            }
        }
        ranges
    }

    /// Maximal ranges inside `[start_tick, end_tick)` with no pitched note sounding.
    /// Silence before the first note and after the last one counts.
    pub fn rests(&self, start_tick: u64, end_tick: u64) -> Vec<(u64, u64)> {
        let mut rests = Vec::new();
        let mut cursor = start_tick;
        for (start, end) in self.pitched_activity() {
            if start > cursor {
                rests.push((cursor, start.min(end_tick)));
            }
            cursor = cursor.max(end);
        }
        if end_tick > cursor {
            rests.push((cursor, end_tick));
        }
        rests.retain(|(start, end)| end > start);
        rests
    }
}
