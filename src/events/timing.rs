// Tick <-> seconds conversion over a tempo map

use super::{TempoEvent, DEFAULT_MICROSECONDS_PER_BEAT};

/// Convert a tick position to seconds using the tempo map.
pub fn tick_to_seconds(tick: u64, ticks_per_beat: u16, tempo_map: &[TempoEvent]) -> f64 {
    let tpb = ticks_per_beat.max(1) as f64;
    let mut seconds = 0.0;
    let mut last_tick = 0u64;
    let mut usec_per_beat = DEFAULT_MICROSECONDS_PER_BEAT as f64;

    for te in tempo_map {
        if te.tick >= tick {
            break;
        }
        let delta_ticks = te.tick - last_tick;
        seconds += (delta_ticks as f64 / tpb) * (usec_per_beat / 1_000_000.0);
        last_tick = te.tick;
        usec_per_beat = te.microseconds_per_beat as f64;
    }

    let delta_ticks = tick - last_tick;
    seconds += (delta_ticks as f64 / tpb) * (usec_per_beat / 1_000_000.0);
    seconds
}

/// Inverse of [`tick_to_seconds`], rounded to the nearest tick.
pub fn seconds_to_tick(seconds: f64, ticks_per_beat: u16, tempo_map: &[TempoEvent]) -> u64 {
    if seconds <= 0.0 {
        return 0;
    }

    let tpb = ticks_per_beat.max(1) as f64;
    let mut elapsed = 0.0;
    let mut last_tick = 0u64;
    let mut usec_per_beat = DEFAULT_MICROSECONDS_PER_BEAT as f64;

    for te in tempo_map {
        let segment = ((te.tick - last_tick) as f64 / tpb) * (usec_per_beat / 1_000_000.0);
        if elapsed + segment >= seconds {
            break;
        }
        elapsed += segment;
        last_tick = te.tick;
        usec_per_beat = te.microseconds_per_beat as f64;
    }

    let remaining_beats = (seconds - elapsed) / (usec_per_beat / 1_000_000.0);
    last_tick + (remaining_beats * tpb).round() as u64
}
