// Standard MIDI File loader with sustain pedal support

use std::collections::HashMap;
use std::path::Path;

use super::{EventStream, NoteEvent, ProgramChange, TempoEvent, TimeSignatureEvent};

/// Ticks per beat assumed when a file carries no usable timing header
const FALLBACK_TICKS_PER_BEAT: u16 = 480;

/// Pending note: (velocity, start_tick)
type HeldNote = (u8, u64);

/// Parse a MIDI file from disk into an [`EventStream`].
pub fn parse_midi(path: &Path) -> anyhow::Result<EventStream> {
    let data = std::fs::read(path)?;
    let stream = parse_midi_bytes(&data)?;
    log::debug!(
        "Parsed {} notes from {}",
        stream.notes().len(),
        path.display()
    );
    Ok(stream)
}

/// Parse an in-memory Standard MIDI File.
pub fn parse_midi_bytes(data: &[u8]) -> anyhow::Result<EventStream> {
    let smf = midly::Smf::parse(data)?;

    let ticks_per_beat = match smf.header.timing {
        midly::Timing::Metrical(tpb) if tpb.as_int() > 0 => tpb.as_int(),
        midly::Timing::Metrical(_) => FALLBACK_TICKS_PER_BEAT,
        midly::Timing::Timecode(fps, subframes) => {
            // Ticks per second, read as if the piece ran at 120 BPM
            let per_second = fps.as_f32() * subframes as f32;
            log::warn!("SMPTE timing ({} ticks/s) converted assuming 120 BPM", per_second);
            ((per_second / 2.0).round() as u16).max(1)
        }
    };

    let mut notes: Vec<NoteEvent> = Vec::new();
    let mut tempo_map: Vec<TempoEvent> = Vec::new();
    let mut time_signatures: Vec<TimeSignatureEvent> = Vec::new();
    let mut program_changes: Vec<ProgramChange> = Vec::new();

    for track in &smf.tracks {
        let mut current_tick: u64 = 0;
        // Active notes: (pitch, channel) -> (velocity, start_tick)
        let mut active_notes: HashMap<(u8, u8), HeldNote> = HashMap::new();
        let mut sustain_on: HashMap<u8, bool> = HashMap::new();
        // Notes held by sustain pedal: channel -> { pitch -> (velocity, start_tick) }
        let mut sustained_notes: HashMap<u8, HashMap<u8, HeldNote>> = HashMap::new();

        for event in track {
            current_tick += event.delta.as_int() as u64;

            match event.kind {
                midly::TrackEventKind::Meta(midly::MetaMessage::Tempo(t)) => {
                    tempo_map.push(TempoEvent {
                        tick: current_tick,
                        microseconds_per_beat: t.as_int(),
                    });
                }
                midly::TrackEventKind::Meta(midly::MetaMessage::TimeSignature(num, denom_pow, _, _)) => {
                    time_signatures.push(TimeSignatureEvent {
                        tick: current_tick,
                        numerator: num,
                        denominator: 1u8.checked_shl(denom_pow as u32).unwrap_or(4),
                    });
                }
                midly::TrackEventKind::Midi { channel, message } => {
                    let ch = channel.as_int();

                    match message {
                        midly::MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            let pitch = key.as_int();

                            // Re-strike finalizes a pedal-held or still active note first
                            if let Some(ch_sustained) = sustained_notes.get_mut(&ch) {
                                if let Some(held) = ch_sustained.remove(&pitch) {
                                    notes.push(finished_note(pitch, ch, held, current_tick));
                                }
                            }
                            if let Some(held) = active_notes.remove(&(pitch, ch)) {
                                notes.push(finished_note(pitch, ch, held, current_tick));
                            }
                            active_notes.insert((pitch, ch), (vel.as_int(), current_tick));
                        }
                        midly::MidiMessage::NoteOn { key, .. } | midly::MidiMessage::NoteOff { key, .. } => {
                            finalize_note_off(
                                &mut active_notes, &mut sustained_notes, &sustain_on,
                                &mut notes, key.as_int(), ch, current_tick,
                            );
                        }
                        midly::MidiMessage::Controller { controller, value } if controller.as_int() == 64 => {
                            // CC64 = Damper/Sustain pedal
                            let is_on = value.as_int() >= 32;
                            let was_on = sustain_on.get(&ch).copied().unwrap_or(false);
                            sustain_on.insert(ch, is_on);

                            if was_on && !is_on {
                                if let Some(ch_sustained) = sustained_notes.remove(&ch) {
                                    for (pitch, held) in ch_sustained {
                                        notes.push(finished_note(pitch, ch, held, current_tick));
                                    }
                                }
                            }
                        }
                        midly::MidiMessage::ProgramChange { program } => {
                            program_changes.push(ProgramChange {
                                tick: current_tick,
                                channel: ch,
                                program: program.as_int(),
                            });
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        // Anything still sounding ends with the track
        for ((pitch, ch), held) in active_notes.drain() {
            notes.push(finished_note(pitch, ch, held, current_tick));
        }
        for (ch, ch_sustained) in sustained_notes.drain() {
            for (pitch, held) in ch_sustained {
                notes.push(finished_note(pitch, ch, held, current_tick));
            }
        }
    }

    Ok(EventStream::new(notes, ticks_per_beat)
        .with_tempo_map(tempo_map)
        .with_time_signatures(time_signatures)
        .with_program_changes(program_changes))
}

fn finished_note(pitch: u8, channel: u8, (velocity, start): HeldNote, end: u64) -> NoteEvent {
    NoteEvent::new(pitch, velocity, channel, start, end.max(start))
}

/// Handle a note-off event, respecting sustain pedal state.
fn finalize_note_off(
    active_notes: &mut HashMap<(u8, u8), HeldNote>,
    sustained_notes: &mut HashMap<u8, HashMap<u8, HeldNote>>,
    sustain_on: &HashMap<u8, bool>,
    notes: &mut Vec<NoteEvent>,
    pitch: u8,
    channel: u8,
    current_tick: u64,
) {
    if let Some(held) = active_notes.remove(&(pitch, channel)) {
        if sustain_on.get(&channel).copied().unwrap_or(false) {
            sustained_notes
                .entry(channel)
                .or_default()
                .insert(pitch, held);
        } else {
            notes.push(finished_note(pitch, channel, held, current_tick));
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use midly::num::{u15, u24, u28, u4, u7};
    use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

    fn midi(delta: u32, channel: u8, message: MidiMessage) -> TrackEvent<'static> {
        TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi { channel: u4::new(channel), message },
        }
    }

    fn note_on(delta: u32, channel: u8, key: u8, vel: u8) -> TrackEvent<'static> {
        midi(delta, channel, MidiMessage::NoteOn { key: u7::new(key), vel: u7::new(vel) })
    }

    fn note_off(delta: u32, channel: u8, key: u8) -> TrackEvent<'static> {
        midi(delta, channel, MidiMessage::NoteOff { key: u7::new(key), vel: u7::new(0) })
    }

    fn end_of_track() -> TrackEvent<'static> {
        TrackEvent { delta: u28::new(0), kind: TrackEventKind::Meta(MetaMessage::EndOfTrack) }
    }

    /// Write a single-track SMF to bytes
    pub(crate) fn write_smf(events: Vec<TrackEvent<'static>>) -> Vec<u8> {
        let mut smf = Smf::new(Header::new(Format::SingleTrack, Timing::Metrical(u15::new(480))));
        let mut track = events;
        track.push(end_of_track());
        smf.tracks.push(track);
        let mut bytes = Vec::new();
        smf.write_std(&mut bytes).expect("write smf");
        bytes
    }

    #[test]
    fn parses_notes_tempo_meter_and_programs() {
        let bytes = write_smf(vec![
            TrackEvent { delta: u28::new(0), kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(600_000))) },
            TrackEvent { delta: u28::new(0), kind: TrackEventKind::Meta(MetaMessage::TimeSignature(3, 2, 24, 8)) },
            midi(0, 0, MidiMessage::ProgramChange { program: u7::new(40) }),
            note_on(0, 0, 60, 100),
            note_on(0, 0, 64, 90),
            note_off(480, 0, 60),
            note_on(0, 0, 64, 0),
            note_on(480, 9, 36, 110),
            note_off(120, 9, 36),
        ]);

        let stream = parse_midi_bytes(&bytes).expect("parse");
        assert_eq!(stream.ticks_per_beat(), 480);
        assert_eq!(stream.notes().len(), 3);
        assert_eq!(stream.notes()[0], NoteEvent::new(60, 100, 0, 0, 480));
        assert_eq!(stream.notes()[1], NoteEvent::new(64, 90, 0, 0, 480));
        assert_eq!(stream.notes()[2], NoteEvent::new(36, 110, 9, 960, 1080));
        assert_eq!(stream.tempo_at(0), 600_000);
        assert_eq!(stream.time_signature_at(0), (3, 4));
        assert_eq!(stream.program_at(0, 0), 40);
    }

    #[test]
    fn sustain_pedal_extends_notes_until_release() {
        let bytes = write_smf(vec![
            midi(0, 0, MidiMessage::Controller { controller: u7::new(64), value: u7::new(127) }),
            note_on(0, 0, 60, 100),
            note_off(240, 0, 60),
            midi(720, 0, MidiMessage::Controller { controller: u7::new(64), value: u7::new(0) }),
        ]);

        let stream = parse_midi_bytes(&bytes).expect("parse");
        assert_eq!(stream.notes(), &[NoteEvent::new(60, 100, 0, 0, 960)]);
    }

    #[test]
    fn unterminated_notes_end_with_the_track() {
        let bytes = write_smf(vec![note_on(0, 2, 67, 80), note_on(960, 2, 72, 80)]);
        let stream = parse_midi_bytes(&bytes).expect("parse");
        assert_eq!(stream.notes().len(), 2);
        assert_eq!(stream.notes()[0].end_tick, 960);
        assert_eq!(stream.notes()[1].duration_ticks(), 0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_midi_bytes(b"not a midi file").is_err());
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("piece.mid");
        std::fs::write(&path, write_smf(vec![note_on(0, 0, 60, 100), note_off(480, 0, 60)])).expect("write");
        let stream = parse_midi(&path).expect("parse");
        assert_eq!(stream.notes().len(), 1);
    }
}
