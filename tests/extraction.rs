// End-to-end extraction through the public API

use midly::num::{u15, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

use symfeat_lib::events::NoteEvent;
use symfeat_lib::features::{
    BASIC_PITCH_HISTOGRAM, BEAT_HISTOGRAM, CHANGE_IN_NOTE_DENSITY, CHORD_TYPE_HISTOGRAM, MELODIC_INTERVAL_HISTOGRAM,
    NOTE_DENSITY, NOTE_DENSITY_TREND, NUMBER_OF_RESTS, PITCH_CLASS_HISTOGRAM, RELATIVE_PREVALENCE_OF_TOP_PITCH_CLASSES,
    RHYTHMIC_VALUE_HISTOGRAM, STANDARD_TRIADS, AVERAGE_REST_DURATION, VERTICAL_DISSONANCE_RATIO,
    VERTICAL_INTERVAL_HISTOGRAM,
};
use symfeat_lib::{
    extract_features, Config, EventStream, FeatureValue, Pipeline, WindowConfig, WindowIndex, WindowSpec,
};

const TPB: u64 = 480;

/// C major triad for a quarter, two quarters of rest, then a single C
fn worked_example() -> EventStream {
    EventStream::new(
        vec![
            NoteEvent::new(60, 100, 0, 0, TPB),
            NoteEvent::new(64, 100, 0, 0, TPB),
            NoteEvent::new(67, 100, 0, 0, TPB),
            NoteEvent::new(60, 100, 0, 3 * TPB, 4 * TPB),
        ],
        TPB as u16,
    )
}

/// Two bars of a walking line over sustained chords, with drums
fn busier_piece() -> EventStream {
    let mut notes = Vec::new();
    let line = [48u8, 52, 55, 57, 59, 57, 55, 52];
    for (i, &pitch) in line.iter().enumerate() {
        let start = i as u64 * TPB;
        notes.push(NoteEvent::new(pitch, 70 + (i as u8) * 5, 1, start, start + TPB));
        notes.push(NoteEvent::new(if i % 2 == 0 { 36 } else { 38 }, 110, 9, start, start + 60));
    }
    for (bar, root) in [(0u64, 60u8), (1, 65)] {
        for offset in [0u8, 4, 7] {
            notes.push(NoteEvent::new(root + offset, 80, 0, bar * 4 * TPB, (bar + 1) * 4 * TPB));
        }
    }
    EventStream::new(notes, TPB as u16)
}

fn config(windows: WindowConfig, workers: usize) -> Config {
    Config { features: Vec::new(), windows, workers }
}

fn values<'a>(value: Option<&'a FeatureValue>) -> &'a [f64] {
    value.and_then(|v| v.values()).expect("available value")
}

#[test]
fn worked_example_overall_features() {
    let table = extract_features(&worked_example(), &config(WindowConfig::overall_only(), 1)).unwrap();

    let pitches = values(table.overall(BASIC_PITCH_HISTOGRAM));
    let nonzero: Vec<usize> = pitches.iter().enumerate().filter(|(_, v)| **v > 0.0).map(|(i, _)| i).collect();
    assert_eq!(nonzero, vec![60, 64, 67]);

    assert_eq!(values(table.overall(STANDARD_TRIADS)), &[1.0]);
    assert_eq!(values(table.overall(NUMBER_OF_RESTS)), &[1.0]);
    assert_eq!(values(table.overall(AVERAGE_REST_DURATION)), &[2.0]);
}

#[test]
fn rest_across_a_window_boundary_is_seen_by_both_windows() {
    let cfg = Config {
        features: vec![NUMBER_OF_RESTS.to_string(), AVERAGE_REST_DURATION.to_string()],
        ..config(WindowConfig::sequential(WindowSpec::Ticks { size: 2 * TPB }), 2)
    };
    let table = extract_features(&worked_example(), &cfg).unwrap();

    assert_eq!(table.window_count(), 2);
    for w in 0..2 {
        assert_eq!(values(table.get(NUMBER_OF_RESTS, WindowIndex::Sequential(w))), &[1.0]);
        assert_eq!(values(table.get(AVERAGE_REST_DURATION, WindowIndex::Sequential(w))), &[1.0]);
    }
    assert_eq!(values(table.overall(AVERAGE_REST_DURATION)), &[2.0]);
}

#[test]
fn empty_piece_yields_zeros_not_errors() {
    let empty = EventStream::new(Vec::new(), 480);
    let table = extract_features(&empty, &config(WindowConfig::sequential(WindowSpec::default()), 2)).unwrap();

    assert_eq!(table.window_count(), 0);
    for name in [BASIC_PITCH_HISTOGRAM, PITCH_CLASS_HISTOGRAM, CHORD_TYPE_HISTOGRAM, BEAT_HISTOGRAM] {
        assert!(values(table.overall(name)).iter().all(|&v| v == 0.0), "{}", name);
    }
    assert_eq!(values(table.overall(RELATIVE_PREVALENCE_OF_TOP_PITCH_CLASSES)), &[0.0]);
    assert_eq!(values(table.overall(VERTICAL_DISSONANCE_RATIO)), &[0.0]);
    for column in table.features() {
        if let Some(v) = column.overall.values() {
            assert!(v.iter().all(|x| x.is_finite()), "{}", column.name);
        }
    }
}

#[test]
fn every_value_has_its_declared_dimensionality() {
    let windows = WindowConfig::sequential(WindowSpec::Ticks { size: 2 * TPB });
    let table = extract_features(&busier_piece(), &config(windows, 4)).unwrap();
    assert_eq!(table.window_count(), 4);

    for column in table.features() {
        let mut all = vec![&column.overall];
        all.extend(column.sequential.iter().flatten());
        for value in all {
            if let Some(v) = value.values() {
                assert_eq!(v.len(), column.dimensionality, "{}", column.name);
                assert!(v.iter().all(|x| x.is_finite()), "{}", column.name);
            }
        }
    }
}

#[test]
fn normalized_histograms_sum_to_one() {
    let windows = WindowConfig::sequential(WindowSpec::Ticks { size: 4 * TPB });
    let table = extract_features(&busier_piece(), &config(windows, 2)).unwrap();

    for name in [
        BASIC_PITCH_HISTOGRAM,
        PITCH_CLASS_HISTOGRAM,
        MELODIC_INTERVAL_HISTOGRAM,
        VERTICAL_INTERVAL_HISTOGRAM,
        CHORD_TYPE_HISTOGRAM,
        BEAT_HISTOGRAM,
        RHYTHMIC_VALUE_HISTOGRAM,
    ] {
        let total: f64 = values(table.overall(name)).iter().sum();
        assert!((total - 1.0).abs() < 1e-9, "{} sums to {}", name, total);
        for w in 0..table.window_count() {
            let total: f64 = values(table.get(name, WindowIndex::Sequential(w))).iter().sum();
            assert!((total - 1.0).abs() < 1e-9, "{} in window {} sums to {}", name, w, total);
        }
    }
}

#[test]
fn output_is_identical_across_runs_and_worker_counts() {
    let windows = WindowConfig::sequential(WindowSpec::Seconds { size: 1.0, overlap: 0.5 });
    let reference = serde_json::to_string(&extract_features(&busier_piece(), &config(windows.clone(), 1)).unwrap()).unwrap();
    for workers in [1, 2, 5] {
        let table = extract_features(&busier_piece(), &config(windows.clone(), workers)).unwrap();
        assert_eq!(serde_json::to_string(&table).unwrap(), reference);
    }
}

#[test]
fn offsets_at_the_edges_are_unavailable() {
    let config = Config {
        features: vec![CHANGE_IN_NOTE_DENSITY.to_string(), NOTE_DENSITY_TREND.to_string()],
        windows: WindowConfig::sequential(WindowSpec::Ticks { size: 2 * TPB }),
        workers: 2,
    };
    let table = extract_features(&busier_piece(), &config).unwrap();
    let last = table.window_count() - 1;

    assert_eq!(table.feature_names(), vec![CHANGE_IN_NOTE_DENSITY, NOTE_DENSITY_TREND]);
    assert_eq!(table.get(CHANGE_IN_NOTE_DENSITY, WindowIndex::Sequential(0)), Some(&FeatureValue::Unavailable));
    assert!(table.get(CHANGE_IN_NOTE_DENSITY, WindowIndex::Sequential(1)).unwrap().is_available());
    assert_eq!(table.get(NOTE_DENSITY_TREND, WindowIndex::Sequential(last)), Some(&FeatureValue::Unavailable));
    assert!(table.get(NOTE_DENSITY_TREND, WindowIndex::Sequential(1)).unwrap().is_available());
    assert!(table.column(NOTE_DENSITY).is_none());

    let matrix = table.sequential_matrix(CHANGE_IN_NOTE_DENSITY).unwrap();
    assert_eq!(matrix.dim(), (table.window_count(), 1));
    assert!(matrix[[0, 0]].is_nan());
    assert_eq!(table.overall_vector(), vec![-1.0, -1.0]);
}

fn track_event(delta: u32, kind: TrackEventKind<'static>) -> TrackEvent<'static> {
    TrackEvent { delta: u28::new(delta), kind }
}

fn note(delta: u32, key: u8, vel: u8) -> TrackEvent<'static> {
    track_event(
        delta,
        TrackEventKind::Midi { channel: u4::new(0), message: MidiMessage::NoteOn { key: u7::new(key), vel: u7::new(vel) } },
    )
}

#[test]
fn midi_file_on_disk_matches_in_memory_stream() {
    let mut smf = Smf::new(Header::new(Format::SingleTrack, Timing::Metrical(u15::new(480))));
    smf.tracks.push(vec![
        note(0, 60, 100),
        note(0, 64, 100),
        note(0, 67, 100),
        note(480, 60, 0),
        note(0, 64, 0),
        note(0, 67, 0),
        note(960, 60, 100),
        note(480, 60, 0),
        track_event(0, TrackEventKind::Meta(MetaMessage::EndOfTrack)),
    ]);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("worked.mid");
    smf.save(&path).unwrap();

    let cfg = config(WindowConfig::overall_only(), 1);
    let pipeline = Pipeline::new(&cfg).unwrap();
    let from_file = pipeline.extract_file(&path).unwrap();
    let in_memory = pipeline.extract(&worked_example()).unwrap();
    assert_eq!(from_file, in_memory);
}

#[test]
fn unknown_requested_feature_fails_before_extraction() {
    let cfg = Config { features: vec!["Not A Feature".into()], ..config(WindowConfig::overall_only(), 1) };
    assert!(matches!(
        Pipeline::new(&cfg),
        Err(symfeat_lib::ConfigurationError::UnknownFeature(name)) if name == "Not A Feature"
    ));
}
