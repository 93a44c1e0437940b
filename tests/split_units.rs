use fq_split::{
    ConfigError, FastqRecord, Layout, PairedSplit, PairingMode, Side, SingleSplit, SplitConfig,
    SplitError, SplitWriter, Splitter, output_paths,
};
use std::path::{Path, PathBuf};

fn rec(id: &str, seq: &str, qual: &str) -> FastqRecord {
    FastqRecord {
        id: id.as_bytes().to_vec(),
        seq: seq.as_bytes().to_vec(),
        qual: qual.as_bytes().to_vec(),
    }
}

#[test]
fn split_at_cuts_sequence_and_quality() {
    let read = rec("@r1", "AAATTTTT", "IIIIIIII");
    let (head, tail) = read.split_at(3).unwrap();
    assert_eq!(head, rec("@r1", "AAA", "III"));
    assert_eq!(tail, rec("@r1", "TTTTT", "IIIII"));

    let mut joined = head.seq.clone();
    joined.extend_from_slice(&tail.seq);
    assert_eq!(joined, read.seq);
}

#[test]
fn split_at_requires_more_than_n_bases() {
    let read = rec("@r", "ACGT", "IIII");
    assert!(read.split_at(4).is_none());
    assert!(read.split_at(10).is_none());
    let (head, tail) = read.split_at(3).unwrap();
    assert_eq!(head.seq, b"ACG");
    assert_eq!(tail.seq, b"T");
}

#[test]
fn write_to_uses_plus_separator() {
    let mut out = Vec::new();
    rec("@r1 extra", "ACG", "I#I").write_to(&mut out).unwrap();
    assert_eq!(out, b"@r1 extra\nACG\n+\nI#I\n");
}

#[test]
fn read_name_drops_description_and_mate_suffix() {
    assert_eq!(rec("@frag7/1 a b", "", "").name(), b"frag7");
    assert_eq!(rec("@frag7/2", "", "").name(), b"frag7");
    assert_eq!(rec("@frag7 1:N:0", "", "").name(), b"frag7");
    assert_eq!(rec("frag7", "", "").name(), b"frag7");
}

#[test]
fn pair_split_emits_head_then_tail() {
    let mut splitter = Splitter::new(2, PairingMode::Positional);
    let [head, tail] = splitter
        .split_pair(rec("@a", "ACGT", "1234"), rec("@b", "TTGCA", "56789"))
        .unwrap()
        .unwrap();
    assert_eq!(head.side, Side::Head);
    assert_eq!(head.first, rec("@a", "AC", "12"));
    assert_eq!(head.second, rec("@b", "TT", "56"));
    assert_eq!(tail.side, Side::Tail);
    assert_eq!(tail.first, rec("@a", "GT", "34"));
    assert_eq!(tail.second, rec("@b", "GCA", "789"));
    assert_eq!(splitter.stats().split, 1);
}

#[test]
fn pair_discarded_when_either_mate_is_short() {
    let mut splitter = Splitter::new(10, PairingMode::Positional);
    let out = splitter
        .split_pair(rec("@a", "ACGTACGT", "IIIIIIII"), rec("@b", "ACGTACGT", "IIIIIIII"))
        .unwrap();
    assert!(out.is_none());

    let mut splitter = Splitter::new(5, PairingMode::Positional);
    let out = splitter
        .split_pair(rec("@a", "ACGTACGT", "IIIIIIII"), rec("@b", "ACGTA", "IIIII"))
        .unwrap();
    assert!(out.is_none());
    let stats = splitter.stats();
    assert_eq!((stats.records_in, stats.split, stats.discarded), (1, 0, 1));
}

#[test]
fn positional_pairing_ignores_ids() {
    let mut splitter = Splitter::new(1, PairingMode::Positional);
    let out = splitter
        .split_pair(rec("@x/1", "AC", "II"), rec("@y/2", "GT", "II"))
        .unwrap();
    assert!(out.is_some());
}

#[test]
fn strict_pairing_rejects_mismatched_names() {
    let mut splitter = Splitter::new(1, PairingMode::StrictId);
    assert!(
        splitter
            .split_pair(rec("@x/1", "AC", "II"), rec("@x/2", "GT", "II"))
            .unwrap()
            .is_some()
    );
    match splitter.split_pair(rec("@x/1", "AC", "II"), rec("@y/2", "GT", "II")) {
        Err(SplitError::PairMismatch { r1, r2 }) => {
            assert_eq!(r1, "@x/1");
            assert_eq!(r2, "@y/2");
        }
        other => panic!("expected mismatch, got {other:?}"),
    }
}

#[test]
fn strict_pairing_compares_names_as_bytes() {
    let raw = |id: &[u8]| FastqRecord {
        id: id.to_vec(),
        seq: b"ACGT".to_vec(),
        qual: b"IIII".to_vec(),
    };
    let mut splitter = Splitter::new(2, PairingMode::StrictId);
    assert_eq!(raw(b"@\xE9t\xE9/1 x").name(), b"\xE9t\xE9");
    assert!(
        splitter
            .split_pair(raw(b"@\xE9t\xE9/1"), raw(b"@\xE9t\xE9/2"))
            .unwrap()
            .is_some()
    );
    match splitter.split_pair(raw(b"@\xE9t\xE9/1"), raw(b"@\xE8t\xE9/2")) {
        Err(SplitError::PairMismatch { r1, r2 }) => {
            assert_eq!(r1, "@\u{FFFD}t\u{FFFD}/1");
            assert_eq!(r2, "@\u{FFFD}t\u{FFFD}/2");
        }
        other => panic!("expected mismatch, got {other:?}"),
    }
}

#[test]
fn single_split_and_discard() {
    let mut splitter = Splitter::new(3, PairingMode::Positional);
    let [head, tail] = splitter.split_single(rec("@r1", "AAATTTTT", "IIIIIIII")).unwrap();
    assert_eq!(head.side, Side::Head);
    assert_eq!(head.read.seq, b"AAA");
    assert_eq!(tail.side, Side::Tail);
    assert_eq!(tail.read.seq, b"TTTTT");
    assert!(splitter.split_single(rec("@r2", "AAA", "III")).is_none());
    assert_eq!(splitter.stats().discarded, 1);
}

#[test]
fn paired_writer_routes_each_mate_to_its_sink() {
    let mut writer = SplitWriter::<Vec<u8>>::paired(Vec::new(), Vec::new(), Vec::new(), Vec::new());
    let mut splitter = Splitter::new(2, PairingMode::Positional);
    for (a, b) in [("@a1", "@b1"), ("@a2", "@b2")] {
        let units = splitter
            .split_pair(rec(a, "ACGT", "IIII"), rec(b, "TTTT", "####"))
            .unwrap()
            .unwrap();
        for unit in units {
            writer.write_unit(unit).unwrap();
        }
    }
    assert_eq!(writer.units(), 4);

    let sinks = writer.finish().unwrap();
    let text: Vec<String> = sinks
        .into_iter()
        .map(|s| String::from_utf8(s).unwrap())
        .collect();
    assert_eq!(text[0], "@a1\nAC\n+\nII\n@a2\nAC\n+\nII\n");
    assert_eq!(text[1], "@b1\nTT\n+\n##\n@b2\nTT\n+\n##\n");
    assert_eq!(text[2], "@a1\nGT\n+\nII\n@a2\nGT\n+\nII\n");
    assert_eq!(text[3], "@b1\nTT\n+\n##\n@b2\nTT\n+\n##\n");
}

#[test]
fn single_writer_keeps_arrival_order() {
    let mut writer = SplitWriter::<Vec<u8>>::single(Vec::new(), Vec::new());
    let (tx, rx) = crossbeam_channel::bounded(0);
    let feeder = std::thread::spawn(move || {
        for (id, side) in [("@1", Side::Head), ("@1", Side::Tail), ("@2", Side::Head)] {
            tx.send(SingleSplit {
                side,
                read: rec(id, "A", "I"),
            })
            .unwrap();
        }
    });
    assert_eq!(writer.run(rx).unwrap(), 3);
    feeder.join().unwrap();

    let sinks = writer.finish().unwrap();
    assert_eq!(sinks[0], b"@1\nA\n+\nI\n@2\nA\n+\nI\n");
    assert_eq!(sinks[1], b"@1\nA\n+\nI\n");
}

#[test]
fn paired_unit_carries_both_mates() {
    use fq_split::SplitUnit;
    let unit = PairedSplit {
        side: Side::Tail,
        first: rec("@1", "A", "I"),
        second: rec("@2", "C", "I"),
    };
    assert_eq!(unit.side(), Side::Tail);
    // one read per lane, no heap collection in between
    let [first, second]: [FastqRecord; 2] = unit.into_reads();
    assert_eq!(first.id, b"@1");
    assert_eq!(second.id, b"@2");

    let single = SingleSplit {
        side: Side::Head,
        read: rec("@3", "G", "I"),
    };
    let [read]: [FastqRecord; 1] = single.into_reads();
    assert_eq!(read.id, b"@3");
}

#[test]
fn layout_from_inputs() {
    let p = |s: &str| Some(PathBuf::from(s));
    assert_eq!(
        Layout::from_inputs(p("a"), p("b"), None),
        Ok(Layout::Paired {
            r1: "a".into(),
            r2: "b".into()
        })
    );
    assert_eq!(
        Layout::from_inputs(None, None, p("s")),
        Ok(Layout::Single { se: "s".into() })
    );
    assert_eq!(Layout::from_inputs(None, None, None), Err(ConfigError::NoInput));
    assert_eq!(
        Layout::from_inputs(p("a"), p("b"), p("s")),
        Err(ConfigError::MixedLayouts)
    );
    assert_eq!(
        Layout::from_inputs(p("a"), None, p("s")),
        Err(ConfigError::MixedLayouts)
    );
    assert_eq!(
        Layout::from_inputs(p("a"), None, None),
        Err(ConfigError::MissingMate("R2"))
    );
    assert_eq!(
        Layout::from_inputs(None, p("b"), None),
        Err(ConfigError::MissingMate("R1"))
    );
}

#[test]
fn config_validation() {
    let layout = Layout::Single { se: "s".into() };
    assert_eq!(
        SplitConfig::new(0, layout.clone(), "out").validate(),
        Err(ConfigError::ZeroSplitPosition)
    );
    let mut config = SplitConfig::new(3, layout, "out");
    assert_eq!(config.validate(), Ok(()));
    config.compression = 10;
    assert_eq!(config.validate(), Err(ConfigError::CompressionLevel(10)));
}

#[test]
fn output_names() {
    let base = Path::new("dir/sample");
    let paired = Layout::Paired {
        r1: "a".into(),
        r2: "b".into(),
    };
    let names: Vec<_> = output_paths(base, &paired)
        .into_iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        [
            "dir/sample_begin_R1.fq.gz",
            "dir/sample_begin_R2.fq.gz",
            "dir/sample_end_R1.fq.gz",
            "dir/sample_end_R2.fq.gz",
        ]
    );
    let single = output_paths(base, &Layout::Single { se: "s".into() });
    assert_eq!(
        single,
        [
            PathBuf::from("dir/sample_begin_SE.fq.gz"),
            PathBuf::from("dir/sample_end_SE.fq.gz"),
        ]
    );
}
