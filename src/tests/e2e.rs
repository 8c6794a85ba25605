//! End-to-end tests: probe, extract and split real (synthetic) files

use std::path::{Path, PathBuf};

use crate::config::SplitConfig;
use crate::error::{ErrorKind, SplitError};
use crate::media::{probe_duration, probe_media_info};
use crate::segment::extract_segment;
use crate::split::{split, split_async, split_with_config};
use crate::ffmpeg_utils::ffmpeg;
use crate::tests::fixtures::{
    payload_for, read_packets, stream_payloads, stream_time_bases, write_fixture, ReadPacket,
};

const STREAMS: usize = 2;

/// Per stream: pts starts at 0 and never decreases.
fn assert_rebased(packets: &[ReadPacket]) {
    for stream in 0..STREAMS {
        let pts: Vec<i64> = packets
            .iter()
            .filter(|p| p.stream == stream)
            .map(|p| p.pts.or(p.dts).unwrap())
            .collect();
        assert!(!pts.is_empty(), "stream {} is empty", stream);
        assert_eq!(pts[0], 0, "stream {} does not start at 0", stream);
        assert!(
            pts.windows(2).all(|w| w[0] <= w[1]),
            "stream {} timestamps decrease: {:?}",
            stream,
            pts
        );
    }
}

/// Every source packet appears in exactly one part, in order.
fn assert_parts_cover(source: &Path, parts: &[PathBuf]) {
    let source_packets = read_packets(source);
    let part_packets: Vec<Vec<ReadPacket>> = parts.iter().map(|p| read_packets(p)).collect();

    for stream in 0..STREAMS {
        let joined: Vec<Vec<u8>> = part_packets
            .iter()
            .flat_map(|packets| stream_payloads(packets, stream))
            .collect();
        assert_eq!(
            joined,
            stream_payloads(&source_packets, stream),
            "stream {} payloads differ from source",
            stream
        );
    }
}

fn chunk_failure(err: &SplitError) -> (usize, &[PathBuf]) {
    match err {
        SplitError::ChunkFailed {
            index, completed, ..
        } => (*index, completed.as_slice()),
        other => panic!("expected a chunk failure, got: {}", other),
    }
}

#[test]
fn test_probe() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "fixture.nut");

    let duration = probe_duration(&input).unwrap().unwrap();
    assert!((9.5..=10.5).contains(&duration), "duration {}", duration);

    let info = probe_media_info(&input).unwrap();
    assert_eq!(info.filename, "fixture.nut");
    assert_eq!(info.format_name, "nut");
    assert_eq!(info.file_size, std::fs::metadata(&input).unwrap().len());
    assert_eq!(info.streams.len(), 2);
    assert!(info.streams.iter().all(|s| s.media_type == "audio"));
    assert_eq!(info.streams[0].codec, "pcm_s16le");
    assert_eq!(info.streams[1].time_base, "1/16000");
}

#[test]
fn test_extract_segment_window() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "fixture.nut");
    let output = dir.path().join("window.nut");

    let summary = extract_segment(&input, &output, 4.0, 2.0).unwrap();

    // [4.0, 6.0): 8 kHz packets 40..60 and 16 kHz packets 16..24
    assert_eq!(summary.packets_written, 28);
    assert_eq!(summary.payload_bytes, 20 * 1600 + 8 * 8000);

    let packets = read_packets(&output);
    assert_rebased(&packets);

    let expected: Vec<Vec<u8>> = (40..60).map(|seq| payload_for(0, seq, 1600)).collect();
    assert_eq!(stream_payloads(&packets, 0), expected);
    let expected: Vec<Vec<u8>> = (16..24).map(|seq| payload_for(1, seq, 8000)).collect();
    assert_eq!(stream_payloads(&packets, 1), expected);

    let pts: Vec<i64> = packets
        .iter()
        .filter(|p| p.stream == 0)
        .filter_map(|p| p.pts)
        .collect();
    assert_eq!(pts, (0..20).map(|i| i * 800).collect::<Vec<_>>());
}

#[test]
fn test_extract_segment_into_other_container() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "fixture.nut");
    let output = dir.path().join("window.mkv");

    let summary = extract_segment(&input, &output, 4.0, 2.0).unwrap();
    assert_eq!(summary.packets_written, 28);

    // matroska picks a millisecond time base for every stream
    let ms = ffmpeg::Rational::new(1, 1000);
    assert_eq!(stream_time_bases(&output), vec![ms, ms]);

    let packets = read_packets(&output);
    assert_rebased(&packets);

    let expected: Vec<Vec<u8>> = (40..60).map(|seq| payload_for(0, seq, 1600)).collect();
    assert_eq!(stream_payloads(&packets, 0), expected);
    let expected: Vec<Vec<u8>> = (16..24).map(|seq| payload_for(1, seq, 8000)).collect();
    assert_eq!(stream_payloads(&packets, 1), expected);

    let pts = |stream: usize| -> Vec<i64> {
        packets
            .iter()
            .filter(|p| p.stream == stream)
            .filter_map(|p| p.pts)
            .collect()
    };
    // 1/8000 and 1/16000 input ticks land on the same millisecond clock
    assert_eq!(pts(0), (0..20).map(|i| i * 100).collect::<Vec<_>>());
    assert_eq!(pts(1), (0..8).map(|i| i * 250).collect::<Vec<_>>());
}

#[test]
fn test_split_into_three_parts() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "fixture.nut");

    let parts = split(&input, 4.0, 1.0).unwrap();

    assert_eq!(
        parts,
        vec![
            dir.path().join("fixture_part01.nut"),
            dir.path().join("fixture_part02.nut"),
            dir.path().join("fixture_part03.nut"),
        ]
    );
    for part in &parts {
        assert_rebased(&read_packets(part));
    }
    assert_parts_cover(&input, &parts);
}

#[test]
fn test_short_tail_is_merged() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "fixture.nut");

    let parts = split(&input, 4.5, 2.0).unwrap();

    assert_eq!(parts.len(), 2);
    assert_parts_cover(&input, &parts);

    // 4.5s .. end
    let last = read_packets(&parts[1]);
    assert_eq!(stream_payloads(&last, 0).len(), 55);
}

#[test]
fn test_split_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "fixture.nut");

    let mut runs = Vec::new();
    for name in ["a", "b"] {
        let out = dir.path().join(name);
        std::fs::create_dir(&out).unwrap();
        let config = SplitConfig {
            output_dir: Some(out),
            ..SplitConfig::with_policy(3.0, 1.0)
        };
        runs.push(split_with_config(&input, &config).unwrap());
    }

    assert_eq!(runs[0].len(), runs[1].len());
    for (a, b) in runs[0].iter().zip(&runs[1]) {
        assert_eq!(a.file_name(), b.file_name());
        assert_eq!(read_packets(a), read_packets(b));
    }
}

#[test]
fn test_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.nut");

    let err = extract_segment(&missing, dir.path().join("out.nut"), 0.0, 1.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Open);

    let err = split(&missing, 4.0, 1.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Open);
    assert_eq!(err.chunk_index(), None);
}

#[test]
fn test_invalid_policy_on_real_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "fixture.nut");

    let err = split(&input, 0.0, 0.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Plan);
    assert!(!dir.path().join("fixture_part01.nut").exists());
}

#[test]
fn test_later_part_failure_keeps_earlier_parts() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "fixture.nut");
    // a directory where part 2 should go makes its sink fail to open
    std::fs::create_dir(dir.path().join("fixture_part02.nut")).unwrap();

    let err = split(&input, 4.0, 1.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(err.chunk_index(), Some(1));
    assert!(err.to_string().starts_with("Part 2 failed"));

    let (index, completed) = chunk_failure(&err);
    let part01 = dir.path().join("fixture_part01.nut");
    assert_eq!(index, 1);
    assert_eq!(completed, [part01.clone()]);
    assert!(part01.is_file());
    assert_rebased(&read_packets(&part01));

    assert!(!dir.path().join("fixture_part03.nut").exists());
}

#[test]
fn test_unknown_output_format() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = write_fixture(dir.path(), "fixture.nut");
    let input = dir.path().join("clip.notaformat");
    std::fs::copy(&fixture, &input).unwrap();

    let err = split(&input, 4.0, 1.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Muxer);

    let (index, completed) = chunk_failure(&err);
    assert_eq!(index, 0);
    assert!(completed.is_empty());
}

#[test]
fn test_unwritable_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "fixture.nut");
    let config = SplitConfig {
        output_dir: Some(dir.path().join("no").join("such").join("dir")),
        ..SplitConfig::with_policy(4.0, 1.0)
    };

    let err = split_with_config(&input, &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(err.chunk_index(), Some(0));
    assert!(err.to_string().starts_with("Part 1 failed"));
}

#[tokio::test]
async fn test_split_async_matches_sequential() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "fixture.nut");

    let seq_dir = dir.path().join("seq");
    let par_dir = dir.path().join("par");
    std::fs::create_dir(&seq_dir).unwrap();
    std::fs::create_dir(&par_dir).unwrap();

    let sequential = SplitConfig {
        output_dir: Some(seq_dir),
        ..SplitConfig::with_policy(4.0, 1.0)
    };
    let parallel = SplitConfig {
        output_dir: Some(par_dir),
        jobs: 2,
        ..sequential.clone()
    };

    let a = split_async(&input, &sequential).await.unwrap();
    let b = split_async(&input, &parallel).await.unwrap();

    assert_eq!(a.len(), 3);
    assert_eq!(b.len(), 3);
    for (a, b) in a.iter().zip(&b) {
        assert_eq!(a.file_name(), b.file_name());
        assert_eq!(read_packets(a), read_packets(b));
    }
    assert_parts_cover(&input, &b);
}

#[tokio::test]
async fn test_split_async_reports_lowest_failure() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = write_fixture(dir.path(), "fixture.nut");
    let input = dir.path().join("clip.notaformat");
    std::fs::copy(&fixture, &input).unwrap();

    let config = SplitConfig {
        jobs: 3,
        ..SplitConfig::with_policy(4.0, 1.0)
    };
    let err = split_async(&input, &config).await.unwrap_err();
    let (index, completed) = chunk_failure(&err);
    assert_eq!(index, 0);
    assert!(completed.is_empty());
    assert_eq!(err.kind(), ErrorKind::Muxer);
}
