//! Stream-copy extractor for one part

use std::path::Path;

use ffmpeg_next as ffmpeg;
use serde::Serialize;

use crate::error::Result;
use crate::ffmpeg_utils::context::{InputContext, OutputContext};
use crate::segment::rebase::{PacketAction, Rebaser, SegmentWindow, Timing};

/// What was written into one part
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SegmentSummary {
    /// Packets written to the output
    pub packets_written: u64,
    /// Packets read but dropped as preceding the window
    pub packets_skipped: u64,
    /// Sum of the written packets' payload sizes
    pub payload_bytes: u64,
}

/// Copy `[start_secs, start_secs + duration_secs)` of `input` into `output`.
///
/// The output container format is inferred from the output path's suffix.
/// Every input stream is mapped one-to-one. On error a partially written
/// output may remain on disk.
pub fn extract_segment<I, O>(
    input: I,
    output: O,
    start_secs: f64,
    duration_secs: f64,
) -> Result<SegmentSummary>
where
    I: AsRef<Path>,
    O: AsRef<Path>,
{
    extract_window(input, output, SegmentWindow::new(start_secs, duration_secs))
}

/// Copy an arbitrary window (possibly open-ended) of `input` into `output`.
pub fn extract_window<I, O>(input: I, output: O, window: SegmentWindow) -> Result<SegmentSummary>
where
    I: AsRef<Path>,
    O: AsRef<Path>,
{
    let mut input = InputContext::open_probed(input.as_ref())?;
    let mut output = OutputContext::create(output.as_ref())?;

    let mut in_time_bases = Vec::with_capacity(input.num_streams());
    for stream in input.streams() {
        output.add_copy_stream(&stream)?;
        in_time_bases.push(stream.time_base());
    }

    output.open_sink()?;
    output.write_header()?;

    let out_time_bases: Vec<ffmpeg::Rational> = in_time_bases
        .iter()
        .enumerate()
        .map(|(i, &tb)| output.time_base(i).unwrap_or(tb))
        .collect();

    // Window times are relative to the container's own start
    let container_start = input.start_time_us();
    let window = window.offset_by(container_start);
    if window.start_us > container_start {
        input.seek_keyframe(window.start_us)?;
    }

    tracing::debug!(
        "Extracting {:?} -> {:?} ({}): window={:?}",
        input.source_path(),
        output.path(),
        output.format_name(),
        window
    );

    let mut rebaser = Rebaser::new(window);
    let mut summary = SegmentSummary::default();

    while let Some(mut packet) = input.read_packet()? {
        let index = packet.stream();
        let (Some(&in_tb), Some(&out_tb)) = (in_time_bases.get(index), out_time_bases.get(index))
        else {
            // Stream appeared after the header was written
            summary.packets_skipped += 1;
            continue;
        };

        let timing = Timing::of(&packet);
        match rebaser.classify(&timing, in_tb) {
            PacketAction::BeforeWindow => {
                summary.packets_skipped += 1;
                continue;
            }
            PacketAction::PastWindow => break,
            PacketAction::Keep => {}
        }

        rebaser.rebase(timing, in_tb, out_tb).apply(&mut packet);
        packet.set_stream(index);
        packet.set_position(-1);

        summary.payload_bytes += packet.size() as u64;
        output.write_interleaved(&mut packet)?;
        summary.packets_written += 1;
    }

    output.write_trailer()?;

    tracing::debug!(
        "Wrote {:?}: {} packets ({} bytes), {} skipped, origin={:?}us",
        output.path(),
        summary.packets_written,
        summary.payload_bytes,
        summary.packets_skipped,
        rebaser.origin_us()
    );

    Ok(summary)
}
