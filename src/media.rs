//! Media information.
//!
//! [`probe_duration`] is what the splitter needs: the container-declared
//! total duration. [`probe_media_info`] is a best-effort summary for display
//! (file name, duration, size on disk, streams).
//!
//! ```no_run
//! let info = video_splitter::probe_media_info("movie.mkv").expect("probe file");
//! println!("{} streams, {:?}s", info.streams.len(), info.duration_secs);
//! ```

use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::ffmpeg_utils::context::InputContext;
use crate::ffmpeg_utils::utils::media_type_name;

/// One stream of a probed file
#[derive(Debug, Clone, Serialize)]
pub struct StreamSummary {
    /// Zero-based index of this stream in the source file
    pub index: usize,
    /// "video", "audio", "subtitle", ...
    pub media_type: String,
    /// FFmpeg codec name (e.g. "h264")
    pub codec: String,
    /// Stream time base as "num/den"
    pub time_base: String,
}

/// Informational summary of a media file
#[derive(Debug, Clone, Serialize)]
pub struct MediaInfo {
    /// File name component of the path
    pub filename: String,
    /// Container-declared duration, `None` if the container declares none
    pub duration_secs: Option<f64>,
    /// Raw file length in bytes (0 if metadata is unavailable)
    pub file_size: u64,
    /// Detected container format
    pub format_name: String,
    /// Streams in container order
    pub streams: Vec<StreamSummary>,
}

/// Open and probe `path` and return its container-declared duration.
///
/// `Ok(None)` means the file is readable but declares no duration.
pub fn probe_duration<P: AsRef<Path>>(path: P) -> Result<Option<f64>> {
    let input = InputContext::open_probed(path.as_ref())?;
    let duration = input.duration();

    tracing::debug!("Probed {:?}: duration={:?}", input.source_path(), duration);

    Ok(duration)
}

/// Best-effort informational probe for display.
pub fn probe_media_info<P: AsRef<Path>>(path: P) -> Result<MediaInfo> {
    let path = path.as_ref();
    let input = InputContext::open_probed(path)?;

    let streams = input
        .streams()
        .map(|stream| {
            let params = stream.parameters();
            let tb = stream.time_base();
            StreamSummary {
                index: stream.index(),
                media_type: media_type_name(params.medium()).to_string(),
                codec: params.id().name().to_string(),
                time_base: format!("{}/{}", tb.numerator(), tb.denominator()),
            }
        })
        .collect();

    let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    Ok(MediaInfo {
        filename: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned()),
        duration_secs: input.duration(),
        file_size,
        format_name: input.format_name(),
        streams,
    })
}
