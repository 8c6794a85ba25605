pub mod config;
pub mod config_file;
pub(crate) mod error;
pub(crate) mod ffmpeg_utils;
pub(crate) mod media;
pub(crate) mod naming;
pub(crate) mod plan;
pub(crate) mod segment;
pub(crate) mod split;

#[cfg(test)]
pub(crate) mod tests;

pub use config::{LogFormat, SplitConfig};
pub use error::{ErrorKind, FfmpegError, Result, SplitError};
pub use ffmpeg_utils::version_info as ffmpeg_version_info;
pub use ffmpeg_utils::{init, install_log_filter};
pub use media::{probe_duration, probe_media_info, MediaInfo, StreamSummary};
pub use naming::{part_file_name, part_path, part_path_in};
pub use plan::{plan_chunks, ChunkPlan, ChunkSpec};
pub use segment::{extract_segment, extract_window, SegmentSummary, SegmentWindow};
pub use split::{split, split_async, split_with_config};
