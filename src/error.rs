use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the splitter
#[derive(Error, Debug)]
pub enum SplitError {
    /// An error originating from the underlying FFmpeg library
    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] FfmpegError),

    /// A standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The container declares no usable duration, so no plan can be made
    #[error("Duration unknown for file: {0}")]
    DurationUnknown(String),

    /// The chunk duration parameters are invalid
    #[error("Invalid chunk plan: {0}")]
    Plan(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A single part failed; parts listed in `completed` were fully written
    #[error("Part {} failed: {source}", index + 1)]
    ChunkFailed {
        index: usize,
        completed: Vec<PathBuf>,
        #[source]
        source: Box<SplitError>,
    },

    /// A background extraction task panicked or was cancelled
    #[error("Task join error: {0}")]
    Join(String),
}

/// FFmpeg-specific errors
#[derive(Error, Debug)]
pub enum FfmpegError {
    /// Failure during global FFmpeg initialization
    #[error("FFmpeg initialization failed: {0}")]
    InitFailed(String),

    /// The input could not be read or its container identified
    #[error("Failed to open input file: {0}")]
    OpenInput(String),

    /// Per-stream codec information could not be determined
    #[error("Failed to find stream info: {0}")]
    FindStreamInfo(String),

    /// Output container undetectable from the path, or allocation failed
    #[error("Failed to create muxer: {0}")]
    MuxerCreate(String),

    /// Codec parameters could not be copied onto an output stream
    #[error("Failed to copy stream parameters: {0}")]
    StreamCopy(String),

    /// The output sink could not be opened
    #[error("Failed to open output file: {0}")]
    OpenOutput(String),

    /// Failure writing the container header
    #[error("Failed to write header: {0}")]
    WriteHeader(String),

    /// Failure seeking the input
    #[error("Failed to seek: {0}")]
    Seek(String),

    /// Failure reading a packet from the input
    #[error("Failed to read frame: {0}")]
    ReadFrame(String),

    /// Failure writing a packet to the output
    #[error("Failed to write packet: {0}")]
    WritePacket(String),

    /// Failure writing the container trailer
    #[error("Failed to write trailer: {0}")]
    WriteTrailer(String),
}

/// Error categories callers can branch on without unpacking nested variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Open,
    Probe,
    DurationUnknown,
    Muxer,
    StreamCopy,
    Io,
    Plan,
    Write,
    Config,
    Internal,
}

impl FfmpegError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FfmpegError::InitFailed(_) => ErrorKind::Internal,
            FfmpegError::OpenInput(_) => ErrorKind::Open,
            FfmpegError::FindStreamInfo(_) => ErrorKind::Probe,
            FfmpegError::MuxerCreate(_) => ErrorKind::Muxer,
            FfmpegError::StreamCopy(_) => ErrorKind::StreamCopy,
            FfmpegError::OpenOutput(_)
            | FfmpegError::WriteHeader(_)
            | FfmpegError::Seek(_)
            | FfmpegError::ReadFrame(_) => ErrorKind::Io,
            FfmpegError::WritePacket(_) | FfmpegError::WriteTrailer(_) => ErrorKind::Write,
        }
    }
}

impl SplitError {
    /// Category of the innermost failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            SplitError::Ffmpeg(e) => e.kind(),
            SplitError::Io(_) => ErrorKind::Io,
            SplitError::DurationUnknown(_) => ErrorKind::DurationUnknown,
            SplitError::Plan(_) => ErrorKind::Plan,
            SplitError::Config(_) => ErrorKind::Config,
            SplitError::ChunkFailed { source, .. } => source.kind(),
            SplitError::Join(_) => ErrorKind::Internal,
        }
    }

    /// Zero-based index of the failing part, if the failure was chunk-scoped
    pub fn chunk_index(&self) -> Option<usize> {
        match self {
            SplitError::ChunkFailed { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SplitError>;
