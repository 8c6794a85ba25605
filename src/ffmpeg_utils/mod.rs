//! FFmpeg module - wrappers and utilities for FFmpeg library access
//!
//! This module handles:
//! - FFmpeg initialization and log routing
//! - Scoped input/output container handles
//! - Timestamp arithmetic across time bases

pub mod context;
pub mod helpers;
pub mod utils;

pub use ffmpeg_next as ffmpeg;

/// Initialize the FFmpeg library.
///
/// Call once at startup before probing or splitting. Opening functions in
/// this crate also call `ffmpeg::init()` themselves, so library users that
/// skip this still get a working setup.
pub fn init() -> Result<(), crate::error::FfmpegError> {
    ffmpeg::init().map_err(|e| {
        crate::error::FfmpegError::InitFailed(format!("ffmpeg::init() failed: {}", e))
    })?;

    tracing::info!("FFmpeg initialized");

    Ok(())
}

/// Install an FFmpeg log callback that forwards messages to `tracing`.
///
/// Stream-copy remuxing makes FFmpeg emit a handful of informational
/// warnings on every part (new Matroska clusters, unset timestamps on
/// passthrough packets); those are dropped, everything else is logged
/// under the `ffmpeg` target.
///
/// **Safety & Ordering:** Must be called after `init()` and before any
/// extraction threads start, because altering the global log callback is
/// not thread-safe.
pub fn install_log_filter() {
    // SAFETY: both functions modify global FFmpeg state and are called
    // once at startup before any other thread touches FFmpeg.
    unsafe {
        ffmpeg::ffi::av_log_set_level(ffmpeg::ffi::AV_LOG_WARNING as i32);
        ffmpeg::ffi::av_log_set_callback(Some(ffmpeg_log_callback));
    }
}

/// Messages that are expected side-effects of stream copy and are suppressed.
const SUPPRESSED_MESSAGES: &[&str] = &[
    "Starting new cluster due to timestamp",
    "Timestamps are unset in a packet for stream",
    "Encoder did not produce proper pts",
];

unsafe extern "C" fn ffmpeg_log_callback(
    avcl: *mut std::ffi::c_void,
    level: std::ffi::c_int,
    fmt: *const std::ffi::c_char,
    vl: ffmpeg::ffi::va_list,
) {
    use std::ffi::CStr;

    if level > ffmpeg::ffi::av_log_get_level() {
        return;
    }

    let mut buf = [0 as std::ffi::c_char; 1024];
    let mut print_prefix: std::ffi::c_int = 1;
    ffmpeg::ffi::av_log_format_line(
        avcl,
        level,
        fmt,
        vl,
        buf.as_mut_ptr(),
        buf.len() as std::ffi::c_int,
        &mut print_prefix,
    );

    let msg = CStr::from_ptr(buf.as_ptr()).to_string_lossy();
    let msg = msg.trim_end();
    if msg.is_empty() {
        return;
    }

    for suppressed in SUPPRESSED_MESSAGES {
        if msg.contains(suppressed) {
            return;
        }
    }

    if level <= ffmpeg::ffi::AV_LOG_ERROR as std::ffi::c_int {
        tracing::error!(target: "ffmpeg", "{}", msg);
    } else if level <= ffmpeg::ffi::AV_LOG_WARNING as std::ffi::c_int {
        tracing::warn!(target: "ffmpeg", "{}", msg);
    } else if level <= ffmpeg::ffi::AV_LOG_INFO as std::ffi::c_int {
        tracing::info!(target: "ffmpeg", "{}", msg);
    } else {
        tracing::debug!(target: "ffmpeg", "{}", msg);
    }
}

/// Version string of the linked libavformat.
pub fn version_info() -> String {
    // SAFETY: `avformat_version` only reads a compile-time constant.
    let v = unsafe { ffmpeg::ffi::avformat_version() };
    format!("libavformat {}.{}.{}", v >> 16, (v >> 8) & 0xff, v & 0xff)
}
