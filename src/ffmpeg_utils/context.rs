//! FFmpeg context wrappers for input/output handling
//!
//! Both wrappers own their `AVFormatContext` through the `ffmpeg-next`
//! context types, whose `Drop` closes the demuxer / closes the AVIO sink and
//! frees the muxer. A handle is therefore released on every exit path,
//! including early `?` returns halfway through setup.

use std::ffi::CString;
use std::path::{Path, PathBuf};
use std::ptr;

use ffmpeg_next as ffmpeg;

use crate::error::{FfmpegError, Result};
use crate::ffmpeg_utils::helpers;

/// Path bytes as FFmpeg expects them. On unix the raw bytes are passed
/// through so non-UTF-8 names open the file they name.
#[cfg(unix)]
fn c_path(path: &Path) -> std::result::Result<CString, String> {
    use std::os::unix::ffi::OsStrExt;

    CString::new(path.as_os_str().as_bytes())
        .map_err(|_| format!("path contains a NUL byte: {:?}", path))
}

#[cfg(not(unix))]
fn c_path(path: &Path) -> std::result::Result<CString, String> {
    let utf8 = path
        .to_str()
        .ok_or_else(|| format!("path is not valid UTF-8: {:?}", path))?;
    CString::new(utf8).map_err(|_| format!("path contains a NUL byte: {:?}", path))
}

/// Wrapper for an FFmpeg demuxer context
pub struct InputContext {
    inner: ffmpeg::format::context::Input,
    source_path: PathBuf,
}

impl InputContext {
    /// Open a media file for reading.
    ///
    /// Only opens the container and identifies its format; call
    /// [`InputContext::probe`] before relying on stream parameters.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        ffmpeg::init()
            .map_err(|e| FfmpegError::InitFailed(format!("ffmpeg::init() failed: {}", e)))?;

        let c_path = c_path(path).map_err(FfmpegError::OpenInput)?;
        let mut ctx: *mut ffmpeg::ffi::AVFormatContext = ptr::null_mut();

        // SAFETY: `ctx` starts null so libavformat allocates it. On failure
        // `avformat_open_input` frees the context and nulls the pointer, so
        // nothing leaks. On success ownership moves into `Input`, whose Drop
        // calls `avformat_close_input`.
        let inner = unsafe {
            let ret = ffmpeg::ffi::avformat_open_input(
                &mut ctx,
                c_path.as_ptr(),
                ptr::null_mut(),
                ptr::null_mut(),
            );
            if ret < 0 || ctx.is_null() {
                return Err(FfmpegError::OpenInput(format!(
                    "Failed to open {:?}: {}",
                    path,
                    ffmpeg::Error::from(ret)
                ))
                .into());
            }
            ffmpeg::format::context::Input::wrap(ctx)
        };

        tracing::debug!("Opened input file: {:?}", path);

        Ok(Self {
            inner,
            source_path: path.to_path_buf(),
        })
    }

    /// Read enough of the input to determine per-stream codec parameters.
    pub fn probe(&mut self) -> Result<()> {
        // SAFETY: `as_mut_ptr()` is a valid, opened demuxer context owned by
        // `self`.
        let ret = unsafe {
            ffmpeg::ffi::avformat_find_stream_info(self.inner.as_mut_ptr(), ptr::null_mut())
        };
        if ret < 0 {
            return Err(FfmpegError::FindStreamInfo(format!(
                "{:?}: {}",
                self.source_path,
                ffmpeg::Error::from(ret)
            ))
            .into());
        }

        for stream in self.inner.streams() {
            crate::ffmpeg_utils::utils::debug_stream_info(&stream, stream.index());
        }

        Ok(())
    }

    /// Open and probe in one step.
    pub fn open_probed<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut input = Self::open(path)?;
        input.probe()?;
        Ok(input)
    }

    /// Get the source file path
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Container-declared duration in seconds, `None` if not declared.
    pub fn duration(&self) -> Option<f64> {
        let duration = self.inner.duration();
        if duration == ffmpeg::ffi::AV_NOPTS_VALUE {
            None
        } else {
            Some(crate::ffmpeg_utils::utils::micros_to_seconds(duration))
        }
    }

    /// Container start time in `AV_TIME_BASE` units, 0 if not declared.
    pub fn start_time_us(&self) -> i64 {
        helpers::input_start_time(&self.inner).unwrap_or(0)
    }

    /// Short name of the detected container format
    pub fn format_name(&self) -> String {
        self.inner.format().name().to_string()
    }

    /// Get the number of streams
    pub fn num_streams(&self) -> usize {
        self.inner.streams().len()
    }

    /// Iterate over all streams
    pub fn streams(&self) -> impl Iterator<Item = ffmpeg::Stream<'_>> + '_ {
        self.inner.streams().into_iter()
    }

    /// Keyframe seek: land on the nearest random-access point at or before
    /// `ts_us` (`AV_TIME_BASE` units, all streams).
    pub fn seek_keyframe(&mut self, ts_us: i64) -> Result<()> {
        self.inner
            .seek(ts_us, ..ts_us)
            .map_err(|e| FfmpegError::Seek(format!("to {}us: {}", ts_us, e)))?;
        Ok(())
    }

    /// Read the next packet in container order; `Ok(None)` at end of input.
    pub fn read_packet(&mut self) -> Result<Option<ffmpeg::Packet>> {
        let mut packet = ffmpeg::Packet::empty();
        match packet.read(&mut self.inner) {
            Ok(()) => Ok(Some(packet)),
            Err(ffmpeg::Error::Eof) => Ok(None),
            Err(e) => Err(FfmpegError::ReadFrame(e.to_string()).into()),
        }
    }
}

/// Wrapper for an FFmpeg muxer context writing to a file
pub struct OutputContext {
    inner: ffmpeg::format::context::Output,
    path: PathBuf,
    header_written: bool,
}

impl OutputContext {
    /// Allocate a muxer whose container format is inferred from the path suffix.
    ///
    /// Does not touch the filesystem; see [`OutputContext::open_sink`].
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let c_path = c_path(path).map_err(FfmpegError::MuxerCreate)?;
        let mut ctx: *mut ffmpeg::ffi::AVFormatContext = ptr::null_mut();

        // SAFETY: format and format name are null so libavformat guesses
        // from the filename. On success ownership moves into `Output`, whose
        // Drop closes `pb` (null-safe) and frees the context.
        let inner = unsafe {
            let ret = ffmpeg::ffi::avformat_alloc_output_context2(
                &mut ctx,
                ptr::null_mut(),
                ptr::null(),
                c_path.as_ptr(),
            );
            if ret < 0 || ctx.is_null() {
                return Err(FfmpegError::MuxerCreate(format!(
                    "No output format for {:?}: {}",
                    path,
                    ffmpeg::Error::from(ret)
                ))
                .into());
            }
            ffmpeg::format::context::Output::wrap(ctx)
        };

        Ok(Self {
            inner,
            path: path.to_path_buf(),
            header_written: false,
        })
    }

    /// Output path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Short name of the inferred container format
    pub fn format_name(&self) -> String {
        self.inner.format().name().to_string()
    }

    /// Add an output stream that stream-copies `input`'s codec parameters.
    ///
    /// The codec tag is cleared so the destination container negotiates its
    /// own, and the input time base is carried over as the muxer's hint.
    pub fn add_copy_stream(&mut self, input: &ffmpeg::Stream) -> Result<usize> {
        let mut out_stream = self
            .inner
            .add_stream(ffmpeg::encoder::find(ffmpeg::codec::Id::None))
            .map_err(|e| {
                FfmpegError::MuxerCreate(format!(
                    "Failed to add stream for input {}: {}",
                    input.index(),
                    e
                ))
            })?;

        helpers::copy_stream_parameters(&mut out_stream, &input.parameters()).map_err(|e| {
            FfmpegError::StreamCopy(format!("stream {}: {}", input.index(), e))
        })?;
        helpers::stream_reset_codec_tag(&mut out_stream);
        out_stream.set_time_base(input.time_base());

        let out_index = out_stream.index();
        tracing::debug!(
            "Added copy stream: input {} -> output {}",
            input.index(),
            out_index
        );

        Ok(out_index)
    }

    /// Open the file sink, unless the format writes no file of its own.
    pub fn open_sink(&mut self) -> Result<()> {
        if !helpers::output_needs_file(&self.inner) {
            tracing::debug!("Format {} needs no sink", self.format_name());
            return Ok(());
        }

        let c_path = c_path(&self.path).map_err(FfmpegError::OpenOutput)?;
        // SAFETY: `pb` is null on a fresh context; `avio_open` stores a new
        // AVIOContext there which `Output`'s Drop closes.
        let ret = unsafe {
            ffmpeg::ffi::avio_open(
                &mut (*self.inner.as_mut_ptr()).pb,
                c_path.as_ptr(),
                ffmpeg::ffi::AVIO_FLAG_WRITE as i32,
            )
        };
        if ret < 0 {
            return Err(FfmpegError::OpenOutput(format!(
                "{:?}: {}",
                self.path,
                ffmpeg::Error::from(ret)
            ))
            .into());
        }
        Ok(())
    }

    /// Write the container header. Required before any packet.
    pub fn write_header(&mut self) -> Result<()> {
        self.inner
            .write_header()
            .map_err(|e| FfmpegError::WriteHeader(format!("{:?}: {}", self.path, e)))?;
        self.header_written = true;
        Ok(())
    }

    /// Time base the muxer settled on for an output stream.
    ///
    /// Only meaningful after [`OutputContext::write_header`]; muxers may
    /// replace the hint set when the stream was added.
    pub fn time_base(&self, index: usize) -> Option<ffmpeg::Rational> {
        self.inner.stream(index).map(|s| s.time_base())
    }

    /// Write one packet, interleaved by timestamp across streams.
    pub fn write_interleaved(&mut self, packet: &mut ffmpeg::Packet) -> Result<()> {
        packet
            .write_interleaved(&mut self.inner)
            .map_err(|e| FfmpegError::WritePacket(format!("{:?}: {}", self.path, e)))?;
        Ok(())
    }

    /// Flush interleaving queues and write the container trailer.
    pub fn write_trailer(&mut self) -> Result<()> {
        if !self.header_written {
            return Err(FfmpegError::WriteTrailer(format!(
                "{:?}: header was never written",
                self.path
            ))
            .into());
        }
        self.inner
            .write_trailer()
            .map_err(|e| FfmpegError::WriteTrailer(format!("{:?}: {}", self.path, e)))?;
        Ok(())
    }
}
