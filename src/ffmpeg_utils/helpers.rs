//! Safe wrappers around FFmpeg FFI calls.
//!
//! Every function in this module is `pub` and **safe** to call.  All `unsafe`
//! blocks are contained here (and in `context`) with explicit safety
//! arguments.  Callers outside `ffmpeg_utils` never write `unsafe`.

use ffmpeg_next as ffmpeg;

// ── Stream setup ─────────────────────────────────────────────────────────────

/// Copy codec parameters verbatim onto an output stream.
///
/// Unlike `StreamMut::set_parameters`, the return code of
/// `avcodec_parameters_copy` is checked, so a failed copy (allocation of
/// extradata, typically) surfaces as an error instead of a half-filled
/// stream.
pub fn copy_stream_parameters(
    out_stream: &mut ffmpeg::format::stream::StreamMut,
    params: &ffmpeg::codec::Parameters,
) -> Result<(), ffmpeg::Error> {
    // SAFETY: `out_stream.as_mut_ptr()` is valid for the lifetime of the
    // stream and `codecpar` is allocated by `avformat_new_stream`.
    // `params.as_ptr()` is a valid, initialised AVCodecParameters.
    let ret = unsafe {
        ffmpeg::ffi::avcodec_parameters_copy((*out_stream.as_mut_ptr()).codecpar, params.as_ptr())
    };
    if ret < 0 {
        Err(ffmpeg::Error::from(ret))
    } else {
        Ok(())
    }
}

/// Zero out `codec_tag` on the `AVCodecParameters` attached to an output
/// stream, so the muxer picks the correct tag for the target container.
///
/// Must be called after the parameters are copied and before
/// `write_header`.
pub fn stream_reset_codec_tag(out_stream: &mut ffmpeg::format::stream::StreamMut) {
    // SAFETY: `out_stream.as_mut_ptr()` is valid for the lifetime of the
    // stream.  `codecpar` is non-null after `avformat_new_stream`.
    // `codec_tag` is a plain u32 field.
    unsafe {
        (*(*out_stream.as_mut_ptr()).codecpar).codec_tag = 0;
    }
}

// ── Container-level fields ───────────────────────────────────────────────────

/// Read the container `start_time` (in `AV_TIME_BASE` units).
///
/// Returns `None` when the demuxer reports `AV_NOPTS_VALUE`.
pub fn input_start_time(input: &ffmpeg::format::context::Input) -> Option<i64> {
    // SAFETY: `input.as_ptr()` is valid for the lifetime of `input`;
    // `start_time` is a plain i64 field.
    let start = unsafe { (*input.as_ptr()).start_time };
    (start != ffmpeg::ffi::AV_NOPTS_VALUE).then_some(start)
}

/// Whether the output format writes through an `AVIOContext` it expects the
/// caller to open (i.e. the format does not carry `AVFMT_NOFILE`).
pub fn output_needs_file(output: &ffmpeg::format::context::Output) -> bool {
    // SAFETY: `oformat` is set by `avformat_alloc_output_context2` and is
    // never null for a successfully allocated output context.
    unsafe {
        let oformat = (*output.as_ptr()).oformat;
        !oformat.is_null() && ((*oformat).flags & ffmpeg::ffi::AVFMT_NOFILE as i32) == 0
    }
}

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Fill an `AVCodecParameters` describing signed 16-bit little-endian PCM.
///
/// `ffmpeg-next` has no safe setters for these fields; tests use this to
/// synthesise input files without an encoder. PCM packets are opaque byte
/// runs to every muxer, so any payload round-trips unchanged.
#[cfg(test)]
pub fn codec_params_set_pcm_for_test(
    params: &mut ffmpeg::codec::Parameters,
    sample_rate: i32,
    channels: i32,
) {
    // SAFETY: `params.as_mut_ptr()` is valid for the lifetime of `params`.
    // `ch_layout` is uninitialised-by-default (zeroed), which is what
    // `av_channel_layout_default` expects.
    unsafe {
        let p = params.as_mut_ptr();
        (*p).codec_type = ffmpeg::ffi::AVMediaType::AVMEDIA_TYPE_AUDIO;
        (*p).codec_id = ffmpeg::ffi::AVCodecID::AV_CODEC_ID_PCM_S16LE;
        (*p).sample_rate = sample_rate;
        (*p).format = ffmpeg::ffi::AVSampleFormat::AV_SAMPLE_FMT_S16 as i32;
        (*p).bits_per_coded_sample = 16;
        (*p).block_align = 2 * channels;
        ffmpeg::ffi::av_channel_layout_default(&mut (*p).ch_layout, channels);
    }
}
