//! FFmpeg utility functions

use ffmpeg_next as ffmpeg;

/// `AV_TIME_BASE_Q`: the microsecond time base FFmpeg uses for container-level times.
pub const MICROS: ffmpeg::Rational = ffmpeg::Rational(1, ffmpeg::ffi::AV_TIME_BASE as i32);

/// Rescale a timestamp from one time base to another.
///
/// Rounds to nearest with halves away from zero and saturates at the `i64`
/// range instead of wrapping. A degenerate time base (zero numerator or
/// denominator) leaves the value unchanged.
pub fn rescale_rnd(ts: i64, from: ffmpeg::Rational, to: ffmpeg::Rational) -> i64 {
    let num = from.numerator() as i128 * to.denominator() as i128;
    let den = from.denominator() as i128 * to.numerator() as i128;
    if num == 0 || den == 0 {
        return ts;
    }
    let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };

    let scaled = ts as i128 * num;
    let half = den / 2;
    let rounded = if scaled >= 0 {
        (scaled + half) / den
    } else {
        (scaled - half) / den
    };

    rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// Convert seconds to microseconds (`AV_TIME_BASE` units), saturating.
pub fn seconds_to_micros(secs: f64) -> i64 {
    // `as` on f64 -> i64 saturates and maps NaN to 0
    (secs * ffmpeg::ffi::AV_TIME_BASE as f64).round() as i64
}

/// Convert microseconds (`AV_TIME_BASE` units) to seconds.
pub fn micros_to_seconds(us: i64) -> f64 {
    us as f64 / ffmpeg::ffi::AV_TIME_BASE as f64
}

/// Get the media type name
pub fn media_type_name(media_type: ffmpeg::media::Type) -> &'static str {
    match media_type {
        ffmpeg::media::Type::Video => "video",
        ffmpeg::media::Type::Audio => "audio",
        ffmpeg::media::Type::Subtitle => "subtitle",
        ffmpeg::media::Type::Data => "data",
        ffmpeg::media::Type::Attachment => "attachment",
        _ => "unknown",
    }
}

/// Print stream information for debugging
pub fn debug_stream_info(stream: &ffmpeg::Stream, index: usize) {
    let params = stream.parameters();
    let tb = stream.time_base();

    tracing::debug!(
        "Stream {}: type={}, codec={}, time_base={}/{}",
        index,
        media_type_name(params.medium()),
        params.id().name(),
        tb.numerator(),
        tb.denominator()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rescale_identity() {
        let tb = ffmpeg::Rational::new(1, 90000);
        assert_eq!(rescale_rnd(123_456, tb, tb), 123_456);
        assert_eq!(rescale_rnd(-42, tb, tb), -42);
    }

    #[test]
    fn test_rescale_between_time_bases() {
        // 1 second
        assert_eq!(
            rescale_rnd(90000, ffmpeg::Rational::new(1, 90000), ffmpeg::Rational::new(1, 1000)),
            1000
        );
        assert_eq!(
            rescale_rnd(25, ffmpeg::Rational::new(1, 25), MICROS),
            1_000_000
        );
        // NTSC frame duration into a 90kHz clock
        assert_eq!(
            rescale_rnd(1, ffmpeg::Rational::new(1001, 30000), ffmpeg::Rational::new(1, 90000)),
            3003
        );
    }

    #[test]
    fn test_rescale_rounds_to_nearest() {
        let ms = ffmpeg::Rational::new(1, 1000);
        let tenths = ffmpeg::Rational::new(1, 10);
        assert_eq!(rescale_rnd(149, ms, tenths), 1);
        assert_eq!(rescale_rnd(150, ms, tenths), 2);
        assert_eq!(rescale_rnd(-150, ms, tenths), -2);
        assert_eq!(rescale_rnd(-149, ms, tenths), -1);
    }

    #[test]
    fn test_rescale_saturates() {
        let coarse = ffmpeg::Rational::new(1, 1);
        let fine = ffmpeg::Rational::new(1, 1_000_000_000);
        assert_eq!(rescale_rnd(i64::MAX / 2, coarse, fine), i64::MAX);
        assert_eq!(rescale_rnd(i64::MIN / 2, coarse, fine), i64::MIN);
    }

    #[test]
    fn test_rescale_degenerate_time_base() {
        let zero = ffmpeg::Rational::new(0, 1);
        assert_eq!(rescale_rnd(77, zero, MICROS), 77);
    }

    #[test]
    fn test_seconds_micros_conversion() {
        assert_eq!(seconds_to_micros(1.5), 1_500_000);
        assert_eq!(seconds_to_micros(14400.0), 14_400_000_000);
        assert!((micros_to_seconds(2_250_000) - 2.25).abs() < 1e-9);
    }
}
