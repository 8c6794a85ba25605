//! Window selection and timestamp rebasing for stream-copied packets
//!
//! Decisions are made on the input timeline in `AV_TIME_BASE` units so
//! streams with different time bases share one clock. The first packet
//! kept fixes the part's time origin; every kept packet then has that origin
//! subtracted (converted into its own stream's time base) and is rescaled
//! into the output stream's time base.

use ffmpeg_next as ffmpeg;

use crate::ffmpeg_utils::utils::{rescale_rnd, seconds_to_micros, MICROS};

/// Where a part starts and ends on the input timeline (`AV_TIME_BASE` units).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentWindow {
    /// First timestamp to keep
    pub start_us: i64,
    /// First timestamp not to keep; `None` reads to end of input
    pub end_us: Option<i64>,
}

impl SegmentWindow {
    /// Half-open window `[start, start + duration)`.
    pub fn new(start_secs: f64, duration_secs: f64) -> Self {
        let start_us = seconds_to_micros(start_secs);
        Self {
            start_us,
            end_us: Some(start_us.saturating_add(seconds_to_micros(duration_secs))),
        }
    }

    /// Window from `start` to end of input.
    pub fn open_ended(start_secs: f64) -> Self {
        Self {
            start_us: seconds_to_micros(start_secs),
            end_us: None,
        }
    }

    /// Shift the window onto a timeline that starts at `offset_us`.
    pub fn offset_by(self, offset_us: i64) -> Self {
        Self {
            start_us: self.start_us.saturating_add(offset_us),
            end_us: self.end_us.map(|end| end.saturating_add(offset_us)),
        }
    }
}

/// What to do with a packet read from the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketAction {
    /// Precedes the window (keyframe-seek overshoot): drop and keep reading
    BeforeWindow,
    /// Inside the window: rebase and write
    Keep,
    /// At or past the window's end: stop reading
    PastWindow,
}

/// Timing fields of one packet, in some stream's time base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub pts: Option<i64>,
    pub dts: Option<i64>,
    pub duration: i64,
}

impl Timing {
    pub fn of(packet: &ffmpeg::Packet) -> Self {
        Self {
            pts: packet.pts(),
            dts: packet.dts(),
            duration: packet.duration(),
        }
    }

    pub fn apply(&self, packet: &mut ffmpeg::Packet) {
        packet.set_pts(self.pts);
        packet.set_dts(self.dts);
        packet.set_duration(self.duration);
    }

    /// Timestamp used for window decisions: pts, falling back to dts.
    pub fn position(&self) -> Option<i64> {
        self.pts.or(self.dts)
    }
}

#[derive(Debug, Clone, Copy)]
struct Origin {
    ts: i64,
    time_base: ffmpeg::Rational,
}

impl Origin {
    fn in_time_base(&self, time_base: ffmpeg::Rational) -> i64 {
        if time_base == self.time_base {
            self.ts
        } else {
            rescale_rnd(self.ts, self.time_base, time_base)
        }
    }
}

/// Per-part packet filter and timestamp rewriter
#[derive(Debug)]
pub struct Rebaser {
    window: SegmentWindow,
    origin: Option<Origin>,
}

impl Rebaser {
    pub fn new(window: SegmentWindow) -> Self {
        Self {
            window,
            origin: None,
        }
    }

    /// Origin of the part on the input timeline, once the first packet was kept.
    pub fn origin_us(&self) -> Option<i64> {
        self.origin.map(|o| rescale_rnd(o.ts, o.time_base, MICROS))
    }

    /// Decide whether a packet with `timing` (in `time_base`) belongs to the part.
    ///
    /// Packets carrying no timestamp at all are kept once the origin is
    /// known and dropped before that.
    pub fn classify(&self, timing: &Timing, time_base: ffmpeg::Rational) -> PacketAction {
        let Some(ts) = timing.position() else {
            return if self.origin.is_some() {
                PacketAction::Keep
            } else {
                PacketAction::BeforeWindow
            };
        };

        let ts_us = rescale_rnd(ts, time_base, MICROS);
        if self.window.end_us.is_some_and(|end| ts_us >= end) {
            PacketAction::PastWindow
        } else if ts_us < self.window.start_us {
            PacketAction::BeforeWindow
        } else {
            PacketAction::Keep
        }
    }

    /// Rewrite a kept packet's timing from the input stream's time base into
    /// the output stream's, relative to the part origin.
    pub fn rebase(
        &mut self,
        timing: Timing,
        in_time_base: ffmpeg::Rational,
        out_time_base: ffmpeg::Rational,
    ) -> Timing {
        if self.origin.is_none() {
            if let Some(ts) = timing.position() {
                self.origin = Some(Origin {
                    ts,
                    time_base: in_time_base,
                });
            }
        }
        let origin = self
            .origin
            .map(|o| o.in_time_base(in_time_base))
            .unwrap_or(0);

        let shift = |ts: i64| rescale_rnd(ts.saturating_sub(origin), in_time_base, out_time_base);

        Timing {
            pts: timing.pts.map(shift),
            dts: timing.dts.map(shift),
            duration: rescale_rnd(timing.duration, in_time_base, out_time_base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(pts: i64, dts: i64, duration: i64) -> Timing {
        Timing {
            pts: Some(pts),
            dts: Some(dts),
            duration,
        }
    }

    #[test]
    fn test_window_bounds() {
        let w = SegmentWindow::new(4.0, 2.5);
        assert_eq!(w.start_us, 4_000_000);
        assert_eq!(w.end_us, Some(6_500_000));

        let w = SegmentWindow::open_ended(8.0).offset_by(1_400_000);
        assert_eq!(w.start_us, 9_400_000);
        assert_eq!(w.end_us, None);
    }

    #[test]
    fn test_classify_half_open_window() {
        let tb = ffmpeg::Rational::new(1, 25);
        let r = Rebaser::new(SegmentWindow::new(4.0, 4.0));

        assert_eq!(r.classify(&timing(99, 99, 1), tb), PacketAction::BeforeWindow);
        assert_eq!(r.classify(&timing(100, 100, 1), tb), PacketAction::Keep);
        assert_eq!(r.classify(&timing(199, 199, 1), tb), PacketAction::Keep);
        assert_eq!(r.classify(&timing(200, 200, 1), tb), PacketAction::PastWindow);
    }

    #[test]
    fn test_open_ended_window_never_stops() {
        let tb = ffmpeg::Rational::new(1, 1000);
        let r = Rebaser::new(SegmentWindow::open_ended(1.0));
        assert_eq!(r.classify(&timing(i64::MAX / 4, 0, 1), tb), PacketAction::Keep);
        assert_eq!(r.classify(&timing(999, 999, 1), tb), PacketAction::BeforeWindow);
    }

    #[test]
    fn test_classify_uses_dts_without_pts() {
        let tb = ffmpeg::Rational::new(1, 1000);
        let r = Rebaser::new(SegmentWindow::new(1.0, 1.0));
        let t = Timing {
            pts: None,
            dts: Some(1500),
            duration: 0,
        };
        assert_eq!(r.classify(&t, tb), PacketAction::Keep);
    }

    #[test]
    fn test_untimed_packets_follow_origin() {
        let tb = ffmpeg::Rational::new(1, 1000);
        let mut r = Rebaser::new(SegmentWindow::new(0.0, 10.0));
        let untimed = Timing {
            pts: None,
            dts: None,
            duration: 0,
        };
        assert_eq!(r.classify(&untimed, tb), PacketAction::BeforeWindow);

        r.rebase(timing(0, 0, 40), tb, tb);
        assert_eq!(r.classify(&untimed, tb), PacketAction::Keep);
        assert_eq!(r.rebase(untimed, tb, tb), untimed);
    }

    #[test]
    fn test_first_kept_packet_becomes_zero() {
        let tb = ffmpeg::Rational::new(1, 25);
        let mut r = Rebaser::new(SegmentWindow::new(4.0, 4.0));

        let first = r.rebase(timing(100, 100, 1), tb, tb);
        assert_eq!(first, timing(0, 0, 1));
        assert_eq!(r.origin_us(), Some(4_000_000));

        let next = r.rebase(timing(101, 101, 1), tb, tb);
        assert_eq!(next, timing(1, 1, 1));
    }

    #[test]
    fn test_origin_is_shared_across_time_bases() {
        let video_tb = ffmpeg::Rational::new(1, 25);
        let audio_tb = ffmpeg::Rational::new(1, 48000);
        let mut r = Rebaser::new(SegmentWindow::new(4.0, 4.0));

        // video keyframe at 4.0s fixes the origin
        r.rebase(timing(100, 100, 1), video_tb, video_tb);

        // audio at 4.5s lands at 0.5s in the part
        let audio = r.rebase(timing(216_000, 216_000, 1024), audio_tb, audio_tb);
        assert_eq!(audio, timing(24_000, 24_000, 1024));
    }

    #[test]
    fn test_rescale_into_output_time_base() {
        let in_tb = ffmpeg::Rational::new(1, 25);
        let out_tb = ffmpeg::Rational::new(1, 90000);
        let mut r = Rebaser::new(SegmentWindow::new(2.0, 2.0));

        r.rebase(timing(50, 50, 1), in_tb, out_tb);
        let t = r.rebase(timing(52, 51, 1), in_tb, out_tb);
        // pts/dts ordering survives the rescale
        assert_eq!(t, timing(7200, 3600, 3600));
    }
}
