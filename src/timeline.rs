//! Wall-clock timeline: maps the `[last, current]` frame interval onto each
//! curve's visibility window and yields the parametric sub-range to draw.
//!
//! Emission is incremental: the host accumulates draw output onto a
//! persistent target, so a curve whose window elapsed entirely before this
//! frame emits nothing.

use crate::core::{SweepRange, TimeMs, TimeWindow};

#[derive(Clone, Copy, Debug, Default)]
pub struct Timeline {
    epoch: Option<TimeMs>,
    last: TimeMs,
    current: TimeMs,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets the epoch; the next `begin_frame` starts a fresh reveal.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_started(&self) -> bool {
        self.epoch.is_some()
    }

    /// Samples the frame clock. The first call after a reset pins the epoch,
    /// so elapsed time is zero on the first frame. Non-monotonic input is
    /// clamped forward rather than propagated.
    pub fn begin_frame(&mut self, now: TimeMs) {
        match self.epoch {
            None => {
                self.epoch = Some(now);
                self.last = now;
                self.current = now;
            }
            Some(_) => {
                self.last = self.current;
                self.current = TimeMs(now.0.max(self.current.0));
            }
        }
    }

    pub fn elapsed(&self) -> u64 {
        match self.epoch {
            Some(epoch) => self.current.saturating_sub(epoch),
            None => 0,
        }
    }

    /// Elapsed time at the previous frame sample.
    pub fn elapsed_prev(&self) -> u64 {
        match self.epoch {
            Some(epoch) => self.last.saturating_sub(epoch),
            None => 0,
        }
    }

    /// The visible sub-range of `window` for this frame, or `None` when the
    /// frame interval lies entirely outside the window.
    pub fn sweep(&self, window: TimeWindow) -> Option<SweepRange> {
        let Some(epoch) = self.epoch else {
            return None;
        };
        let diff_last = self.last.saturating_sub(epoch);
        let diff_cur = self.current.saturating_sub(epoch);
        let start = window.start;
        let end = window.end();

        // Not-yet-started straight to fully-drawn inside one frame.
        if diff_last <= start && diff_cur >= end {
            return Some(SweepRange::FULL);
        }

        // Instantaneous curves either hit the case above or stay invisible.
        if window.duration == 0 {
            return None;
        }

        let overlaps =
            |t: u64| -> bool { start <= t && t <= end };
        if overlaps(diff_last) || overlaps(diff_cur) {
            let d = window.duration as f64;
            let t0 = ((diff_last as f64 - start as f64) / d).clamp(0.0, 1.0);
            let t1 = ((diff_cur as f64 - start as f64) / d).clamp(0.0, 1.0);
            return Some(SweepRange { t0, t1 });
        }

        None
    }

    /// True while `window`'s end still lies in the future; this is the only
    /// driver of whether another frame must be scheduled.
    pub fn pending(&self, window: TimeWindow) -> bool {
        match self.epoch {
            Some(epoch) => window.end() > self.current.saturating_sub(epoch),
            None => true,
        }
    }
}
