//! Fixed-rate frame scheduling.
//!
//! [`FrameLoop`] stands in for a vsync callback: the driver asks for the next deadline, waits on a
//! [`FrameClock`] and then calls [`FrameLoop::tick`].

use std::time::{Duration, Instant};

use crate::foundation::core::{FrameIndex, Fps};

/// Source of monotonic time, measured from the clock's own origin.
pub trait FrameClock {
    /// Time elapsed since the origin.
    fn now(&self) -> Duration;

    /// Block (or jump) until `deadline`.
    fn wait_until(&mut self, deadline: Duration);
}

/// Real time; `wait_until` sleeps.
#[derive(Clone, Copy, Debug)]
pub struct WallClock {
    origin: Instant,
}

impl WallClock {
    /// Clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for WallClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn wait_until(&mut self, deadline: Duration) {
        let now = self.now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
    }
}

/// Virtual time that only moves when waited on. Used for frame-exact offline export and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SteppedClock {
    now: Duration,
}

impl SteppedClock {
    /// Clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move forward by `by`.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

impl FrameClock for SteppedClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn wait_until(&mut self, deadline: Duration) {
        self.now = self.now.max(deadline);
    }
}

/// One frame the loop decided to render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameTick {
    /// Index since the loop started.
    pub frame: FrameIndex,
    /// Scheduled time of this frame relative to the loop start.
    pub elapsed: Duration,
    /// Frames skipped because the driver fell behind.
    pub dropped: u64,
}

/// Cancellable fixed-rate frame schedule.
///
/// Frame `n` is due at `start + n / fps`, computed from the index so virtual clocks never drift.
/// When the driver is late, intermediate frames are dropped rather than replayed.
#[derive(Clone, Debug)]
pub struct FrameLoop {
    fps: Fps,
    start: Duration,
    next: u64,
    cancelled: bool,
    rendered: u64,
    dropped: u64,
}

impl FrameLoop {
    /// Loop whose first frame is due at `now`.
    pub fn start(fps: Fps, now: Duration) -> Self {
        Self {
            fps,
            start: now,
            next: 0,
            cancelled: false,
            rendered: 0,
            dropped: 0,
        }
    }

    /// Frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    fn due(&self, frame: u64) -> Duration {
        let nanos = u128::from(frame) * u128::from(self.fps.den) * 1_000_000_000
            / u128::from(self.fps.num.max(1));
        self.start + Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// When the next frame is due, or `None` once cancelled.
    pub fn next_deadline(&self) -> Option<Duration> {
        (!self.cancelled).then(|| self.due(self.next))
    }

    /// Returns the frame to render if one is due at `now`.
    pub fn tick(&mut self, now: Duration) -> Option<FrameTick> {
        if self.cancelled || now < self.due(self.next) {
            return None;
        }

        let mut frame = self.next;
        while now >= self.due(frame + 1) {
            frame += 1;
        }
        let dropped = frame - self.next;

        self.next = frame + 1;
        self.rendered += 1;
        self.dropped += dropped;

        Some(FrameTick {
            frame: FrameIndex(frame),
            elapsed: self.due(frame) - self.start,
            dropped,
        })
    }

    /// Stop scheduling. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        if !self.cancelled {
            tracing::debug!(
                rendered = self.rendered,
                dropped = self.dropped,
                "frame loop cancelled"
            );
        }
        self.cancelled = true;
    }

    /// `false` after [`FrameLoop::cancel`].
    pub fn is_running(&self) -> bool {
        !self.cancelled
    }

    /// Frames handed out so far.
    pub fn frames_rendered(&self) -> u64 {
        self.rendered
    }

    /// Frames skipped so far.
    pub fn frames_dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame_loop.rs"]
mod tests;
