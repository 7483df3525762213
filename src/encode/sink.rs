use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::AnimResult;
use crate::render::surface::FrameRGBA;

/// Configuration provided to a [`FrameSink`] when a recording starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

/// Consumer of recorded frames.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order. A session
/// ends with exactly one of `end` (keep the output) or `abort` (discard it).
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> AnimResult<()>;
    /// Push one frame in strictly increasing order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> AnimResult<()>;
    /// Finalize the output.
    fn end(&mut self) -> AnimResult<()>;
    /// Stop without producing output. Must be safe to call after a failure and more than once.
    fn abort(&mut self);
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    ended: bool,
    aborted: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    /// Whether `end` completed.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Whether the output was discarded.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> AnimResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> AnimResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> AnimResult<()> {
        self.ended = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.frames.clear();
        self.aborted = true;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
