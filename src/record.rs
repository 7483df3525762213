use std::path::PathBuf;
use std::time::Duration;

use crate::animation::bubble::{BubbleScript, BubbleTicker};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Affine, Canvas, Fps, FrameIndex, Rect};
use crate::foundation::error::{AnimError, AnimResult};
use crate::overlay::{BubbleOverlay, BubbleStyle};
use crate::render::bubble_paint::BubblePainter;
use crate::render::frame_loop::FrameLoop;
use crate::render::surface::{FrameRGBA, ImagePaint, Surface};
use crate::settings::shared::{AnimationSettings, SettingsFreeze, SharedSettings};

/// Whether a recording is in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecorderState {
    /// Ready to start.
    Idle,
    /// Frames are being captured.
    Recording,
}

/// Outcome of a finished recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordingSummary {
    /// Frames handed to the sink.
    pub frames: u64,
    /// Recorded wall time.
    pub duration: Duration,
    /// Where the sink wrote the clip, when it writes to disk.
    pub out_path: Option<PathBuf>,
}

/// What a recorder tick did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordTick {
    /// No session is active.
    Idle,
    /// Still recording; `frames` pushed so far.
    Recording {
        /// Frames pushed so far.
        frames: u64,
    },
    /// The scheduled stop fired and the clip was finalized.
    Finished(RecordingSummary),
}

/// Length of a recording for `settings`: two typing cycles when looping, one otherwise.
pub fn recording_duration(settings: &AnimationSettings) -> Duration {
    let cycle = AnimationSettings::clamp_duration(settings.typing_duration_secs);
    let cycles = if settings.is_typing_loop { 2.0 } else { 1.0 };
    Duration::from_secs_f64(cycle * cycles)
}

/// File name for a clip started at `unix_ms`: `<stem>_<unix_ms>.<ext>`.
pub fn recording_file_name(stem: &str, unix_ms: u128, ext: &str) -> String {
    format!("{stem}_{unix_ms}.{ext}")
}

struct ActiveRecording {
    sink: Box<dyn FrameSink>,
    _freeze: SettingsFreeze,
    settings: AnimationSettings,
    ticker: BubbleTicker,
    frame_loop: FrameLoop,
    surface: Surface,
    overlay: BubbleOverlay,
    duration: Duration,
    stop_at: Duration,
    frames: u64,
    out_path: Option<PathBuf>,
}

/// Captures composited frames plus a redrawn bubble into a [`FrameSink`].
///
/// At most one session runs at a time. While it runs, the bubble text in [`SharedSettings`] is
/// frozen and the recorder animates its own copy of the typing effect on its own timer.
pub struct Recorder {
    canvas: Canvas,
    fps: Fps,
    style: BubbleStyle,
    painter: BubblePainter,
    active: Option<ActiveRecording>,
}

impl Recorder {
    /// Recorder producing `canvas`-sized frames at `fps`.
    pub fn new(canvas: Canvas, fps: Fps, style: BubbleStyle, painter: BubblePainter) -> Self {
        Self {
            canvas,
            fps,
            style,
            painter,
            active: None,
        }
    }

    /// Idle or recording.
    pub fn state(&self) -> RecorderState {
        if self.active.is_some() {
            RecorderState::Recording
        } else {
            RecorderState::Idle
        }
    }

    /// `true` while a session is active.
    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Frame rate of recorded clips.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Start a session at `now`.
    ///
    /// Fails with [`AnimError::RecordingBusy`] while another session is active. If the sink cannot
    /// begin, it is aborted and the recorder stays idle.
    #[tracing::instrument(skip_all, fields(out = ?out_path))]
    pub fn start(
        &mut self,
        settings: &SharedSettings,
        mut sink: Box<dyn FrameSink>,
        out_path: Option<PathBuf>,
        now: Duration,
    ) -> AnimResult<()> {
        if self.active.is_some() {
            tracing::warn!("recording already in progress, start rejected");
            return Err(AnimError::RecordingBusy);
        }

        let (freeze, snapshot) = settings.freeze();
        let duration = recording_duration(&snapshot);
        let surface = Surface::new(self.canvas)?;

        let cfg = SinkConfig {
            width: self.canvas.width,
            height: self.canvas.height,
            fps: self.fps,
        };
        if let Err(e) = sink.begin(cfg) {
            sink.abort();
            tracing::warn!(error = %e, "encoder failed to start");
            return Err(e);
        }

        let planned = self.fps.secs_to_frames_round(duration.as_secs_f64());
        tracing::info!(
            frames = planned,
            duration_ms = duration.as_millis() as u64,
            looping = snapshot.is_typing_loop,
            "recording started"
        );

        let ticker = BubbleTicker::start(BubbleScript::from_settings(&snapshot), now);
        self.active = Some(ActiveRecording {
            sink,
            _freeze: freeze,
            ticker,
            frame_loop: FrameLoop::start(self.fps, now),
            surface,
            overlay: BubbleOverlay::new(self.canvas, self.style.clone()),
            settings: snapshot,
            duration,
            stop_at: now + duration,
            frames: 0,
            out_path,
        });
        Ok(())
    }

    /// Earliest time the recorder needs another tick: the next frame or the scheduled stop.
    pub fn next_deadline(&self) -> Option<Duration> {
        let active = self.active.as_ref()?;
        Some(match active.frame_loop.next_deadline() {
            Some(frame) => frame.min(active.stop_at),
            None => active.stop_at,
        })
    }

    /// Advance the session to `now`.
    ///
    /// `source` is the compositor's latest frame; when absent only the background and bubble are
    /// drawn. Once the scheduled stop is due, the frame falling on the stop itself is captured and
    /// the clip is finalized, so a single typing cycle ends on the completed text. An encoder error
    /// aborts the session, discards its output and returns the recorder to idle.
    pub fn tick(&mut self, now: Duration, source: Option<&FrameRGBA>) -> AnimResult<RecordTick> {
        let Some(active) = self.active.as_mut() else {
            return Ok(RecordTick::Idle);
        };

        if now >= active.stop_at {
            let stop_at = active.stop_at;
            if let Some(tick) = active.frame_loop.tick(stop_at) {
                self.capture(tick.frame, stop_at, source)?;
            }
            return self.finish(true).map(|summary| match summary {
                Some(summary) => RecordTick::Finished(summary),
                None => RecordTick::Idle,
            });
        }

        let Some(tick) = active.frame_loop.tick(now) else {
            return Ok(RecordTick::Recording {
                frames: active.frames,
            });
        };
        let frames = self.capture(tick.frame, now, source)?;
        Ok(RecordTick::Recording { frames })
    }

    fn capture(
        &mut self,
        idx: FrameIndex,
        at: Duration,
        source: Option<&FrameRGBA>,
    ) -> AnimResult<u64> {
        let Some(active) = self.active.as_mut() else {
            return Ok(0);
        };
        active.ticker.poll(at);
        let frame = paint_frame(&mut self.painter, active, source);
        if let Err(e) = active.sink.push_frame(idx, &frame) {
            self.abort_with(&e);
            return Err(e);
        }
        active.frames += 1;
        Ok(active.frames)
    }

    /// Stop now and keep what was captured.
    ///
    /// Cancels the scheduled stop. Returns `Ok(None)` when nothing was recording, so calling it
    /// twice is safe.
    pub fn stop(&mut self) -> AnimResult<Option<RecordingSummary>> {
        self.finish(false)
    }

    /// Stop now and discard the output. Safe to call repeatedly.
    pub fn abort(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.frame_loop.cancel();
            active.ticker.cancel();
            active.sink.abort();
            tracing::warn!(frames = active.frames, "recording aborted");
        }
    }

    fn abort_with(&mut self, err: &AnimError) {
        tracing::error!(error = %err, "encoder failed, discarding recording");
        self.abort();
    }

    fn finish(&mut self, completed: bool) -> AnimResult<Option<RecordingSummary>> {
        let Some(mut active) = self.active.take() else {
            return Ok(None);
        };
        active.frame_loop.cancel();
        active.ticker.cancel();

        if let Err(e) = active.sink.end() {
            active.sink.abort();
            tracing::error!(error = %e, frames = active.frames, "encoder failed to finalize");
            return Err(e);
        }

        let summary = RecordingSummary {
            frames: active.frames,
            duration: if completed {
                active.duration
            } else {
                Duration::from_secs_f64(self.fps.frames_to_secs(active.frames)).min(active.duration)
            },
            out_path: active.out_path.take(),
        };
        tracing::info!(
            frames = summary.frames,
            dropped = active.frame_loop.frames_dropped(),
            "recording finished"
        );
        Ok(Some(summary))
    }
}

fn paint_frame(
    painter: &mut BubblePainter,
    active: &mut ActiveRecording,
    source: Option<&FrameRGBA>,
) -> FrameRGBA {
    let canvas = active.surface.canvas();
    active.surface.begin();
    active
        .surface
        .fill_background(active.settings.background_color);

    if let Some(source) = source {
        match ImagePaint::from_frame(source) {
            Ok(paint) => active.surface.draw_image_fill(&paint, Affine::IDENTITY),
            Err(e) => tracing::warn!(error = %e, "compositor frame unusable, skipping"),
        }
    }

    let text = active.ticker.visible_text().to_owned();
    let style = active.overlay.style().clone();
    let text_size = painter.measure(&text, &style, canvas);
    active.overlay.set_text_size(text_size);
    let rect = Rect::from_origin_size(active.overlay.recentered(), active.overlay.size());
    painter.paint(&mut active.surface, rect, &text, &style, false);

    active.surface.finish()
}

#[cfg(test)]
#[path = "../tests/unit/record/record.rs"]
mod tests;
