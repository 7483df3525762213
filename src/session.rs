use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::animation::bubble::{BubbleScript, BubbleTicker};
use crate::assets::store::TextLayoutEngine;
use crate::config::StudioConfig;
use crate::controls::{Controls, RecordButton};
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::FrameSink;
use crate::foundation::core::{Affine, Fps};
use crate::foundation::error::{AnimError, AnimResult};
use crate::overlay::{BubbleOverlay, cursor_visible};
use crate::record::{RecordTick, Recorder, RecorderState, RecordingSummary, recording_file_name};
use crate::render::bubble_paint::BubblePainter;
use crate::render::compositor::RenderSession;
use crate::render::frame_loop::FrameClock;
use crate::render::surface::{FrameRGBA, ImagePaint, Surface};
use crate::settings::shared::SharedSettings;
use crate::traits::dictionary::{DirDictionarySource, TraitDictionaries};
use crate::traits::layer_key::LayerOrderTable;
use crate::traits::metadata::TokenMetadata;
use crate::traits::resolver::{LayerStack, TraitResolver};

/// What one [`Studio::step`] did.
#[derive(Clone, Debug)]
pub struct StepOutcome {
    /// Compositor frame painted during this step, if one was due.
    pub frame: Option<Arc<FrameRGBA>>,
    /// Whether the interactive bubble text changed.
    pub bubble_changed: bool,
    /// Recorder progress.
    pub recording: RecordTick,
}

/// Cooperative, single-threaded driver for one avatar.
///
/// Owns the compositor loop, the interactive bubble (typing ticker plus overlay) and the
/// recorder. Each [`Studio::step`] services whichever of them is due at the clock's current
/// time; [`Studio::next_deadline`] says when to call it again.
pub struct Studio<C: FrameClock> {
    config: StudioConfig,
    fps: Fps,
    clock: C,
    settings: SharedSettings,
    controls: Controls,
    dictionaries: TraitDictionaries,
    order: LayerOrderTable,
    compositor: RenderSession,
    overlay: BubbleOverlay,
    bubble: BubbleTicker,
    bubble_started: Duration,
    painter: BubblePainter,
    view: Option<Surface>,
    recorder: Recorder,
}

impl<C: FrameClock> Studio<C> {
    /// Studio reading dictionaries from the configured directory.
    pub fn new(config: StudioConfig, clock: C) -> AnimResult<Self> {
        let source = DirDictionarySource::new(config.dictionaries_dir());
        let dictionaries = TraitDictionaries::load(&source);
        Self::with_dictionaries(config, dictionaries, clock)
    }

    /// Studio using already-loaded dictionaries.
    pub fn with_dictionaries(
        config: StudioConfig,
        dictionaries: TraitDictionaries,
        clock: C,
    ) -> AnimResult<Self> {
        config.validate()?;
        let fps = config.frame_rate()?;
        let canvas = config.canvas();
        let order = config.order_table()?;

        let settings = SharedSettings::new(config.settings.clone());
        let controls = Controls::new(settings.clone());
        let compositor = RenderSession::new(canvas, &config.assets_root, settings.clone())?;

        let font = config.font_path.as_deref();
        let painter = BubblePainter::new(TextLayoutEngine::from_config(font, config.system_fonts));
        let recorder = Recorder::new(
            canvas,
            fps,
            config.bubble.clone(),
            BubblePainter::new(TextLayoutEngine::from_config(font, config.system_fonts)),
        );

        let now = clock.now();
        let bubble = BubbleTicker::start(BubbleScript::from_settings(&settings.snapshot()), now);
        let overlay = BubbleOverlay::new(canvas, config.bubble.clone());

        Ok(Self {
            config,
            fps,
            clock,
            settings,
            controls,
            dictionaries,
            order,
            compositor,
            overlay,
            bubble,
            bubble_started: now,
            painter,
            view: None,
            recorder,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    /// Shared animation settings.
    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    /// User controls writing the shared settings.
    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    /// The clock driving this studio.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Mutable clock access, e.g. to advance a stepped clock.
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// The layer compositor.
    pub fn compositor(&self) -> &RenderSession {
        &self.compositor
    }

    /// Interactive bubble placement.
    pub fn overlay(&self) -> &BubbleOverlay {
        &self.overlay
    }

    /// Interactive bubble placement, for dragging.
    pub fn overlay_mut(&mut self) -> &mut BubbleOverlay {
        &mut self.overlay
    }

    /// Text currently shown by the interactive bubble.
    pub fn bubble_text(&self) -> &str {
        self.bubble.visible_text()
    }

    /// Recorder state.
    pub fn recorder_state(&self) -> RecorderState {
        self.recorder.state()
    }

    /// Record button for the current recorder state.
    pub fn record_button(&self) -> RecordButton {
        self.controls.record_button(self.recorder.state())
    }

    /// Whether bubble text glyphs can be drawn with the configured or system font.
    pub fn has_text_font(&self) -> bool {
        self.painter.has_font()
    }

    /// Turn the arm wave on or off.
    pub fn set_wave_enabled(&mut self, enabled: bool) {
        self.compositor.set_wave_enabled(enabled);
    }

    /// Resolve `metadata` and swap its layers into the compositor.
    ///
    /// Without a resolvable base figure the compositor is cleared and the error is returned.
    pub fn load_token(&mut self, metadata: &TokenMetadata) -> AnimResult<Arc<LayerStack>> {
        let resolver = TraitResolver::new(&self.dictionaries, &self.order);
        match resolver.resolve(metadata) {
            Ok(stack) => {
                tracing::info!(layers = stack.len(), "token loaded");
                self.compositor.set_layers(stack);
                Ok(self.compositor.layers())
            }
            Err(e) => {
                tracing::warn!(error = %e, "token not renderable, clearing layers");
                self.compositor.set_layers(LayerStack::default());
                Err(e)
            }
        }
    }

    /// Swap in an already-resolved stack.
    pub fn set_layers(&mut self, stack: LayerStack) {
        self.compositor.set_layers(stack);
    }

    /// Start the compositor loop at the current time. Restarts it if already running.
    pub fn start(&mut self) {
        let now = self.clock.now();
        self.compositor.start(self.fps, now);
    }

    /// Earliest time any ticker needs service.
    pub fn next_deadline(&self) -> Option<Duration> {
        [
            self.compositor.next_deadline(),
            self.bubble.next_deadline(),
            self.recorder.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Service every ticker due at the clock's current time.
    ///
    /// Only an encoder failure is returned as an error; the recorder is already back to idle when
    /// that happens.
    pub fn step(&mut self) -> AnimResult<StepOutcome> {
        let now = self.clock.now();
        let frame = self.compositor.tick(now);
        let bubble_changed = self.sync_bubble(now);
        let source = self.compositor.last_frame();
        let recording = self.recorder.tick(now, source.as_deref())?;
        Ok(StepOutcome {
            frame,
            bubble_changed,
            recording,
        })
    }

    /// Wait for the next deadline and step.
    pub fn wait_and_step(&mut self) -> AnimResult<StepOutcome> {
        if let Some(deadline) = self.next_deadline() {
            self.clock.wait_until(deadline);
        }
        self.step()
    }

    /// Start recording into `sink`. Starts the compositor loop if it is not running.
    pub fn start_recording(
        &mut self,
        sink: Box<dyn FrameSink>,
        out_path: Option<PathBuf>,
    ) -> AnimResult<()> {
        if !self.compositor.is_running() {
            self.start();
        }
        let now = self.clock.now();
        self.recorder.start(&self.settings, sink, out_path, now)
    }

    /// Stop the recording now, keeping what was captured.
    pub fn stop_recording(&mut self) -> AnimResult<Option<RecordingSummary>> {
        self.recorder.stop()
    }

    /// Record into `sink` and drive every ticker until the scheduled stop.
    pub fn record_with(
        &mut self,
        sink: Box<dyn FrameSink>,
        out_path: Option<PathBuf>,
    ) -> AnimResult<RecordingSummary> {
        self.start_recording(sink, out_path)?;
        loop {
            match self.wait_and_step()?.recording {
                RecordTick::Finished(summary) => return Ok(summary),
                RecordTick::Recording { .. } => {}
                RecordTick::Idle => {
                    return Err(AnimError::encoder("recording ended before its scheduled stop"));
                }
            }
        }
    }

    /// Path a recording started at `unix_ms` is written to.
    pub fn output_path(&self, unix_ms: u128) -> PathBuf {
        self.config.output_dir.join(recording_file_name(
            &self.config.file_stem,
            unix_ms,
            self.config.encoder.container.extension(),
        ))
    }

    /// Record a clip to the output directory with `ffmpeg`.
    pub fn record_to_file(&mut self) -> AnimResult<RecordingSummary> {
        let unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let out_path = self.output_path(unix_ms);
        let opts = FfmpegSinkOpts {
            out_path: out_path.clone(),
            encoder: self.config.encoder,
            bg_rgba: self.settings.snapshot().background_color.to_rgba8(),
        };
        self.record_with(Box::new(FfmpegSink::new(opts)), Some(out_path))
    }

    /// Latest compositor frame with the interactive bubble on top.
    pub fn interactive_frame(&mut self) -> AnimResult<Option<FrameRGBA>> {
        let Some(base) = self.compositor.last_frame() else {
            return Ok(None);
        };
        let elapsed = self.clock.now().saturating_sub(self.bubble_started);
        let cursor = cursor_visible(elapsed, self.bubble.state().is_complete());
        let text = self.bubble.visible_text().to_owned();
        self.compose_bubble(&base, &text, cursor).map(Some)
    }

    /// Render the avatar at `t_secs` of loop time with the bubble as the interactive view would
    /// show it at that time.
    ///
    /// Looping text repeats every cycle, so any representable time renders in constant time.
    pub fn preview_frame(&mut self, t_secs: f64) -> AnimResult<FrameRGBA> {
        if !t_secs.is_finite() || t_secs < 0.0 {
            return Err(AnimError::validation("preview time must be finite and >= 0"));
        }
        let at = Duration::try_from_secs_f64(t_secs)
            .map_err(|e| AnimError::validation(format!("preview time {t_secs}s: {e}")))?;
        let script = BubbleScript::from_settings(&self.settings.snapshot());
        let phase = script.phase_time(at);
        let mut ticker = BubbleTicker::start(script, Duration::ZERO);
        ticker.poll(phase);
        let cursor = cursor_visible(phase, ticker.state().is_complete());

        let base = self.compositor.render_frame(t_secs);
        self.compose_bubble(&base, ticker.visible_text(), cursor)
    }

    /// Tear down: abort any recording, stop the loop and release images. Safe to call twice.
    pub fn stop(&mut self) {
        self.recorder.abort();
        self.bubble.cancel();
        self.compositor.stop();
        self.view = None;
    }

    fn sync_bubble(&mut self, now: Duration) -> bool {
        let script = BubbleScript::from_settings(&self.settings.snapshot());
        let mut changed = false;
        if &script != self.bubble.script() {
            self.bubble = BubbleTicker::start(script, now);
            self.bubble_started = now;
            changed = true;
        }
        changed |= self.bubble.poll(now);
        if changed {
            let canvas = self.compositor.canvas();
            let size = self
                .painter
                .measure(self.bubble.visible_text(), self.overlay.style(), canvas);
            self.overlay.set_text_size(size);
        }
        changed
    }

    fn compose_bubble(&mut self, base: &FrameRGBA, text: &str, cursor: bool) -> AnimResult<FrameRGBA> {
        let canvas = self.compositor.canvas();
        let style = self.overlay.style().clone();
        let size = self.painter.measure(text, &style, canvas);
        self.overlay.set_text_size(size);
        let rect = self.overlay.rect();

        let paint = ImagePaint::from_frame(base)?;
        let mut surface = match self.view.take() {
            Some(surface) => surface,
            None => Surface::new(canvas)?,
        };
        surface.begin();
        surface.draw_image_fill(&paint, Affine::IDENTITY);
        self.painter.paint(&mut surface, rect, text, &style, cursor);
        let frame = surface.finish();
        self.view = Some(surface);
        Ok(frame)
    }
}

#[cfg(test)]
#[path = "../tests/unit/session/session.rs"]
mod tests;
