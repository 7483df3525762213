use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::animation::wave::wave_transform;
use crate::assets::store::{ImageSlot, ImageStore};
use crate::foundation::core::{Affine, Canvas, Fps};
use crate::foundation::error::AnimResult;
use crate::render::frame_loop::FrameLoop;
use crate::render::surface::{FrameRGBA, ImagePaint, Surface};
use crate::settings::shared::SharedSettings;
use crate::traits::resolver::LayerStack;

/// The continuous layer compositor.
///
/// Holds the drawing surface, decoded images for the current [`LayerStack`] and the wave flag.
/// Each frame clears to the background color and paints every layer in rank order, rotating
/// wave targets about the canvas center.
pub struct RenderSession {
    surface: Surface,
    store: ImageStore,
    stack: Arc<LayerStack>,
    paints: Vec<Option<ImagePaint>>,
    wave: Vec<bool>,
    wave_enabled: bool,
    settings: SharedSettings,
    frame_loop: Option<FrameLoop>,
    last_frame: Option<Arc<FrameRGBA>>,
}

impl RenderSession {
    /// Session drawing onto a `canvas`-sized surface, reading images below `assets_root`.
    pub fn new(
        canvas: Canvas,
        assets_root: impl Into<PathBuf>,
        settings: SharedSettings,
    ) -> AnimResult<Self> {
        Ok(Self {
            surface: Surface::new(canvas)?,
            store: ImageStore::new(assets_root),
            stack: Arc::new(LayerStack::default()),
            paints: Vec::new(),
            wave: Vec::new(),
            wave_enabled: true,
            settings,
            frame_loop: None,
            last_frame: None,
        })
    }

    /// Surface size.
    pub fn canvas(&self) -> Canvas {
        self.surface.canvas()
    }

    /// Replace the layer stack.
    ///
    /// Images are decoded before the swap, so a frame never mixes two stacks. Layers whose image
    /// fails to load stay in place and draw nothing.
    #[tracing::instrument(skip_all, fields(layers = stack.len()))]
    pub fn set_layers(&mut self, stack: LayerStack) {
        let slots = self.store.load_stack(&stack);
        let paints = slots
            .iter()
            .zip(stack.layers())
            .map(|(slot, layer)| match slot {
                ImageSlot::Ready(img) => match ImagePaint::from_prepared(img) {
                    Ok(p) => Some(p),
                    Err(e) => {
                        tracing::warn!(path = %layer.image_source, error = %e, "layer image unusable, drawing blank");
                        None
                    }
                },
                ImageSlot::Blank => None,
            })
            .collect::<Vec<_>>();
        let wave = stack
            .layers()
            .iter()
            .map(|l| l.is_wave_target())
            .collect();
        let blank = paints.iter().filter(|p| p.is_none()).count();
        tracing::debug!(blank, "layer stack ready");

        self.paints = paints;
        self.wave = wave;
        self.stack = Arc::new(stack);
        self.last_frame = None;
    }

    /// Current layer stack.
    pub fn layers(&self) -> Arc<LayerStack> {
        Arc::clone(&self.stack)
    }

    /// Turn the arm-wave rotation on or off.
    pub fn set_wave_enabled(&mut self, enabled: bool) {
        self.wave_enabled = enabled;
    }

    /// Whether the arm-wave rotation is applied.
    pub fn wave_enabled(&self) -> bool {
        self.wave_enabled
    }

    /// Paint one frame at `t_secs` of loop time. Never fails; unusable layers are skipped.
    pub fn render_frame(&mut self, t_secs: f64) -> Arc<FrameRGBA> {
        let background = self.settings.snapshot().background_color;
        let wave = if self.wave_enabled {
            wave_transform(t_secs, self.surface.canvas().center())
        } else {
            Affine::IDENTITY
        };

        self.surface.begin();
        self.surface.fill_background(background);
        for (paint, waves) in self.paints.iter().zip(&self.wave) {
            let Some(paint) = paint else {
                continue;
            };
            let transform = if *waves { wave } else { Affine::IDENTITY };
            self.surface.draw_image_fill(paint, transform);
        }

        let frame = Arc::new(self.surface.finish());
        self.last_frame = Some(Arc::clone(&frame));
        frame
    }

    /// Most recent frame painted from the current layer stack.
    pub fn last_frame(&self) -> Option<Arc<FrameRGBA>> {
        self.last_frame.clone()
    }

    /// Start the frame loop at `now`.
    pub fn start(&mut self, fps: Fps, now: Duration) {
        if let Some(l) = &mut self.frame_loop {
            l.cancel();
        }
        self.frame_loop = Some(FrameLoop::start(fps, now));
    }

    /// When the next frame is due, if the loop is running.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.frame_loop.as_ref().and_then(FrameLoop::next_deadline)
    }

    /// Whether the loop is running.
    pub fn is_running(&self) -> bool {
        self.frame_loop.as_ref().is_some_and(FrameLoop::is_running)
    }

    /// Render a frame if one is due at `now`.
    pub fn tick(&mut self, now: Duration) -> Option<Arc<FrameRGBA>> {
        let tick = self.frame_loop.as_mut()?.tick(now)?;
        Some(self.render_frame(tick.elapsed.as_secs_f64()))
    }

    /// Cancel the loop and release decoded images. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(l) = &mut self.frame_loop {
            l.cancel();
        }
        self.frame_loop = None;
        self.paints.clear();
        self.wave.clear();
        self.store.clear();
        self.last_frame = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
