//! The interactive speech bubble: where it sits, how big it is, and pointer dragging.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::foundation::core::{Canvas, Point, Rect, Size, Vec2};
use crate::foundation::error::{AnimError, AnimResult};
use crate::settings::color::CssColor;

/// Full blink period of the typing cursor.
pub const CURSOR_BLINK_PERIOD: Duration = Duration::from_millis(700);

/// Space kept between the canvas edge and the largest allowed bubble.
const CANVAS_MARGIN: f64 = 40.0;
/// Horizontal room reserved around the text, before scaling.
const TEXT_ROOM: f64 = 60.0;
const MAX_BODY_HEIGHT: f64 = 100.0;
const MIN_BODY_HEIGHT: f64 = 50.0;

/// Look of the speech bubble. Lengths are in canvas pixels before `scale`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleStyle {
    /// Text size.
    pub font_size: f64,
    /// Narrowest bubble body.
    pub min_width: f64,
    /// Widest bubble body.
    pub max_width: f64,
    /// Minimum distance between the bubble and the canvas edge.
    pub padding: f64,
    /// Corner radius of the body.
    pub corner_radius: f64,
    /// Half-width of the tail base.
    pub tail_width: f64,
    /// Height of the tail below the body.
    pub tail_height: f64,
    /// Uniform scale applied to the layout constants.
    pub scale: f64,
    /// Top-left corner before the first clamp.
    pub initial_position: Point,
    /// Body fill.
    pub fill: CssColor,
    /// One-pixel outline.
    pub stroke: CssColor,
    /// Text color.
    pub text_color: CssColor,
}

impl Default for BubbleStyle {
    fn default() -> Self {
        Self {
            font_size: 18.0,
            min_width: 80.0,
            max_width: 300.0,
            padding: 20.0,
            corner_radius: 10.0,
            tail_width: 10.0,
            tail_height: 15.0,
            scale: 1.0,
            initial_position: Point::new(20.0, 300.0),
            fill: CssColor::WHITE,
            stroke: CssColor::rgb(0xcc, 0xcc, 0xcc),
            text_color: CssColor::BLACK,
        }
    }
}

impl BubbleStyle {
    /// Validate sizes.
    pub fn validate(&self) -> AnimResult<()> {
        let positive = [
            ("font_size", self.font_size),
            ("min_width", self.min_width),
            ("max_width", self.max_width),
            ("scale", self.scale),
        ];
        for (name, v) in positive {
            if !v.is_finite() || v <= 0.0 {
                return Err(AnimError::validation(format!(
                    "bubble {name} must be finite and > 0"
                )));
            }
        }
        let non_negative = [
            ("padding", self.padding),
            ("corner_radius", self.corner_radius),
            ("tail_width", self.tail_width),
            ("tail_height", self.tail_height),
        ];
        for (name, v) in non_negative {
            if !v.is_finite() || v < 0.0 {
                return Err(AnimError::validation(format!(
                    "bubble {name} must be finite and >= 0"
                )));
            }
        }
        if self.min_width > self.max_width {
            return Err(AnimError::validation(
                "bubble min_width must not exceed max_width",
            ));
        }
        Ok(())
    }

    /// Scaled text size in pixels.
    pub fn font_px(&self) -> f64 {
        self.font_size * self.scale
    }

    /// Horizontal room reserved around the text.
    pub fn text_room(&self) -> f64 {
        TEXT_ROOM * self.scale
    }

    /// Width text is wrapped at on a canvas of this size.
    pub fn wrap_width(&self, canvas: Canvas) -> f64 {
        let body_max = self
            .max_width
            .min(f64::from(canvas.width) - CANVAS_MARGIN);
        (body_max - self.text_room()).max(1.0)
    }

    /// Bubble size for text of `text_size`.
    ///
    /// The body is the text plus reserved room, clamped to `[min_width, min(max_width, canvas -
    /// 40)]`, then widened by one font size. Height is twice the text height, capped at 100 and
    /// floored at 50 (both scaled).
    pub fn bubble_size(&self, text_size: Size, canvas: Canvas) -> Size {
        let s = self.scale;
        let max_w = self.max_width.min(f64::from(canvas.width) - CANVAS_MARGIN);
        let max_h = f64::from(canvas.height) - CANVAS_MARGIN;

        let body_w = (text_size.width + TEXT_ROOM * s)
            .max(self.min_width)
            .min(max_w);
        let body_h = (text_size.height * 2.0 * s)
            .min((MAX_BODY_HEIGHT * s).min(max_h))
            .max(MIN_BODY_HEIGHT * s);

        Size::new(body_w + self.font_size * s, body_h)
    }
}

/// Position and drag state of the on-screen bubble.
#[derive(Clone, Debug, PartialEq)]
pub struct BubbleOverlay {
    canvas: Canvas,
    style: BubbleStyle,
    position: Point,
    size: Size,
    drag_offset: Option<Vec2>,
}

impl BubbleOverlay {
    /// Overlay at the style's initial position with an empty-text size.
    pub fn new(canvas: Canvas, style: BubbleStyle) -> Self {
        let size = style.bubble_size(Size::ZERO, canvas);
        let mut overlay = Self {
            canvas,
            position: style.initial_position,
            style,
            size,
            drag_offset: None,
        };
        overlay.position = overlay.clamp(overlay.position);
        overlay
    }

    /// Style in use.
    pub fn style(&self) -> &BubbleStyle {
        &self.style
    }

    /// Top-left corner.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Current bubble size (body plus tail room).
    pub fn size(&self) -> Size {
        self.size
    }

    /// Bounds on the canvas.
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    /// Keep a top-left corner inside the canvas minus padding.
    ///
    /// When the bubble is wider than the room available, it is pinned to the padding.
    pub fn clamp(&self, p: Point) -> Point {
        let pad = self.style.padding;
        let max_x = f64::from(self.canvas.width) - self.size.width - pad;
        let max_y = f64::from(self.canvas.height) - self.size.height - pad;
        Point::new(p.x.min(max_x).max(pad), p.y.min(max_y).max(pad))
    }

    /// Recompute the size for new text metrics and re-clamp the position.
    pub fn set_text_size(&mut self, text_size: Size) {
        let size = self.style.bubble_size(text_size, self.canvas);
        if size != self.size {
            self.size = size;
            self.position = self.clamp(self.position);
        }
    }

    /// Begin a drag if `pointer` is on the bubble.
    pub fn drag_start(&mut self, pointer: Point) -> bool {
        if !self.rect().contains(pointer) {
            return false;
        }
        self.drag_offset = Some(pointer - self.position);
        true
    }

    /// Follow the pointer while dragging.
    pub fn drag_move(&mut self, pointer: Point) {
        if let Some(offset) = self.drag_offset {
            self.position = self.clamp(pointer - offset);
        }
    }

    /// Finish dragging.
    pub fn drag_end(&mut self) {
        self.drag_offset = None;
    }

    /// Whether a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag_offset.is_some()
    }

    /// Position the recorder draws the bubble at: horizontally centered, at the top padding.
    pub fn recentered(&self) -> Point {
        let x = (f64::from(self.canvas.width) - self.size.width) / 2.0;
        self.clamp(Point::new(x, self.style.padding))
    }
}

/// Whether the typing cursor is lit at `elapsed`. It is hidden once typing is complete.
pub fn cursor_visible(elapsed: Duration, typing_complete: bool) -> bool {
    if typing_complete {
        return false;
    }
    let period = CURSOR_BLINK_PERIOD.as_nanos();
    elapsed.as_nanos() % period < period / 2
}

#[cfg(test)]
#[path = "../tests/unit/overlay/overlay.rs"]
mod tests;
