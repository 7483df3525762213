use kurbo::Shape;

use crate::assets::store::{TextBrushRgba8, TextLayoutEngine};
use crate::foundation::core::{Affine, BezPath, Canvas, Point, Rect, Size};
use crate::overlay::BubbleStyle;
use crate::render::surface::{Surface, affine_to_cpu};

const CURVE_TOLERANCE: f64 = 0.1;
/// Distance from the body's left edge to the start of the tail base.
const TAIL_INSET: f64 = 10.0;
const CURSOR_WIDTH: f64 = 2.0;

/// Outline of a bubble occupying `rect`: a rounded body with a tail hanging from its lower left.
///
/// The tail is carved out of the bottom of `rect`, so the whole shape stays inside it.
pub fn bubble_path(rect: Rect, style: &BubbleStyle) -> BezPath {
    let s = style.scale;
    let tail_h = (style.tail_height * s).min(rect.height() / 2.0);
    let body = Rect::new(rect.x0, rect.y0, rect.x1, rect.y1 - tail_h);
    let radius = style
        .corner_radius
        .min(body.width() / 2.0)
        .min(body.height() / 2.0);

    let mut path = BezPath::new();
    for el in kurbo::RoundedRect::from_rect(body, radius).path_elements(CURVE_TOLERANCE) {
        path.push(el);
    }

    let base_left = body.x0 + TAIL_INSET.max(radius);
    let base_right = (base_left + 2.0 * style.tail_width * s).min(body.x1 - radius);
    let apex = Point::new((base_left + base_right) / 2.0, rect.y1);
    // Overlap the body by a pixel so the seam never shows.
    path.move_to(Point::new(base_right, body.y1 - 1.0));
    path.line_to(apex);
    path.line_to(Point::new(base_left, body.y1 - 1.0));
    path.close_path();
    path
}

/// Draws the bubble and its text with primitive fills.
///
/// Shared by the interactive preview and the recorder so both produce the same pixels.
pub struct BubblePainter {
    text: TextLayoutEngine,
}

impl BubblePainter {
    /// Painter using `text` for layout.
    pub fn new(text: TextLayoutEngine) -> Self {
        Self { text }
    }

    /// Whether glyphs will be drawn.
    pub fn has_font(&self) -> bool {
        self.text.has_font()
    }

    /// Size of `text` when wrapped for this canvas.
    pub fn measure(&mut self, text: &str, style: &BubbleStyle, canvas: Canvas) -> Size {
        self.text.measure(
            text,
            style.font_px() as f32,
            Some(style.wrap_width(canvas) as f32),
        )
    }

    /// Paint a bubble at `rect` showing `text`, optionally followed by the typing cursor.
    pub(crate) fn paint(
        &mut self,
        surface: &mut Surface,
        rect: Rect,
        text: &str,
        style: &BubbleStyle,
        cursor: bool,
    ) {
        let outer = bubble_path(rect, style);
        surface.fill_path(&outer, style.stroke);
        let inner = bubble_path(rect.inset(-1.0), style);
        surface.fill_path(&inner, style.fill);

        let s = style.scale;
        let tail_h = (style.tail_height * s).min(rect.height() / 2.0);
        let body = Rect::new(rect.x0, rect.y0, rect.x1, rect.y1 - tail_h);
        let text_w = (body.width() - style.text_room()).max(1.0);
        let font_px = style.font_px();
        let brush = TextBrushRgba8 {
            r: style.text_color.r,
            g: style.text_color.g,
            b: style.text_color.b,
            a: style.text_color.a,
        };

        let block = if text.is_empty() {
            None
        } else {
            match self.text.layout(text, font_px as f32, brush, Some(text_w as f32)) {
                Ok(block) => block,
                Err(e) => {
                    tracing::warn!(error = %e, "bubble text layout failed");
                    None
                }
            }
        };

        let origin_x = body.x0 + style.text_room() / 2.0;
        let Some(block) = block else {
            if cursor {
                let c = body.center();
                self.paint_cursor(surface, Point::new(c.x, c.y + font_px * 0.5), style);
            }
            return;
        };

        let origin_y = body.y0 + (body.height() - f64::from(block.layout.height())) / 2.0;
        let origin = Affine::translate((origin_x, origin_y));
        let mut caret = Point::new(body.center().x, origin_y + font_px);

        let ctx = surface.ctx_mut();
        ctx.set_transform(affine_to_cpu(origin));
        for line in block.layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let b = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(b.r, b.g, b.b, b.a));
                let glyphs: Vec<vello_cpu::Glyph> = run
                    .glyphs()
                    .map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    })
                    .collect();
                caret = Point::new(
                    origin_x + f64::from(run.offset() + run.advance()),
                    origin_y + f64::from(run.baseline()),
                );
                ctx.glyph_run(&block.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs.into_iter());
            }
        }

        if cursor {
            self.paint_cursor(surface, caret, style);
        }
    }

    /// Vertical bar whose baseline sits at `at`.
    fn paint_cursor(&self, surface: &mut Surface, at: Point, style: &BubbleStyle) {
        let h = style.font_px();
        let bar = Rect::new(
            at.x + 1.0,
            at.y - h * 0.8,
            at.x + 1.0 + CURSOR_WIDTH,
            at.y + h * 0.2,
        );
        surface.fill_path(&bar.to_path(CURVE_TOLERANCE), style.text_color);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/bubble_paint.rs"]
mod tests;
