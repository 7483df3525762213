use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::assets::decode::PreparedImage;
use crate::foundation::core::{Affine, BezPath, Canvas};
use crate::foundation::error::{AnimError, AnimResult};
use crate::foundation::math::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place};
use crate::settings::color::CssColor;

/// A rendered frame as RGBA8 pixels.
///
/// Frames are premultiplied alpha; `premultiplied` makes that explicit at API boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Pixel at `(x, y)`; out-of-range coordinates read as transparent.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0; 4];
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Straight-alpha copy of the pixel data.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut out);
        }
        out
    }

    /// Write the frame as a PNG.
    pub fn write_png(&self, path: &Path) -> AnimResult<()> {
        let img = image::RgbaImage::from_raw(self.width, self.height, self.to_straight_rgba())
            .ok_or_else(|| AnimError::validation("frame byte length does not match its size"))?;
        img.save(path)
            .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

/// Paint for an image together with its natural size.
#[derive(Clone)]
pub(crate) struct ImagePaint {
    pub(crate) paint: vello_cpu::Image,
    pub(crate) w: u32,
    pub(crate) h: u32,
}

impl ImagePaint {
    pub(crate) fn from_prepared(img: &PreparedImage) -> AnimResult<Self> {
        let pixmap = pixmap_from_premul_bytes(&img.rgba8_premul, img.width, img.height)?;
        Ok(Self::from_pixmap(pixmap, img.width, img.height))
    }

    pub(crate) fn from_frame(frame: &FrameRGBA) -> AnimResult<Self> {
        let data: Cow<'_, [u8]> = if frame.premultiplied {
            Cow::Borrowed(&frame.data)
        } else {
            let mut bytes = frame.data.clone();
            premultiply_rgba8_in_place(&mut bytes);
            Cow::Owned(bytes)
        };
        let pixmap = pixmap_from_premul_bytes(&data, frame.width, frame.height)?;
        Ok(Self::from_pixmap(pixmap, frame.width, frame.height))
    }

    fn from_pixmap(pixmap: vello_cpu::Pixmap, w: u32, h: u32) -> Self {
        Self {
            paint: vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
            w,
            h,
        }
    }
}

/// Persistent CPU drawing surface.
///
/// Each frame is `begin`, draw calls, then `finish`, which rasterizes and reads the pixels back.
pub(crate) struct Surface {
    canvas: Canvas,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
}

impl Surface {
    pub(crate) fn new(canvas: Canvas) -> AnimResult<Self> {
        canvas.validate()?;
        let w: u16 = canvas
            .width
            .try_into()
            .map_err(|_| AnimError::validation("surface width exceeds u16"))?;
        let h: u16 = canvas
            .height
            .try_into()
            .map_err(|_| AnimError::validation("surface height exceeds u16"))?;
        Ok(Self {
            canvas,
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
        })
    }

    pub(crate) fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub(crate) fn begin(&mut self) {
        self.ctx.reset();
        self.ctx
            .set_blend_mode(vello_cpu::peniko::BlendMode::default());
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }

    /// Cover the whole surface with `color`.
    pub(crate) fn fill_background(&mut self, color: CssColor) {
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(color.to_cpu_color());
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.canvas.width),
            f64::from(self.canvas.height),
        ));
    }

    /// Draw `image` stretched over the full surface, then transformed by `transform`.
    pub(crate) fn draw_image_fill(&mut self, image: &ImagePaint, transform: Affine) {
        let sx = f64::from(self.canvas.width) / f64::from(image.w.max(1));
        let sy = f64::from(self.canvas.height) / f64::from(image.h.max(1));
        self.draw_image(image, transform * Affine::scale_non_uniform(sx, sy));
    }

    /// Draw `image` at its natural size under `transform`.
    pub(crate) fn draw_image(&mut self, image: &ImagePaint, transform: Affine) {
        self.ctx.set_transform(affine_to_cpu(transform));
        self.ctx.set_paint(image.paint.clone());
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(image.w),
            f64::from(image.h),
        ));
    }

    /// Fill `path` (in surface coordinates) with `color`.
    pub(crate) fn fill_path(&mut self, path: &BezPath, color: CssColor) {
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(color.to_cpu_color());
        self.ctx.fill_path(&bezpath_to_cpu(path));
    }

    pub(crate) fn ctx_mut(&mut self) -> &mut vello_cpu::RenderContext {
        &mut self.ctx
    }

    /// Rasterize everything drawn since `begin` and read the pixels back.
    pub(crate) fn finish(&mut self) -> FrameRGBA {
        self.pixmap.data_as_u8_slice_mut().fill(0);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> AnimResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| AnimError::asset_load("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| AnimError::asset_load("image height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(AnimError::asset_load("pixmap byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
