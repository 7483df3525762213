use std::time::Duration;

use crate::foundation::error::{AnimError, AnimResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Size, Vec2};

/// Absolute 0-based frame index in a recording or render loop.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> AnimResult<Self> {
        if den == 0 {
            return Err(AnimError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(AnimError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Whole frames per second.
    pub fn whole(fps: u32) -> AnimResult<Self> {
        Self::new(fps, 1)
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Duration of one frame.
    pub fn frame_duration(self) -> Duration {
        Duration::from_secs_f64(self.frame_duration_secs())
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Number of frames needed to cover `secs`, rounded to the nearest frame.
    pub fn secs_to_frames_round(self, secs: f64) -> u64 {
        (secs * self.as_f64()).round().max(0.0) as u64
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Square canvas of `side` pixels.
    pub fn square(side: u32) -> Self {
        Self {
            width: side,
            height: side,
        }
    }

    /// Validate that the canvas is usable by both the raster backend and the encoder.
    pub fn validate(self) -> AnimResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(AnimError::validation("canvas width/height must be non-zero"));
        }
        if self.width > u32::from(u16::MAX) || self.height > u32::from(u16::MAX) {
            return Err(AnimError::validation("canvas width/height must fit in u16"));
        }
        Ok(())
    }

    /// Center point of the canvas.
    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    /// Byte length of a tightly packed RGBA8 buffer of this size.
    pub fn rgba_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    /// Bytes in `[r, g, b, a]` order.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
