use std::sync::Arc;

use crate::foundation::error::{AnimError, AnimResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Decoded raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Fully transparent image of the given size.
    pub fn blank(width: u32, height: u32) -> Self {
        let len = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        Self {
            width,
            height,
            rgba8_premul: Arc::new(vec![0; len]),
        }
    }
}

/// Decode any format the `image` crate recognizes (PNG, WebP, JPEG, ...).
pub fn decode_image(bytes: &[u8]) -> AnimResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| AnimError::asset_load(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(AnimError::asset_load("decoded image has zero size"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
