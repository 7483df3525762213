use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::assets::decode::{PreparedImage, decode_image};
use crate::foundation::core::Size;
use crate::foundation::error::{AnimError, AnimResult};
use crate::traits::resolver::LayerStack;

/// Normalize and validate assets-root-relative paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> AnimResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(AnimError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(AnimError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(AnimError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(AnimError::validation("asset path must contain a file name"));
    }

    Ok(out.join("/"))
}

/// Image handle for one layer of a stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSlot {
    /// Decoded and ready to paint.
    Ready(Arc<PreparedImage>),
    /// Failed to load; painted as nothing.
    Blank,
}

impl ImageSlot {
    /// The decoded image, if any.
    pub fn image(&self) -> Option<&PreparedImage> {
        match self {
            Self::Ready(img) => Some(img),
            Self::Blank => None,
        }
    }
}

/// Decoded-image cache keyed by normalized path.
///
/// Holds the images of the most recently loaded stack. Paths shared between consecutive stacks
/// are decoded once; paths that failed are retried on the next load.
#[derive(Debug)]
pub struct ImageStore {
    assets_root: PathBuf,
    cache: HashMap<String, Arc<PreparedImage>>,
}

impl ImageStore {
    /// Store reading files below `assets_root`.
    pub fn new(assets_root: impl Into<PathBuf>) -> Self {
        Self {
            assets_root: assets_root.into(),
            cache: HashMap::new(),
        }
    }

    /// Root directory image paths are resolved against.
    pub fn assets_root(&self) -> &Path {
        &self.assets_root
    }

    /// Number of decoded images held.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// One slot per layer of `stack`, in the same order.
    ///
    /// Images the stack no longer references are dropped. Paths not yet cached are read and
    /// decoded in parallel. Failures become [`ImageSlot::Blank`] so indices never shift.
    pub fn load_stack(&mut self, stack: &LayerStack) -> Vec<ImageSlot> {
        let referenced: HashSet<&str> = stack
            .layers()
            .iter()
            .map(|l| l.image_source.as_str())
            .collect();
        self.cache.retain(|src, _| referenced.contains(src.as_str()));

        let mut pending = Vec::<String>::new();
        for layer in stack.layers() {
            let src = &layer.image_source;
            if !self.cache.contains_key(src) && !pending.contains(src) {
                pending.push(src.clone());
            }
        }

        let root = self.assets_root.as_path();
        let decoded: Vec<(String, AnimResult<PreparedImage>)> = pending
            .into_par_iter()
            .map(|src| {
                let res = read_and_decode(root, &src);
                (src, res)
            })
            .collect();

        for (src, res) in decoded {
            match res {
                Ok(img) => {
                    self.cache.insert(src, Arc::new(img));
                }
                Err(e) => {
                    tracing::warn!(path = %src, error = %e, "layer image failed to load, drawing blank");
                }
            }
        }

        stack
            .layers()
            .iter()
            .map(|l| match self.cache.get(&l.image_source) {
                Some(img) => ImageSlot::Ready(Arc::clone(img)),
                None => ImageSlot::Blank,
            })
            .collect()
    }

    /// Drop every decoded image.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

fn read_and_decode(root: &Path, rel: &str) -> AnimResult<PreparedImage> {
    let norm = normalize_rel_path(rel)?;
    let p = root.join(Path::new(&norm));
    let bytes = std::fs::read(&p)
        .map_err(|e| AnimError::asset_load(format!("failed to read '{}': {e}", p.display())))?;
    decode_image(&bytes)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

/// Laid-out text ready to paint.
pub(crate) struct TextBlock {
    pub(crate) layout: parley::Layout<TextBrushRgba8>,
    pub(crate) font: vello_cpu::peniko::FontData,
}

struct LoadedFont {
    family: String,
    data: vello_cpu::peniko::FontData,
}

/// Average glyph advance relative to font size, used when no font is loaded.
const FALLBACK_ADVANCE_EM: f64 = 0.55;
const LINE_HEIGHT_EM: f64 = 1.2;

/// Parley layout for bubble text.
///
/// The font comes from configuration or the system. Without one, text is measured approximately
/// (so bubble geometry still tracks the text) and glyphs are not drawn.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    font: Option<LoadedFont>,
    warned_missing_font: bool,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    /// Engine with no font.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            font: None,
            warned_missing_font: false,
        }
    }

    /// Engine using the given TTF/OTF bytes.
    pub fn with_font_bytes(font_bytes: Vec<u8>) -> AnimResult<Self> {
        let mut engine = Self::new();
        let families = engine
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| AnimError::validation("no font families registered from font bytes"))?;
        let family = engine
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| AnimError::validation("registered font family has no name"))?
            .to_string();

        let data = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
        engine.font = Some(LoadedFont { family, data });
        Ok(engine)
    }

    /// Engine for the configured font source.
    ///
    /// A font file wins when given. Otherwise the system's default sans-serif face is used when
    /// `system_fonts` is set. Failures are logged and leave the engine without a font.
    pub fn from_config(font_path: Option<&Path>, system_fonts: bool) -> Self {
        let loaded = match font_path {
            Some(path) => std::fs::read(path)
                .map_err(|e| AnimError::asset_load(format!("read font '{}': {e}", path.display())))
                .and_then(Self::with_font_bytes),
            None if system_fonts => Self::system_default(),
            None => return Self::new(),
        };
        match loaded {
            Ok(engine) => engine,
            Err(e) => {
                tracing::warn!(error = %e, "bubble font unavailable, text will not be drawn");
                let mut engine = Self::new();
                engine.warned_missing_font = true;
                engine
            }
        }
    }

    /// Engine using the default face of the system's sans-serif family.
    pub fn system_default() -> AnimResult<Self> {
        let mut engine = Self::new();
        let collection = &mut engine.font_ctx.collection;
        let family_id = collection
            .generic_families(parley::fontique::GenericFamily::SansSerif)
            .next()
            .ok_or_else(|| AnimError::asset_load("no system sans-serif font family"))?;
        let family = collection
            .family(family_id)
            .ok_or_else(|| AnimError::asset_load("system sans-serif family not found"))?;
        let font = family
            .default_font()
            .ok_or_else(|| AnimError::asset_load("system sans-serif family has no fonts"))?;
        let blob = font
            .load(None)
            .ok_or_else(|| AnimError::asset_load("failed to load system sans-serif font"))?;

        let data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(blob.data().to_vec()),
            font.index(),
        );
        tracing::debug!(family = family.name(), "using system font for bubble text");
        engine.font = Some(LoadedFont {
            family: family.name().to_owned(),
            data,
        });
        Ok(engine)
    }

    /// Whether glyphs can be drawn.
    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Size of `text` wrapped at `max_width_px`.
    pub fn measure(&mut self, text: &str, size_px: f32, max_width_px: Option<f32>) -> Size {
        if text.is_empty() {
            return Size::ZERO;
        }
        match self.layout(text, size_px, TextBrushRgba8::default(), max_width_px) {
            Ok(Some(block)) => Size::new(
                f64::from(block.layout.width()),
                f64::from(block.layout.height()),
            ),
            _ => approximate_size(text, f64::from(size_px), max_width_px.map(f64::from)),
        }
    }

    /// Shape `text`, wrap at `max_width_px` and center each line within that width.
    ///
    /// Returns `Ok(None)` when no font is loaded.
    pub(crate) fn layout(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
        max_width_px: Option<f32>,
    ) -> AnimResult<Option<TextBlock>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(AnimError::validation("text size_px must be finite and > 0"));
        }
        let Some(font) = &self.font else {
            if !self.warned_missing_font {
                tracing::warn!("no bubble font configured, text will not be drawn");
                self.warned_missing_font = true;
            }
            return Ok(None);
        };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(font.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(max_width_px);
        layout.align(
            max_width_px,
            parley::Alignment::Center,
            parley::AlignmentOptions::default(),
        );

        Ok(Some(TextBlock {
            layout,
            font: font.data.clone(),
        }))
    }
}

fn approximate_size(text: &str, size_px: f64, max_width_px: Option<f64>) -> Size {
    let advance = size_px * FALLBACK_ADVANCE_EM;
    let line_h = size_px * LINE_HEIGHT_EM;
    let mut widest = 0.0_f64;
    let mut lines = 0_u32;
    for paragraph in text.split('\n') {
        let w = paragraph.chars().count() as f64 * advance;
        match max_width_px {
            Some(max) if max > 0.0 && w > max => {
                lines += (w / max).ceil() as u32;
                widest = widest.max(max);
            }
            _ => {
                lines += 1;
                widest = widest.max(w);
            }
        }
    }
    Size::new(widest, f64::from(lines) * line_h)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
