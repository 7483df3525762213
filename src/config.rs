use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::encode::ffmpeg::EncoderSettings;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{AnimError, AnimResult};
use crate::overlay::BubbleStyle;
use crate::settings::shared::AnimationSettings;
use crate::traits::layer_key::{LayerKey, LayerOrderTable};

/// Studio configuration, read from JSON. Every field has a default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Side of the square render surface in pixels.
    pub canvas_size: u32,
    /// Render and recording frame rate.
    pub fps: u32,
    /// Directory image paths in dictionaries are relative to.
    pub assets_root: PathBuf,
    /// Directory holding the `<category>.json` dictionaries. Defaults to `<assets_root>/metadata`.
    pub dictionaries_root: Option<PathBuf>,
    /// Font used for bubble text.
    pub font_path: Option<PathBuf>,
    /// Fall back to the system sans-serif font when `font_path` is unset.
    pub system_fonts: bool,
    /// Where recordings are written.
    pub output_dir: PathBuf,
    /// Recording file name prefix.
    pub file_stem: String,
    /// Container and bitrate of recordings.
    pub encoder: EncoderSettings,
    /// Initial animation settings.
    pub settings: AnimationSettings,
    /// Bubble appearance.
    pub bubble: BubbleStyle,
    /// Rank overrides keyed by layer key name.
    pub layer_order: BTreeMap<String, i32>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            canvas_size: 828,
            fps: 60,
            assets_root: PathBuf::from("."),
            dictionaries_root: None,
            font_path: None,
            system_fonts: true,
            output_dir: PathBuf::from("."),
            file_stem: "animation".to_owned(),
            encoder: EncoderSettings::default(),
            settings: AnimationSettings::default(),
            bubble: BubbleStyle::default(),
            layer_order: BTreeMap::new(),
        }
    }
}

impl StudioConfig {
    /// Read a config file. Relative paths inside it are resolved against the file's directory.
    pub fn load(path: &Path) -> AnimResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let mut cfg: Self = serde_json::from_str(&text)?;
        if let Some(base) = path.parent() {
            cfg.rebase(base);
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a config document without touching the filesystem.
    pub fn from_json_str(s: &str) -> AnimResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn rebase(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.assets_root);
        join(&mut self.output_dir);
        if let Some(p) = &mut self.dictionaries_root {
            join(p);
        }
        if let Some(p) = &mut self.font_path {
            join(p);
        }
    }

    /// Check every field.
    pub fn validate(&self) -> AnimResult<()> {
        if self.canvas_size == 0 || !self.canvas_size.is_multiple_of(2) {
            return Err(AnimError::validation(format!(
                "canvas_size must be even and non-zero, got {}",
                self.canvas_size
            )));
        }
        self.canvas().validate()?;
        self.frame_rate()?;
        if self.file_stem.trim().is_empty() {
            return Err(AnimError::validation("file_stem must be non-empty"));
        }
        if self
            .file_stem
            .chars()
            .any(|c| std::path::is_separator(c) || c.is_control())
        {
            return Err(AnimError::validation(format!(
                "file_stem must be a plain name, got \"{}\"",
                self.file_stem
            )));
        }
        self.encoder.validate()?;
        self.settings.validate()?;
        self.bubble.validate()?;
        self.order_table()?;
        Ok(())
    }

    /// Render surface size.
    pub fn canvas(&self) -> Canvas {
        Canvas::square(self.canvas_size)
    }

    /// Frame rate as [`Fps`].
    pub fn frame_rate(&self) -> AnimResult<Fps> {
        Fps::whole(self.fps)
    }

    /// Dictionary directory, defaulting below the assets root.
    pub fn dictionaries_dir(&self) -> PathBuf {
        self.dictionaries_root
            .clone()
            .unwrap_or_else(|| self.assets_root.join("metadata"))
    }

    /// Standard layer order with the configured overrides applied.
    pub fn order_table(&self) -> AnimResult<LayerOrderTable> {
        self.layer_order
            .iter()
            .try_fold(LayerOrderTable::standard(), |table, (name, rank)| {
                let key = LayerKey::from_name(name).ok_or_else(|| {
                    AnimError::validation(format!("layer_order: unknown layer key \"{name}\""))
                })?;
                Ok(table.with_override(key, *rank))
            })
    }
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
