use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::foundation::error::{AnimError, AnimResult};
use crate::settings::color::CssColor;

/// Lower bound for the typing duration, in seconds.
pub const MIN_TYPING_DURATION_SECS: f64 = 0.1;
/// Upper bound for the typing duration, in seconds.
pub const MAX_TYPING_DURATION_SECS: f64 = 10.0;

/// Process-wide animation settings, independent of the selected token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Full text the speech bubble types out.
    pub bubble_text: String,
    /// Restart typing after a pause once the full text is shown.
    pub is_typing_loop: bool,
    /// Time to type the whole text, in seconds, within `[0.1, 10]`.
    pub typing_duration_secs: f64,
    /// Background fill painted under every frame.
    pub background_color: CssColor,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            bubble_text: "Welcome to Shapecraft!".to_owned(),
            is_typing_loop: true,
            typing_duration_secs: 2.0,
            background_color: CssColor::WHITE,
        }
    }
}

impl AnimationSettings {
    /// Clamp a requested typing duration into the accepted range.
    ///
    /// Non-finite input falls back to the lower bound.
    pub fn clamp_duration(secs: f64) -> f64 {
        if !secs.is_finite() {
            return MIN_TYPING_DURATION_SECS;
        }
        secs.clamp(MIN_TYPING_DURATION_SECS, MAX_TYPING_DURATION_SECS)
    }

    /// Validate ranges.
    pub fn validate(&self) -> AnimResult<()> {
        if !self.typing_duration_secs.is_finite()
            || self.typing_duration_secs < MIN_TYPING_DURATION_SECS
            || self.typing_duration_secs > MAX_TYPING_DURATION_SECS
        {
            return Err(AnimError::validation(format!(
                "typing_duration_secs must be within [{MIN_TYPING_DURATION_SECS}, {MAX_TYPING_DURATION_SECS}], got {}",
                self.typing_duration_secs
            )));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct SharedInner {
    settings: AnimationSettings,
    revision: u64,
    freezes: u32,
    pending_text: Option<String>,
}

/// Single source of truth for [`AnimationSettings`].
///
/// Readers take snapshots; writes go through [`crate::Controls`]. While a recording holds a
/// [`SettingsFreeze`], bubble text edits are parked and applied when the last freeze is released.
#[derive(Clone, Debug)]
pub struct SharedSettings {
    inner: Arc<RwLock<SharedInner>>,
}

impl SharedSettings {
    /// Wrap initial settings.
    pub fn new(settings: AnimationSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(SharedInner {
                settings,
                revision: 0,
                freezes: 0,
                pending_text: None,
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SharedInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SharedInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Copy of the current settings.
    pub fn snapshot(&self) -> AnimationSettings {
        self.read().settings.clone()
    }

    /// Monotonic counter bumped on every applied change.
    pub fn revision(&self) -> u64 {
        self.read().revision
    }

    /// `true` while at least one recording holds the text frozen.
    pub fn is_frozen(&self) -> bool {
        self.read().freezes > 0
    }

    /// Text edit waiting for the freeze to lift, if any.
    pub fn pending_text(&self) -> Option<String> {
        self.read().pending_text.clone()
    }

    pub(crate) fn set_bubble_text(&self, text: String) {
        let mut inner = self.write();
        if inner.freezes > 0 {
            tracing::debug!("bubble text edit deferred until recording ends");
            inner.pending_text = Some(text);
            return;
        }
        inner.settings.bubble_text = text;
        inner.revision += 1;
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut AnimationSettings)) {
        let mut inner = self.write();
        f(&mut inner.settings);
        inner.revision += 1;
    }

    /// Freeze the bubble text and return the snapshot the freeze protects.
    pub fn freeze(&self) -> (SettingsFreeze, AnimationSettings) {
        let mut inner = self.write();
        inner.freezes += 1;
        let snapshot = inner.settings.clone();
        (
            SettingsFreeze {
                shared: self.clone(),
                released: false,
            },
            snapshot,
        )
    }

    fn release_freeze(&self) {
        let mut inner = self.write();
        inner.freezes = inner.freezes.saturating_sub(1);
        if inner.freezes == 0
            && let Some(text) = inner.pending_text.take()
        {
            inner.settings.bubble_text = text;
            inner.revision += 1;
        }
    }
}

impl Default for SharedSettings {
    fn default() -> Self {
        Self::new(AnimationSettings::default())
    }
}

/// Guard keeping the bubble text read-only. Releasing twice is a no-op.
#[derive(Debug)]
pub struct SettingsFreeze {
    shared: SharedSettings,
    released: bool,
}

impl SettingsFreeze {
    /// Release the freeze now instead of on drop.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.shared.release_freeze();
    }
}

impl Drop for SettingsFreeze {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/settings/shared.rs"]
mod tests;
