use crate::foundation::error::AnimResult;
use crate::record::RecorderState;
use crate::settings::color::CssColor;
use crate::settings::shared::{AnimationSettings, SharedSettings};

/// Label and enabled flag of the record action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordButton {
    /// Recorder state the button reflects.
    pub state: RecorderState,
    /// Text shown on the button.
    pub label: &'static str,
    /// Whether pressing it starts a recording.
    pub enabled: bool,
}

/// The only writer of [`SharedSettings`].
#[derive(Clone, Debug)]
pub struct Controls {
    settings: SharedSettings,
}

impl Controls {
    /// Controls writing to `settings`.
    pub fn new(settings: SharedSettings) -> Self {
        Self { settings }
    }

    /// Settings these controls write.
    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    /// Replace the bubble text. Deferred while a recording holds the text frozen.
    pub fn set_bubble_text(&self, text: impl Into<String>) {
        self.settings.set_bubble_text(text.into());
    }

    /// Set the typing duration, clamped to the accepted range. Returns the applied value.
    pub fn set_typing_duration(&self, secs: f64) -> f64 {
        let secs = AnimationSettings::clamp_duration(secs);
        self.settings.update(|s| s.typing_duration_secs = secs);
        secs
    }

    /// Turn typing loop on or off.
    pub fn set_looping(&self, looping: bool) {
        self.settings.update(|s| s.is_typing_loop = looping);
    }

    /// Parse and apply a CSS background color. Invalid input leaves the setting unchanged.
    pub fn set_background_color(&self, css: &str) -> AnimResult<CssColor> {
        let color = CssColor::parse(css)?;
        self.settings.update(|s| s.background_color = color);
        Ok(color)
    }

    /// Record button for the recorder's current state.
    pub fn record_button(&self, state: RecorderState) -> RecordButton {
        match state {
            RecorderState::Idle => RecordButton {
                state,
                label: "Record Animation",
                enabled: true,
            },
            RecorderState::Recording => RecordButton {
                state,
                label: "Recording...",
                enabled: false,
            },
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/controls/controls.rs"]
mod tests;
