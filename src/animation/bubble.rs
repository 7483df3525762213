//! Typewriter animation for the speech bubble.
//!
//! [`advance`] is the single step function; [`BubbleTicker`] schedules it against a clock. The
//! interactive overlay and the recorder each own a ticker, so they share the logic but not the
//! timer.

use std::time::Duration;

use crate::settings::shared::AnimationSettings;

/// Pause between a completed line and the restart of a looping animation.
pub const LOOP_PAUSE: Duration = Duration::from_millis(1000);

/// Animator phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BubblePhase {
    /// Not started since the last text or duration change.
    Idle,
    /// Revealing one character per interval.
    Typing,
    /// Full text shown; the next step clears it.
    Pausing,
    /// Full text shown and held (non-looping).
    Done,
}

/// What the animator types, and how fast.
#[derive(Clone, Debug, PartialEq)]
pub struct BubbleScript {
    chars: Vec<char>,
    duration_secs: f64,
    looping: bool,
}

impl BubbleScript {
    /// Script for `text`; whitespace runs are collapsed and the ends trimmed before typing.
    pub fn new(text: &str, duration_secs: f64, looping: bool) -> Self {
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        Self {
            chars: normalized.chars().collect(),
            duration_secs: AnimationSettings::clamp_duration(duration_secs),
            looping,
        }
    }

    /// Script for the current settings.
    pub fn from_settings(settings: &AnimationSettings) -> Self {
        Self::new(
            &settings.bubble_text,
            settings.typing_duration_secs,
            settings.is_typing_loop,
        )
    }

    /// Characters in the normalized text.
    pub fn char_count(&self) -> usize {
        self.chars.len()
    }

    /// Whether the animation restarts after the loop pause.
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// The normalized full text.
    pub fn full_text(&self) -> String {
        self.chars.iter().collect()
    }

    /// Delay between characters: the whole text takes `duration_secs`.
    pub fn char_interval(&self) -> Duration {
        if self.chars.is_empty() {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.duration_secs / self.chars.len() as f64)
    }

    /// Length of one looping cycle: every character plus the loop pause. `None` when the
    /// animation does not repeat.
    pub fn cycle_length(&self) -> Option<Duration> {
        if !self.looping || self.chars.is_empty() {
            return None;
        }
        let n = u32::try_from(self.chars.len()).ok()?;
        self.char_interval().checked_mul(n)?.checked_add(LOOP_PAUSE)
    }

    /// The point of the animation `at` corresponds to. Looping scripts repeat every
    /// [`BubbleScript::cycle_length`], so `at` is folded into the first cycle.
    pub fn phase_time(&self, at: Duration) -> Duration {
        match self.cycle_length() {
            Some(cycle) if !cycle.is_zero() => {
                let nanos = at.as_nanos() % cycle.as_nanos();
                Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
            }
            _ => at,
        }
    }

    fn prefix(&self, n: usize) -> String {
        self.chars[..n.min(self.chars.len())].iter().collect()
    }
}

/// Animator state; ephemeral and rebuilt whenever the script changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BubbleState {
    /// Current phase.
    pub phase: BubblePhase,
    /// Characters revealed so far.
    pub char_index: usize,
    /// `text[..char_index]`.
    pub visible_text: String,
}

impl BubbleState {
    /// Fresh state before typing starts.
    pub fn idle() -> Self {
        Self {
            phase: BubblePhase::Idle,
            char_index: 0,
            visible_text: String::new(),
        }
    }

    /// Whether the full text has been revealed.
    pub fn is_complete(&self) -> bool {
        matches!(self.phase, BubblePhase::Pausing | BubblePhase::Done)
    }
}

impl Default for BubbleState {
    fn default() -> Self {
        Self::idle()
    }
}

/// One discrete step of the animator.
///
/// `Idle` enters `Typing` with nothing shown. Each `Typing` step reveals one character; the step
/// that reveals the last one moves to `Pausing` (looping) or `Done`. `Pausing` clears the text and
/// resumes `Typing`. `Done` is terminal.
pub fn advance(state: &BubbleState, script: &BubbleScript) -> BubbleState {
    let n = script.char_count();
    let complete = if script.looping {
        BubblePhase::Pausing
    } else {
        BubblePhase::Done
    };

    match state.phase {
        BubblePhase::Idle if n == 0 => BubbleState {
            phase: BubblePhase::Done,
            char_index: 0,
            visible_text: String::new(),
        },
        BubblePhase::Idle | BubblePhase::Pausing => BubbleState {
            phase: BubblePhase::Typing,
            char_index: 0,
            visible_text: String::new(),
        },
        BubblePhase::Typing => {
            let char_index = (state.char_index + 1).min(n);
            BubbleState {
                phase: if char_index == n {
                    complete
                } else {
                    BubblePhase::Typing
                },
                char_index,
                visible_text: script.prefix(char_index),
            }
        }
        BubblePhase::Done => state.clone(),
    }
}

/// Delay before the next [`advance`] from `state`; `None` once nothing more will change.
pub fn next_delay(state: &BubbleState, script: &BubbleScript) -> Option<Duration> {
    match state.phase {
        BubblePhase::Idle => Some(Duration::ZERO),
        BubblePhase::Typing => Some(script.char_interval()),
        BubblePhase::Pausing => Some(LOOP_PAUSE),
        BubblePhase::Done => None,
    }
}

/// Drives [`advance`] from a monotonic clock.
///
/// Time is passed in as "elapsed since an arbitrary origin"; the ticker keeps one pending
/// deadline, which [`BubbleTicker::cancel`] clears.
#[derive(Clone, Debug)]
pub struct BubbleTicker {
    script: BubbleScript,
    state: BubbleState,
    deadline: Option<Duration>,
}

impl BubbleTicker {
    /// Start animating `script` at `now`; the first step is due immediately.
    pub fn start(script: BubbleScript, now: Duration) -> Self {
        Self {
            script,
            state: BubbleState::idle(),
            deadline: Some(now),
        }
    }

    /// Reset to `Idle` with a new script. A no-op when the script is unchanged.
    pub fn restart(&mut self, script: BubbleScript, now: Duration) {
        if script == self.script && self.deadline.is_some() {
            return;
        }
        *self = Self::start(script, now);
    }

    /// Run every step due at or before `now`. Returns `true` when the visible text changed.
    pub fn poll(&mut self, now: Duration) -> bool {
        let before = self.state.visible_text.clone();
        while let Some(due) = self.deadline {
            if due > now {
                break;
            }
            self.state = advance(&self.state, &self.script);
            self.deadline = next_delay(&self.state, &self.script).map(|d| due + d);
        }
        self.state.visible_text != before
    }

    /// Drop the pending deadline; the state freezes where it is.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Whether a step is still scheduled.
    pub fn is_active(&self) -> bool {
        self.deadline.is_some()
    }

    /// Current state.
    pub fn state(&self) -> &BubbleState {
        &self.state
    }

    /// Current script.
    pub fn script(&self) -> &BubbleScript {
        &self.script
    }

    /// Text to draw right now.
    pub fn visible_text(&self) -> &str {
        &self.state.visible_text
    }

    /// When the next step is due.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.deadline
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/bubble.rs"]
mod tests;
