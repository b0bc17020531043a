//! Per-key edge detection.
//!
//! Each matrix position remembers the last level it was sampled at. A press
//! or release is reported only when the new sample differs from it. The
//! caller is expected to have waited for the row to settle before sampling,
//! no further filtering happens here.

use std::time::{Duration, Instant};

use m100_keymap::{COLS, ROWS};

/// Electrical level sampled on a column line while its row is driven.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Edge derived from two consecutive samples of the same position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    None,
    Pressed,
    Released,
}

#[derive(Copy, Clone, Debug, Default)]
struct KeyState {
    pressed: bool,
    /// When the last press at this position was passed on.
    last_press: Option<Instant>,
}

pub struct KeyTracker {
    keys: [[KeyState; COLS]; ROWS],
}

impl KeyTracker {
    /// Every position starts released.
    pub fn new() -> Self {
        Self {
            keys: [[KeyState::default(); COLS]; ROWS],
        }
    }

    /// Record a new sample for `(row, col)` and report the edge it makes.
    pub fn observe(&mut self, row: usize, col: usize, level: Level) -> Transition {
        let key = &mut self.keys[row][col];
        let pressed = level == Level::High;
        let transition = match (key.pressed, pressed) {
            (false, true) => Transition::Pressed,
            (true, false) => Transition::Released,
            _ => Transition::None,
        };
        key.pressed = pressed;
        transition
    }

    #[cfg(test)]
    pub fn is_pressed(&self, row: usize, col: usize) -> bool {
        self.keys[row][col].pressed
    }

    /// Decide whether a press at `(row, col)` is far enough from the previous
    /// accepted one to be forwarded. A zero `window` accepts every press.
    ///
    /// Accepted presses restart the window; rejected ones do not.
    pub fn accept_press(&mut self, row: usize, col: usize, now: Instant, window: Duration) -> bool {
        let key = &mut self.keys[row][col];
        let accept = match key.last_press {
            Some(last) if !window.is_zero() => now.saturating_duration_since(last) >= window,
            _ => true,
        };
        if accept {
            key.last_press = Some(now);
        }
        accept
    }
}

impl Default for KeyTracker {
    fn default() -> Self {
        Self::new()
    }
}
