//! Modifier and CODE handling.
//!
//! The decision logic is a pair of pure functions: they take the current
//! [`ModifierState`] and a detected edge, and hand back the next state along
//! with what should be sent to the host. Nothing here touches hardware.

use m100_keymap::{code_combo, lookup, modifier_at, Keycode, Modifier, COLS, MODIFIER_POSITIONS};

/// Latched modifier flags.
///
/// Shift, ctrl and alt follow the physical key. CODE is armed by its key and
/// consumed by the next regular key press.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ModifierState {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub code: bool,
}

impl ModifierState {
    pub fn with(mut self, modifier: Modifier, on: bool) -> Self {
        match modifier {
            Modifier::Shift => self.shift = on,
            Modifier::Ctrl => self.ctrl = on,
            Modifier::Alt => self.alt = on,
            Modifier::Code => self.code = on,
        }
        self
    }

    /// Fold in the modifiers found held while sampling the current row.
    pub fn merge(self, row: RowModifiers) -> Self {
        Self {
            shift: self.shift || row.shift,
            ctrl: self.ctrl || row.ctrl,
            alt: self.alt || row.alt,
            code: self.code,
        }
    }

    /// The single modifier to wrap a regular key in, ctrl first, then shift,
    /// then alt.
    pub fn combo_modifier(self) -> Option<Keycode> {
        if self.ctrl {
            Some(Keycode::LCtrl)
        } else if self.shift {
            Some(Keycode::LShift)
        } else if self.alt {
            Some(Keycode::LAlt)
        } else {
            None
        }
    }
}

/// Modifier columns reading high in one sampled row.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RowModifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl RowModifiers {
    /// Inspect a row's column samples before any of its keys are dispatched,
    /// so a modifier and a key closing in the same row combine even though the
    /// modifier column is visited last.
    pub fn sample(row: usize, columns: &[bool; COLS]) -> Self {
        MODIFIER_POSITIONS
            .iter()
            .filter(|&&(r, c, _)| r == row && columns[c])
            .fold(Self::default(), |mut held, &(_, _, modifier)| {
                match modifier {
                    Modifier::Shift => held.shift = true,
                    Modifier::Ctrl => held.ctrl = true,
                    Modifier::Alt => held.alt = true,
                    Modifier::Code => {}
                }
                held
            })
    }
}

/// Key events to synthesize on the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Emission {
    KeyDown(Keycode),
    KeyUp(Keycode),
    /// Down followed by up.
    Press(Keycode),
    /// Hold `modifier`, tap `key`, release `modifier`.
    Combo { modifier: Keycode, key: Keycode },
}

/// Outcome of one edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Dispatch {
    pub state: ModifierState,
    pub emission: Option<Emission>,
    /// Whether the post-key delay applies after emitting.
    pub settle: bool,
}

impl Dispatch {
    fn new(state: ModifierState, emission: Option<Emission>) -> Self {
        Self {
            state,
            emission,
            settle: false,
        }
    }
}

/// Handle a press detected at `(row, col)`.
pub fn on_press(state: ModifierState, row_held: RowModifiers, row: usize, col: usize) -> Dispatch {
    let state = state.merge(row_held);

    if let Some(modifier) = modifier_at(row, col) {
        return Dispatch::new(
            state.with(modifier, true),
            modifier.keycode().map(Emission::KeyDown),
        );
    }

    // CODE is spent on this press whether or not a combo matches.
    let state = if state.code {
        if let Some(key) = code_combo(row, col) {
            return Dispatch::new(state.with(Modifier::Code, false), Some(Emission::Press(key)));
        }
        state.with(Modifier::Code, false)
    } else {
        state
    };

    let Some(key) = lookup(row, col) else {
        return Dispatch::new(state, None);
    };

    let emission = match state.combo_modifier() {
        Some(modifier) => Emission::Combo { modifier, key },
        None => Emission::Press(key),
    };

    Dispatch {
        state,
        emission: Some(emission),
        settle: true,
    }
}

/// Handle a release detected at `(row, col)`. Regular keys emit nothing on
/// release.
pub fn on_release(state: ModifierState, row: usize, col: usize) -> Dispatch {
    match modifier_at(row, col) {
        Some(modifier) => Dispatch::new(
            state.with(modifier, false),
            modifier.keycode().map(Emission::KeyUp),
        ),
        None => Dispatch::new(state, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use m100_keymap::MODIFIER_COL;

    const NONE: RowModifiers = RowModifiers {
        shift: false,
        ctrl: false,
        alt: false,
    };

    fn press(state: ModifierState, row: usize, col: usize) -> Dispatch {
        on_press(state, NONE, row, col)
    }

    #[test]
    fn test_plain_press() {
        let d = press(ModifierState::default(), 0, 1);
        assert_eq!(d.emission, Some(Emission::Press(Keycode::A)));
        assert_eq!(d.state, ModifierState::default());
        assert!(d.settle);
    }

    #[test]
    fn test_modifier_press_and_release() {
        let d = press(ModifierState::default(), 1, MODIFIER_COL);
        assert!(d.state.ctrl);
        assert_eq!(d.emission, Some(Emission::KeyDown(Keycode::LCtrl)));
        assert!(!d.settle);

        let d = on_release(d.state, 1, MODIFIER_COL);
        assert!(!d.state.ctrl);
        assert_eq!(d.emission, Some(Emission::KeyUp(Keycode::LCtrl)));
    }

    #[test]
    fn test_every_shift_row_latches_shift() {
        for row in [0, 4, 5, 6] {
            let d = press(ModifierState::default(), row, MODIFIER_COL);
            assert!(d.state.shift, "row {row}");
            assert_eq!(d.emission, Some(Emission::KeyDown(Keycode::LShift)));
        }
    }

    #[test]
    fn test_shift_combo() {
        let d = press(ModifierState::default(), 0, MODIFIER_COL);
        let d = press(d.state, 0, 1);
        assert_eq!(
            d.emission,
            Some(Emission::Combo {
                modifier: Keycode::LShift,
                key: Keycode::A
            })
        );
        // The latched flag survives the synthesized release.
        assert!(d.state.shift);
    }

    #[test]
    fn test_ctrl_wins_over_shift_and_alt() {
        let state = ModifierState {
            shift: true,
            ctrl: true,
            alt: true,
            code: false,
        };
        let d = press(state, 2, 2);
        assert_eq!(
            d.emission,
            Some(Emission::Combo {
                modifier: Keycode::LCtrl,
                key: Keycode::E
            })
        );
        assert_eq!(d.state, state);

        let d = press(ModifierState { alt: true, ..ModifierState::default() }, 2, 2);
        assert_eq!(
            d.emission,
            Some(Emission::Combo {
                modifier: Keycode::LAlt,
                key: Keycode::E
            })
        );
    }

    #[test]
    fn test_code_press_is_silent() {
        let d = press(ModifierState::default(), 3, MODIFIER_COL);
        assert!(d.state.code);
        assert_eq!(d.emission, None);

        let d = on_release(d.state, 3, MODIFIER_COL);
        assert!(!d.state.code);
        assert_eq!(d.emission, None);
    }

    #[test]
    fn test_code_combos_replace_matrix_key() {
        let armed = press(ModifierState::default(), 3, MODIFIER_COL).state;

        let d = press(armed, 6, 5);
        assert_eq!(d.emission, Some(Emission::Press(Keycode::PageUp)));
        assert!(!d.state.code);
        assert!(!d.settle);

        let d = press(armed, 7, 5);
        assert_eq!(d.emission, Some(Emission::Press(Keycode::PageDown)));
        assert!(!d.state.code);
    }

    #[test]
    fn test_code_disarmed_without_match() {
        let armed = ModifierState {
            code: true,
            ..ModifierState::default()
        };
        let d = press(armed, 0, 2);
        assert_eq!(d.emission, Some(Emission::Press(Keycode::Q)));
        assert!(!d.state.code);
    }

    #[test]
    fn test_code_not_spent_by_modifier() {
        let armed = ModifierState {
            code: true,
            ..ModifierState::default()
        };
        let d = press(armed, 0, MODIFIER_COL);
        assert!(d.state.code);
        assert!(d.state.shift);
    }

    #[test]
    fn test_regular_release_is_silent() {
        let state = ModifierState {
            shift: true,
            ..ModifierState::default()
        };
        let d = on_release(state, 0, 1);
        assert_eq!(d.emission, None);
        assert_eq!(d.state, state);
    }

    #[test]
    fn test_row_modifiers_sample() {
        let mut columns = [false; COLS];
        columns[1] = true;
        assert_eq!(RowModifiers::sample(0, &columns), NONE);

        columns[MODIFIER_COL] = true;
        assert!(RowModifiers::sample(0, &columns).shift);
        assert!(RowModifiers::sample(5, &columns).shift);
        assert!(RowModifiers::sample(1, &columns).ctrl);
        assert!(RowModifiers::sample(2, &columns).alt);
        assert_eq!(RowModifiers::sample(3, &columns), NONE);
        assert_eq!(RowModifiers::sample(7, &columns), NONE);
    }

    #[test]
    fn test_row_held_shift_applies_to_same_row_press() {
        let held = RowModifiers {
            shift: true,
            ..NONE
        };
        let d = on_press(ModifierState::default(), held, 4, 2);
        assert_eq!(
            d.emission,
            Some(Emission::Combo {
                modifier: Keycode::LShift,
                key: Keycode::T
            })
        );
        assert!(d.state.shift);
    }
}
