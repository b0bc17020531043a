//! Keyboard matrix definitions for the TRS-80 Model 100.
//!
//! This crate is `no_std`-compatible and free of any host dependency so the
//! matrix, the modifier columns and the CODE combinations can be inspected
//! (and rendered) without GPIO or uinput access.

#![cfg_attr(not(test), no_std)]

/// Number of rows (driven lines) in the matrix.
pub const ROWS: usize = 8;
/// Number of columns (sensed lines) in the matrix.
pub const COLS: usize = 9;

/// Column shared by every modifier key.
pub const MODIFIER_COL: usize = 8;

/// Linux input event key codes.
/// See `include/uapi/linux/input-event-codes.h`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Keycode {
    Escape = 1,

    // Numbers
    N1 = 2,
    N2 = 3,
    N3 = 4,
    N4 = 5,
    N5 = 6,
    N6 = 7,
    N7 = 8,
    N8 = 9,
    N9 = 10,
    N0 = 11,
    Minus = 12,
    Equal = 13,
    Backspace = 14,
    Tab = 15,

    // Letters, in scancode order
    Q = 16,
    W = 17,
    E = 18,
    R = 19,
    T = 20,
    Y = 21,
    U = 22,
    I = 23,
    O = 24,
    P = 25,
    LBrace = 26,
    RBrace = 27,
    Enter = 28,
    LCtrl = 29,
    A = 30,
    S = 31,
    D = 32,
    F = 33,
    G = 34,
    H = 35,
    J = 36,
    K = 37,
    L = 38,
    Semicolon = 39,
    Apostrophe = 40,
    LShift = 42,
    Backslash = 43,
    Z = 44,
    X = 45,
    C = 46,
    V = 47,
    B = 48,
    N = 49,
    M = 50,
    Comma = 51,
    Dot = 52,
    Slash = 53,
    LAlt = 56,
    Space = 57,

    // Function keys
    F1 = 59,
    F2 = 60,
    F3 = 61,
    F4 = 62,
    F5 = 63,
    F6 = 64,
    F7 = 65,
    F11 = 87,
    F12 = 88,

    // Navigation
    Up = 103,
    PageUp = 104,
    Left = 105,
    Right = 106,
    Down = 108,
    PageDown = 109,
    Delete = 111,
}

impl Keycode {
    /// The raw event code reported to the host.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Check if this keycode is one of the host modifiers the matrix can hold.
    pub fn is_modifier(self) -> bool {
        matches!(self, Keycode::LCtrl | Keycode::LShift | Keycode::LAlt)
    }

    /// Display name for use in layout visualizations.
    pub fn display_name(self) -> &'static str {
        match self {
            Keycode::Escape => "Esc",
            Keycode::N1 => "1",
            Keycode::N2 => "2",
            Keycode::N3 => "3",
            Keycode::N4 => "4",
            Keycode::N5 => "5",
            Keycode::N6 => "6",
            Keycode::N7 => "7",
            Keycode::N8 => "8",
            Keycode::N9 => "9",
            Keycode::N0 => "0",
            Keycode::Minus => "-",
            Keycode::Equal => "=",
            Keycode::Backspace => "Bksp",
            Keycode::Tab => "Tab",
            Keycode::Q => "Q",
            Keycode::W => "W",
            Keycode::E => "E",
            Keycode::R => "R",
            Keycode::T => "T",
            Keycode::Y => "Y",
            Keycode::U => "U",
            Keycode::I => "I",
            Keycode::O => "O",
            Keycode::P => "P",
            Keycode::LBrace => "[",
            Keycode::RBrace => "]",
            Keycode::Enter => "Ent",
            Keycode::LCtrl => "Ctrl",
            Keycode::A => "A",
            Keycode::S => "S",
            Keycode::D => "D",
            Keycode::F => "F",
            Keycode::G => "G",
            Keycode::H => "H",
            Keycode::J => "J",
            Keycode::K => "K",
            Keycode::L => "L",
            Keycode::Semicolon => ";",
            Keycode::Apostrophe => "'",
            Keycode::LShift => "Shft",
            Keycode::Backslash => "\\",
            Keycode::Z => "Z",
            Keycode::X => "X",
            Keycode::C => "C",
            Keycode::V => "V",
            Keycode::B => "B",
            Keycode::N => "N",
            Keycode::M => "M",
            Keycode::Comma => ",",
            Keycode::Dot => ".",
            Keycode::Slash => "/",
            Keycode::LAlt => "Alt",
            Keycode::Space => "Spc",
            Keycode::F1 => "F1",
            Keycode::F2 => "F2",
            Keycode::F3 => "F3",
            Keycode::F4 => "F4",
            Keycode::F5 => "F5",
            Keycode::F6 => "F6",
            Keycode::F7 => "F7",
            Keycode::F11 => "F11",
            Keycode::F12 => "F12",
            Keycode::Up => "\u{2191}",
            Keycode::PageUp => "PgUp",
            Keycode::Left => "\u{2190}",
            Keycode::Right => "\u{2192}",
            Keycode::Down => "\u{2193}",
            Keycode::PageDown => "PgDn",
            Keycode::Delete => "Del",
        }
    }
}

/// Shorthand aliases for readability.
const ESC: Keycode = Keycode::Escape;
const BSP: Keycode = Keycode::Backspace;
const TAB: Keycode = Keycode::Tab;
const SPC: Keycode = Keycode::Space;
const DEL: Keycode = Keycode::Delete;
const ENT: Keycode = Keycode::Enter;
const LCTL: Keycode = Keycode::LCtrl;
const LSFT: Keycode = Keycode::LShift;
const LALT: Keycode = Keycode::LAlt;

/// The Model 100 matrix, indexed `[row][col]`.
///
/// Column 8 carries the modifiers. Row 3 column 8 is the CODE key; it maps
/// to shift here but never produces a key event of its own.
pub static KEYMAP: [[Keycode; COLS]; ROWS] = [
    // Row 0
    [Keycode::Z, Keycode::A, Keycode::Q, Keycode::O, Keycode::N1, Keycode::N9, BSP, Keycode::F1, LSFT],
    // Row 1
    [Keycode::X, Keycode::S, Keycode::W, Keycode::P, Keycode::N2, Keycode::N0, Keycode::Up, Keycode::F2, LCTL],
    // Row 2
    [Keycode::C, Keycode::D, Keycode::E, Keycode::Equal, Keycode::N3, Keycode::Semicolon, Keycode::Down, Keycode::F3, LALT],
    // Row 3
    [Keycode::V, Keycode::F, Keycode::R, Keycode::Backslash, Keycode::N4, Keycode::Apostrophe, Keycode::Left, Keycode::F4, LSFT],
    // Row 4
    [Keycode::B, Keycode::G, Keycode::T, Keycode::Comma, Keycode::N5, Keycode::Minus, Keycode::Right, Keycode::F5, LSFT],
    // Row 5
    [Keycode::N, Keycode::H, Keycode::Y, Keycode::Dot, Keycode::N6, Keycode::LBrace, TAB, Keycode::F6, LSFT],
    // Row 6
    [Keycode::M, Keycode::J, Keycode::U, Keycode::Slash, Keycode::N7, SPC, ESC, Keycode::F7, LSFT],
    // Row 7
    [Keycode::L, Keycode::K, Keycode::I, Keycode::RBrace, Keycode::N8, DEL, ENT, Keycode::F11, Keycode::F12],
];

/// A matrix position that latches state instead of typing a key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Modifier {
    Shift,
    Ctrl,
    Alt,
    /// One-shot secondary layer, consumed by the next key press.
    Code,
}

impl Modifier {
    /// The host key synthesized while this modifier is held.
    /// CODE has no host counterpart.
    pub fn keycode(self) -> Option<Keycode> {
        match self {
            Modifier::Shift => Some(LSFT),
            Modifier::Ctrl => Some(LCTL),
            Modifier::Alt => Some(LALT),
            Modifier::Code => None,
        }
    }
}

/// Hardware wiring of the modifier keys as `(row, col, modifier)`.
/// Shift is wired into four rows at the same column.
pub static MODIFIER_POSITIONS: [(usize, usize, Modifier); 7] = [
    (0, MODIFIER_COL, Modifier::Shift),
    (1, MODIFIER_COL, Modifier::Ctrl),
    (2, MODIFIER_COL, Modifier::Alt),
    (3, MODIFIER_COL, Modifier::Code),
    (4, MODIFIER_COL, Modifier::Shift),
    (5, MODIFIER_COL, Modifier::Shift),
    (6, MODIFIER_COL, Modifier::Shift),
];

/// A key typed instead of the matrix key while CODE is armed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CodeCombo {
    pub row: usize,
    pub col: usize,
    pub key: Keycode,
}

pub static CODE_COMBOS: [CodeCombo; 2] = [
    // CODE + Space
    CodeCombo { row: 6, col: 5, key: Keycode::PageUp },
    // CODE + Delete
    CodeCombo { row: 7, col: 5, key: Keycode::PageDown },
];

/// Look up the keycode for a matrix position.
///
/// Every position inside the grid maps to a key; `None` means the position
/// is outside the matrix.
pub fn lookup(row: usize, col: usize) -> Option<Keycode> {
    KEYMAP.get(row)?.get(col).copied()
}

/// Which modifier, if any, is wired at a matrix position.
pub fn modifier_at(row: usize, col: usize) -> Option<Modifier> {
    MODIFIER_POSITIONS
        .iter()
        .find(|&&(r, c, _)| r == row && c == col)
        .map(|&(_, _, modifier)| modifier)
}

/// The CODE-layer key for a matrix position, if one is defined.
pub fn code_combo(row: usize, col: usize) -> Option<Keycode> {
    CODE_COMBOS
        .iter()
        .find(|combo| combo.row == row && combo.col == col)
        .map(|combo| combo.key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_total_over_grid() {
        for row in 0..ROWS {
            for col in 0..COLS {
                let first = lookup(row, col);
                assert!(first.is_some(), "({row}, {col}) unmapped");
                assert_eq!(first, lookup(row, col));
            }
        }
        assert_eq!(lookup(ROWS, 0), None);
        assert_eq!(lookup(0, COLS), None);
    }

    #[test]
    fn test_lookup_known_keys() {
        assert_eq!(lookup(0, 1), Some(Keycode::A));
        assert_eq!(lookup(6, 5), Some(Keycode::Space));
        assert_eq!(lookup(7, 5), Some(Keycode::Delete));
        assert_eq!(lookup(7, 8), Some(Keycode::F12));
        assert_eq!(Keycode::A.code(), 30);
        assert_eq!(Keycode::PageDown.code(), 109);
    }

    #[test]
    fn test_shift_shared_across_rows() {
        for row in [0, 4, 5, 6] {
            assert_eq!(modifier_at(row, MODIFIER_COL), Some(Modifier::Shift));
        }
        assert_eq!(modifier_at(1, MODIFIER_COL), Some(Modifier::Ctrl));
        assert_eq!(modifier_at(2, MODIFIER_COL), Some(Modifier::Alt));
        assert_eq!(modifier_at(3, MODIFIER_COL), Some(Modifier::Code));
        assert_eq!(modifier_at(7, MODIFIER_COL), None);
        assert_eq!(modifier_at(0, 1), None);
    }

    #[test]
    fn test_modifier_keys_match_matrix() {
        for &(row, col, modifier) in MODIFIER_POSITIONS.iter() {
            match modifier.keycode() {
                Some(kc) => {
                    assert!(kc.is_modifier());
                    assert_eq!(lookup(row, col), Some(kc));
                }
                None => assert_eq!(modifier, Modifier::Code),
            }
        }
    }

    #[test]
    fn test_code_combos() {
        assert_eq!(code_combo(6, 5), Some(Keycode::PageUp));
        assert_eq!(code_combo(7, 5), Some(Keycode::PageDown));
        assert_eq!(code_combo(0, 1), None);
    }
}
