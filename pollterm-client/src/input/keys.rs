//! Key translation for terminal input
//!
//! Translates crossterm key events into the key descriptors the protocol
//! encoder understands. Codes follow the conventional keyboard numbering
//! (65 = A, 37..40 = arrows, 112.. = F1..) so the encoder's tables apply
//! unchanged.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, ModifierKeyCode};
use pollterm_protocol::{KeyEvent as RawKey, Modifiers};

/// Translate a crossterm key event to a protocol key descriptor
///
/// Returns `None` for keys with no counterpart on a conventional keyboard
/// (media keys, keypad begin, ...).
pub fn translate_key(key: &KeyEvent) -> Option<RawKey> {
    let modifiers = translate_modifiers(key.modifiers);

    let raw = match key.code {
        KeyCode::Char(c) if modifiers.intersects(Modifiers::CTRL | Modifiers::ALT) => {
            RawKey::non_printable(chord_code(c)?)
        }
        KeyCode::Char(c) => RawKey::printable(c),
        KeyCode::Null => RawKey::non_printable(CTRL_AT),
        KeyCode::Enter => RawKey::printable('\r'),
        KeyCode::Tab | KeyCode::BackTab => RawKey::non_printable(9),
        KeyCode::Backspace => RawKey::non_printable(8),
        KeyCode::Esc => RawKey::non_printable(27),
        KeyCode::PageUp => RawKey::non_printable(33),
        KeyCode::PageDown => RawKey::non_printable(34),
        KeyCode::End => RawKey::non_printable(35),
        KeyCode::Home => RawKey::non_printable(36),
        KeyCode::Left => RawKey::non_printable(37),
        KeyCode::Up => RawKey::non_printable(38),
        KeyCode::Right => RawKey::non_printable(39),
        KeyCode::Down => RawKey::non_printable(40),
        KeyCode::Insert => RawKey::non_printable(45),
        KeyCode::Delete => RawKey::non_printable(46),
        KeyCode::F(n @ 1..=12) => RawKey::non_printable(111 + u32::from(n)),
        KeyCode::CapsLock => RawKey::non_printable(20),
        KeyCode::Modifier(m) => RawKey::non_printable(modifier_code(m)),
        _ => return None,
    };

    let raw = match key.code {
        KeyCode::Null => raw.with_modifiers(modifiers | Modifiers::CTRL),
        _ => raw.with_modifiers(modifiers),
    };

    if key.kind == KeyEventKind::Release {
        Some(RawKey::release(raw.code()).with_modifiers(raw.modifiers))
    } else {
        Some(raw)
    }
}

/// Key code of `@`/`2`, the Ctrl-@ (NUL) chord
const CTRL_AT: u32 = 50;

/// Key code for a character typed with Ctrl or Alt held
///
/// Letters use their key code. Legacy terminals report Ctrl-\ through
/// Ctrl-_ as Ctrl-4 through Ctrl-7, and Ctrl-@ as Ctrl-Space, so those are
/// folded onto the punctuation keys.
fn chord_code(c: char) -> Option<u32> {
    match c {
        'a'..='z' | 'A'..='Z' => Some(u32::from(c.to_ascii_uppercase())),
        '^' | '6' => Some(54),
        '_' | '-' | '7' => Some(109),
        '[' | '3' => Some(219),
        '\\' | '4' => Some(220),
        ']' | '5' => Some(221),
        '@' | '2' | ' ' => Some(CTRL_AT),
        _ => None,
    }
}

fn modifier_code(key: ModifierKeyCode) -> u32 {
    match key {
        ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => 16,
        ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => 17,
        ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => 18,
        ModifierKeyCode::RightSuper | ModifierKeyCode::RightMeta => 92,
        _ => 91,
    }
}

pub fn translate_modifiers(modifiers: KeyModifiers) -> Modifiers {
    let mut out = Modifiers::empty();
    if modifiers.contains(KeyModifiers::SHIFT) {
        out |= Modifiers::SHIFT;
    }
    if modifiers.contains(KeyModifiers::CONTROL) {
        out |= Modifiers::CTRL;
    }
    if modifiers.contains(KeyModifiers::ALT) {
        out |= Modifiers::ALT;
    }
    if modifiers.intersects(KeyModifiers::SUPER | KeyModifiers::META) {
        out |= Modifiers::META;
    }
    out
}
