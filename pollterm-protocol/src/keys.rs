//! Key encoding for the terminal key stream
//!
//! Key events are described the way a keyboard reports them: a key code,
//! the character code (`which`, zero for keys without a printable
//! character) and the held modifiers. The encoder maps a descriptor to the
//! bytes a terminal expects: control codes for Ctrl chords, CSI-style
//! sequences for navigation and function keys, and the plain character
//! otherwise.
//!
//! The mapping is table-driven: one static table holds every fixed entry and
//! only the Ctrl+letter range is computed.

use std::fmt;

use crate::escape::escape_text;

bitflags::bitflags! {
    /// Modifier keys held during a key event
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL = 0b0010;
        const ALT = 0b0100;
        const META = 0b1000;
    }
}

/// Whether the key went down or came up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPhase {
    Down,
    Up,
}

/// Raw keyboard event descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// Physical key code (65 = A, 38 = Up, 112 = F1, ...)
    pub key_code: u32,
    /// Character code of the key, zero for non-printable keys
    pub which: u32,
    pub modifiers: Modifiers,
    pub phase: KeyPhase,
}

impl KeyEvent {
    /// Key-down of a key without a character (arrows, function keys, Tab...)
    pub fn non_printable(key_code: u32) -> Self {
        Self {
            key_code,
            which: 0,
            modifiers: Modifiers::empty(),
            phase: KeyPhase::Down,
        }
    }

    /// Key-down producing character `c`
    pub fn printable(c: char) -> Self {
        let code = u32::from(c);
        Self {
            key_code: code,
            which: code,
            modifiers: Modifiers::empty(),
            phase: KeyPhase::Down,
        }
    }

    /// Key-up of `key_code`
    pub fn release(key_code: u32) -> Self {
        Self {
            phase: KeyPhase::Up,
            ..Self::non_printable(key_code)
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// The code the encoder dispatches on: `which` when set, else `key_code`
    pub fn code(&self) -> u32 {
        if self.which != 0 {
            self.which
        } else {
            self.key_code
        }
    }

    fn class(&self) -> KeyClass {
        if self.modifiers.intersects(Modifiers::CTRL | Modifiers::ALT) {
            KeyClass::Chord
        } else if self.which == 0 {
            KeyClass::NonPrintable
        } else {
            KeyClass::Printable
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self.phase {
            KeyPhase::Down => "kd",
            KeyPhase::Up => "ku",
        };
        write!(
            f,
            "{} kC={} w={} sh={} ct={} al={}",
            phase,
            self.key_code,
            self.which,
            self.modifiers.contains(Modifiers::SHIFT),
            self.modifiers.contains(Modifiers::CTRL),
            self.modifiers.contains(Modifiers::ALT),
        )
    }
}

/// Dispatch class of an event, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyClass {
    /// Ctrl or Alt held
    Chord,
    /// No character code
    NonPrintable,
    /// Plain character, possibly shifted
    Printable,
}

/// One fixed entry of the key map
#[derive(Debug, Clone, Copy)]
struct KeyBinding {
    class: KeyClass,
    code: u32,
    output: &'static str,
}

const fn bind(class: KeyClass, code: u32, output: &'static str) -> KeyBinding {
    KeyBinding {
        class,
        code,
        output,
    }
}

pub const BACKSPACE: u32 = 8;
pub const TAB: u32 = 9;
pub const ESCAPE: u32 = 27;
pub const PAGE_UP: u32 = 33;

/// Key codes of modifier keys; pressing one alone never emits anything
const MODIFIER_KEYS: &[u32] = &[16, 17, 18, 20, 91, 92, 93, 224];

use KeyClass::{Chord, NonPrintable};

static KEY_TABLE: &[KeyBinding] = &[
    // Ctrl punctuation
    bind(Chord, 54, "\x1e"),  // Ctrl-^
    bind(Chord, 109, "\x1f"), // Ctrl-_
    bind(Chord, 219, "\x1b"), // Ctrl-[
    bind(Chord, 220, "\x1c"), // Ctrl-\
    bind(Chord, 221, "\x1d"), // Ctrl-]
    bind(Chord, 50, "\x00"),  // Ctrl-@
    // Single-byte keys
    bind(NonPrintable, TAB, "\t"),
    bind(NonPrintable, BACKSPACE, "\x7f"),
    bind(NonPrintable, ESCAPE, "\x1b"),
    // Navigation
    bind(NonPrintable, PAGE_UP, "\x1b[5~"),
    bind(NonPrintable, 34, "\x1b[6~"), // PgDn
    bind(NonPrintable, 35, "\x1b[4~"), // End
    bind(NonPrintable, 36, "\x1b[1~"), // Home
    bind(NonPrintable, 37, "\x1b[D"),  // Left
    bind(NonPrintable, 38, "\x1b[A"),  // Up
    bind(NonPrintable, 39, "\x1b[C"),  // Right
    bind(NonPrintable, 40, "\x1b[B"),  // Down
    bind(NonPrintable, 45, "\x1b[2~"), // Ins
    bind(NonPrintable, 46, "\x1b[3~"), // Del
    // Function keys
    bind(NonPrintable, 112, "\x1b[[A"),
    bind(NonPrintable, 113, "\x1b[[B"),
    bind(NonPrintable, 114, "\x1b[[C"),
    bind(NonPrintable, 115, "\x1b[[D"),
    bind(NonPrintable, 116, "\x1b[[E"),
    bind(NonPrintable, 117, "\x1b[17~"),
    bind(NonPrintable, 118, "\x1b[18~"),
    bind(NonPrintable, 119, "\x1b[19~"),
    bind(NonPrintable, 120, "\x1b[20~"),
    bind(NonPrintable, 121, "\x1b[21~"),
    bind(NonPrintable, 122, "\x1b[23~"),
    bind(NonPrintable, 123, "\x1b[24~"),
];

fn lookup(class: KeyClass, code: u32) -> Option<&'static str> {
    KEY_TABLE
        .iter()
        .find(|binding| binding.class == class && binding.code == code)
        .map(|binding| binding.output)
}

/// Ctrl-A..Ctrl-Z for either letter case
fn control_letter(code: u32) -> Option<char> {
    match code {
        65..=90 => char::from_u32(code - 64),
        97..=122 => char::from_u32(code - 96),
        _ => None,
    }
}

/// Maps key events to terminal input
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyEncoder {
    /// Emit a lone ESC when PgUp is released
    ///
    /// Some keyboard layers deliver Alt as a PgUp release; a few hosts rely
    /// on the ESC this produces. Off unless asked for.
    pub legacy_keyup_escape: bool,
}

impl KeyEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_legacy_keyup_escape(mut self, enabled: bool) -> Self {
        self.legacy_keyup_escape = enabled;
        self
    }

    /// Terminal text for one key event, or `None` if the key has no meaning
    /// to the terminal
    pub fn encode(&self, event: &KeyEvent) -> Option<String> {
        if event.phase == KeyPhase::Up {
            return (self.legacy_keyup_escape && event.key_code == PAGE_UP)
                .then(|| "\x1b".to_string());
        }

        if event.which == 0 && MODIFIER_KEYS.contains(&event.key_code) {
            return None;
        }

        let code = event.code();

        match event.class() {
            // Key code 109 (`-`/`_`) shares its value with a lowercase `m`
            KeyClass::Chord if event.which == 0 => lookup(KeyClass::Chord, code)
                .map(String::from)
                .or_else(|| control_letter(code).map(String::from)),
            KeyClass::Chord => control_letter(code)
                .map(String::from)
                .or_else(|| lookup(KeyClass::Chord, code).map(String::from)),
            KeyClass::NonPrintable => lookup(KeyClass::NonPrintable, code).map(String::from),
            KeyClass::Printable if code == BACKSPACE => Some("\x7f".to_string()),
            KeyClass::Printable => char::from_u32(code).map(String::from),
        }
    }

    /// Encode and escape for transport in the `k` field
    pub fn encode_escaped(&self, event: &KeyEvent) -> Option<String> {
        self.encode(event).map(|text| escape_text(&text))
    }
}
