//! Platform-independent key events.
//!
//! The native tap hands over a raw virtual key code plus the text the active
//! keyboard layout produced for it. Virtual key codes are positional, so they
//! are only trusted for keys whose meaning doesn't depend on the layout
//! (return, arrows, delete...). Everything else resolves to
//! [`KeyCode::Character`] and carries its text in [`KeyEvent::characters`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical key identity, identical across keyboard layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyCode {
    /// Any key whose meaning comes from the layout-resolved characters.
    Character,
    Return,
    KeypadEnter,
    Tab,
    Delete,
    ForwardDelete,
    Escape,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    PageUp,
    PageDown,
    /// F1..F12
    Function(u8),
}

impl KeyCode {
    /// Resolve a macOS virtual key code (`kVK_*`) to a logical key.
    pub fn from_virtual_keycode(code: u16) -> Self {
        match code {
            0x24 => KeyCode::Return,
            0x4C => KeyCode::KeypadEnter,
            0x30 => KeyCode::Tab,
            0x33 => KeyCode::Delete,
            0x75 => KeyCode::ForwardDelete,
            0x35 => KeyCode::Escape,
            0x7E => KeyCode::ArrowUp,
            0x7D => KeyCode::ArrowDown,
            0x7B => KeyCode::ArrowLeft,
            0x7C => KeyCode::ArrowRight,
            0x73 => KeyCode::Home,
            0x77 => KeyCode::End,
            0x74 => KeyCode::PageUp,
            0x79 => KeyCode::PageDown,
            0x7A => KeyCode::Function(1),
            0x78 => KeyCode::Function(2),
            0x63 => KeyCode::Function(3),
            0x76 => KeyCode::Function(4),
            0x60 => KeyCode::Function(5),
            0x61 => KeyCode::Function(6),
            0x62 => KeyCode::Function(7),
            0x64 => KeyCode::Function(8),
            0x65 => KeyCode::Function(9),
            0x6D => KeyCode::Function(10),
            0x67 => KeyCode::Function(11),
            0x6F => KeyCode::Function(12),
            _ => KeyCode::Character,
        }
    }

    /// Keys the native menu tracking loop needs for navigation and acceptance.
    /// These always fall through, whatever the modifiers.
    pub fn is_menu_navigation(self) -> bool {
        matches!(
            self,
            KeyCode::Return | KeyCode::KeypadEnter | KeyCode::ArrowUp | KeyCode::ArrowDown
        )
    }

    /// Keys the toolkit keeps for itself (dismissal, focus, paging).
    pub fn is_toolkit_reserved(self) -> bool {
        matches!(
            self,
            KeyCode::Tab
                | KeyCode::Escape
                | KeyCode::ArrowLeft
                | KeyCode::ArrowRight
                | KeyCode::Home
                | KeyCode::End
                | KeyCode::PageUp
                | KeyCode::PageDown
                | KeyCode::ForwardDelete
                | KeyCode::Function(_)
        )
    }

    pub fn name(self) -> String {
        match self {
            KeyCode::Character => "character".to_string(),
            KeyCode::Return => "return".to_string(),
            KeyCode::KeypadEnter => "enter".to_string(),
            KeyCode::Tab => "tab".to_string(),
            KeyCode::Delete => "delete".to_string(),
            KeyCode::ForwardDelete => "forward-delete".to_string(),
            KeyCode::Escape => "escape".to_string(),
            KeyCode::ArrowUp => "up".to_string(),
            KeyCode::ArrowDown => "down".to_string(),
            KeyCode::ArrowLeft => "left".to_string(),
            KeyCode::ArrowRight => "right".to_string(),
            KeyCode::Home => "home".to_string(),
            KeyCode::End => "end".to_string(),
            KeyCode::PageUp => "page-up".to_string(),
            KeyCode::PageDown => "page-down".to_string(),
            KeyCode::Function(n) => format!("f{}", n),
        }
    }
}

/// Modifier keys held during a key press.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub command: bool,
    #[serde(default)]
    pub control: bool,
    #[serde(default)]
    pub option: bool,
    #[serde(default)]
    pub shift: bool,
}

impl Modifiers {
    pub fn none() -> Self {
        Self::default()
    }
    pub fn command() -> Self {
        Self {
            command: true,
            ..Default::default()
        }
    }
    pub fn control() -> Self {
        Self {
            control: true,
            ..Default::default()
        }
    }
    pub fn option() -> Self {
        Self {
            option: true,
            ..Default::default()
        }
    }
    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Default::default()
        }
    }

    /// Command, control or option held: the press belongs to a native shortcut.
    /// Shift alone only changes which character is typed.
    pub fn is_shortcut_chord(&self) -> bool {
        self.command || self.control || self.option
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(4);
        if self.command {
            parts.push("cmd");
        }
        if self.control {
            parts.push("ctrl");
        }
        if self.option {
            parts.push("opt");
        }
        if self.shift {
            parts.push("shift");
        }
        if parts.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", parts.join("+"))
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyEventKind {
    KeyDown,
    KeyRepeat,
    KeyUp,
}

/// One key press as seen by the tap. Consumed once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub kind: KeyEventKind,
    pub modifiers: Modifiers,
    /// Characters the active layout produced for the press.
    pub characters: String,
}

impl KeyEvent {
    pub fn new(
        key: KeyCode,
        kind: KeyEventKind,
        modifiers: Modifiers,
        characters: impl Into<String>,
    ) -> Self {
        Self {
            key,
            kind,
            modifiers,
            characters: characters.into(),
        }
    }

    /// Build an event from the raw values a native tap reports.
    pub fn from_virtual_keycode(
        code: u16,
        kind: KeyEventKind,
        modifiers: Modifiers,
        characters: impl Into<String>,
    ) -> Self {
        Self::new(
            KeyCode::from_virtual_keycode(code),
            kind,
            modifiers,
            characters,
        )
    }

    /// A plain key-down that types `c`.
    pub fn character(c: char) -> Self {
        Self::new(
            KeyCode::Character,
            KeyEventKind::KeyDown,
            Modifiers::none(),
            c.to_string(),
        )
    }

    /// A key-down for a non-character key.
    pub fn key_down(key: KeyCode, modifiers: Modifiers) -> Self {
        Self::new(key, KeyEventKind::KeyDown, modifiers, String::new())
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }
}
