//! Keyboard and pointer input types.
//!
//! The list engine consumes already-decoded input: the host toolkit
//! translates raw events into [`Key`] presses and pointer coordinates
//! before handing them to the element. [`KeyCombination`] doubles as the
//! key for the global shortcut table and as the text rendered in
//! menu-style trailing cells ("Ctrl+Q").

use std::fmt;

/// A decoded, layout-independent key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Enter,
    Space,
    Escape,
    /// A printable character key.
    Char(char),
}

/// Modifier keys held during a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyboardModifiers {
    pub control: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl KeyboardModifiers {
    /// No modifiers held.
    pub const NONE: Self = Self {
        control: false,
        alt: false,
        shift: false,
        meta: false,
    };

    /// Control only.
    pub const CTRL: Self = Self {
        control: true,
        alt: false,
        shift: false,
        meta: false,
    };

    /// Alt only.
    pub const ALT: Self = Self {
        control: false,
        alt: true,
        shift: false,
        meta: false,
    };

    /// Shift only.
    pub const SHIFT: Self = Self {
        control: false,
        alt: false,
        shift: true,
        meta: false,
    };

    /// Returns `true` if no modifier is held.
    pub fn is_none(&self) -> bool {
        !self.control && !self.alt && !self.shift && !self.meta
    }
}

/// A key plus the modifiers that must be held with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombination {
    pub key: Key,
    pub modifiers: KeyboardModifiers,
}

impl KeyCombination {
    /// Create a combination from a key and modifiers.
    pub fn new(key: Key, modifiers: KeyboardModifiers) -> Self {
        Self { key, modifiers }
    }

    /// A bare key with no modifiers.
    pub fn key_only(key: Key) -> Self {
        Self::new(key, KeyboardModifiers::NONE)
    }

    /// Ctrl+key.
    pub fn ctrl(key: Key) -> Self {
        Self::new(key, KeyboardModifiers::CTRL)
    }

    /// Alt+key.
    pub fn alt(key: Key) -> Self {
        Self::new(key, KeyboardModifiers::ALT)
    }

    /// Shift+key.
    pub fn shift(key: Key) -> Self {
        Self::new(key, KeyboardModifiers::SHIFT)
    }

    /// Check whether a key press matches this combination.
    pub fn matches(&self, key: Key, modifiers: KeyboardModifiers) -> bool {
        self.key == key && self.modifiers == modifiers
    }
}

impl fmt::Display for KeyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.control {
            write!(f, "Ctrl+")?;
        }
        if self.modifiers.alt {
            write!(f, "Alt+")?;
        }
        if self.modifiers.shift {
            write!(f, "Shift+")?;
        }
        if self.modifiers.meta {
            write!(f, "Meta+")?;
        }
        match self.key {
            Key::Up => write!(f, "Up"),
            Key::Down => write!(f, "Down"),
            Key::Home => write!(f, "Home"),
            Key::End => write!(f, "End"),
            Key::PageUp => write!(f, "PgUp"),
            Key::PageDown => write!(f, "PgDn"),
            Key::Enter => write!(f, "Enter"),
            Key::Space => write!(f, "Space"),
            Key::Escape => write!(f, "Esc"),
            Key::Char(c) => write!(f, "{}", c.to_uppercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combination_matches() {
        let combo = KeyCombination::ctrl(Key::Char('q'));
        assert!(combo.matches(Key::Char('q'), KeyboardModifiers::CTRL));
        assert!(!combo.matches(Key::Char('q'), KeyboardModifiers::NONE));
        assert!(!combo.matches(Key::Char('w'), KeyboardModifiers::CTRL));
    }

    #[test]
    fn test_display_format() {
        assert_eq!(KeyCombination::ctrl(Key::Char('q')).to_string(), "Ctrl+Q");
        assert_eq!(
            KeyCombination::new(
                Key::Char('x'),
                KeyboardModifiers {
                    control: true,
                    shift: true,
                    ..KeyboardModifiers::NONE
                }
            )
            .to_string(),
            "Ctrl+Shift+X"
        );
        assert_eq!(KeyCombination::key_only(Key::Enter).to_string(), "Enter");
    }
}
