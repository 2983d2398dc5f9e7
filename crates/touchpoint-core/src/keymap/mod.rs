//! Key identifiers and modifier state for the keyboard control modality.
//!
//! Keys are named by their DOM `KeyboardEvent.code` string (`"KeyE"`,
//! `"ArrowLeft"`, `"Space"`, ...).  These names describe **physical key
//! positions**, not characters, so the W/A/S/D movement cluster stays in the
//! same place on AZERTY or Dvorak layouts.
//!
//! Some older input stacks report arrow keys as `"Left"`, `"Right"`, `"Up"`
//! and `"Down"`; those legacy names parse to the same [`KeyCode`] variants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string is not a recognised key code name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown key code: {0:?}")]
pub struct UnknownKeyCode(pub String);

macro_rules! key_codes {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// A physical key, named by its DOM `KeyboardEvent.code` string.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum KeyCode {
            $($variant,)+
        }

        impl KeyCode {
            /// Returns the canonical DOM code string for this key.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(KeyCode::$variant => $name,)+
                }
            }
        }

        impl FromStr for KeyCode {
            type Err = UnknownKeyCode;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(KeyCode::$variant),)+
                    // Legacy arrow names.
                    "Left" => Ok(KeyCode::ArrowLeft),
                    "Right" => Ok(KeyCode::ArrowRight),
                    "Up" => Ok(KeyCode::ArrowUp),
                    "Down" => Ok(KeyCode::ArrowDown),
                    other => Err(UnknownKeyCode(other.to_string())),
                }
            }
        }
    };
}

key_codes! {
    KeyA => "KeyA", KeyB => "KeyB", KeyC => "KeyC", KeyD => "KeyD",
    KeyE => "KeyE", KeyF => "KeyF", KeyG => "KeyG", KeyH => "KeyH",
    KeyI => "KeyI", KeyJ => "KeyJ", KeyK => "KeyK", KeyL => "KeyL",
    KeyM => "KeyM", KeyN => "KeyN", KeyO => "KeyO", KeyP => "KeyP",
    KeyQ => "KeyQ", KeyR => "KeyR", KeyS => "KeyS", KeyT => "KeyT",
    KeyU => "KeyU", KeyV => "KeyV", KeyW => "KeyW", KeyX => "KeyX",
    KeyY => "KeyY", KeyZ => "KeyZ",
    Digit0 => "Digit0", Digit1 => "Digit1", Digit2 => "Digit2", Digit3 => "Digit3",
    Digit4 => "Digit4", Digit5 => "Digit5", Digit6 => "Digit6", Digit7 => "Digit7",
    Digit8 => "Digit8", Digit9 => "Digit9",
    ArrowLeft => "ArrowLeft", ArrowRight => "ArrowRight",
    ArrowUp => "ArrowUp", ArrowDown => "ArrowDown",
    Space => "Space", Escape => "Escape", Enter => "Enter", Tab => "Tab",
    Backspace => "Backspace",
    ControlLeft => "ControlLeft", ControlRight => "ControlRight",
    ShiftLeft => "ShiftLeft", ShiftRight => "ShiftRight",
    AltLeft => "AltLeft", AltRight => "AltRight",
    MetaLeft => "MetaLeft", MetaRight => "MetaRight",
    F1 => "F1", F2 => "F2", F3 => "F3", F4 => "F4", F5 => "F5", F6 => "F6",
    F7 => "F7", F8 => "F8", F9 => "F9", F10 => "F10", F11 => "F11", F12 => "F12",
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for KeyCode {
    type Error = UnknownKeyCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyCode> for String {
    fn from(code: KeyCode) -> Self {
        code.as_str().to_string()
    }
}

/// Modifier keys held while a key event was generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_code_parses_dom_names() {
        assert_eq!("KeyE".parse::<KeyCode>().unwrap(), KeyCode::KeyE);
        assert_eq!("ArrowLeft".parse::<KeyCode>().unwrap(), KeyCode::ArrowLeft);
        assert_eq!("Space".parse::<KeyCode>().unwrap(), KeyCode::Space);
    }

    #[test]
    fn test_legacy_arrow_names_map_to_arrow_keys() {
        assert_eq!("Left".parse::<KeyCode>().unwrap(), KeyCode::ArrowLeft);
        assert_eq!("Right".parse::<KeyCode>().unwrap(), KeyCode::ArrowRight);
        assert_eq!("Up".parse::<KeyCode>().unwrap(), KeyCode::ArrowUp);
        assert_eq!("Down".parse::<KeyCode>().unwrap(), KeyCode::ArrowDown);
    }

    #[test]
    fn test_unknown_key_code_is_rejected() {
        let err = "Hyper".parse::<KeyCode>().unwrap_err();
        assert_eq!(err, UnknownKeyCode("Hyper".to_string()));
    }

    #[test]
    fn test_key_code_serde_uses_dom_string() {
        let json = serde_json::to_string(&KeyCode::KeyQ).unwrap();
        assert_eq!(json, r#""KeyQ""#);
        let back: KeyCode = serde_json::from_str(r#""Escape""#).unwrap();
        assert_eq!(back, KeyCode::Escape);
    }

    #[test]
    fn test_key_code_serde_rejects_unknown_string() {
        assert!(serde_json::from_str::<KeyCode>(r#""NotAKey""#).is_err());
    }

    #[test]
    fn test_modifiers_default_to_none() {
        let m: Modifiers = serde_json::from_str("{}").unwrap();
        assert_eq!(m, Modifiers::NONE);
    }
}
