//! The abstract speech instruction stream.
//!
//! A speech sequence is a flat, ordered list of [`Instruction`]s: literal text
//! interleaved with control markers.  Every pass in this crate consumes a
//! `Vec<Instruction>` and produces a new one; nothing is shared between items.

use std::fmt;

/// A prosody change carried by `Pitch` / `Rate` / `Volume`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProsodyValue {
    /// Absolute value on the 0..100 scale.
    Absolute(u8),
    /// Multiplier applied to the voice's own base value.
    Multiplier(f64),
}

impl ProsodyValue {
    /// Resolve against the voice's base value (0..100).
    ///
    /// The result is not clamped; callers bound it for their own protocol.
    pub fn scaled(self, base: u8) -> f64 {
        match self {
            ProsodyValue::Absolute(v) => f64::from(v),
            ProsodyValue::Multiplier(m) => f64::from(base) * m,
        }
    }

    /// `true` when the change leaves the voice at its base value.
    pub fn is_neutral(self, base: u8) -> bool {
        match self {
            ProsodyValue::Absolute(v) => v == base,
            ProsodyValue::Multiplier(m) => m == 1.0,
        }
    }
}

/// One element of a speech sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Literal spoken content.
    Text(String),
    /// Bookmark used by the host to correlate playback with source position.
    IndexMark(u32),
    /// Switch the active voice; `None` reverts to the default voice.
    LanguageChange(Option<String>),
    /// Silence in milliseconds.
    Break(u32),
    /// Spelled-out delivery on / off.
    CharacterMode(bool),
    Pitch(ProsodyValue),
    Rate(ProsodyValue),
    Volume(ProsodyValue),
    /// Phonetic payload with a display fallback.
    Phoneme { ipa: String, text: String },
    /// Flush without changing voice (caps fragment length).
    Split,
    /// A host command this crate does not understand.  Logged and skipped.
    Unsupported(String),
}

impl Instruction {
    /// Shorthand for `Instruction::Text(s.into())`.
    pub fn text(s: impl Into<String>) -> Self {
        Instruction::Text(s.into())
    }

    /// Shorthand for a language change to `code`.
    pub fn lang(code: impl Into<String>) -> Self {
        Instruction::LanguageChange(Some(code.into()))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Text(s) => write!(f, "{:?}", s),
            Instruction::IndexMark(i) => write!(f, "IndexMark({})", i),
            Instruction::LanguageChange(Some(code)) => write!(f, "LanguageChange({})", code),
            Instruction::LanguageChange(None) => f.write_str("LanguageChange(default)"),
            Instruction::Break(ms) => write!(f, "Break({}ms)", ms),
            Instruction::CharacterMode(on) => write!(f, "CharacterMode({})", on),
            Instruction::Pitch(v) => write!(f, "Pitch({:?})", v),
            Instruction::Rate(v) => write!(f, "Rate({:?})", v),
            Instruction::Volume(v) => write!(f, "Volume({:?})", v),
            Instruction::Phoneme { ipa, .. } => write!(f, "Phoneme({})", ipa),
            Instruction::Split => f.write_str("Split"),
            Instruction::Unsupported(kind) => write!(f, "Unsupported({})", kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prosody_scaled() {
        assert_eq!(ProsodyValue::Absolute(70).scaled(50), 70.0);
        assert_eq!(ProsodyValue::Multiplier(1.5).scaled(40), 60.0);
    }

    #[test]
    fn test_prosody_neutral() {
        assert!(ProsodyValue::Multiplier(1.0).is_neutral(30));
        assert!(ProsodyValue::Absolute(30).is_neutral(30));
        assert!(!ProsodyValue::Absolute(31).is_neutral(30));
    }

    #[test]
    fn test_display() {
        assert_eq!(Instruction::LanguageChange(None).to_string(), "LanguageChange(default)");
        assert_eq!(Instruction::lang("fr").to_string(), "LanguageChange(fr)");
        assert_eq!(Instruction::Break(500).to_string(), "Break(500ms)");
    }
}
