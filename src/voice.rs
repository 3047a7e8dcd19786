//! Backend seams: voice handles, the voice router and the digit symbol table.
//!
//! The compiler never constructs a voice.  It asks the host's [`VoiceRouter`]
//! for one by locale and compares handles by identity only.

use std::{collections::HashMap, fmt, path::Path, sync::Arc};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

// ─────────────────────────────────────────────────────────────────────────────
// Engine kinds
// ─────────────────────────────────────────────────────────────────────────────

/// The three backend protocol families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    /// Text chunks joined by a separator, inline `\x1b\key=value\` directives.
    Chunk,
    /// XML-like markup with nested prosody elements.
    Markup,
    /// Plain sequential calls: speak, index.
    Plain,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EngineKind::Chunk => "chunk",
            EngineKind::Markup => "markup",
            EngineKind::Plain => "plain",
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Voice handles
// ─────────────────────────────────────────────────────────────────────────────

/// One synthesizer voice instance as exposed by the host.
///
/// Prosody getters return the voice's current 0..100 settings.  The compiler
/// reads them but never writes them.
pub trait Voice: Send + Sync {
    fn name(&self) -> &str;
    fn engine(&self) -> EngineKind;
    fn language(&self) -> &str;

    fn pitch(&self) -> u8;
    fn rate(&self) -> u8;
    fn volume(&self) -> u8;

    /// Hand one encoded payload to the backend.
    fn speak(&self, payload: &str) -> Result<()>;

    /// Insert silence of `ms` milliseconds after everything spoken so far.
    fn insert_break(&self, ms: u32) -> Result<()>;

    /// Bookmark call for engines without inline bookmarks.
    fn index(&self, _id: u32) -> Result<()> {
        Ok(())
    }

    fn pause(&self) {}
    fn resume(&self) {}
    fn stop(&self) {}
}

/// Shared voice handle.  Two handles are the same voice iff [`same_voice`].
pub type VoiceRef = Arc<dyn Voice>;

/// Identity comparison of two handles as returned by the router.
pub fn same_voice(a: &VoiceRef, b: &VoiceRef) -> bool {
    Arc::ptr_eq(a, b)
}

/// Locale → voice lookup owned by the host.
///
/// Implementations must be side-effect free; routing only changes between
/// top-level `speak` calls.
pub trait VoiceRouter {
    fn resolve(&self, language: &str) -> Option<VoiceRef>;
    fn default_voice(&self) -> VoiceRef;
    fn default_language(&self) -> String;
}

// ─────────────────────────────────────────────────────────────────────────────
// Digit symbol table
// ─────────────────────────────────────────────────────────────────────────────

/// Per-language replacement strings for single ASCII digits.
pub trait SymbolTable {
    fn lookup(&self, digit: char, language: &str) -> Option<String>;
}

/// Language key whose entries apply to every language.
pub const ANY_LANGUAGE: &str = "*";

/// Map-backed [`SymbolTable`].
///
/// JSON layout: `{ "zh": { "0": "零", "1": "一" }, "*": { ... } }`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct DigitSymbols {
    languages: HashMap<String, HashMap<char, String>>,
}

impl DigitSymbols {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a replacement for `digit` in `language`.
    pub fn insert(&mut self, language: &str, digit: char, replacement: impl Into<String>) {
        self.languages
            .entry(language.to_string())
            .or_default()
            .insert(digit, replacement.into());
    }

    /// Register all ten digits for `language` at once, `0` first.
    pub fn with_digits(mut self, language: &str, words: [&str; 10]) -> Self {
        for (d, word) in ('0'..='9').zip(words) {
            self.insert(language, d, word);
        }
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let table: Self = serde_json::from_str(json).context("Failed to parse symbol table")?;
        table.validate()?;
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read symbol table: {}", path.display()))?;
        Self::from_json(&text)
    }

    fn validate(&self) -> Result<()> {
        for (language, digits) in &self.languages {
            if let Some(d) = digits.keys().find(|d| !d.is_ascii_digit()) {
                bail!("Symbol table entry {:?} for '{}' is not a digit", d, language);
            }
        }
        Ok(())
    }
}

impl SymbolTable for DigitSymbols {
    fn lookup(&self, digit: char, language: &str) -> Option<String> {
        [language, ANY_LANGUAGE]
            .iter()
            .filter_map(|lang| self.languages.get(*lang))
            .find_map(|digits| digits.get(&digit))
            .filter(|s| !s.is_empty())
            .cloned()
    }
}
