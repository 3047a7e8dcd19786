//! Compiler configuration.
//!
//! One immutable [`CompilerConfig`] is passed into every compile call.  The
//! host owns persistence and hands a fresh value over between `speak` calls.

use std::{fmt, path::Path, str::FromStr};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Enumerated settings
// ─────────────────────────────────────────────────────────────────────────────

/// How numeric runs are spoken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberMode {
    /// Read the numeral string as a value ("101" → one hundred and one).
    #[default]
    Value,
    /// Read every digit on its own ("101" → one zero one).
    Number,
}

impl FromStr for NumberMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "value" => Ok(NumberMode::Value),
            "number" => Ok(NumberMode::Number),
            other => Err(Error::InvalidNumberMode(other.to_string())),
        }
    }
}

/// Unicode normalization applied to text fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum NormalizationForm {
    #[default]
    #[serde(rename = "OFF")]
    Off,
    #[serde(rename = "NFC")]
    Nfc,
    #[serde(rename = "NFKC")]
    Nfkc,
    #[serde(rename = "NFD")]
    Nfd,
    #[serde(rename = "NFKD")]
    Nfkd,
}

impl NormalizationForm {
    pub const ALL: [NormalizationForm; 5] = [
        NormalizationForm::Off,
        NormalizationForm::Nfc,
        NormalizationForm::Nfkc,
        NormalizationForm::Nfd,
        NormalizationForm::Nfkd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NormalizationForm::Off => "OFF",
            NormalizationForm::Nfc => "NFC",
            NormalizationForm::Nfkc => "NFKC",
            NormalizationForm::Nfd => "NFD",
            NormalizationForm::Nfkd => "NFKD",
        }
    }
}

impl fmt::Display for NormalizationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NormalizationForm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|form| form.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidNormalization(s.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CompilerConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Read-only flags consumed by the preprocessing passes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Replaces `.` between number segments when per-segment handling applies.
    pub number_dot_replacement: String,

    /// Drop thousands-separator commas between digits (`1,000` → `1000`).
    pub ignore_comma_between_numbers: bool,

    /// Logographic spacing factor; `0` disables the script spacer.
    /// Each boundary becomes a break of `factor × 5` ms.
    pub script_wait_factor: u32,

    pub normalization: NormalizationForm,

    pub number_mode: NumberMode,

    /// Locale numbers are spoken in; `None` keeps the driver's language.
    pub number_language: Option<String>,

    /// Cap on text fragment length; longer fragments get `Split` markers.
    pub max_fragment_chars: Option<usize>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            number_dot_replacement: ".".to_string(),
            ignore_comma_between_numbers: false,
            script_wait_factor: 0,
            normalization: NormalizationForm::Off,
            number_mode: NumberMode::Value,
            number_language: None,
            max_fragment_chars: None,
        }
    }
}

impl CompilerConfig {
    /// Parse a JSON document; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse compiler config")
    }

    /// Load a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Cannot read config: {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Break length inserted by the script spacer, or `None` when disabled.
    pub fn script_break_ms(&self) -> Option<u32> {
        (self.script_wait_factor != 0).then(|| self.script_wait_factor.saturating_mul(5))
    }
}
