//! # speechmux
//!
//! A speech instruction compiler for multilingual screen-reader output.
//!
//! The host hands over a linear speech sequence (text interleaved with
//! markers for language changes, prosody, bookmarks, breaks, spelling and
//! phonemes) and gets back the calls to make on each synthesizer voice, in
//! whichever of three protocols that voice speaks.
//!
//! ## Quick start
//!
//! ```no_run
//! use speechmux::{CompilerConfig, DigitSymbols, Instruction, VoiceRouter};
//!
//! fn read_aloud(router: &dyn VoiceRouter) -> anyhow::Result<()> {
//!     let config = CompilerConfig::from_json(
//!         r#"{"number_language": "zh", "number_mode": "number"}"#,
//!     )?;
//!     let symbols = DigitSymbols::new()
//!         .with_digits("zh", ["零", "一", "二", "三", "四", "五", "六", "七", "八", "九"]);
//!
//!     let seq = vec![
//!         Instruction::text("Call 110 or "),
//!         Instruction::lang("fr"),
//!         Instruction::text("appelez le 112"),
//!     ];
//!     let calls = speechmux::compile(seq, &config, router, &symbols);
//!     speechmux::dispatch(&calls);
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//! 1. **Digit-comma stripping**: `1,000` → `1000` (optional).
//! 2. **Numeric tagging**: numbers wrapped in language changes and localized.
//! 3. **Script spacing**: breaks between whitespace-separated Han runs (optional).
//! 4. **Length splitting**: `Split` markers in long fragments (optional).
//! 5. **Normalization**: NFC / NFKC / NFD / NFKD on text (optional).
//! 6. **Stabilization**: language changes moved next to the text they govern.
//! 7. **Multiplexing**: voice switching and per-engine encoding.

pub mod compiler;
pub mod config;
pub mod driver;
pub mod error;
pub mod instruction;
pub mod markup;
pub mod numbers;
pub mod phoneme;
pub mod pipeline;
pub mod preprocess;
pub mod stabilize;
pub mod voice;

#[cfg(test)]
mod testing;

// ─── Re-exports for convenience ─────────────────────────────────────────────

pub use compiler::{dispatch, BackendCall, BackendOp};
pub use config::{CompilerConfig, NormalizationForm, NumberMode};
pub use driver::SpeechDriver;
pub use error::Error;
pub use instruction::{Instruction, ProsodyValue};
pub use pipeline::compile;
pub use voice::{DigitSymbols, EngineKind, SymbolTable, Voice, VoiceRef, VoiceRouter};
