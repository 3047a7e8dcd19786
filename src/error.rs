//! Error types for speechmux.
//!
//! The compile path itself never fails; these cover configuration parsing and
//! the recoverable phonetic-conversion step.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Cannot convert IPA symbol {symbol:?} in {ipa:?}")]
    UnknownPhoneme { symbol: char, ipa: String },

    #[error("Unknown normalization form: {0}")]
    InvalidNormalization(String),

    #[error("Unknown number mode: {0}")]
    InvalidNumberMode(String),
}

pub type Result<T> = std::result::Result<T, Error>;
