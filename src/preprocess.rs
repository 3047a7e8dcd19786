//! Sequence-level text passes that run before number tagging and compilation.
//!
//! Each pass takes a speech sequence by value and returns the rewritten one.
//! Only [`Instruction::Text`] items are touched; markers keep their relative
//! order.

use fancy_regex::Regex as FancyRegex;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::{config::NormalizationForm, instruction::Instruction};

// ─────────────────────────────────────────────────────────────────────────────
// Compiled regexes (lazily initialised once)
// ─────────────────────────────────────────────────────────────────────────────

static RE_DIGIT_COMMA: Lazy<FancyRegex> =
    Lazy::new(|| FancyRegex::new(r"(?<=[0-9]),(?=[0-9])").unwrap());

/// Whitespace with a logographic (Han) character on both sides.
static RE_LOGOGRAPHIC_GAP: Lazy<FancyRegex> = Lazy::new(|| {
    FancyRegex::new(r"(?<=[㐀-䶿一-鿿豈-﫿])\s+(?=[㐀-䶿一-鿿豈-﫿])").unwrap()
});

static RE_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s").unwrap());

// ─────────────────────────────────────────────────────────────────────────────
// Punctuation stripper
// ─────────────────────────────────────────────────────────────────────────────

/// Remove thousands-separator commas sitting between two digits.
pub fn strip_digit_commas(text: &str) -> String {
    RE_DIGIT_COMMA.replace_all(text, "").into_owned()
}

pub fn strip_sequence_digit_commas(seq: Vec<Instruction>) -> Vec<Instruction> {
    map_text(seq, |s| strip_digit_commas(&s))
}

// ─────────────────────────────────────────────────────────────────────────────
// Script spacer
// ─────────────────────────────────────────────────────────────────────────────

/// Split `text` at every whitespace run between two logographic characters.
///
/// The whitespace itself is dropped.  A text with no such boundary comes back
/// as a single piece.
pub fn split_logographic_gaps(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut last = 0;
    // A match error means backtracking blew its limit; keep the rest intact.
    for gap in RE_LOGOGRAPHIC_GAP.find_iter(text).map_while(Result::ok) {
        pieces.push(&text[last..gap.start()]);
        last = gap.end();
    }
    pieces.push(&text[last..]);
    pieces
}

/// Insert a `Break(break_ms)` at every logographic whitespace boundary.
///
/// Adjacent text items are joined first so that a boundary spanning two
/// fragments is still found; markers stay where they were.
pub fn space_logographic_runs(seq: Vec<Instruction>, break_ms: u32) -> Vec<Instruction> {
    let mut out = Vec::with_capacity(seq.len());
    let mut joined = String::new();

    let flush = |joined: &mut String, out: &mut Vec<Instruction>| {
        if joined.is_empty() {
            return;
        }
        for (i, piece) in split_logographic_gaps(joined.as_str()).into_iter().enumerate() {
            if i > 0 {
                out.push(Instruction::Break(break_ms));
            }
            out.push(Instruction::text(piece));
        }
        joined.clear();
    };

    for instruction in seq {
        match instruction {
            Instruction::Text(s) => joined.push_str(&s),
            other => {
                flush(&mut joined, &mut out);
                out.push(other);
            }
        }
    }
    flush(&mut joined, &mut out);
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Length splitter
// ─────────────────────────────────────────────────────────────────────────────

/// Cut `text` into pieces, closing a piece after the whitespace that pushes it
/// past `max_chars`.  Words are never split.
pub fn split_by_length(text: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut fragment = String::new();
    let mut last = 0;
    for space in RE_SPACE.find_iter(text) {
        fragment.push_str(&text[last..space.end()]);
        last = space.end();
        if fragment.chars().count() > max_chars {
            pieces.push(std::mem::take(&mut fragment));
        }
    }
    fragment.push_str(&text[last..]);
    pieces.push(fragment);
    pieces
}

/// Apply [`split_by_length`] to every text item, separating pieces with `Split`.
pub fn split_long_fragments(seq: Vec<Instruction>, max_chars: usize) -> Vec<Instruction> {
    let mut out = Vec::with_capacity(seq.len());
    for instruction in seq {
        match instruction {
            Instruction::Text(s) => {
                for (i, piece) in split_by_length(&s, max_chars).into_iter().enumerate() {
                    if i > 0 {
                        out.push(Instruction::Split);
                    }
                    out.push(Instruction::Text(piece));
                }
            }
            other => out.push(other),
        }
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Unicode normalization
// ─────────────────────────────────────────────────────────────────────────────

pub fn normalize_text(text: &str, form: NormalizationForm) -> String {
    match form {
        NormalizationForm::Off => text.to_string(),
        NormalizationForm::Nfc => text.nfc().collect(),
        NormalizationForm::Nfkc => text.nfkc().collect(),
        NormalizationForm::Nfd => text.nfd().collect(),
        NormalizationForm::Nfkd => text.nfkd().collect(),
    }
}

pub fn normalize_sequence(seq: Vec<Instruction>, form: NormalizationForm) -> Vec<Instruction> {
    if form == NormalizationForm::Off {
        return seq;
    }
    map_text(seq, |s| normalize_text(&s, form))
}

fn map_text(seq: Vec<Instruction>, f: impl Fn(String) -> String) -> Vec<Instruction> {
    seq.into_iter()
        .map(|instruction| match instruction {
            Instruction::Text(s) => Instruction::Text(f(s)),
            other => other,
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
