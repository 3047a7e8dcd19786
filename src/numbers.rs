//! Numeric tagging: speaks numbers in a language of their own.
//!
//! Every numeric run inside a text fragment is cut out, localized through the
//! [`SymbolTable`], and wrapped in a pair of language changes: one into the
//! number language, one back to whatever language was in force just before
//! the number.
//!
//! Tagging happens in two passes.  The first splits text and drops
//! placeholder markers around each run; the second walks the result once,
//! tracking the active language, and turns the placeholders into real
//! [`Instruction::LanguageChange`]s.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    config::{CompilerConfig, NumberMode},
    instruction::Instruction,
    voice::SymbolTable,
};

/// Signed integers, decimals, ratios and clock times; always ends on a digit.
static RE_NUMBER_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9+\-]+[0-9.:]*[0-9]+|[0-9]").unwrap());

// ─────────────────────────────────────────────────────────────────────────────
// Run localization
// ─────────────────────────────────────────────────────────────────────────────

/// Replace every ASCII digit that has an entry for `language`; anything else
/// is kept literally.
pub fn translate_digits(s: &str, language: &str, symbols: &dyn SymbolTable) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c.is_ascii_digit().then(|| symbols.lookup(c, language)).flatten() {
            Some(replacement) => out.push_str(&replacement),
            None => out.push(c),
        }
    }
    out
}

/// Spoken form of one numeric run.
///
/// * `value` mode keeps the run as written unless it has more than two
///   dot-separated segments; then lone-digit segments are localized and the
///   dots replaced.
/// * `number` mode spaces every digit, localizes every segment and replaces
///   the dots.
pub fn localize_number(
    run: &str,
    mode: NumberMode,
    language: &str,
    symbols: &dyn SymbolTable,
    dot_replacement: &str,
) -> String {
    let segment_count = run.split('.').count();
    let spoken = match mode {
        NumberMode::Value => run.to_string(),
        NumberMode::Number => {
            let spaced: Vec<String> = run.chars().map(String::from).collect();
            spaced.join(" ").replace(" . ", ".")
        }
    };

    if segment_count <= 2 && mode == NumberMode::Value {
        return spoken;
    }

    spoken
        .split('.')
        .map(|segment| {
            if mode == NumberMode::Number || segment.chars().count() == 1 {
                translate_digits(segment, language, symbols)
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(dot_replacement)
}

// ─────────────────────────────────────────────────────────────────────────────
// Sequence tagging
// ─────────────────────────────────────────────────────────────────────────────

enum Tagged {
    Item(Instruction),
    NumberStart,
    NumberEnd,
}

/// Number-speaking settings extracted from [`CompilerConfig`].
pub struct NumberTagger<'a> {
    mode: NumberMode,
    language: String,
    dot_replacement: &'a str,
    symbols: &'a dyn SymbolTable,
}

impl<'a> NumberTagger<'a> {
    /// `default_language` is used when the config names no number language.
    pub fn new(config: &'a CompilerConfig, symbols: &'a dyn SymbolTable, default_language: &str) -> Self {
        Self {
            mode: config.number_mode,
            language: config
                .number_language
                .clone()
                .unwrap_or_else(|| default_language.to_string()),
            dot_replacement: &config.number_dot_replacement,
            symbols,
        }
    }

    fn split_text(&self, text: &str, out: &mut Vec<Tagged>) {
        let mut last = 0;
        for m in RE_NUMBER_RUN.find_iter(text) {
            if m.start() > last {
                out.push(Tagged::Item(Instruction::text(&text[last..m.start()])));
            }
            let spoken = localize_number(
                m.as_str(),
                self.mode,
                &self.language,
                self.symbols,
                self.dot_replacement,
            );
            out.push(Tagged::NumberStart);
            out.push(Tagged::Item(Instruction::Text(spoken)));
            out.push(Tagged::NumberEnd);
            last = m.end();
        }
        if last < text.len() || last == 0 {
            out.push(Tagged::Item(Instruction::text(&text[last..])));
        }
    }

    /// Rewrite `seq`, starting from `active_language`.
    pub fn tag(&self, seq: Vec<Instruction>, active_language: &str) -> Vec<Instruction> {
        let mut tagged = Vec::with_capacity(seq.len());
        for instruction in seq {
            match instruction {
                Instruction::Text(s) => self.split_text(&s, &mut tagged),
                other => tagged.push(Tagged::Item(other)),
            }
        }

        let mut current = active_language.to_string();
        tagged
            .into_iter()
            .map(|t| match t {
                Tagged::NumberStart => Instruction::lang(self.language.as_str()),
                Tagged::NumberEnd => Instruction::lang(current.as_str()),
                Tagged::Item(instruction) => {
                    if let Instruction::LanguageChange(code) = &instruction {
                        current = code.clone().unwrap_or_else(|| active_language.to_string());
                    }
                    instruction
                }
            })
            .collect()
    }
}

/// Tag every numeric run in `seq`; see the module docs.
pub fn tag_numbers(
    seq: Vec<Instruction>,
    config: &CompilerConfig,
    symbols: &dyn SymbolTable,
    active_language: &str,
) -> Vec<Instruction> {
    NumberTagger::new(config, symbols, active_language).tag(seq, active_language)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
