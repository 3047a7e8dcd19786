//! The full pass chain, in order:
//!
//! 1. digit-comma stripping (optional)
//! 2. numeric tagging
//! 3. logographic script spacing (optional)
//! 4. fragment length splitting (optional)
//! 5. Unicode normalization (optional)
//! 6. stabilization
//! 7. engine multiplexing

use tracing::debug;

use crate::{
    compiler::{multiplex, BackendCall},
    config::CompilerConfig,
    instruction::Instruction,
    numbers::tag_numbers,
    preprocess::{
        normalize_sequence, space_logographic_runs, split_long_fragments,
        strip_sequence_digit_commas,
    },
    stabilize::stabilize,
    voice::{SymbolTable, VoiceRouter},
};

/// Run passes 1–6.  `language` is the language active at the start of `seq`.
pub fn prepare(
    seq: Vec<Instruction>,
    config: &CompilerConfig,
    symbols: &dyn SymbolTable,
    language: &str,
) -> Vec<Instruction> {
    let mut seq = seq;
    if config.ignore_comma_between_numbers {
        seq = strip_sequence_digit_commas(seq);
    }
    seq = tag_numbers(seq, config, symbols, language);
    if let Some(break_ms) = config.script_break_ms() {
        seq = space_logographic_runs(seq, break_ms);
    }
    if let Some(max_chars) = config.max_fragment_chars {
        seq = split_long_fragments(seq, max_chars);
    }
    seq = normalize_sequence(seq, config.normalization);
    stabilize(seq)
}

/// Compile a raw speech sequence into backend calls.
///
/// Pure with respect to the voices: nothing is sent until the calls are
/// handed to [`crate::compiler::dispatch`].
pub fn compile(
    seq: Vec<Instruction>,
    config: &CompilerConfig,
    router: &dyn VoiceRouter,
    symbols: &dyn SymbolTable,
) -> Vec<BackendCall> {
    let language = router.default_language();
    let prepared = prepare(seq, config, symbols, &language);
    debug!(instructions = prepared.len(), language = %language, "compiling speech sequence");
    multiplex(prepared, router)
}
