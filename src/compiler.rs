//! Engine multiplexer. Turns a prepared speech sequence into backend calls.
//!
//! A single pass over the sequence keeps one active voice and one pending
//! buffer.  The active voice's [`EngineKind`] decides how each instruction is
//! encoded:
//!
//! | Engine   | Text buffer                          | Bookmark              | Prosody                      |
//! |----------|--------------------------------------|-----------------------|------------------------------|
//! | `Chunk`  | chunks joined by two spaces          | `\x1b\mrk=N\`         | inline `\x1b\rate=N\` etc.   |
//! | `Markup` | text inside nested prosody elements  | `<Bookmark Mark="N" />` | staged in a [`TagSet`]     |
//! | `Plain`  | chunks concatenated                  | direct `index` call   | ignored                      |
//!
//! The buffer is flushed to the active voice on a voice switch, a `Split`, a
//! `Break` (which then goes to the voice as its own call) and at the end of
//! the sequence.  Nothing is ever retracted once emitted.

use std::fmt;

use tracing::{debug, warn};

use crate::{
    instruction::{Instruction, ProsodyValue},
    markup::{escape_attr, escape_text, MarkupTag, TagSet},
    phoneme::ipa_to_phones,
    voice::{same_voice, EngineKind, VoiceRef, VoiceRouter},
};

/// Separator between chunks for the chunk protocol.
pub const CHUNK_SEPARATOR: &str = "  ";

/// Prefix of every inline chunk-protocol directive.
const ESCAPE: char = '\x1b';

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

/// One operation for one voice.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendOp {
    /// Encoded payload for the voice's protocol.
    Speak(String),
    /// Silence in milliseconds.
    Break(u32),
    /// Bookmark (plain-call engines only).
    Index(u32),
}

#[derive(Clone)]
pub struct BackendCall {
    pub voice: VoiceRef,
    pub op: BackendOp,
}

impl fmt::Debug for BackendCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendCall")
            .field("voice", &self.voice.name())
            .field("op", &self.op)
            .finish()
    }
}

/// Hand every call to its voice in order.
///
/// A failing backend call is logged and the rest still go out; calls already
/// made are never retried.
pub fn dispatch(calls: &[BackendCall]) {
    for call in calls {
        let result = match &call.op {
            BackendOp::Speak(payload) => call.voice.speak(payload),
            BackendOp::Break(ms) => call.voice.insert_break(*ms),
            BackendOp::Index(id) => call.voice.index(*id),
        };
        if let Err(e) = result {
            warn!(voice = call.voice.name(), "backend call failed: {:#}", e);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Prosody encodings
// ─────────────────────────────────────────────────────────────────────────────

/// Chunk-protocol value: `2^((v − 50) / factor) × 100`, `v` bounded to 0..100.
pub fn chunk_prosody(value: f64, factor: f64) -> i64 {
    let bounded = value.round().clamp(0.0, 100.0);
    let norm = 2f64.powf((bounded - 50.0) / factor);
    (norm * 100.0).round() as i64
}

/// Rate uses a steeper curve above the midpoint.
fn chunk_rate(value: f64) -> i64 {
    let factor = if value.round() >= 50.0 { 25.0 } else { 50.0 };
    chunk_prosody(value, factor)
}

/// Markup `absmiddle` for a scaled pitch.
pub fn markup_pitch(scaled: f64) -> i64 {
    (scaled / 2.0).floor() as i64 - 25
}

fn baseline_pitch(voice: &VoiceRef) -> Vec<(&'static str, i64)> {
    vec![("absmiddle", markup_pitch(f64::from(voice.pitch())))]
}

// ─────────────────────────────────────────────────────────────────────────────
// Multiplexer
// ─────────────────────────────────────────────────────────────────────────────

struct Multiplexer<'r> {
    router: &'r dyn VoiceRouter,
    default_voice: VoiceRef,
    default_language: String,

    voice: VoiceRef,
    language: String,

    chunks: Vec<String>,
    markup: String,
    tags: TagSet,
    char_mode: bool,
    spell_pending: bool,
    pending_output: bool,

    calls: Vec<BackendCall>,
}

impl<'r> Multiplexer<'r> {
    fn new(router: &'r dyn VoiceRouter) -> Self {
        let default_voice = router.default_voice();
        let default_language = router.default_language();
        Self {
            router,
            voice: default_voice.clone(),
            language: default_language.clone(),
            default_voice,
            default_language,
            chunks: Vec::new(),
            markup: String::new(),
            tags: TagSet::new(),
            char_mode: false,
            spell_pending: false,
            pending_output: false,
            calls: Vec::new(),
        }
    }

    fn engine(&self) -> EngineKind {
        self.voice.engine()
    }

    fn push(&mut self, op: BackendOp) {
        self.calls.push(BackendCall { voice: self.voice.clone(), op });
    }

    fn push_chunk(&mut self, chunk: String) {
        self.chunks.push(chunk);
        self.pending_output = true;
    }

    fn push_markup(&mut self, s: &str) {
        self.markup.push_str(s);
        self.pending_output = true;
    }

    fn directive(&mut self, key: &str, value: impl fmt::Display) {
        self.push_chunk(format!("{ESCAPE}\\{key}={value}\\"));
    }

    /// Send whatever is buffered to the active voice.
    fn flush(&mut self) {
        if self.engine() == EngineKind::Markup {
            self.tags.close_all(&mut self.markup);
        }
        let chunks = std::mem::take(&mut self.chunks);
        let markup = std::mem::take(&mut self.markup);
        if !std::mem::replace(&mut self.pending_output, false) {
            return;
        }
        let payload = match self.engine() {
            EngineKind::Chunk => chunks
                .join(CHUNK_SEPARATOR)
                .replace(&format!("{CHUNK_SEPARATOR}{ESCAPE}"), &ESCAPE.to_string()),
            EngineKind::Plain => chunks.concat(),
            EngineKind::Markup => markup,
        };
        if !payload.is_empty() {
            self.push(BackendOp::Speak(payload));
        }
    }

    /// Open or reopen markup elements when the staged values changed.
    fn emit_tags(&mut self) {
        if !self.tags.is_dirty() {
            return;
        }
        self.tags.emit(&mut self.markup);
        if self.engine() == EngineKind::Markup {
            // pitch has no implicit default in markup; keep it explicit
            self.tags.set(MarkupTag::Pitch, baseline_pitch(&self.voice));
        }
    }

    fn step(&mut self, instruction: Instruction) {
        match (self.engine(), instruction) {
            (_, Instruction::LanguageChange(code)) => self.change_language(code),
            (_, Instruction::Split) => self.flush(),
            (_, Instruction::Break(ms)) => {
                self.flush();
                self.push(BackendOp::Break(ms));
            }
            (_, Instruction::Unsupported(kind)) => {
                warn!(command = %kind, "Unsupported speech command");
            }

            // ── chunk protocol ────────────────────────────────────────────────
            (EngineKind::Chunk, Instruction::Text(text)) => {
                let text = text.trim();
                if text.is_empty() {
                    return;
                }
                if std::mem::take(&mut self.spell_pending) {
                    self.directive("tn", "spell");
                }
                // the engine has no way to switch off capital reporting
                let text = if self.char_mode || text.chars().count() == 1 {
                    text.to_lowercase()
                } else {
                    text.to_string()
                };
                self.push_chunk(text.replace(ESCAPE, ""));
            }
            (EngineKind::Chunk, Instruction::IndexMark(id)) => self.directive("mrk", id),
            (EngineKind::Chunk, Instruction::CharacterMode(on)) => {
                self.char_mode = on;
                self.spell_pending = false;
                self.directive("tn", if on { "spell" } else { "normal" });
            }
            (EngineKind::Chunk, Instruction::Rate(value)) => {
                let v = chunk_rate(value.scaled(self.voice.rate()));
                self.directive("rate", v);
            }
            (EngineKind::Chunk, Instruction::Pitch(value)) => {
                let v = chunk_prosody(value.scaled(self.voice.pitch()), 50.0);
                self.directive("pitch", v);
            }
            (EngineKind::Chunk, Instruction::Volume(value)) => {
                let v = value.scaled(self.voice.volume()).round().clamp(0.0, 100.0) as i64;
                self.directive("vol", v);
            }
            (EngineKind::Chunk, instruction @ Instruction::Phoneme { .. }) => {
                warn!(command = %instruction, "Unsupported speech command");
            }

            // ── markup protocol ───────────────────────────────────────────────
            (EngineKind::Markup, Instruction::Text(text)) => {
                self.emit_tags();
                self.push_markup(&escape_text(&text));
            }
            (EngineKind::Markup, Instruction::IndexMark(id)) => {
                self.push_markup(&format!("<Bookmark Mark=\"{}\" />", id));
            }
            (EngineKind::Markup, Instruction::CharacterMode(on)) => {
                self.char_mode = on;
                if on {
                    self.tags.stage(MarkupTag::Spell, Vec::new());
                } else {
                    self.tags.unstage(MarkupTag::Spell);
                }
            }
            (EngineKind::Markup, Instruction::Pitch(value)) => {
                let absmiddle = markup_pitch(value.scaled(self.voice.pitch()));
                self.tags.stage(MarkupTag::Pitch, vec![("absmiddle", absmiddle)]);
            }
            (EngineKind::Markup, Instruction::Volume(value)) => {
                self.stage_or_drop(MarkupTag::Volume, "level", value, self.voice.volume());
            }
            (EngineKind::Markup, Instruction::Rate(value)) => {
                self.stage_or_drop(MarkupTag::Rate, "absspeed", value, self.voice.rate());
            }
            (EngineKind::Markup, Instruction::Phoneme { ipa, text }) => {
                self.emit_tags();
                match ipa_to_phones(&ipa) {
                    Ok(phones) => self.push_markup(&format!(
                        "<pron sym=\"{}\">{}</pron>",
                        escape_attr(&phones),
                        escape_text(&text)
                    )),
                    Err(e) => {
                        debug!("{}", e);
                        if !text.is_empty() {
                            self.push_markup(&escape_text(&text));
                        }
                    }
                }
            }

            // ── plain calls ───────────────────────────────────────────────────
            (EngineKind::Plain, Instruction::Text(text)) => {
                let text = if self.char_mode {
                    text.chars().map(String::from).collect::<Vec<_>>().join(" ")
                } else {
                    text
                };
                self.push_chunk(text);
            }
            (EngineKind::Plain, Instruction::IndexMark(id)) => {
                self.flush();
                self.push(BackendOp::Index(id));
            }
            (EngineKind::Plain, Instruction::CharacterMode(on)) => self.char_mode = on,
            (
                EngineKind::Plain,
                instruction @ (Instruction::Pitch(_)
                | Instruction::Rate(_)
                | Instruction::Volume(_)
                | Instruction::Phoneme { .. }),
            ) => {
                debug!(command = %instruction, "not supported by plain engine, skipped");
            }
        }
    }

    fn stage_or_drop(&mut self, tag: MarkupTag, key: &'static str, value: ProsodyValue, base: u8) {
        if value.is_neutral(base) {
            self.tags.unstage(tag);
        } else {
            self.tags.stage(tag, vec![(key, value.scaled(base) as i64)]);
        }
    }

    fn change_language(&mut self, code: Option<String>) {
        let (target, language) = match code {
            Some(code) if code == self.language => return,
            Some(code) => {
                let voice = self.router.resolve(&code).unwrap_or_else(|| {
                    debug!(language = %code, "no voice for language, using default");
                    self.default_voice.clone()
                });
                (voice, code)
            }
            None => (self.default_voice.clone(), self.default_language.clone()),
        };
        self.language = language;
        if same_voice(&target, &self.voice) {
            return;
        }
        debug!(
            from = self.voice.name(),
            to = target.name(),
            language = %self.language,
            "voice switch"
        );
        self.flush();
        self.adopt(target);
    }

    /// Make `voice` active with fresh per-voice state.
    fn adopt(&mut self, voice: VoiceRef) {
        self.voice = voice;
        self.tags = TagSet::new();
        self.spell_pending = false;
        match self.engine() {
            EngineKind::Markup => {
                self.tags.set(MarkupTag::Pitch, baseline_pitch(&self.voice));
                if self.char_mode {
                    self.tags.set(MarkupTag::Spell, Vec::new());
                }
            }
            // sent with the next text so a bare directive never goes out alone
            EngineKind::Chunk if self.char_mode => self.spell_pending = true,
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<BackendCall> {
        self.flush();
        self.calls
    }
}

/// Compile a prepared sequence into backend calls.
///
/// Starts on the router's default voice and language.  The sequence should
/// already have gone through the preprocessing passes; see
/// [`crate::pipeline::compile`] for the full chain.
pub fn multiplex(seq: Vec<Instruction>, router: &dyn VoiceRouter) -> Vec<BackendCall> {
    let mut mux = Multiplexer::new(router);
    for instruction in seq {
        mux.step(instruction);
    }
    mux.finish()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
