//! Host-facing driver: compile, dispatch, and the interruption hooks.

use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::{
    compiler::dispatch,
    config::CompilerConfig,
    instruction::Instruction,
    pipeline::compile,
    voice::{same_voice, SymbolTable, VoiceRef, VoiceRouter},
};

/// Owns the router, symbol table and current configuration.
///
/// `speak` calls must not overlap; `cancel` and `pause` may come from another
/// thread and touch every voice that has received output.
pub struct SpeechDriver<R, S> {
    router: R,
    symbols: S,
    config: CompilerConfig,
    used_voices: Mutex<Vec<VoiceRef>>,
}

impl<R: VoiceRouter, S: SymbolTable> SpeechDriver<R, S> {
    pub fn new(router: R, symbols: S, config: CompilerConfig) -> Self {
        Self { router, symbols, config, used_voices: Mutex::new(Vec::new()) }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Replace the configuration; takes effect on the next `speak`.
    pub fn set_config(&mut self, config: CompilerConfig) {
        self.config = config;
    }

    /// Compile `seq` and send the result to the voices.
    pub fn speak(&self, seq: Vec<Instruction>) {
        let calls = compile(seq, &self.config, &self.router, &self.symbols);
        {
            let mut used = self.used_voices.lock().unwrap_or_else(PoisonError::into_inner);
            for call in &calls {
                if !used.iter().any(|v| same_voice(v, &call.voice)) {
                    used.push(call.voice.clone());
                }
            }
        }
        dispatch(&calls);
    }

    /// Every distinct voice that has received a call, in first-use order.
    ///
    /// Falls back to the default voice before anything was spoken.
    pub fn voices(&self) -> Vec<VoiceRef> {
        let used = self.used_voices.lock().unwrap_or_else(PoisonError::into_inner);
        if used.is_empty() {
            vec![self.router.default_voice()]
        } else {
            used.clone()
        }
    }

    /// Stop every voice that has spoken, and the default voice.
    pub fn cancel(&self) {
        let mut voices = self.voices();
        let default = self.router.default_voice();
        if !voices.iter().any(|v| same_voice(v, &default)) {
            voices.push(default);
        }
        for voice in &voices {
            debug!(voice = voice.name(), "cancel");
            voice.stop();
        }
    }

    /// `true` pauses every voice that has spoken, `false` resumes them.
    pub fn pause(&self, switch: bool) {
        for voice in self.voices() {
            debug!(voice = voice.name(), paused = switch, "pause");
            if switch {
                voice.pause();
            } else {
                voice.resume();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        testing::{MockRouter, MockVoice},
        voice::{DigitSymbols, EngineKind},
    };

    fn driver() -> (
        SpeechDriver<MockRouter, DigitSymbols>,
        std::sync::Arc<MockVoice>,
        std::sync::Arc<MockVoice>,
    ) {
        let en = MockVoice::new("en", EngineKind::Chunk, "en").build();
        let de = MockVoice::new("de", EngineKind::Plain, "de").build();
        let router = MockRouter::new(en.clone()).with("de", de.clone());
        (SpeechDriver::new(router, DigitSymbols::new(), CompilerConfig::default()), en, de)
    }

    #[test]
    fn test_speak_dispatches() {
        let (driver, en, de) = driver();
        driver.speak(vec![
            Instruction::text("hello"),
            Instruction::Break(100),
            Instruction::lang("de"),
            Instruction::text("hallo"),
            Instruction::IndexMark(4),
        ]);
        // the language change moves ahead of the break, so the break belongs to "de"
        assert_eq!(en.log(), vec!["speak:hello"]);
        assert_eq!(de.log(), vec!["break:100", "speak:hallo", "index:4"]);
    }

    #[test]
    fn test_break_stays_on_speaking_voice() {
        let (driver, en, de) = driver();
        driver.speak(vec![Instruction::text("hello"), Instruction::Break(100), Instruction::text("there")]);
        assert_eq!(en.log(), vec!["speak:hello", "break:100", "speak:there"]);
        assert!(de.log().is_empty(), "got: {:?}", de.log());
    }

    #[test]
    fn test_cancel_stops_active_and_default() {
        let (driver, en, de) = driver();
        driver.speak(vec![Instruction::lang("de"), Instruction::text("x")]);
        driver.cancel();
        assert_eq!(de.log(), vec!["speak:x", "stop"]);
        assert_eq!(en.log(), vec!["stop"]);
    }

    #[test]
    fn test_cancel_stops_every_voice_of_the_utterance() {
        let (driver, en, de) = driver();
        driver.speak(vec![
            Instruction::text("He said "),
            Instruction::lang("de"),
            Instruction::text("hallo"),
            Instruction::LanguageChange(None),
            Instruction::text("!"),
        ]);
        driver.cancel();
        assert_eq!(en.log(), vec!["speak:He said", "speak:!", "stop"]);
        assert_eq!(de.log(), vec!["speak:hallo", "stop"]);
    }

    #[test]
    fn test_pause_covers_every_voice_of_the_utterance() {
        let (driver, en, de) = driver();
        driver.speak(vec![Instruction::text("a"), Instruction::lang("de"), Instruction::text("b")]);
        driver.pause(true);
        driver.pause(false);
        assert_eq!(en.log(), vec!["speak:a", "pause", "resume"]);
        assert_eq!(de.log(), vec!["speak:b", "pause", "resume"]);
    }

    #[test]
    fn test_pause_before_any_speech_uses_default() {
        let (driver, en, _de) = driver();
        driver.pause(true);
        driver.pause(false);
        assert_eq!(en.log(), vec!["pause", "resume"]);
    }

    #[test]
    fn test_set_config_applies_to_next_speak() {
        let (mut driver, en, _de) = driver();
        driver.set_config(CompilerConfig { ignore_comma_between_numbers: true, ..Default::default() });
        assert!(driver.config().ignore_comma_between_numbers);
        driver.speak(vec![Instruction::text("1,5")]);
        assert_eq!(en.log(), vec!["speak:15"]);
    }
}
