//! Recording voices and a static router for unit tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use anyhow::{bail, Result};

use crate::{
    compiler::{BackendCall, BackendOp},
    voice::{EngineKind, Voice, VoiceRef, VoiceRouter},
};

pub struct MockVoice {
    name: String,
    engine: EngineKind,
    language: String,
    pub pitch: u8,
    pub rate: u8,
    pub volume: u8,
    pub fail_speak: bool,
    log: Mutex<Vec<String>>,
}

impl MockVoice {
    pub fn new(name: &str, engine: EngineKind, language: &str) -> Self {
        Self {
            name: name.to_string(),
            engine,
            language: language.to_string(),
            pitch: 50,
            rate: 50,
            volume: 50,
            fail_speak: false,
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn with_pitch(mut self, pitch: u8) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_speak = true;
        self
    }

    pub fn build(self) -> Arc<MockVoice> {
        Arc::new(self)
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

impl Voice for MockVoice {
    fn name(&self) -> &str {
        &self.name
    }
    fn engine(&self) -> EngineKind {
        self.engine
    }
    fn language(&self) -> &str {
        &self.language
    }
    fn pitch(&self) -> u8 {
        self.pitch
    }
    fn rate(&self) -> u8 {
        self.rate
    }
    fn volume(&self) -> u8 {
        self.volume
    }

    fn speak(&self, payload: &str) -> Result<()> {
        if self.fail_speak {
            bail!("{} is offline", self.name);
        }
        self.record(format!("speak:{}", payload));
        Ok(())
    }

    fn insert_break(&self, ms: u32) -> Result<()> {
        self.record(format!("break:{}", ms));
        Ok(())
    }

    fn index(&self, id: u32) -> Result<()> {
        self.record(format!("index:{}", id));
        Ok(())
    }

    fn pause(&self) {
        self.record("pause".to_string());
    }

    fn resume(&self) {
        self.record("resume".to_string());
    }

    fn stop(&self) {
        self.record("stop".to_string());
    }
}

pub struct MockRouter {
    default: VoiceRef,
    default_language: String,
    voices: HashMap<String, VoiceRef>,
}

impl MockRouter {
    pub fn new(default: Arc<MockVoice>) -> Self {
        let default_language = default.language().to_string();
        Self { default, default_language, voices: HashMap::new() }
    }

    pub fn with(mut self, language: &str, voice: Arc<MockVoice>) -> Self {
        self.voices.insert(language.to_string(), voice);
        self
    }
}

impl VoiceRouter for MockRouter {
    fn resolve(&self, language: &str) -> Option<VoiceRef> {
        self.voices.get(language).cloned()
    }

    fn default_voice(&self) -> VoiceRef {
        self.default.clone()
    }

    fn default_language(&self) -> String {
        self.default_language.clone()
    }
}

/// `(voice name, op)` pairs, easier to assert on than handles.
pub fn summarize(calls: &[BackendCall]) -> Vec<(String, BackendOp)> {
    calls
        .iter()
        .map(|call| (call.voice.name().to_string(), call.op.clone()))
        .collect()
}

pub fn speak(voice: &str, payload: &str) -> (String, BackendOp) {
    (voice.to_string(), BackendOp::Speak(payload.to_string()))
}
