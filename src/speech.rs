//! Speech synthesis seam with last-write-wins playback.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::lock::lock_or_recover;

const MIN_RATE: f32 = 0.1;
const MAX_RATE: f32 = 10.0;
const MAX_PITCH: f32 = 2.0;

/// Voice parameters forwarded with every utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechParams {
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for SpeechParams {
    fn default() -> Self {
        Self {
            lang: "en-US".to_string(),
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

impl SpeechParams {
    /// Clamp into the ranges host synthesizers accept.
    #[must_use = "clamped params should replace the raw ones"]
    pub fn clamped(self) -> Self {
        Self {
            rate: self.rate.clamp(MIN_RATE, MAX_RATE),
            pitch: self.pitch.clamp(0.0, MAX_PITCH),
            volume: self.volume.clamp(0.0, 1.0),
            ..self
        }
    }
}

/// Host text-to-speech capability. Fire-and-forget.
pub trait SpeechSynthesizer {
    fn speak(&mut self, text: &str, params: &SpeechParams);
    fn cancel(&mut self);
}

/// Owns the synthesizer and enforces that a new utterance replaces the current one.
pub struct Speaker {
    synth: Box<dyn SpeechSynthesizer>,
    params: SpeechParams,
}

impl Speaker {
    #[must_use]
    pub fn new(synth: Box<dyn SpeechSynthesizer>, params: SpeechParams) -> Self {
        Self {
            synth,
            params: params.clamped(),
        }
    }

    pub fn say(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        self.synth.cancel();
        self.synth.speak(text, &self.params);
    }

    pub fn silence(&mut self) {
        self.synth.cancel();
    }

    #[must_use]
    pub fn params(&self) -> &SpeechParams {
        &self.params
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpeechLogEntry {
    Spoke(String),
    Cancelled,
}

/// Shared view of what a [`MemorySynthesizer`] was asked to do.
#[derive(Debug, Clone, Default)]
pub struct SpeechLog {
    entries: Arc<Mutex<Vec<SpeechLogEntry>>>,
}

impl SpeechLog {
    #[must_use]
    pub fn entries(&self) -> Vec<SpeechLogEntry> {
        lock_or_recover(&self.entries, "speech-log").clone()
    }

    /// Only the spoken texts, in order.
    #[must_use]
    pub fn spoken(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                SpeechLogEntry::Spoke(text) => Some(text),
                SpeechLogEntry::Cancelled => None,
            })
            .collect()
    }

    #[must_use]
    pub fn last_spoken(&self) -> Option<String> {
        self.spoken().pop()
    }

    fn push(&self, entry: SpeechLogEntry) {
        lock_or_recover(&self.entries, "speech-log").push(entry);
    }
}

/// Synthesizer that records requests instead of producing audio.
#[derive(Debug, Clone, Default)]
pub struct MemorySynthesizer {
    log: SpeechLog,
}

impl MemorySynthesizer {
    #[must_use]
    pub fn with_log() -> (Self, SpeechLog) {
        let synth = Self::default();
        let log = synth.log.clone();
        (synth, log)
    }
}

impl SpeechSynthesizer for MemorySynthesizer {
    fn speak(&mut self, text: &str, _params: &SpeechParams) {
        self.log.push(SpeechLogEntry::Spoke(text.to_string()));
    }

    fn cancel(&mut self) {
        self.log.push(SpeechLogEntry::Cancelled);
    }
}
