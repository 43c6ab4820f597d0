//! One recognition result as delivered by the host engine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    /// Engine confidence in `[0, 1]` for the top alternative.
    #[serde(default)]
    pub confidence: f32,
    #[serde(default = "default_final", rename = "final")]
    pub is_final: bool,
}

fn default_final() -> bool {
    true
}

impl Utterance {
    #[must_use]
    pub fn final_result(text: &str, confidence: f32) -> Self {
        Self {
            text: text.to_string(),
            confidence,
            is_final: true,
        }
    }

    #[must_use]
    pub fn interim(text: &str) -> Self {
        Self {
            text: text.to_string(),
            confidence: 0.0,
            is_final: false,
        }
    }

    /// Some engines leave confidence at zero for final results; treat that as certain.
    #[must_use]
    pub fn effective_confidence(&self) -> f32 {
        if self.confidence <= 0.0 {
            1.0
        } else {
            self.confidence.min(1.0)
        }
    }
}
