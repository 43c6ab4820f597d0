//! Newline-delimited JSON contract between the session and its host page.
//!
//! Outbound messages carry an `"event"` tag, inbound ones a `"cmd"` tag.

use serde::{Deserialize, Serialize};

use crate::command::{Params, RuleDefinition};
use crate::dom::{ElementSpec, PageAction};
use crate::feedback::Feedback;
use crate::features::{FeatureId, Transition};
use crate::remote::RelayRequest;
use crate::voice::{RecognitionErrorKind, Utterance};

// ============================================================================
// Host messages (session -> host)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum HostMessage {
    /// Sent once on startup.
    #[serde(rename = "ready")]
    Ready {
        session_id: String,
        version: String,
        /// Rules in the grammar, built-in plus custom.
        rules: usize,
        speech_input: bool,
    },

    /// User-visible status; `message` is the rendered text.
    #[serde(rename = "feedback")]
    Feedback { feedback: Feedback, message: String },

    #[serde(rename = "speak")]
    Speak {
        text: String,
        lang: String,
        rate: f32,
        pitch: f32,
        volume: f32,
    },

    #[serde(rename = "cancel_speech")]
    CancelSpeech,

    #[serde(rename = "recognition_start")]
    RecognitionStart { lang: String, continuous: bool },

    #[serde(rename = "recognition_stop")]
    RecognitionStop,

    /// Fallback interpretation request; answered by `interpret_reply`.
    #[serde(rename = "interpret")]
    Interpret { request_id: u64, text: String },

    #[serde(rename = "relay")]
    Relay { request: RelayRequest },

    /// Presentation toggle the host applies (stylesheet, font, overlay).
    #[serde(rename = "feature")]
    Feature { feature: FeatureId, enabled: bool },

    #[serde(rename = "page_action")]
    PageAction { action: PageAction },

    #[serde(rename = "error")]
    Error { message: String, recoverable: bool },
}

impl HostMessage {
    #[must_use]
    pub fn feedback(feedback: Feedback) -> Self {
        let message = feedback.to_string();
        HostMessage::Feedback { feedback, message }
    }
}

// ============================================================================
// Client messages (host -> session)
// ============================================================================

fn default_transition() -> Transition {
    Transition::Toggle
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cmd")]
pub enum ClientMessage {
    /// Recognition result, interim or final.
    #[serde(rename = "result")]
    Result(Utterance),

    #[serde(rename = "recognition_end")]
    RecognitionEnd,

    #[serde(rename = "recognition_error")]
    RecognitionError { error: RecognitionErrorKind },

    /// Reply to an `interpret` request. A missing command means "no idea".
    #[serde(rename = "interpret_reply")]
    InterpretReply(InterpretReply),

    /// Panel or remote toggle.
    #[serde(rename = "feature")]
    Feature {
        feature: String,
        #[serde(default = "default_transition")]
        transition: Transition,
    },

    /// Named command from a panel button or remote message.
    #[serde(rename = "command")]
    Command {
        command: String,
        #[serde(default)]
        params: Params,
    },

    #[serde(rename = "shortcut")]
    Shortcut { keys: String },

    /// Fresh document snapshot after a DOM mutation.
    #[serde(rename = "document")]
    Document { root: ElementSpec },

    #[serde(rename = "register_rule")]
    RegisterRule { rule: RuleDefinition },

    #[serde(rename = "start_listening")]
    StartListening,

    #[serde(rename = "stop_listening")]
    StopListening,

    #[serde(rename = "shutdown")]
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InterpretReply {
    pub request_id: u64,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub params: Params,
}
