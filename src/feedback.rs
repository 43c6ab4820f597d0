//! User-visible feedback surface so every pipeline outcome ends in a message, never a crash.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::features::FeatureId;
use crate::lock::lock_or_recover;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Feedback {
    Listening,
    Stopped,
    Interim { text: String },
    Heard { text: String },
    LowConfidence { text: String, confidence: f32 },
    Executed { command: String, message: String },
    NotRecognized { text: String },
    Failed { command: String, reason: String },
    FeatureChanged { feature: FeatureId, enabled: bool },
    Unavailable,
    PermissionDenied,
    Info { message: String },
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feedback::Listening => f.write_str("Listening..."),
            Feedback::Stopped => f.write_str("Voice control stopped"),
            Feedback::Interim { text } => write!(f, "{text}..."),
            Feedback::Heard { text } => write!(f, "Heard: {text}"),
            Feedback::LowConfidence { confidence, .. } => write!(
                f,
                "Low confidence ({:.0}%), please repeat",
                confidence * 100.0
            ),
            Feedback::Executed { message, .. } => f.write_str(message),
            Feedback::NotRecognized { text } => write!(f, "Command not recognized: {text}"),
            Feedback::Failed { reason, .. } => f.write_str(reason),
            Feedback::FeatureChanged { feature, enabled } => {
                let state = if *enabled { "on" } else { "off" };
                let name = feature.display_name();
                let mut chars = name.chars();
                match chars.next() {
                    Some(first) => write!(f, "{}{} {state}", first.to_uppercase(), chars.as_str()),
                    None => write!(f, "{state}"),
                }
            }
            Feedback::Unavailable => {
                f.write_str("Speech recognition is not available in this browser")
            }
            Feedback::PermissionDenied => f.write_str(
                "Microphone access denied. Allow microphone access to use voice commands",
            ),
            Feedback::Info { message } => f.write_str(message),
        }
    }
}

/// Destination for feedback (status bar, toast, JSON event stream).
pub trait FeedbackSink {
    fn publish(&mut self, feedback: Feedback);
}

/// Sink that keeps every message for later inspection.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeedback {
    entries: Arc<Mutex<Vec<Feedback>>>,
}

impl MemoryFeedback {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> Vec<Feedback> {
        lock_or_recover(&self.entries, "feedback-log").clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<Feedback> {
        self.entries().pop()
    }

    pub fn clear(&self) {
        lock_or_recover(&self.entries, "feedback-log").clear();
    }
}

impl FeedbackSink for MemoryFeedback {
    fn publish(&mut self, feedback: Feedback) {
        lock_or_recover(&self.entries, "feedback-log").push(feedback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_changed_capitalizes_display_name() {
        let feedback = Feedback::FeatureChanged {
            feature: FeatureId::ScreenReader,
            enabled: true,
        };
        assert_eq!(feedback.to_string(), "Screen reader on");
    }

    #[test]
    fn low_confidence_reports_percentage() {
        let feedback = Feedback::LowConfidence {
            text: "scroll".into(),
            confidence: 0.42,
        };
        assert_eq!(feedback.to_string(), "Low confidence (42%), please repeat");
    }

    #[test]
    fn feedback_serializes_with_kind_tag() {
        let json = serde_json::to_value(Feedback::NotRecognized {
            text: "dance".into(),
        })
        .expect("serialize");
        assert_eq!(json["kind"], "not_recognized");
        assert_eq!(json["text"], "dance");
    }

    #[test]
    fn memory_feedback_clones_share_entries() {
        let sink = MemoryFeedback::new();
        let mut writer = sink.clone();
        writer.publish(Feedback::Listening);
        assert_eq!(sink.last(), Some(Feedback::Listening));
        sink.clear();
        assert!(sink.entries().is_empty());
    }
}
