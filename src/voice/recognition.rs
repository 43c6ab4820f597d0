//! Continuous recognition lifecycle with confidence gating and one cancelable auto-restart.
//!
//! The host engine ends sessions on its own (silence timeouts, network
//! hiccups). While voice control is wanted and continuous listening is on,
//! each end schedules exactly one restart; an explicit `stop()` cancels it so
//! a stale restart can never reopen the microphone after the user turned
//! voice control off.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::normalize::{format_transcript_preview, normalize_transcript};
use super::utterance::Utterance;

pub const DEFAULT_SENSITIVITY: f32 = 0.7;
pub const DEFAULT_RESTART_DELAY_MS: u64 = 500;
const INTERIM_PREVIEW_MAX: usize = 60;

/// Clamp a confidence threshold into `[0, 1]`; `NaN` becomes the default.
#[must_use]
pub fn clamp_sensitivity(sensitivity: f32) -> f32 {
    if sensitivity.is_nan() {
        DEFAULT_SENSITIVITY
    } else {
        sensitivity.clamp(0.0, 1.0)
    }
}

/// Host speech-to-text capability.
pub trait SpeechToText {
    fn is_available(&self) -> bool;
    fn start(&mut self) -> Result<(), RecognitionError>;
    fn stop(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    #[error("speech recognition is not available on this host")]
    Unavailable,
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("speech engine failed to start: {0}")]
    Engine(String),
}

/// Error classes reported by the host engine (Web Speech API codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecognitionErrorKind {
    NotAllowed,
    ServiceNotAllowed,
    NoSpeech,
    Network,
    Aborted,
    AudioCapture,
    #[serde(other)]
    Other,
}

impl RecognitionErrorKind {
    #[must_use]
    pub fn is_permission_denied(self) -> bool {
        matches!(
            self,
            RecognitionErrorKind::NotAllowed | RecognitionErrorKind::ServiceNotAllowed
        )
    }
}

/// Asynchronous notifications from the host engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RecognitionEvent {
    Result(Utterance),
    Ended,
    Error { kind: RecognitionErrorKind },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecognitionSettings {
    pub sensitivity: f32,
    pub continuous: bool,
    pub restart_delay: Duration,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_SENSITIVITY,
            continuous: true,
            restart_delay: Duration::from_millis(DEFAULT_RESTART_DELAY_MS),
        }
    }
}

/// What the session should do with one engine event.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionOutput {
    Ignored,
    Interim(String),
    /// Final, confident, normalized text ready for the dispatcher.
    Accepted(String),
    LowConfidence { text: String, confidence: f32 },
    RestartScheduled,
    Restarted,
    Ended,
    PermissionDenied,
}

pub struct RecognitionFrontEnd {
    engine: Box<dyn SpeechToText>,
    settings: RecognitionSettings,
    capturing: bool,
    wanted: bool,
    permission_denied: bool,
    unavailable_surfaced: bool,
    restart_at: Option<Instant>,
}

impl RecognitionFrontEnd {
    #[must_use]
    pub fn new(engine: Box<dyn SpeechToText>, settings: RecognitionSettings) -> Self {
        Self {
            engine,
            settings: RecognitionSettings {
                sensitivity: clamp_sensitivity(settings.sensitivity),
                ..settings
            },
            capturing: false,
            wanted: false,
            permission_denied: false,
            unavailable_surfaced: false,
            restart_at: None,
        }
    }

    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    #[must_use]
    pub fn settings(&self) -> RecognitionSettings {
        self.settings
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.settings.sensitivity = clamp_sensitivity(sensitivity);
    }

    /// Deadline of the pending auto-restart, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.restart_at
    }

    /// Begin capture. Returns `Ok(false)` when already capturing.
    pub fn start(&mut self) -> Result<bool, RecognitionError> {
        if self.permission_denied {
            return Err(RecognitionError::PermissionDenied);
        }
        if self.capturing {
            self.wanted = true;
            return Ok(false);
        }
        if !self.engine.is_available() {
            warn!("speech recognition unavailable on host");
            return Err(RecognitionError::Unavailable);
        }
        self.engine.start()?;
        self.capturing = true;
        self.wanted = true;
        self.restart_at = None;
        info!("speech recognition started");
        Ok(true)
    }

    /// End capture and cancel any pending restart. Returns `false` when already idle.
    pub fn stop(&mut self) -> bool {
        self.wanted = false;
        self.restart_at = None;
        if !self.capturing {
            return false;
        }
        self.engine.stop();
        self.capturing = false;
        info!("speech recognition stopped");
        true
    }

    /// True exactly once, the first time the host reports no capability.
    pub fn take_unavailable_notice(&mut self) -> bool {
        !std::mem::replace(&mut self.unavailable_surfaced, true)
    }

    pub fn handle(&mut self, event: RecognitionEvent, now: Instant) -> RecognitionOutput {
        match event {
            RecognitionEvent::Result(utterance) => self.handle_result(&utterance),
            RecognitionEvent::Ended => {
                self.capturing = false;
                if self.schedule_restart(now) {
                    RecognitionOutput::RestartScheduled
                } else {
                    RecognitionOutput::Ended
                }
            }
            RecognitionEvent::Error { kind } if kind.is_permission_denied() => {
                warn!(?kind, "microphone permission denied; disabling continuous listening");
                self.permission_denied = true;
                self.settings.continuous = false;
                self.wanted = false;
                self.capturing = false;
                self.restart_at = None;
                RecognitionOutput::PermissionDenied
            }
            RecognitionEvent::Error { kind } => {
                debug!(?kind, "transient recognition error");
                self.capturing = false;
                if self.schedule_restart(now) {
                    RecognitionOutput::RestartScheduled
                } else {
                    RecognitionOutput::Ignored
                }
            }
        }
    }

    /// Fire the pending restart when its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> RecognitionOutput {
        match self.restart_at {
            Some(deadline) if deadline <= now => {}
            _ => return RecognitionOutput::Ignored,
        }
        self.restart_at = None;
        if !self.wanted || self.capturing {
            return RecognitionOutput::Ignored;
        }
        match self.engine.start() {
            Ok(()) => {
                self.capturing = true;
                debug!("speech recognition restarted");
                RecognitionOutput::Restarted
            }
            Err(err) => {
                warn!(%err, "speech recognition restart failed");
                self.wanted = false;
                RecognitionOutput::Ended
            }
        }
    }

    fn schedule_restart(&mut self, now: Instant) -> bool {
        if !self.wanted || !self.settings.continuous || self.permission_denied {
            return false;
        }
        if self.restart_at.is_none() {
            self.restart_at = Some(now + self.settings.restart_delay);
        }
        true
    }

    fn handle_result(&mut self, utterance: &Utterance) -> RecognitionOutput {
        // Engines can flush a last result after `stop()`; voice control is off by then.
        if !self.wanted {
            debug!("dropping result delivered while recognition is off");
            return RecognitionOutput::Ignored;
        }
        if !utterance.is_final {
            let preview = format_transcript_preview(&utterance.text, INTERIM_PREVIEW_MAX);
            if preview.is_empty() {
                return RecognitionOutput::Ignored;
            }
            return RecognitionOutput::Interim(preview);
        }
        let confidence = utterance.effective_confidence();
        if confidence < self.settings.sensitivity {
            debug!(confidence, threshold = self.settings.sensitivity, "dropping low-confidence result");
            return RecognitionOutput::LowConfidence {
                text: utterance.text.trim().to_string(),
                confidence,
            };
        }
        let normalized = normalize_transcript(&utterance.text);
        if normalized.is_empty() {
            return RecognitionOutput::Ignored;
        }
        RecognitionOutput::Accepted(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Counters {
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
    }

    struct ScriptedEngine {
        available: bool,
        counters: Counters,
    }

    impl SpeechToText for ScriptedEngine {
        fn is_available(&self) -> bool {
            self.available
        }

        fn start(&mut self) -> Result<(), RecognitionError> {
            self.counters.starts.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn stop(&mut self) {
            self.counters.stops.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn front_end(available: bool) -> (RecognitionFrontEnd, Counters) {
        let counters = Counters::default();
        let engine = ScriptedEngine {
            available,
            counters: counters.clone(),
        };
        (
            RecognitionFrontEnd::new(Box::new(engine), RecognitionSettings::default()),
            counters,
        )
    }

    fn starts(counters: &Counters) -> usize {
        counters.starts.load(Ordering::Relaxed)
    }

    #[test]
    fn start_is_a_no_op_while_capturing() {
        let (mut recognition, counters) = front_end(true);
        assert_eq!(recognition.start(), Ok(true));
        assert_eq!(recognition.start(), Ok(false));
        assert_eq!(starts(&counters), 1);
    }

    #[test]
    fn stop_is_a_no_op_while_idle() {
        let (mut recognition, counters) = front_end(true);
        assert!(!recognition.stop());
        assert_eq!(counters.stops.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn unavailable_engine_fails_and_notice_surfaces_once() {
        let (mut recognition, counters) = front_end(false);
        assert_eq!(recognition.start(), Err(RecognitionError::Unavailable));
        assert!(recognition.take_unavailable_notice());
        assert!(!recognition.take_unavailable_notice());
        assert_eq!(starts(&counters), 0);
    }

    #[test]
    fn confidence_gate_is_inclusive_at_threshold() {
        let (mut recognition, _) = front_end(true);
        recognition.start().expect("start");
        let now = Instant::now();
        let low = recognition.handle(
            RecognitionEvent::Result(Utterance::final_result("scroll down", 0.69)),
            now,
        );
        assert!(matches!(low, RecognitionOutput::LowConfidence { .. }));
        let ok = recognition.handle(
            RecognitionEvent::Result(Utterance::final_result("Scroll down.", 0.70)),
            now,
        );
        assert_eq!(ok, RecognitionOutput::Accepted("scroll down".into()));
    }

    #[test]
    fn interim_results_only_produce_previews() {
        let (mut recognition, _) = front_end(true);
        recognition.start().expect("start");
        let out = recognition.handle(
            RecognitionEvent::Result(Utterance::interim("  click the ")),
            Instant::now(),
        );
        assert_eq!(out, RecognitionOutput::Interim("click the".into()));
    }

    #[test]
    fn results_after_stop_are_dropped() {
        let (mut recognition, _) = front_end(true);
        let now = Instant::now();
        let result = || RecognitionEvent::Result(Utterance::final_result("scroll down", 0.9));
        assert_eq!(recognition.handle(result(), now), RecognitionOutput::Ignored);

        recognition.start().expect("start");
        assert_eq!(
            recognition.handle(result(), now),
            RecognitionOutput::Accepted("scroll down".into())
        );
        recognition.stop();
        assert_eq!(recognition.handle(result(), now), RecognitionOutput::Ignored);
        assert_eq!(
            recognition.handle(RecognitionEvent::Result(Utterance::interim("scroll")), now),
            RecognitionOutput::Ignored
        );
    }

    #[test]
    fn nan_sensitivity_falls_back_to_default_gate() {
        let (mut recognition, _) = front_end(true);
        recognition.set_sensitivity(f32::NAN);
        assert!((recognition.settings().sensitivity - DEFAULT_SENSITIVITY).abs() < f32::EPSILON);
        recognition.start().expect("start");
        let low = recognition.handle(
            RecognitionEvent::Result(Utterance::final_result("go back", 0.2)),
            Instant::now(),
        );
        assert!(matches!(low, RecognitionOutput::LowConfidence { .. }));
        assert!((clamp_sensitivity(f32::INFINITY) - 1.0).abs() < f32::EPSILON);
        assert!(clamp_sensitivity(-0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn session_end_schedules_exactly_one_restart() {
        let (mut recognition, counters) = front_end(true);
        let now = Instant::now();
        recognition.start().expect("start");
        assert_eq!(
            recognition.handle(RecognitionEvent::Ended, now),
            RecognitionOutput::RestartScheduled
        );
        let deadline = recognition.next_deadline().expect("restart pending");
        assert_eq!(deadline, now + Duration::from_millis(500));

        let _ = recognition.handle(
            RecognitionEvent::Error {
                kind: RecognitionErrorKind::NoSpeech,
            },
            now + Duration::from_millis(100),
        );
        assert_eq!(recognition.next_deadline(), Some(deadline));

        assert_eq!(
            recognition.poll(now + Duration::from_millis(499)),
            RecognitionOutput::Ignored
        );
        assert_eq!(recognition.poll(deadline), RecognitionOutput::Restarted);
        assert_eq!(recognition.poll(deadline), RecognitionOutput::Ignored);
        assert_eq!(starts(&counters), 2);
        assert!(recognition.is_capturing());
    }

    #[test]
    fn stop_cancels_pending_restart() {
        let (mut recognition, counters) = front_end(true);
        let now = Instant::now();
        recognition.start().expect("start");
        recognition.handle(RecognitionEvent::Ended, now);
        recognition.stop();
        assert_eq!(recognition.next_deadline(), None);
        assert_eq!(
            recognition.poll(now + Duration::from_secs(5)),
            RecognitionOutput::Ignored
        );
        assert_eq!(starts(&counters), 1);
    }

    #[test]
    fn end_without_continuous_listening_does_not_restart() {
        let (mut recognition, _) = front_end(true);
        recognition.settings.continuous = false;
        recognition.start().expect("start");
        assert_eq!(
            recognition.handle(RecognitionEvent::Ended, Instant::now()),
            RecognitionOutput::Ended
        );
        assert_eq!(recognition.next_deadline(), None);
    }

    #[test]
    fn permission_denial_disables_continuous_and_blocks_restart() {
        let (mut recognition, counters) = front_end(true);
        let now = Instant::now();
        recognition.start().expect("start");
        assert_eq!(
            recognition.handle(
                RecognitionEvent::Error {
                    kind: RecognitionErrorKind::NotAllowed
                },
                now
            ),
            RecognitionOutput::PermissionDenied
        );
        assert!(!recognition.settings().continuous);
        assert_eq!(
            recognition.handle(RecognitionEvent::Ended, now),
            RecognitionOutput::Ended
        );
        assert_eq!(recognition.next_deadline(), None);
        assert_eq!(recognition.start(), Err(RecognitionError::PermissionDenied));
        assert_eq!(starts(&counters), 1);
    }

    #[test]
    fn error_kinds_parse_from_web_speech_codes() {
        let kind: RecognitionErrorKind =
            serde_json::from_str("\"not-allowed\"").expect("known code");
        assert!(kind.is_permission_denied());
        let unknown: RecognitionErrorKind =
            serde_json::from_str("\"bad-grammar\"").expect("fallback code");
        assert_eq!(unknown, RecognitionErrorKind::Other);
    }
}
