//! Session collaborators implemented by messaging the host page.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, warn};

use super::event_sink::MessageSink;
use super::protocol::{HostMessage, InterpretReply};
use crate::command::{ActionError, Command, ResolvedCommand};
use crate::features::{FeatureHooks, FeatureId};
use crate::feedback::{Feedback, FeedbackSink};
use crate::remote::{RelayRequest, RemoteServices};
use crate::speech::{SpeechParams, SpeechSynthesizer};
use crate::voice::{RecognitionError, SpeechToText};

pub const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 3000;

pub struct HostSynthesizer<S> {
    sink: S,
}

impl<S: MessageSink> HostSynthesizer<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }
}

impl<S: MessageSink> SpeechSynthesizer for HostSynthesizer<S> {
    fn speak(&mut self, text: &str, params: &SpeechParams) {
        self.sink.send(&HostMessage::Speak {
            text: text.to_string(),
            lang: params.lang.clone(),
            rate: params.rate,
            pitch: params.pitch,
            volume: params.volume,
        });
    }

    fn cancel(&mut self) {
        self.sink.send(&HostMessage::CancelSpeech);
    }
}

/// Recognition runs in the host; results come back as `result` commands.
pub struct HostSpeechToText<S> {
    sink: S,
    available: bool,
    lang: String,
    continuous: bool,
}

impl<S: MessageSink> HostSpeechToText<S> {
    pub fn new(sink: S, available: bool, lang: &str, continuous: bool) -> Self {
        Self {
            sink,
            available,
            lang: lang.to_string(),
            continuous,
        }
    }
}

impl<S: MessageSink> SpeechToText for HostSpeechToText<S> {
    fn is_available(&self) -> bool {
        self.available
    }

    fn start(&mut self) -> Result<(), RecognitionError> {
        if !self.available {
            return Err(RecognitionError::Unavailable);
        }
        self.sink.send(&HostMessage::RecognitionStart {
            lang: self.lang.clone(),
            continuous: self.continuous,
        });
        Ok(())
    }

    fn stop(&mut self) {
        self.sink.send(&HostMessage::RecognitionStop);
    }
}

/// Presentation toggles are applied by the host stylesheet layer.
pub struct HostFeatureHooks<S> {
    sink: S,
}

impl<S: MessageSink> HostFeatureHooks<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }
}

impl<S: MessageSink> FeatureHooks for HostFeatureHooks<S> {
    fn apply(&mut self, feature: FeatureId, enabled: bool) -> Result<(), String> {
        self.sink.send(&HostMessage::Feature { feature, enabled });
        Ok(())
    }
}

pub struct HostFeedback<S> {
    sink: S,
}

impl<S: MessageSink> HostFeedback<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }
}

impl<S: MessageSink> FeedbackSink for HostFeedback<S> {
    fn publish(&mut self, feedback: Feedback) {
        self.sink.send(&HostMessage::feedback(feedback));
    }
}

/// Remote interpreter and relay over the host channel.
///
/// `interpret` blocks the session until the matching reply arrives or the
/// timeout passes. Replies to earlier, abandoned requests are discarded.
pub struct ChannelRemote<S> {
    sink: S,
    replies: Receiver<InterpretReply>,
    timeout: Duration,
    next_request: u64,
}

impl<S: MessageSink> ChannelRemote<S> {
    pub fn new(sink: S, replies: Receiver<InterpretReply>, timeout: Duration) -> Self {
        Self {
            sink,
            replies,
            timeout,
            next_request: 0,
        }
    }
}

fn resolve_reply(reply: InterpretReply) -> Option<ResolvedCommand> {
    let name = reply.command?;
    match Command::parse_name(&name) {
        Some(command) => Some(ResolvedCommand::new(command, reply.params)),
        None => {
            warn!(command = %name, "remote named an unknown command");
            None
        }
    }
}

impl<S: MessageSink> RemoteServices for ChannelRemote<S> {
    fn interpret(&mut self, text: &str) -> Option<ResolvedCommand> {
        self.next_request += 1;
        let request_id = self.next_request;
        self.sink.send(&HostMessage::Interpret {
            request_id,
            text: text.to_string(),
        });

        let deadline = Instant::now() + self.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.replies.recv_timeout(remaining) {
                Ok(reply) if reply.request_id == request_id => return resolve_reply(reply),
                Ok(reply) => debug!(stale = reply.request_id, "discarding stale interpret reply"),
                Err(RecvTimeoutError::Timeout) => {
                    warn!(request_id, "interpret request timed out");
                    return None;
                }
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    fn relay(&mut self, request: RelayRequest) -> Result<(), ActionError> {
        self.sink.send(&HostMessage::Relay { request });
        Ok(())
    }
}
