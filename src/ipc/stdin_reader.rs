use std::io::BufRead;
use std::thread;

use crossbeam_channel::Sender;
use tracing::{debug, info};

use super::event_sink::MessageSink;
use super::protocol::{ClientMessage, HostMessage, InterpretReply};
use crate::command::{Command, ResolvedCommand};
use crate::dom::MemoryDocument;
use crate::features::{FeatureId, Transition};
use crate::session::SessionEvent;
use crate::voice::RecognitionEvent;

/// Where one inbound message goes.
#[derive(Debug)]
pub enum Inbound {
    Event(SessionEvent),
    /// Answers a pending `interpret` request; bypasses the session queue
    /// because the session is blocked waiting for it.
    Reply(InterpretReply),
}

/// Map a parsed client message onto the session's vocabulary.
pub fn route(message: ClientMessage) -> Result<Inbound, String> {
    let event = match message {
        ClientMessage::InterpretReply(reply) => return Ok(Inbound::Reply(reply)),
        ClientMessage::Result(utterance) => {
            SessionEvent::Recognition(RecognitionEvent::Result(utterance))
        }
        ClientMessage::RecognitionEnd => SessionEvent::Recognition(RecognitionEvent::Ended),
        ClientMessage::RecognitionError { error } => {
            SessionEvent::Recognition(RecognitionEvent::Error { kind: error })
        }
        ClientMessage::Feature {
            feature,
            transition,
        } => {
            let id = FeatureId::parse_name(&feature)
                .ok_or_else(|| format!("Unknown feature: {feature}"))?;
            SessionEvent::Feature { id, transition }
        }
        ClientMessage::Command { command, params } => {
            let command = Command::parse_name(&command)
                .ok_or_else(|| format!("Unknown command: {command}"))?;
            SessionEvent::Command(ResolvedCommand::new(command, params))
        }
        ClientMessage::Shortcut { keys } => SessionEvent::Shortcut(keys),
        ClientMessage::Document { root } => {
            SessionEvent::Document(MemoryDocument::from_spec(root))
        }
        ClientMessage::RegisterRule { rule } => {
            let rule = rule.compile(0).map_err(|err| format!("Invalid rule: {err}"))?;
            SessionEvent::RegisterRule(rule)
        }
        ClientMessage::StartListening => SessionEvent::Feature {
            id: FeatureId::Speech,
            transition: Transition::Start,
        },
        ClientMessage::StopListening => SessionEvent::Feature {
            id: FeatureId::Speech,
            transition: Transition::Stop,
        },
        ClientMessage::Shutdown => SessionEvent::Shutdown,
    };
    Ok(Inbound::Event(event))
}

/// Read JSON lines from `input` until EOF or until the session hangs up.
///
/// Malformed lines produce a recoverable `error` message and are skipped.
pub fn spawn_reader<R, S>(
    input: R,
    events: Sender<SessionEvent>,
    replies: Sender<InterpretReply>,
    sink: S,
) -> thread::JoinHandle<()>
where
    R: BufRead + Send + 'static,
    S: MessageSink + Send + 'static,
{
    thread::spawn(move || {
        for line in input.lines() {
            let line = match line {
                Ok(l) => l,
                Err(_) => break,
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let routed = serde_json::from_str::<ClientMessage>(trimmed)
                .map_err(|e| format!("Invalid command: {e}"))
                .and_then(route);
            match routed {
                Ok(Inbound::Event(event)) => {
                    if events.send(event).is_err() {
                        break; // Session has exited
                    }
                }
                Ok(Inbound::Reply(reply)) => {
                    if replies.send(reply).is_err() {
                        debug!("interpret reply dropped; no remote listener");
                    }
                }
                Err(message) => {
                    sink.send(&HostMessage::Error {
                        message,
                        recoverable: true,
                    });
                }
            }
        }

        info!("stdin reader thread exiting");
    })
}
