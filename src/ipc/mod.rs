//! JSON-lines channel between a session and its host page.

mod event_sink;
mod host;
pub mod protocol;
mod stdin_reader;

pub use event_sink::{MemorySink, MessageSink, StdoutSink};
pub use host::{
    ChannelRemote, HostFeatureHooks, HostFeedback, HostSpeechToText, HostSynthesizer,
    DEFAULT_REMOTE_TIMEOUT_MS,
};
pub use protocol::{ClientMessage, HostMessage, InterpretReply};
pub use stdin_reader::{route, spawn_reader, Inbound};

/// Fresh id for one session run, derived from wall-clock milliseconds.
#[must_use]
pub fn new_session_id() -> String {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("{millis:x}")
}
