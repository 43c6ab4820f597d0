use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::warn;

use super::protocol::HostMessage;
use crate::lock::lock_or_recover;

/// Outbound half of the host channel. Shared by every host adapter.
pub trait MessageSink {
    fn send(&self, message: &HostMessage);
}

/// Writes one JSON object per line to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl MessageSink for StdoutSink {
    fn send(&self, message: &HostMessage) {
        match serde_json::to_string(message) {
            Ok(json) => {
                let mut stdout = io::stdout().lock();
                if let Err(err) = writeln!(stdout, "{json}") {
                    warn!(%err, "host message write failed");
                    return;
                }
                if let Err(err) = stdout.flush() {
                    warn!(%err, "host message flush failed");
                }
            }
            Err(err) => warn!(%err, "host message serialization failed"),
        }
    }
}

/// Keeps messages in memory; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    messages: Arc<Mutex<Vec<HostMessage>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> Vec<HostMessage> {
        lock_or_recover(&self.messages, "memory-sink").clone()
    }

    pub fn take(&self) -> Vec<HostMessage> {
        std::mem::take(&mut *lock_or_recover(&self.messages, "memory-sink"))
    }
}

impl MessageSink for MemorySink {
    fn send(&self, message: &HostMessage) {
        lock_or_recover(&self.messages, "memory-sink").push(message.clone());
    }
}
