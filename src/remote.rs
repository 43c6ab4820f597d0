//! Remote collaborators reached over the message channel: the fallback
//! interpreter and the summarize/describe relay.

use serde::{Deserialize, Serialize};

use crate::command::{ActionError, ResolvedCommand};

/// Payload relayed to an external summarization/description service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "service", rename_all = "snake_case")]
pub enum RelayRequest {
    Summarize { title: Option<String>, text: String },
    DescribeImage { src: Option<String>, alt: Option<String> },
}

pub trait RemoteServices {
    /// Ask for an interpretation of unmatched text. `None` when the service
    /// is absent, times out, or names no known command.
    fn interpret(&mut self, text: &str) -> Option<ResolvedCommand>;

    fn relay(&mut self, request: RelayRequest) -> Result<(), ActionError>;
}

/// No channel attached: nothing interprets and nothing relays.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineRemote;

impl RemoteServices for OfflineRemote {
    fn interpret(&mut self, _text: &str) -> Option<ResolvedCommand> {
        None
    }

    fn relay(&mut self, _request: RelayRequest) -> Result<(), ActionError> {
        Err(ActionError::RemoteUnavailable)
    }
}
