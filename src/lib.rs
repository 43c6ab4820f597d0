//! Voice-command pipeline for page navigation and accessibility features.
//!
//! Recognized speech flows through the recognition front-end, the ordered
//! command grammar and the registry into page actions and feature toggles.
//! The `voicenav` binary hosts one [`session::Session`] over JSON lines.

pub mod command;
pub mod config;
pub mod dom;
pub mod features;
pub mod feedback;
pub mod ipc;
mod lock;
pub mod prefs;
pub mod reader;
pub mod remote;
pub mod session;
pub mod speech;
pub mod telemetry;
pub mod voice;

pub use command::{Command, CommandGrammar, CommandRegistry, Params, ResolvedCommand};
pub use features::{ActiveFeatureSet, FeatureId, Transition};
pub use feedback::Feedback;
pub use session::{Session, SessionEvent, SessionParts, SessionSettings};
