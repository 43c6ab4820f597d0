use thiserror::Error;

use crate::voice::RecognitionError;

use super::name::Command;

/// Why a matched command could not run. Surfaced as feedback; never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("no {role} matching \"{phrase}\"")]
    TargetNotFound { role: &'static str, phrase: String },
    #[error("no field matching \"{0}\"")]
    FieldNotFound(String),
    #[error("no focused field to type into")]
    NoFocusedField,
    #[error("no form to submit")]
    NoForm,
    #[error("no image to describe")]
    NoImage,
    #[error("nothing to read on this page")]
    NothingToRead,
    #[error("missing {0}")]
    MissingParam(&'static str),
    #[error("invalid {key}: {value}")]
    InvalidParam { key: &'static str, value: String },
    #[error("unknown feature \"{0}\"")]
    UnknownFeature(String),
    #[error("{feature} could not be changed: {reason}")]
    Feature { feature: String, reason: String },
    #[error(transparent)]
    Recognition(#[from] RecognitionError),
    #[error("remote service unavailable")]
    RemoteUnavailable,
    #[error("no action registered for {0}")]
    Unregistered(Command),
}

/// Problems in a custom rule definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("rule {index}: expected exactly one of phrase, contains, or pattern")]
    MatcherCount { index: usize },
    #[error("rule {index}: unknown command \"{command}\"")]
    UnknownCommand { index: usize, command: String },
    #[error("rule {index}: invalid pattern: {reason}")]
    Pattern { index: usize, reason: String },
    #[error("rule {index}: empty phrase")]
    EmptyPhrase { index: usize },
}
