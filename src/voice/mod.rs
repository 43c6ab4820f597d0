//! Recognition front-end: engine lifecycle, confidence gating, transcript cleanup.

mod normalize;
mod recognition;
mod utterance;

pub use normalize::{format_transcript_preview, normalize_transcript};
pub use recognition::{
    clamp_sensitivity, RecognitionError, RecognitionErrorKind, RecognitionEvent, RecognitionFrontEnd,
    RecognitionOutput, RecognitionSettings, SpeechToText, DEFAULT_RESTART_DELAY_MS,
    DEFAULT_SENSITIVITY,
};
pub use utterance::Utterance;
