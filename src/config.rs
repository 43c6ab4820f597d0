//! CLI flag schema. Flags left unset fall back to persisted preferences.

use std::path::PathBuf;

use clap::Parser;

use crate::prefs::Preferences;
use crate::session::SessionSettings;

#[derive(Debug, Parser, Clone, Default)]
#[command(
    name = "voicenav",
    about = "Voice-driven page navigation over a JSON-lines host channel",
    version
)]
pub struct AppConfig {
    /// Document snapshot (JSON element tree) to load at startup
    #[arg(long = "document", env = "VOICENAV_DOCUMENT")]
    pub document: Option<PathBuf>,

    /// YAML file with custom command rules, appended after the built-ins
    #[arg(long = "rules", env = "VOICENAV_RULES")]
    pub rules: Option<PathBuf>,

    /// Minimum recognition confidence in [0.0, 1.0] (out-of-range values clamp)
    #[arg(
        long = "sensitivity",
        allow_negative_numbers = true,
        value_parser = parse_finite
    )]
    pub sensitivity: Option<f32>,

    /// Wake phrase every command must start with
    #[arg(long = "command-prefix", env = "VOICENAV_COMMAND_PREFIX")]
    pub command_prefix: Option<String>,

    /// Restart recognition automatically when the engine ends a session
    #[arg(long = "continuous", overrides_with = "no_continuous")]
    pub continuous: bool,

    /// Let recognition stop when the engine ends a session
    #[arg(long = "no-continuous", overrides_with = "continuous")]
    pub no_continuous: bool,

    /// Delay before an automatic recognition restart (clamped to 100..=10000 ms)
    #[arg(long = "restart-delay-ms")]
    pub restart_delay_ms: Option<u64>,

    /// How long to wait for the remote interpreter before giving up (ms)
    #[arg(long = "remote-timeout-ms")]
    pub remote_timeout_ms: Option<u64>,

    /// Language tag for recognition and speech (e.g. en-US)
    #[arg(long = "lang", env = "VOICENAV_LANG")]
    pub lang: Option<String>,

    /// Speech rate multiplier
    #[arg(long = "speech-rate", value_parser = parse_finite)]
    pub speech_rate: Option<f32>,

    /// Speech pitch
    #[arg(long = "speech-pitch", value_parser = parse_finite)]
    pub speech_pitch: Option<f32>,

    /// Speech volume in [0.0, 1.0]
    #[arg(long = "speech-volume", value_parser = parse_finite)]
    pub speech_volume: Option<f32>,

    /// Report speech recognition as unavailable on this host
    #[arg(long = "no-speech-input", default_value_t = false)]
    pub no_speech_input: bool,

    /// Write structured trace logs ($VOICENAV_TRACE_LOG or the temp dir)
    #[arg(long = "logs", default_value_t = false)]
    pub logs: bool,

    /// Disable all logging, overriding --logs
    #[arg(long = "no-logs", default_value_t = false)]
    pub no_logs: bool,

    /// Include transcript text in trace logs
    #[arg(long = "log-content", default_value_t = false)]
    pub log_content: bool,

    /// Persist the effective settings as the new preferences
    #[arg(long = "save-prefs", default_value_t = false)]
    pub save_prefs: bool,
}

fn parse_finite(raw: &str) -> Result<f32, String> {
    let value: f32 = raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid number '{raw}'"))?;
    if !value.is_finite() {
        return Err(format!("'{raw}' must be a finite number"));
    }
    Ok(value)
}

impl AppConfig {
    /// Explicit `--continuous`/`--no-continuous`, if either was given.
    #[must_use]
    pub fn continuous_override(&self) -> Option<bool> {
        if self.no_continuous {
            Some(false)
        } else if self.continuous {
            Some(true)
        } else {
            None
        }
    }

    /// Preferences with every explicitly given flag applied on top.
    #[must_use]
    pub fn merged_prefs(&self, saved: &Preferences) -> Preferences {
        let mut prefs = saved.clone();
        let recognition = &mut prefs.recognition;
        if let Some(v) = self.sensitivity {
            recognition.sensitivity = v;
        }
        if let Some(v) = self.continuous_override() {
            recognition.continuous = v;
        }
        if let Some(v) = self.restart_delay_ms {
            recognition.restart_delay_ms = v;
        }
        if let Some(ref v) = self.command_prefix {
            recognition.command_prefix = Some(v.clone());
        }
        if let Some(v) = self.remote_timeout_ms {
            prefs.remote.timeout_ms = v;
        }
        let speech = &mut prefs.speech;
        if let Some(ref v) = self.lang {
            speech.lang = v.clone();
        }
        if let Some(v) = self.speech_rate {
            speech.rate = v;
        }
        if let Some(v) = self.speech_pitch {
            speech.pitch = v;
        }
        if let Some(v) = self.speech_volume {
            speech.volume = v;
        }
        prefs
    }

    /// Session settings from already-merged preferences.
    #[must_use]
    pub fn session_settings(&self, prefs: &Preferences) -> SessionSettings {
        SessionSettings {
            recognition: prefs.recognition.settings(),
            speech: prefs.speech.clone().clamped(),
            command_prefix: prefs.recognition.command_prefix.clone(),
            log_content: self.log_content && !self.no_logs,
        }
    }
}
