//! Persistent user preferences (`<config dir>/voicenav/prefs.toml`).
//!
//! One table per feature area. Each table merges shallowly over its defaults,
//! so a file that only sets `[speech] rate` keeps every other default.
//! CLI flags take precedence over these values; see `config`.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::features::FeatureId;
use crate::ipc::DEFAULT_REMOTE_TIMEOUT_MS;
use crate::speech::SpeechParams;
use crate::voice::{
    clamp_sensitivity, RecognitionSettings, DEFAULT_RESTART_DELAY_MS, DEFAULT_SENSITIVITY,
};

const PREFS_FILE: &str = "prefs.toml";
const CONFIG_DIR_ENV: &str = "VOICENAV_CONFIG_DIR";

pub const MIN_RESTART_DELAY_MS: u64 = 100;
pub const MAX_RESTART_DELAY_MS: u64 = 10_000;

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("no config directory available")]
    NoConfigDir,
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("invalid preferences in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize preferences: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionPrefs {
    pub sensitivity: f32,
    pub continuous: bool,
    pub restart_delay_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_prefix: Option<String>,
    /// Start listening as soon as the session is ready.
    pub auto_start: bool,
}

impl Default for RecognitionPrefs {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_SENSITIVITY,
            continuous: true,
            restart_delay_ms: DEFAULT_RESTART_DELAY_MS,
            command_prefix: None,
            auto_start: false,
        }
    }
}

impl RecognitionPrefs {
    /// Recognition settings with out-of-range values clamped.
    #[must_use]
    pub fn settings(&self) -> RecognitionSettings {
        RecognitionSettings {
            sensitivity: clamp_sensitivity(self.sensitivity),
            continuous: self.continuous,
            restart_delay: Duration::from_millis(
                self.restart_delay_ms
                    .clamp(MIN_RESTART_DELAY_MS, MAX_RESTART_DELAY_MS),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemotePrefs {
    pub timeout_ms: u64,
}

impl Default for RemotePrefs {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_REMOTE_TIMEOUT_MS,
        }
    }
}

impl RemotePrefs {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturePrefs {
    /// Features switched on at startup.
    pub enabled: Vec<FeatureId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub recognition: RecognitionPrefs,
    pub speech: SpeechParams,
    pub remote: RemotePrefs,
    pub features: FeaturePrefs,
}

/// Resolve `$VOICENAV_CONFIG_DIR` or the platform config dir.
fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = env::var(CONFIG_DIR_ENV) {
        let trimmed = dir.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    dirs::config_dir().map(|dir| dir.join("voicenav"))
}

#[must_use]
pub fn prefs_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(PREFS_FILE))
}

impl Preferences {
    pub fn parse(raw: &str, path: &Path) -> Result<Self, PrefsError> {
        toml::from_str(raw).map_err(|source| PrefsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, PrefsError> {
        match fs::read_to_string(path) {
            Ok(raw) => Self::parse(&raw, path),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no preferences file; using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(PrefsError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load from the default location, falling back to defaults on any error.
    #[must_use]
    pub fn load() -> Self {
        let Some(path) = prefs_path() else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(prefs) => prefs,
            Err(err) => {
                warn!(%err, "preferences ignored");
                Self::default()
            }
        }
    }

    /// Write every area to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), PrefsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| PrefsError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let body = toml::to_string_pretty(self)?;
        fs::write(path, body).map_err(|source| PrefsError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "preferences saved");
        Ok(())
    }

    pub fn save(&self) -> Result<PathBuf, PrefsError> {
        let path = prefs_path().ok_or(PrefsError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }
}
