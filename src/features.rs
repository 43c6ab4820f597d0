//! Active-feature state machine shared by voice, shortcut, panel, and remote triggers.
//!
//! Membership only changes after the enabling/disabling side effect returns
//! `Ok`, and redundant start/stop requests never reach the side effect.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for a toggleable accessibility capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureId {
    ScreenReader,
    Speech,
    Motor,
    Cognitive,
    Visual,
    HighContrast,
    LargeText,
    ReadingGuide,
    DyslexiaFont,
}

impl FeatureId {
    pub const ALL: [FeatureId; 9] = [
        FeatureId::ScreenReader,
        FeatureId::Speech,
        FeatureId::Motor,
        FeatureId::Cognitive,
        FeatureId::Visual,
        FeatureId::HighContrast,
        FeatureId::LargeText,
        FeatureId::ReadingGuide,
        FeatureId::DyslexiaFont,
    ];

    /// Wire name used in IPC and preference files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureId::ScreenReader => "screenReader",
            FeatureId::Speech => "speech",
            FeatureId::Motor => "motor",
            FeatureId::Cognitive => "cognitive",
            FeatureId::Visual => "visual",
            FeatureId::HighContrast => "highContrast",
            FeatureId::LargeText => "largeText",
            FeatureId::ReadingGuide => "readingGuide",
            FeatureId::DyslexiaFont => "dyslexiaFont",
        }
    }

    /// Phrases a user might say for this feature; the first is the display name.
    #[must_use]
    pub fn spoken_names(self) -> &'static [&'static str] {
        match self {
            FeatureId::ScreenReader => &["screen reader"],
            FeatureId::Speech => &["voice control", "speech", "voice commands"],
            FeatureId::Motor => &["motor assistance", "motor", "motor support"],
            FeatureId::Cognitive => &["cognitive assistance", "cognitive", "cognitive support"],
            FeatureId::Visual => &["visual assistance", "visual", "visual support"],
            FeatureId::HighContrast => &["high contrast", "contrast"],
            FeatureId::LargeText => &["large text", "big text", "text size"],
            FeatureId::ReadingGuide => &["reading guide", "reading ruler"],
            FeatureId::DyslexiaFont => &["dyslexia font", "dyslexic font"],
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        self.spoken_names()[0]
    }

    /// Accept wire names (`highContrast`), snake case, or any spoken alias.
    #[must_use]
    pub fn parse_name(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let spoken = trimmed.replace(['_', '-'], " ").to_lowercase();
        Self::ALL.into_iter().find(|id| {
            id.as_str().eq_ignore_ascii_case(trimmed)
                || id.spoken_names().iter().any(|name| *name == spoken)
        })
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Toggle,
    Start,
    Stop,
}

/// Outcome of one transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureChange {
    pub feature: FeatureId,
    /// Membership after the request.
    pub enabled: bool,
    /// False when the request was a redundant start/stop.
    pub changed: bool,
}

/// Presentation side effects (stylesheets, fonts, overlays) applied by the host.
pub trait FeatureHooks {
    fn apply(&mut self, feature: FeatureId, enabled: bool) -> Result<(), String>;
}

/// Hooks that accept every change without doing anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl FeatureHooks for NoopHooks {
    fn apply(&mut self, _feature: FeatureId, _enabled: bool) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveFeatureSet {
    active: BTreeSet<FeatureId>,
}

impl ActiveFeatureSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_active(&self, id: FeatureId) -> bool {
        self.active.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = FeatureId> + '_ {
        self.active.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Apply `transition`, running `effect(id, enable)` only for real changes.
    ///
    /// The set is updated after `effect` succeeds; on error it is untouched.
    pub fn apply<E>(
        &mut self,
        id: FeatureId,
        transition: Transition,
        effect: impl FnOnce(FeatureId, bool) -> Result<(), E>,
    ) -> Result<FeatureChange, E> {
        let current = self.is_active(id);
        let target = match transition {
            Transition::Toggle => !current,
            Transition::Start => true,
            Transition::Stop => false,
        };
        if target == current {
            return Ok(FeatureChange {
                feature: id,
                enabled: current,
                changed: false,
            });
        }
        effect(id, target)?;
        if target {
            self.active.insert(id);
        } else {
            self.active.remove(&id);
        }
        Ok(FeatureChange {
            feature: id,
            enabled: target,
            changed: true,
        })
    }

    /// Drop every membership without running side effects (session teardown).
    pub fn clear(&mut self) {
        self.active.clear();
    }
}
