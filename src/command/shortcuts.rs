//! Keyboard chords that route into the same command path as voice.

use std::fmt;
use std::str::FromStr;

use super::name::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

/// A parsed chord such as `alt+shift+s`. Case and modifier order are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub modifiers: Modifiers,
    pub key: String,
}

impl FromStr for KeyChord {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut modifiers = Modifiers::default();
        let mut key: Option<String> = None;
        for part in raw.split('+').map(str::trim) {
            let lowered = part.to_ascii_lowercase();
            match lowered.as_str() {
                "" => return Err(format!("empty key in chord \"{raw}\"")),
                "ctrl" | "control" => modifiers.ctrl = true,
                "alt" | "option" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "meta" | "cmd" | "command" | "super" => modifiers.meta = true,
                _ => {
                    if key.replace(normalize_key(&lowered)).is_some() {
                        return Err(format!("chord \"{raw}\" names more than one key"));
                    }
                }
            }
        }
        let key = key.ok_or_else(|| format!("chord \"{raw}\" has no key"))?;
        Ok(Self { modifiers, key })
    }
}

fn normalize_key(key: &str) -> String {
    match key {
        "esc" => "escape".to_string(),
        other => other.to_string(),
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (on, name) in [
            (self.modifiers.ctrl, "ctrl"),
            (self.modifiers.alt, "alt"),
            (self.modifiers.shift, "shift"),
            (self.modifiers.meta, "meta"),
        ] {
            if on {
                write!(f, "{name}+")?;
            }
        }
        f.write_str(&self.key)
    }
}

const DEFAULT_BINDINGS: &[(&str, Command)] = &[
    ("alt+shift+s", Command::ToggleScreenReader),
    ("alt+shift+v", Command::ToggleListening),
    ("alt+shift+c", Command::ToggleHighContrast),
    ("alt+shift+r", Command::ReadPage),
    ("alt+shift+n", Command::NextElement),
    ("alt+shift+p", Command::PreviousElement),
    ("escape", Command::StopReading),
];

#[derive(Debug, Clone)]
pub struct ShortcutMap {
    bindings: Vec<(KeyChord, Command)>,
}

impl Default for ShortcutMap {
    fn default() -> Self {
        Self {
            bindings: DEFAULT_BINDINGS
                .iter()
                .filter_map(|(chord, command)| {
                    chord.parse::<KeyChord>().ok().map(|chord| (chord, *command))
                })
                .collect(),
        }
    }
}

impl ShortcutMap {
    #[must_use]
    pub fn lookup(&self, chord: &KeyChord) -> Option<Command> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == chord)
            .map(|(_, command)| *command)
    }

    /// Parse and look up a chord string; unparseable chords map to nothing.
    #[must_use]
    pub fn lookup_str(&self, raw: &str) -> Option<Command> {
        raw.parse::<KeyChord>()
            .ok()
            .and_then(|chord| self.lookup(&chord))
    }

    pub fn bind(&mut self, chord: KeyChord, command: Command) {
        self.bindings.retain(|(bound, _)| *bound != chord);
        self.bindings.push((chord, command));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&KeyChord, Command)> {
        self.bindings.iter().map(|(chord, command)| (chord, *command))
    }
}
