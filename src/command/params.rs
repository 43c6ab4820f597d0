//! Command parameter map with typed accessors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::ActionError;
use super::name::Command;

/// String-keyed parameters (`text`, `field`, `value`, `amount`, `index`, `feature`).
///
/// Remote interpreters may send numbers or booleans; they are stored in their
/// textual form so every command reads parameters the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, RawParam>")]
pub struct Params(BTreeMap<String, String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawParam {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

impl From<BTreeMap<String, RawParam>> for Params {
    fn from(raw: BTreeMap<String, RawParam>) -> Self {
        Self(
            raw.into_iter()
                .map(|(key, value)| {
                    let value = match value {
                        RawParam::Text(text) => text,
                        RawParam::Number(number) => number.to_string(),
                        RawParam::Flag(flag) => flag.to_string(),
                    };
                    (key, value)
                })
                .collect(),
        )
    }
}

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Insert only when the key is absent.
    pub fn insert_default(&mut self, key: &str, value: &str) {
        self.0
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn require(&self, key: &'static str) -> Result<&str, ActionError> {
        self.get(key).ok_or(ActionError::MissingParam(key))
    }

    /// Parse an unsigned number, falling back to `default` when absent.
    pub fn number_or(&self, key: &'static str, default: u64) -> Result<u64, ActionError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite() && *value >= 0.0)
                .map(|value| value.round() as u64)
                .ok_or_else(|| ActionError::InvalidParam {
                    key,
                    value: raw.to_string(),
                }),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Merge `other` over `self`; keys in `other` win.
    pub fn extend(&mut self, other: &Params) {
        for (key, value) in other.iter() {
            self.insert(key, value);
        }
    }
}

/// A matched command with its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCommand {
    pub command: Command,
    #[serde(default)]
    pub params: Params,
}

impl ResolvedCommand {
    #[must_use]
    pub fn new(command: Command, params: Params) -> Self {
        Self { command, params }
    }

    #[must_use]
    pub fn bare(command: Command) -> Self {
        Self::new(command, Params::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_and_flags_deserialize_as_text() {
        let params: Params =
            serde_json::from_str(r#"{"amount": 250, "smooth": true, "text": "Go"}"#)
                .expect("valid params");
        assert_eq!(params.get("amount"), Some("250"));
        assert_eq!(params.get("smooth"), Some("true"));
        assert_eq!(params.number_or("amount", 300).expect("number"), 250);
    }

    #[test]
    fn number_or_defaults_and_rejects_garbage() {
        let params = Params::new().with("amount", "lots");
        assert_eq!(Params::new().number_or("amount", 300).expect("default"), 300);
        assert!(matches!(
            params.number_or("amount", 300),
            Err(ActionError::InvalidParam { key: "amount", .. })
        ));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let params = Params::new().with("text", "   ");
        assert_eq!(params.get("text"), None);
        assert!(matches!(
            params.require("text"),
            Err(ActionError::MissingParam("text"))
        ));
    }

    #[test]
    fn resolved_command_round_trips_through_remote_reply_shape() {
        let resolved: ResolvedCommand =
            serde_json::from_str(r#"{"command":"scroll_down","params":{"amount":120}}"#)
                .expect("valid reply");
        assert_eq!(resolved.command, Command::ScrollDown);
        assert_eq!(resolved.params.get("amount"), Some("120"));
    }
}
