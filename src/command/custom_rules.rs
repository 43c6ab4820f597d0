//! User rule file loading. Custom rules append after the built-in table.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::RuleError;
use super::grammar::CommandRule;
use super::name::Command;
use super::params::Params;

#[derive(Debug, Deserialize)]
struct RawRuleFile {
    #[serde(default)]
    rules: Vec<RuleDefinition>,
}

/// One entry in the YAML `rules:` list, or one `register_rule` IPC payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuleDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phrase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub command: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, RawValue>,
}

/// Scalar parameter values as YAML/JSON may spell them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Text(String),
    Integer(i64),
    Flag(bool),
}

impl RawValue {
    fn into_text(self) -> String {
        match self {
            RawValue::Text(text) => text,
            RawValue::Integer(value) => value.to_string(),
            RawValue::Flag(flag) => flag.to_string(),
        }
    }
}

impl RuleDefinition {
    /// Validate and compile. `index` only labels errors.
    pub fn compile(self, index: usize) -> Result<CommandRule, RuleError> {
        let command =
            Command::parse_name(&self.command).ok_or_else(|| RuleError::UnknownCommand {
                index,
                command: self.command.clone(),
            })?;
        let mut params = Params::new();
        for (key, value) in self.params {
            params.insert(&key, value.into_text());
        }
        match (self.phrase, self.contains, self.pattern) {
            (Some(phrase), None, None) => {
                if phrase.trim().is_empty() {
                    return Err(RuleError::EmptyPhrase { index });
                }
                Ok(CommandRule::exact(command, &[phrase.as_str()]).with_params(params))
            }
            (None, Some(phrase), None) => {
                if phrase.trim().is_empty() {
                    return Err(RuleError::EmptyPhrase { index });
                }
                Ok(CommandRule::contains(command, &phrase).with_params(params))
            }
            (None, None, Some(pattern)) => CommandRule::pattern(command, &pattern)
                .map(|rule| rule.with_defaults(params))
                .map_err(|err| RuleError::Pattern {
                    index,
                    reason: err.to_string(),
                }),
            _ => Err(RuleError::MatcherCount { index }),
        }
    }
}

/// Parse a whole rule file; any bad entry rejects the file.
pub fn parse_rules(raw: &str) -> Result<Vec<CommandRule>, String> {
    let parsed: RawRuleFile =
        serde_norway::from_str(raw).map_err(|err| format!("yaml parse error: {err}"))?;
    parsed
        .rules
        .into_iter()
        .enumerate()
        .map(|(index, rule)| rule.compile(index).map_err(|err| err.to_string()))
        .collect()
}

/// Load rules from `path`. Missing, unreadable, or invalid files yield no rules.
#[must_use]
pub fn load_from_path(path: &Path) -> Vec<CommandRule> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(path = %path.display(), %err, "custom rule file unreadable");
            return Vec::new();
        }
    };
    match parse_rules(&contents) {
        Ok(rules) => {
            info!(count = rules.len(), path = %path.display(), "loaded custom rules");
            rules
        }
        Err(err) => {
            warn!(path = %path.display(), %err, "custom rule file invalid; using built-ins only");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name: &str) -> std::path::PathBuf {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "voicenav-rules-{now}-{}-{name}",
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ))
    }

    #[test]
    fn phrase_rule_carries_fixed_params() {
        let rules = parse_rules(
            r#"
rules:
  - phrase: "Open the menu"
    command: click_button
    params: { text: "menu" }
"#,
        )
        .expect("valid yaml");
        let resolved = rules[0].apply("open the menu").expect("match");
        assert_eq!(resolved.command, Command::ClickButton);
        assert_eq!(resolved.params.get("text"), Some("menu"));
    }

    #[test]
    fn pattern_rule_named_groups_become_params() {
        let rules = parse_rules(
            r#"
rules:
  - pattern: "^jump to (?P<text>.+)$"
    command: click_link
  - contains: "bigger"
    command: TOGGLE_LARGE_TEXT
  - pattern: "^nudge(?: (?P<amount>\\d+))?$"
    command: scroll_down
    params: { amount: 50 }
"#,
        )
        .expect("valid yaml");
        let jump = rules[0].apply("jump to pricing").expect("match");
        assert_eq!(jump.command, Command::ClickLink);
        assert_eq!(jump.params.get("text"), Some("pricing"));
        assert_eq!(
            rules[1].apply("make it bigger").expect("match").command,
            Command::ToggleLargeText
        );
        assert_eq!(
            rules[2].apply("nudge").expect("match").params.get("amount"),
            Some("50")
        );
    }

    #[test]
    fn rejects_rules_with_zero_or_two_matchers() {
        let err = parse_rules(
            r#"
rules:
  - phrase: "a"
    contains: "b"
    command: help
"#,
        )
        .expect_err("two matchers");
        assert!(err.contains("exactly one of"));
        assert!(parse_rules("rules:\n  - command: help\n").is_err());
    }

    #[test]
    fn rejects_unknown_commands_and_bad_patterns() {
        let err = parse_rules("rules:\n  - phrase: x\n    command: teleport\n")
            .expect_err("unknown command");
        assert!(err.contains("teleport"));
        let err = parse_rules("rules:\n  - pattern: \"(\"\n    command: help\n")
            .expect_err("bad regex");
        assert!(err.contains("invalid pattern"));
    }

    #[test]
    fn invalid_or_missing_files_load_nothing() {
        let path = temp_path("bad.yaml");
        fs::write(&path, "rules: [ {").expect("write rules");
        assert!(load_from_path(&path).is_empty());
        assert!(load_from_path(&temp_path("missing.yaml")).is_empty());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn valid_file_loads_in_order() {
        let path = temp_path("ok.yaml");
        fs::write(
            &path,
            "rules:\n  - phrase: first\n    command: help\n  - phrase: second\n    command: reload\n",
        )
        .expect("write rules");
        let rules = load_from_path(&path);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].command(), Command::Reload);
        let _ = fs::remove_file(path);
    }
}
