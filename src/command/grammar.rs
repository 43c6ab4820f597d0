//! Ordered rule list that turns normalized transcript text into commands.

use regex::{Captures, Regex, RegexBuilder};
use tracing::debug;

use crate::voice::normalize_transcript;

use super::name::Command;
use super::params::{Params, ResolvedCommand};

/// Builds parameters from a pattern match (spoken number words, renames).
pub type CustomExtractor = fn(&Captures<'_>) -> Params;

#[derive(Debug, Clone)]
pub enum RuleMatcher {
    /// Whole-text match against any listed phrase.
    Exact(Vec<String>),
    Contains(String),
    /// Anchored regex; named groups feed the extractor.
    Pattern(Regex),
}

#[derive(Debug, Clone)]
pub enum Extractor {
    /// Constant parameters regardless of the match.
    Fixed(Params),
    /// Named capture groups, then `defaults` for groups that did not participate.
    Captures { defaults: Params },
    Custom(CustomExtractor),
}

#[derive(Debug, Clone)]
pub struct CommandRule {
    matcher: RuleMatcher,
    command: Command,
    extractor: Extractor,
}

impl CommandRule {
    #[must_use]
    pub fn exact(command: Command, phrases: &[&str]) -> Self {
        Self {
            matcher: RuleMatcher::Exact(
                phrases
                    .iter()
                    .map(|phrase| normalize_transcript(phrase))
                    .collect(),
            ),
            command,
            extractor: Extractor::Fixed(Params::new()),
        }
    }

    #[must_use]
    pub fn contains(command: Command, phrase: &str) -> Self {
        Self {
            matcher: RuleMatcher::Contains(normalize_transcript(phrase)),
            command,
            extractor: Extractor::Fixed(Params::new()),
        }
    }

    /// Case-insensitive regex rule; named groups become parameters.
    pub fn pattern(command: Command, pattern: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self {
            matcher: RuleMatcher::Pattern(regex),
            command,
            extractor: Extractor::Captures {
                defaults: Params::new(),
            },
        })
    }

    /// Defaults for capture groups that did not participate in the match.
    #[must_use]
    pub fn with_defaults(mut self, defaults: Params) -> Self {
        self.extractor = Extractor::Captures { defaults };
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.extractor = Extractor::Fixed(params);
        self
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: CustomExtractor) -> Self {
        self.extractor = Extractor::Custom(extractor);
        self
    }

    #[must_use]
    pub fn command(&self) -> Command {
        self.command
    }

    #[must_use]
    pub fn matcher(&self) -> &RuleMatcher {
        &self.matcher
    }

    /// Match already-normalized text.
    #[must_use]
    pub fn apply(&self, text: &str) -> Option<ResolvedCommand> {
        let params = match &self.matcher {
            RuleMatcher::Exact(phrases) => {
                if !phrases.iter().any(|phrase| phrase == text) {
                    return None;
                }
                self.fixed_params()
            }
            RuleMatcher::Contains(phrase) => {
                if phrase.is_empty() || !text.contains(phrase.as_str()) {
                    return None;
                }
                self.fixed_params()
            }
            RuleMatcher::Pattern(regex) => {
                let captures = regex.captures(text)?;
                self.extract(regex, &captures)
            }
        };
        Some(ResolvedCommand::new(self.command, params))
    }

    fn fixed_params(&self) -> Params {
        match &self.extractor {
            Extractor::Fixed(params) | Extractor::Captures { defaults: params } => params.clone(),
            Extractor::Custom(_) => Params::new(),
        }
    }

    fn extract(&self, regex: &Regex, captures: &Captures<'_>) -> Params {
        match &self.extractor {
            Extractor::Fixed(params) => params.clone(),
            Extractor::Custom(extract) => extract(captures),
            Extractor::Captures { defaults } => {
                let mut params = Params::new();
                for name in regex.capture_names().flatten() {
                    if let Some(value) = captures.name(name) {
                        let value = value.as_str().trim();
                        if !value.is_empty() {
                            params.insert(name, value);
                        }
                    }
                }
                for (key, value) in defaults.iter() {
                    params.insert_default(key, value);
                }
                params
            }
        }
    }
}

/// Ordered rules plus an optional spoken prefix ("computer, scroll down").
#[derive(Debug, Clone, Default)]
pub struct CommandGrammar {
    rules: Vec<CommandRule>,
    prefix: Option<String>,
}

impl CommandGrammar {
    #[must_use]
    pub fn new(rules: Vec<CommandRule>) -> Self {
        Self {
            rules,
            prefix: None,
        }
    }

    #[must_use]
    pub fn with_default_rules() -> Self {
        Self::new(super::rules::default_rules())
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: Option<&str>) -> Self {
        self.set_prefix(prefix);
        self
    }

    pub fn set_prefix(&mut self, prefix: Option<&str>) {
        self.prefix = prefix
            .map(normalize_transcript)
            .filter(|prefix| !prefix.is_empty());
    }

    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    #[must_use]
    pub fn rules(&self) -> &[CommandRule] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Append a rule after every existing one.
    pub fn push_rule(&mut self, rule: CommandRule) {
        debug!(command = %rule.command, "rule appended");
        self.rules.push(rule);
    }

    /// False when a prefix is configured and `text` does not start with it.
    #[must_use]
    pub fn is_addressed(&self, text: &str) -> bool {
        match &self.prefix {
            Some(prefix) => strip_prefix(&normalize_transcript(text), prefix)
                .is_some_and(|body| !body.is_empty()),
            None => true,
        }
    }

    #[must_use]
    pub fn match_text(&self, text: &str) -> Option<ResolvedCommand> {
        self.match_indexed(text).map(|(_, resolved)| resolved)
    }

    /// First matching rule and its index in list order.
    #[must_use]
    pub fn match_indexed(&self, text: &str) -> Option<(usize, ResolvedCommand)> {
        let normalized = normalize_transcript(text);
        let body = match &self.prefix {
            Some(prefix) => strip_prefix(&normalized, prefix)?,
            None => normalized.as_str(),
        };
        if body.is_empty() {
            return None;
        }
        self.rules
            .iter()
            .enumerate()
            .find_map(|(idx, rule)| rule.apply(body).map(|resolved| (idx, resolved)))
    }
}

fn strip_prefix<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(prefix)?;
    if !rest.is_empty() && !rest.starts_with([' ', ',']) {
        return None;
    }
    Some(rest.trim_start_matches([' ', ',']).trim())
}
