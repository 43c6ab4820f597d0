//! Built-in rule table. Order matters: specific phrasings precede general ones.

use regex::Captures;
use tracing::warn;

use crate::features::FeatureId;

use super::grammar::CommandRule;
use super::name::Command;
use super::params::Params;

pub const DEFAULT_SCROLL_AMOUNT: u64 = 300;

const NUMBER_WORDS: &[(&str, &str)] = &[
    ("one", "1"),
    ("first", "1"),
    ("two", "2"),
    ("second", "2"),
    ("three", "3"),
    ("third", "3"),
    ("four", "4"),
    ("fourth", "4"),
    ("five", "5"),
    ("fifth", "5"),
    ("six", "6"),
    ("sixth", "6"),
    ("seven", "7"),
    ("seventh", "7"),
    ("eight", "8"),
    ("eighth", "8"),
    ("nine", "9"),
    ("ninth", "9"),
    ("ten", "10"),
    ("tenth", "10"),
    ("eleven", "11"),
    ("twelve", "12"),
    ("thirteen", "13"),
    ("fourteen", "14"),
    ("fifteen", "15"),
    ("sixteen", "16"),
    ("seventeen", "17"),
    ("eighteen", "18"),
    ("nineteen", "19"),
    ("twenty", "20"),
];

/// Accept digits or number words ("three", "third").
pub(crate) fn spoken_number(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if !raw.is_empty() && raw.chars().all(|ch| ch.is_ascii_digit()) {
        return Some(raw.to_string());
    }
    NUMBER_WORDS
        .iter()
        .find(|(word, _)| *word == raw)
        .map(|(_, digits)| (*digits).to_string())
}

fn select_index(captures: &Captures<'_>) -> Params {
    let mut params = Params::new();
    if let Some(index) = captures
        .name("index")
        .and_then(|raw| spoken_number(raw.as_str()))
    {
        params.insert("index", index);
    }
    params
}

/// Alternation of every spoken feature alias, longest first.
fn feature_alternation() -> String {
    let mut names: Vec<&str> = FeatureId::ALL
        .into_iter()
        .flat_map(|id| id.spoken_names().iter().copied())
        .collect();
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));
    names
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|")
}

fn scroll_defaults() -> Params {
    Params::new().with("amount", DEFAULT_SCROLL_AMOUNT.to_string())
}

fn exact(command: Command, phrases: &[&str]) -> Option<CommandRule> {
    Some(CommandRule::exact(command, phrases))
}

fn pattern(command: Command, pattern: &str) -> Option<CommandRule> {
    CommandRule::pattern(command, pattern)
        .map_err(|err| warn!(%command, %err, "built-in rule pattern rejected"))
        .ok()
}

fn table() -> Vec<Option<CommandRule>> {
    let features = feature_alternation();
    vec![
        pattern(
            Command::ScrollDown,
            r"^scroll down(?: by)?(?: (?P<amount>\d+))?(?: pixels?)?$",
        )
        .map(|rule| rule.with_defaults(scroll_defaults())),
        pattern(
            Command::ScrollUp,
            r"^scroll up(?: by)?(?: (?P<amount>\d+))?(?: pixels?)?$",
        )
        .map(|rule| rule.with_defaults(scroll_defaults())),
        exact(
            Command::ScrollTop,
            &[
                "scroll to top",
                "scroll to the top",
                "go to top",
                "go to the top",
                "top of page",
            ],
        ),
        exact(
            Command::ScrollBottom,
            &[
                "scroll to bottom",
                "scroll to the bottom",
                "go to bottom",
                "go to the bottom",
                "bottom of page",
            ],
        ),
        exact(Command::GoBack, &["go back", "back", "previous page"]),
        exact(Command::GoForward, &["go forward", "forward", "next page"]),
        exact(
            Command::Reload,
            &[
                "reload",
                "reload page",
                "reload the page",
                "refresh",
                "refresh page",
                "refresh the page",
            ],
        ),
        pattern(
            Command::StartScreenReader,
            r"^(?:start|turn on|enable|activate|open) (?:the )?screen reader$",
        ),
        pattern(
            Command::StopScreenReader,
            r"^(?:stop|turn off|disable|deactivate|close) (?:the )?screen reader$",
        ),
        exact(
            Command::ToggleScreenReader,
            &["toggle screen reader", "toggle the screen reader", "screen reader"],
        ),
        exact(
            Command::ReadPage,
            &[
                "read page",
                "read the page",
                "read this page",
                "read all",
                "read everything",
                "start reading",
            ],
        ),
        exact(
            Command::NextElement,
            &["next", "next element", "next item", "read next"],
        ),
        exact(
            Command::PreviousElement,
            &["previous", "previous element", "previous item", "read previous"],
        ),
        exact(
            Command::StopReading,
            &["stop reading", "stop talking", "stop", "be quiet", "quiet", "silence"],
        ),
        exact(
            Command::RescanPage,
            &["rescan page", "rescan the page", "rescan", "scan page"],
        ),
        pattern(
            Command::ToggleHighContrast,
            r"^(?:toggle |switch )?(?:the )?high contrast(?: mode)?$",
        ),
        pattern(
            Command::ToggleLargeText,
            r"^(?:toggle |switch )?(?:the )?(?:large|big) text$",
        ),
        pattern(
            Command::ToggleReadingGuide,
            r"^(?:toggle |switch )?(?:the )?reading (?:guide|ruler)$",
        ),
        pattern(
            Command::ToggleDyslexiaFont,
            r"^(?:toggle |switch )?(?:the )?dyslexi(?:a|c) font$",
        ),
        exact(
            Command::StopListening,
            &[
                "stop listening",
                "stop voice control",
                "stop voice commands",
                "stop speech recognition",
            ],
        ),
        pattern(
            Command::EnableFeature,
            &format!(r"^(?:turn on|enable|activate|start) (?:the )?(?P<feature>{features})(?: mode)?$"),
        ),
        pattern(
            Command::DisableFeature,
            &format!(r"^(?:turn off|disable|deactivate|stop) (?:the )?(?P<feature>{features})(?: mode)?$"),
        ),
        pattern(
            Command::ClickButton,
            r"^(?:click|press|tap|push) (?:on )?(?:the )?button (?P<text>.+)$",
        ),
        pattern(
            Command::ClickButton,
            r"^(?:click|press|tap|push) (?:on )?(?:the )?(?P<text>.+) button$",
        ),
        pattern(
            Command::ClickLink,
            r"^(?:click|follow|open|tap) (?:on )?(?:the )?link (?P<text>.+)$",
        ),
        pattern(
            Command::ClickLink,
            r"^(?:click|follow|open|tap) (?:on )?(?:the )?(?P<text>.+) link$",
        ),
        pattern(
            Command::SelectElement,
            r"^(?:select|go to|jump to) (?:item|element|number) (?P<index>\S+)$",
        )
        .map(|rule| rule.with_extractor(select_index)),
        pattern(
            Command::FocusField,
            r"^(?:focus on|focus|go to|select) (?:the )?(?P<field>.+?) (?:field|box|input)$",
        ),
        pattern(
            Command::FillField,
            r"^(?:type|enter|write|input) (?P<value>.+?) (?:in|into) (?:the )?(?P<field>.+?)(?: field| box| input)?$",
        ),
        pattern(
            Command::FillField,
            r"^fill (?:in )?(?:the )?(?P<field>.+?)(?: field| box)? with (?P<value>.+)$",
        ),
        pattern(Command::TypeText, r"^(?:type|enter|write|input) (?P<value>.+)$"),
        exact(
            Command::SubmitForm,
            &[
                "submit",
                "submit form",
                "submit the form",
                "send form",
                "send the form",
            ],
        ),
        exact(
            Command::SummarizePage,
            &[
                "summarize",
                "summarize page",
                "summarize the page",
                "summarize this page",
            ],
        ),
        pattern(
            Command::DescribeImage,
            r"^describe (?:the |this )?(?:image|picture|photo)(?: (?:of |called |named )?(?P<text>.+))?$",
        ),
        exact(
            Command::Help,
            &["help", "show help", "list commands", "show commands"],
        ),
        Some(CommandRule::contains(Command::Help, "what can i say")),
        pattern(
            Command::Click,
            r"^(?:click|press|tap|choose|select) (?:on )?(?:the )?(?P<text>.+)$",
        ),
    ]
}

/// Built-in rules in evaluation order.
#[must_use]
pub fn default_rules() -> Vec<CommandRule> {
    table().into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::grammar::CommandGrammar;

    /// One representative phrase per rule, in table order.
    const SAMPLES: &[(&str, Command)] = &[
        ("scroll down", Command::ScrollDown),
        ("scroll up", Command::ScrollUp),
        ("scroll to top", Command::ScrollTop),
        ("go to the bottom", Command::ScrollBottom),
        ("go back", Command::GoBack),
        ("go forward", Command::GoForward),
        ("refresh page", Command::Reload),
        ("turn on screen reader", Command::StartScreenReader),
        ("stop the screen reader", Command::StopScreenReader),
        ("toggle screen reader", Command::ToggleScreenReader),
        ("read page", Command::ReadPage),
        ("next", Command::NextElement),
        ("previous", Command::PreviousElement),
        ("stop reading", Command::StopReading),
        ("rescan page", Command::RescanPage),
        ("toggle high contrast", Command::ToggleHighContrast),
        ("large text", Command::ToggleLargeText),
        ("toggle reading guide", Command::ToggleReadingGuide),
        ("dyslexia font", Command::ToggleDyslexiaFont),
        ("stop listening", Command::StopListening),
        ("turn on motor assistance", Command::EnableFeature),
        ("turn off high contrast", Command::DisableFeature),
        ("click the button submit", Command::ClickButton),
        ("press subscribe button", Command::ClickButton),
        ("click the link pricing", Command::ClickLink),
        ("follow the docs link", Command::ClickLink),
        ("select item 3", Command::SelectElement),
        ("focus the email field", Command::FocusField),
        ("type hello in email", Command::FillField),
        ("fill email with bob", Command::FillField),
        ("type hello", Command::TypeText),
        ("submit form", Command::SubmitForm),
        ("summarize page", Command::SummarizePage),
        ("describe image logo", Command::DescribeImage),
        ("help", Command::Help),
        ("hey what can i say", Command::Help),
        ("click submit", Command::Click),
    ];

    #[test]
    fn every_built_in_pattern_compiles() {
        assert_eq!(default_rules().len(), table().len());
    }

    #[test]
    fn each_sample_is_claimed_by_its_own_rule() {
        let grammar = CommandGrammar::with_default_rules();
        assert_eq!(grammar.len(), SAMPLES.len());
        for (idx, (sample, command)) in SAMPLES.iter().enumerate() {
            let (matched_idx, resolved) = grammar
                .match_indexed(sample)
                .unwrap_or_else(|| panic!("\"{sample}\" matched nothing"));
            assert_eq!(matched_idx, idx, "\"{sample}\" claimed by an earlier rule");
            assert_eq!(resolved.command, *command);
            assert_eq!(grammar.rules()[idx].command(), *command);
        }
    }

    #[test]
    fn scroll_amount_defaults_to_three_hundred() {
        let grammar = CommandGrammar::with_default_rules();
        let resolved = grammar.match_text("scroll up").expect("match");
        assert_eq!(resolved.params.get("amount"), Some("300"));
    }

    #[test]
    fn spoken_numbers_cover_words_and_digits() {
        assert_eq!(spoken_number("12").as_deref(), Some("12"));
        assert_eq!(spoken_number("third").as_deref(), Some("3"));
        assert_eq!(spoken_number("many"), None);
        assert_eq!(spoken_number(""), None);
    }

    #[test]
    fn select_with_unknown_word_leaves_index_missing() {
        let grammar = CommandGrammar::with_default_rules();
        let resolved = grammar.match_text("select item many").expect("match");
        assert_eq!(resolved.command, Command::SelectElement);
        assert_eq!(resolved.params.get("index"), None);
    }
}
