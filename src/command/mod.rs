//! Command grammar, registry, and the actions voice and shortcuts trigger.

mod actions;
pub mod custom_rules;
mod error;
mod grammar;
mod name;
mod params;
mod registry;
mod rules;
mod shortcuts;

pub use actions::{ActionContext, ActionOutcome};
pub use custom_rules::RuleDefinition;
pub use error::{ActionError, RuleError};
pub use grammar::{CommandGrammar, CommandRule, CustomExtractor, Extractor, RuleMatcher};
pub use name::Command;
pub use params::{Params, ResolvedCommand};
pub use registry::{ActionFn, CommandRegistry};
pub use rules::{default_rules, DEFAULT_SCROLL_AMOUNT};
pub use shortcuts::{KeyChord, Modifiers, ShortcutMap};
