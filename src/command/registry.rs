use std::collections::HashMap;

use tracing::debug;

use super::actions::{self, ActionContext, ActionOutcome};
use super::error::ActionError;
use super::name::Command;
use super::params::{Params, ResolvedCommand};

pub type ActionFn = fn(&mut ActionContext<'_>, &Params) -> Result<ActionOutcome, ActionError>;

/// Command name to executable action.
#[derive(Clone)]
pub struct CommandRegistry {
    actions: HashMap<Command, ActionFn>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_default_actions()
    }
}

impl CommandRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_default_actions() -> Self {
        let mut registry = Self::empty();
        let table: [(Command, ActionFn); 34] = [
            (Command::ScrollDown, actions::scroll_down),
            (Command::ScrollUp, actions::scroll_up),
            (Command::ScrollTop, actions::scroll_top),
            (Command::ScrollBottom, actions::scroll_bottom),
            (Command::GoBack, actions::go_back),
            (Command::GoForward, actions::go_forward),
            (Command::Reload, actions::reload),
            (Command::StartScreenReader, actions::start_screen_reader),
            (Command::StopScreenReader, actions::stop_screen_reader),
            (Command::ToggleScreenReader, actions::toggle_screen_reader),
            (Command::ReadPage, actions::read_page),
            (Command::NextElement, actions::next_element),
            (Command::PreviousElement, actions::previous_element),
            (Command::StopReading, actions::stop_reading),
            (Command::RescanPage, actions::rescan_page),
            (Command::ToggleHighContrast, actions::toggle_high_contrast),
            (Command::ToggleLargeText, actions::toggle_large_text),
            (Command::ToggleReadingGuide, actions::toggle_reading_guide),
            (Command::ToggleDyslexiaFont, actions::toggle_dyslexia_font),
            (Command::EnableFeature, actions::enable_feature),
            (Command::DisableFeature, actions::disable_feature),
            (Command::ClickButton, actions::click_button),
            (Command::ClickLink, actions::click_link),
            (Command::Click, actions::click),
            (Command::FillField, actions::fill_field),
            (Command::FocusField, actions::focus_field),
            (Command::TypeText, actions::type_text),
            (Command::SubmitForm, actions::submit_form),
            (Command::SelectElement, actions::select_element),
            (Command::SummarizePage, actions::summarize_page),
            (Command::DescribeImage, actions::describe_image),
            (Command::StopListening, actions::stop_listening),
            (Command::ToggleListening, actions::toggle_listening),
            (Command::Help, actions::help),
        ];
        for (command, action) in table {
            registry.register(command, action);
        }
        registry
    }

    /// Install or replace the action for `command`, returning the previous one.
    pub fn register(&mut self, command: Command, action: ActionFn) -> Option<ActionFn> {
        self.actions.insert(command, action)
    }

    #[must_use]
    pub fn contains(&self, command: Command) -> bool {
        self.actions.contains_key(&command)
    }

    pub fn execute(
        &self,
        ctx: &mut ActionContext<'_>,
        resolved: &ResolvedCommand,
    ) -> Result<ActionOutcome, ActionError> {
        let action = self
            .actions
            .get(&resolved.command)
            .ok_or(ActionError::Unregistered(resolved.command))?;
        debug!(command = %resolved.command, "executing command");
        action(ctx, &resolved.params)
    }
}
