use std::fmt;

use serde::{Deserialize, Serialize};

use crate::features::{FeatureId, Transition};

/// Every command the grammar, shortcuts, or remote interpreter can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    ScrollDown,
    ScrollUp,
    ScrollTop,
    ScrollBottom,
    GoBack,
    GoForward,
    Reload,
    StartScreenReader,
    StopScreenReader,
    ToggleScreenReader,
    ReadPage,
    NextElement,
    PreviousElement,
    StopReading,
    RescanPage,
    ToggleHighContrast,
    ToggleLargeText,
    ToggleReadingGuide,
    ToggleDyslexiaFont,
    EnableFeature,
    DisableFeature,
    ClickButton,
    ClickLink,
    Click,
    FillField,
    FocusField,
    TypeText,
    SubmitForm,
    SelectElement,
    SummarizePage,
    DescribeImage,
    StopListening,
    ToggleListening,
    Help,
}

impl Command {
    pub const ALL: [Command; 34] = [
        Command::ScrollDown,
        Command::ScrollUp,
        Command::ScrollTop,
        Command::ScrollBottom,
        Command::GoBack,
        Command::GoForward,
        Command::Reload,
        Command::StartScreenReader,
        Command::StopScreenReader,
        Command::ToggleScreenReader,
        Command::ReadPage,
        Command::NextElement,
        Command::PreviousElement,
        Command::StopReading,
        Command::RescanPage,
        Command::ToggleHighContrast,
        Command::ToggleLargeText,
        Command::ToggleReadingGuide,
        Command::ToggleDyslexiaFont,
        Command::EnableFeature,
        Command::DisableFeature,
        Command::ClickButton,
        Command::ClickLink,
        Command::Click,
        Command::FillField,
        Command::FocusField,
        Command::TypeText,
        Command::SubmitForm,
        Command::SelectElement,
        Command::SummarizePage,
        Command::DescribeImage,
        Command::StopListening,
        Command::ToggleListening,
        Command::Help,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Command::ScrollDown => "scroll_down",
            Command::ScrollUp => "scroll_up",
            Command::ScrollTop => "scroll_top",
            Command::ScrollBottom => "scroll_bottom",
            Command::GoBack => "go_back",
            Command::GoForward => "go_forward",
            Command::Reload => "reload",
            Command::StartScreenReader => "start_screen_reader",
            Command::StopScreenReader => "stop_screen_reader",
            Command::ToggleScreenReader => "toggle_screen_reader",
            Command::ReadPage => "read_page",
            Command::NextElement => "next_element",
            Command::PreviousElement => "previous_element",
            Command::StopReading => "stop_reading",
            Command::RescanPage => "rescan_page",
            Command::ToggleHighContrast => "toggle_high_contrast",
            Command::ToggleLargeText => "toggle_large_text",
            Command::ToggleReadingGuide => "toggle_reading_guide",
            Command::ToggleDyslexiaFont => "toggle_dyslexia_font",
            Command::EnableFeature => "enable_feature",
            Command::DisableFeature => "disable_feature",
            Command::ClickButton => "click_button",
            Command::ClickLink => "click_link",
            Command::Click => "click",
            Command::FillField => "fill_field",
            Command::FocusField => "focus_field",
            Command::TypeText => "type_text",
            Command::SubmitForm => "submit_form",
            Command::SelectElement => "select_element",
            Command::SummarizePage => "summarize_page",
            Command::DescribeImage => "describe_image",
            Command::StopListening => "stop_listening",
            Command::ToggleListening => "toggle_listening",
            Command::Help => "help",
        }
    }

    /// Accept snake case or the upper-case message form (`TOGGLE_HIGH_CONTRAST`).
    #[must_use]
    pub fn parse_name(raw: &str) -> Option<Self> {
        let wanted = raw.trim().replace('-', "_").to_ascii_lowercase();
        Self::ALL.into_iter().find(|command| command.as_str() == wanted)
    }

    /// Fixed feature transition for start/stop/toggle commands.
    ///
    /// `enable_feature`/`disable_feature` carry their feature as a parameter and
    /// are not covered here.
    #[must_use]
    pub fn fixed_transition(self) -> Option<(FeatureId, Transition)> {
        let pair = match self {
            Command::StartScreenReader => (FeatureId::ScreenReader, Transition::Start),
            Command::StopScreenReader => (FeatureId::ScreenReader, Transition::Stop),
            Command::ToggleScreenReader => (FeatureId::ScreenReader, Transition::Toggle),
            Command::ToggleHighContrast => (FeatureId::HighContrast, Transition::Toggle),
            Command::ToggleLargeText => (FeatureId::LargeText, Transition::Toggle),
            Command::ToggleReadingGuide => (FeatureId::ReadingGuide, Transition::Toggle),
            Command::ToggleDyslexiaFont => (FeatureId::DyslexiaFont, Transition::Toggle),
            Command::StopListening => (FeatureId::Speech, Transition::Stop),
            Command::ToggleListening => (FeatureId::Speech, Transition::Toggle),
            _ => return None,
        };
        Some(pair)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
