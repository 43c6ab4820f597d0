//! Built-in command actions and the context they run against.

use tracing::{debug, warn};

use crate::dom::{
    ancestors, resolve, resolve_field, role_of, CandidateRole, Document, NodeId, Page, Role,
};
use crate::features::{ActiveFeatureSet, FeatureChange, FeatureHooks, FeatureId, Transition};
use crate::reader::ScreenReader;
use crate::remote::{RelayRequest, RemoteServices};
use crate::speech::Speaker;
use crate::voice::RecognitionFrontEnd;

use super::error::ActionError;
use super::params::Params;
use super::rules::DEFAULT_SCROLL_AMOUNT;

const MAX_SUMMARY_CHARS: usize = 20_000;

const HELP_TEXT: &str = "You can say: scroll down, go back, read page, next, previous, \
click followed by a name, type followed by text, or turn on a feature like high contrast.";

/// Everything an action may touch, borrowed from the session for one command.
pub struct ActionContext<'a> {
    pub page: &'a mut dyn Page,
    pub reader: &'a mut ScreenReader,
    pub speaker: &'a mut Speaker,
    pub features: &'a mut ActiveFeatureSet,
    pub recognition: &'a mut RecognitionFrontEnd,
    pub hooks: &'a mut dyn FeatureHooks,
    pub remote: &'a mut dyn RemoteServices,
}

impl ActionContext<'_> {
    /// Run one feature transition through the state machine with its side effect.
    pub fn set_feature(
        &mut self,
        id: FeatureId,
        transition: Transition,
    ) -> Result<FeatureChange, ActionError> {
        let ActionContext {
            page,
            reader,
            speaker,
            features,
            recognition,
            hooks,
            ..
        } = self;
        features.apply::<ActionError>(id, transition, |id, enable| match id {
            FeatureId::ScreenReader => {
                if enable {
                    reader.scan_page(&**page);
                } else {
                    reader.reset(&mut **page, &mut **speaker);
                }
                Ok(())
            }
            FeatureId::Speech => {
                if enable {
                    recognition.start()?;
                } else {
                    recognition.stop();
                }
                Ok(())
            }
            other => hooks
                .apply(other, enable)
                .map_err(|reason| ActionError::Feature {
                    feature: other.display_name().to_string(),
                    reason,
                }),
        })
    }

    /// Run a reader step with the screen reader switched on. When the step
    /// fails, a reader this call switched on is switched back off.
    fn with_reader(
        &mut self,
        step: impl FnOnce(&mut Self) -> Result<(), ActionError>,
    ) -> Result<FeatureChange, ActionError> {
        let change = self.set_feature(FeatureId::ScreenReader, Transition::Start)?;
        if let Err(err) = step(self) {
            if change.changed {
                if let Err(undo) = self.set_feature(FeatureId::ScreenReader, Transition::Stop) {
                    warn!(%undo, "screen reader rollback failed");
                }
            }
            return Err(err);
        }
        Ok(change)
    }

    fn current_spoken(&self) -> String {
        self.reader
            .current()
            .map(|element| element.spoken.clone())
            .unwrap_or_default()
    }
}

/// Result of a successful action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub message: String,
    /// Set when the action ran a feature transition.
    pub feature: Option<FeatureChange>,
}

impl ActionOutcome {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            feature: None,
        }
    }

    #[must_use]
    pub fn feature(change: FeatureChange) -> Self {
        let state = if change.enabled { "on" } else { "off" };
        let message = if change.changed {
            format!("{} {state}", change.feature)
        } else {
            format!("{} already {state}", change.feature)
        };
        Self {
            message,
            feature: Some(change),
        }
    }
}

type ActionResult = Result<ActionOutcome, ActionError>;

fn clamp_pixels(amount: u64) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}

pub(crate) fn scroll_down(ctx: &mut ActionContext<'_>, params: &Params) -> ActionResult {
    let amount = params.number_or("amount", DEFAULT_SCROLL_AMOUNT)?;
    ctx.page.scroll_by(clamp_pixels(amount));
    Ok(ActionOutcome::message(format!("Scrolled down {amount} pixels")))
}

pub(crate) fn scroll_up(ctx: &mut ActionContext<'_>, params: &Params) -> ActionResult {
    let amount = params.number_or("amount", DEFAULT_SCROLL_AMOUNT)?;
    ctx.page.scroll_by(-clamp_pixels(amount));
    Ok(ActionOutcome::message(format!("Scrolled up {amount} pixels")))
}

pub(crate) fn scroll_top(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    ctx.page.scroll_to_top();
    Ok(ActionOutcome::message("Scrolled to top"))
}

pub(crate) fn scroll_bottom(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    ctx.page.scroll_to_bottom();
    Ok(ActionOutcome::message("Scrolled to bottom"))
}

pub(crate) fn go_back(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    ctx.page.history_back();
    Ok(ActionOutcome::message("Went back"))
}

pub(crate) fn go_forward(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    ctx.page.history_forward();
    Ok(ActionOutcome::message("Went forward"))
}

pub(crate) fn reload(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    ctx.page.reload();
    Ok(ActionOutcome::message("Reloading page"))
}

fn announce_reader(ctx: &mut ActionContext<'_>, change: FeatureChange) {
    if change.changed && change.enabled {
        let count = ctx.reader.elements().len();
        ctx.speaker
            .say(&format!("Screen reader on. {count} items found."));
    }
}

pub(crate) fn start_screen_reader(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    let change = ctx.set_feature(FeatureId::ScreenReader, Transition::Start)?;
    announce_reader(ctx, change);
    Ok(ActionOutcome::feature(change))
}

pub(crate) fn stop_screen_reader(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    let change = ctx.set_feature(FeatureId::ScreenReader, Transition::Stop)?;
    Ok(ActionOutcome::feature(change))
}

pub(crate) fn toggle_screen_reader(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    let change = ctx.set_feature(FeatureId::ScreenReader, Transition::Toggle)?;
    announce_reader(ctx, change);
    Ok(ActionOutcome::feature(change))
}

pub(crate) fn read_page(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    let change = ctx.with_reader(|ctx| {
        if ctx.reader.read_page(&mut *ctx.page, &mut *ctx.speaker) {
            Ok(())
        } else {
            Err(ActionError::NothingToRead)
        }
    })?;
    Ok(reader_outcome(change, format!("Reading: {}", ctx.current_spoken())))
}

/// Carries the reader's switch-on, if the step caused one, next to `message`.
fn reader_outcome(change: FeatureChange, message: String) -> ActionOutcome {
    ActionOutcome {
        message,
        feature: change.changed.then_some(change),
    }
}

pub(crate) fn next_element(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    let change = ctx.with_reader(|ctx| {
        if ctx.reader.next(&mut *ctx.page, &mut *ctx.speaker) {
            Ok(())
        } else {
            Err(ActionError::NothingToRead)
        }
    })?;
    Ok(reader_outcome(change, ctx.current_spoken()))
}

pub(crate) fn previous_element(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    let change = ctx.with_reader(|ctx| {
        if ctx.reader.previous(&mut *ctx.page, &mut *ctx.speaker) {
            Ok(())
        } else {
            Err(ActionError::NothingToRead)
        }
    })?;
    Ok(reader_outcome(change, ctx.current_spoken()))
}

pub(crate) fn select_element(ctx: &mut ActionContext<'_>, params: &Params) -> ActionResult {
    let raw = params.require("index")?;
    let position = usize::try_from(params.number_or("index", 0)?).unwrap_or(usize::MAX);
    let change = ctx.with_reader(|ctx| {
        if ctx.reader.select(&mut *ctx.page, &mut *ctx.speaker, position) {
            Ok(())
        } else {
            Err(ActionError::InvalidParam {
                key: "index",
                value: raw.to_string(),
            })
        }
    })?;
    Ok(reader_outcome(change, ctx.current_spoken()))
}

pub(crate) fn stop_reading(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    ctx.reader.stop(&mut *ctx.page, &mut *ctx.speaker);
    Ok(ActionOutcome::message("Stopped reading"))
}

pub(crate) fn rescan_page(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    let count = ctx.reader.scan_page(&*ctx.page);
    Ok(ActionOutcome::message(format!("Found {count} items")))
}

fn feature_action(ctx: &mut ActionContext<'_>, id: FeatureId, transition: Transition) -> ActionResult {
    ctx.set_feature(id, transition).map(ActionOutcome::feature)
}

pub(crate) fn toggle_high_contrast(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    feature_action(ctx, FeatureId::HighContrast, Transition::Toggle)
}

pub(crate) fn toggle_large_text(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    feature_action(ctx, FeatureId::LargeText, Transition::Toggle)
}

pub(crate) fn toggle_reading_guide(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    feature_action(ctx, FeatureId::ReadingGuide, Transition::Toggle)
}

pub(crate) fn toggle_dyslexia_font(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    feature_action(ctx, FeatureId::DyslexiaFont, Transition::Toggle)
}

fn feature_param(params: &Params) -> Result<FeatureId, ActionError> {
    let raw = params.require("feature")?;
    FeatureId::parse_name(raw).ok_or_else(|| ActionError::UnknownFeature(raw.to_string()))
}

pub(crate) fn enable_feature(ctx: &mut ActionContext<'_>, params: &Params) -> ActionResult {
    let id = feature_param(params)?;
    feature_action(ctx, id, Transition::Start)
}

pub(crate) fn disable_feature(ctx: &mut ActionContext<'_>, params: &Params) -> ActionResult {
    let id = feature_param(params)?;
    feature_action(ctx, id, Transition::Stop)
}

pub(crate) fn stop_listening(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    feature_action(ctx, FeatureId::Speech, Transition::Stop)
}

pub(crate) fn toggle_listening(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    feature_action(ctx, FeatureId::Speech, Transition::Toggle)
}

fn click_target(
    ctx: &mut ActionContext<'_>,
    params: &Params,
    candidate: CandidateRole,
    role: &'static str,
) -> ActionResult {
    let phrase = params.require("text")?;
    let node = resolve(&*ctx.page, phrase, candidate).ok_or_else(|| {
        ActionError::TargetNotFound {
            role,
            phrase: phrase.to_string(),
        }
    })?;
    debug!(node = node.0, role, "clicking resolved target");
    ctx.page.click(node);
    Ok(ActionOutcome::message(format!("Clicked {phrase}")))
}

pub(crate) fn click_button(ctx: &mut ActionContext<'_>, params: &Params) -> ActionResult {
    click_target(ctx, params, CandidateRole::Button, "button")
}

pub(crate) fn click_link(ctx: &mut ActionContext<'_>, params: &Params) -> ActionResult {
    click_target(ctx, params, CandidateRole::Link, "link")
}

pub(crate) fn click(ctx: &mut ActionContext<'_>, params: &Params) -> ActionResult {
    click_target(ctx, params, CandidateRole::Interactive, "element")
}

fn find_field(ctx: &ActionContext<'_>, phrase: &str) -> Result<NodeId, ActionError> {
    resolve_field(&*ctx.page, phrase).ok_or_else(|| ActionError::FieldNotFound(phrase.to_string()))
}

pub(crate) fn fill_field(ctx: &mut ActionContext<'_>, params: &Params) -> ActionResult {
    let field = params.require("field")?;
    let value = params.require("value")?;
    let node = find_field(ctx, field)?;
    ctx.page.focus(node);
    ctx.page.set_value(node, value);
    Ok(ActionOutcome::message(format!("Typed \"{value}\" into {field}")))
}

pub(crate) fn focus_field(ctx: &mut ActionContext<'_>, params: &Params) -> ActionResult {
    let field = params.require("field")?;
    let node = find_field(ctx, field)?;
    ctx.page.focus(node);
    Ok(ActionOutcome::message(format!("Focused {field}")))
}

pub(crate) fn type_text(ctx: &mut ActionContext<'_>, params: &Params) -> ActionResult {
    let value = params.require("value")?;
    let node = ctx
        .page
        .focused()
        .filter(|node| matches!(role_of(&*ctx.page, *node), Role::TextField | Role::TextArea))
        .ok_or(ActionError::NoFocusedField)?;
    let combined = match ctx.page.attribute(node, "value").map(str::trim_end) {
        Some(existing) if !existing.is_empty() => format!("{existing} {value}"),
        _ => value.to_string(),
    };
    ctx.page.set_value(node, &combined);
    Ok(ActionOutcome::message(format!("Typed \"{value}\"")))
}

pub(crate) fn submit_form(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    let page = &*ctx.page;
    let from_focus = page.focused().and_then(|node| {
        std::iter::once(node)
            .chain(ancestors(page, node))
            .find(|candidate| page.tag_name(*candidate) == "form")
    });
    let form = from_focus
        .or_else(|| {
            page.query_tags(&["form"])
                .into_iter()
                .find(|node| !page.is_hidden(*node))
        })
        .ok_or(ActionError::NoForm)?;
    ctx.page.submit(form);
    Ok(ActionOutcome::message("Submitted form"))
}

fn page_title(page: &dyn Page) -> Option<String> {
    page.query_tags(&["title", "h1"])
        .into_iter()
        .map(|node| page.text_content(node))
        .find(|text| !text.is_empty())
}

pub(crate) fn summarize_page(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    let page = &*ctx.page;
    let root = page
        .query_tags(&["body"])
        .into_iter()
        .next()
        .or_else(|| page.elements().into_iter().next());
    let text: String = root
        .map(|node| page.text_content(node))
        .unwrap_or_default()
        .chars()
        .take(MAX_SUMMARY_CHARS)
        .collect();
    if text.is_empty() {
        return Err(ActionError::NothingToRead);
    }
    let request = RelayRequest::Summarize {
        title: page_title(page),
        text,
    };
    ctx.remote.relay(request)?;
    Ok(ActionOutcome::message("Summarizing page"))
}

fn find_image(ctx: &ActionContext<'_>, phrase: Option<&str>) -> Option<NodeId> {
    let page = &*ctx.page;
    let images: Vec<NodeId> = page
        .query_tags(&["img"])
        .into_iter()
        .filter(|node| !page.is_hidden(*node))
        .collect();
    if let Some(phrase) = phrase {
        let needle = phrase.to_lowercase();
        return images.into_iter().find(|node| {
            ["alt", "title", "aria-label"].iter().any(|attr| {
                page.attribute(*node, attr)
                    .is_some_and(|value| value.to_lowercase().contains(&needle))
            })
        });
    }
    ctx.reader
        .current()
        .filter(|element| element.role == Role::Image)
        .map(|element| element.node)
        .or_else(|| images.into_iter().next())
}

pub(crate) fn describe_image(ctx: &mut ActionContext<'_>, params: &Params) -> ActionResult {
    let node = find_image(ctx, params.get("text")).ok_or(ActionError::NoImage)?;
    let request = RelayRequest::DescribeImage {
        src: ctx.page.attribute(node, "src").map(str::to_string),
        alt: ctx.page.attribute(node, "alt").map(str::to_string),
    };
    ctx.remote.relay(request)?;
    Ok(ActionOutcome::message("Describing image"))
}

pub(crate) fn help(ctx: &mut ActionContext<'_>, _params: &Params) -> ActionResult {
    ctx.speaker.say(HELP_TEXT);
    Ok(ActionOutcome::message(HELP_TEXT))
}
