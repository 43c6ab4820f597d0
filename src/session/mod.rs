//! One page's voice-control session.
//!
//! `Session` owns every piece of per-page mutable state (grammar, registry,
//! feature set, traversal cursor, recognition lifecycle) and handles events
//! strictly one at a time. Nothing here is global: tearing the session down
//! with [`Session::cleanup`] returns the page to its initial state.

mod event_loop;

use std::convert::Infallible;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::command::{
    ActionContext, ActionError, ActionFn, ActionOutcome, Command, CommandGrammar, CommandRegistry,
    CommandRule, ResolvedCommand, ShortcutMap,
};
use crate::dom::{MemoryDocument, Page, SnapshotPage};
use crate::features::{ActiveFeatureSet, FeatureHooks, FeatureId, Transition};
use crate::feedback::{Feedback, FeedbackSink};
use crate::reader::ScreenReader;
use crate::remote::RemoteServices;
use crate::speech::{Speaker, SpeechParams, SpeechSynthesizer};
use crate::voice::{
    RecognitionError, RecognitionEvent, RecognitionFrontEnd, RecognitionOutput,
    RecognitionSettings, SpeechToText,
};

pub use event_loop::{run_event_loop, SESSION_QUEUE_CAPACITY};

/// Everything that can happen to a session, in arrival order.
#[derive(Debug)]
pub enum SessionEvent {
    Recognition(RecognitionEvent),
    /// Named command from a panel button or remote message.
    Command(ResolvedCommand),
    Feature {
        id: FeatureId,
        transition: Transition,
    },
    Shortcut(String),
    /// Fresh snapshot after the host mutated the DOM.
    Document(MemoryDocument),
    RegisterRule(CommandRule),
    Shutdown,
}

/// Collaborators the session drives. Owned for the life of the session.
pub struct SessionParts<P> {
    pub page: P,
    pub engine: Box<dyn SpeechToText>,
    pub synthesizer: Box<dyn SpeechSynthesizer>,
    pub hooks: Box<dyn FeatureHooks>,
    pub remote: Box<dyn RemoteServices>,
    pub feedback: Box<dyn FeedbackSink>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    pub recognition: RecognitionSettings,
    pub speech: SpeechParams,
    pub command_prefix: Option<String>,
    /// Allow transcript text in trace logs.
    pub log_content: bool,
}

pub struct Session<P: Page> {
    page: P,
    grammar: CommandGrammar,
    registry: CommandRegistry,
    shortcuts: ShortcutMap,
    features: ActiveFeatureSet,
    reader: ScreenReader,
    recognition: RecognitionFrontEnd,
    speaker: Speaker,
    hooks: Box<dyn FeatureHooks>,
    remote: Box<dyn RemoteServices>,
    feedback: Box<dyn FeedbackSink>,
    log_content: bool,
}

impl<P: Page> Session<P> {
    #[must_use]
    pub fn new(parts: SessionParts<P>, settings: SessionSettings) -> Self {
        let grammar =
            CommandGrammar::with_default_rules().with_prefix(settings.command_prefix.as_deref());
        info!(
            rules = grammar.len(),
            prefix = grammar.prefix().unwrap_or(""),
            "session created"
        );
        Self {
            page: parts.page,
            grammar,
            registry: CommandRegistry::with_default_actions(),
            shortcuts: ShortcutMap::default(),
            features: ActiveFeatureSet::new(),
            reader: ScreenReader::new(),
            recognition: RecognitionFrontEnd::new(parts.engine, settings.recognition),
            speaker: Speaker::new(parts.synthesizer, settings.speech.clamped()),
            hooks: parts.hooks,
            remote: parts.remote,
            feedback: parts.feedback,
            log_content: settings.log_content,
        }
    }

    #[must_use]
    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    #[must_use]
    pub fn grammar(&self) -> &CommandGrammar {
        &self.grammar
    }

    #[must_use]
    pub fn features(&self) -> &ActiveFeatureSet {
        &self.features
    }

    #[must_use]
    pub fn reader(&self) -> &ScreenReader {
        &self.reader
    }

    #[must_use]
    pub fn recognition(&self) -> &RecognitionFrontEnd {
        &self.recognition
    }

    pub fn shortcuts_mut(&mut self) -> &mut ShortcutMap {
        &mut self.shortcuts
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.features.is_active(FeatureId::Speech)
    }

    /// Deadline of the next timer the event loop must wake for.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.recognition.next_deadline()
    }

    /// Append a rule after every built-in and previously registered rule.
    pub fn register_rule(&mut self, rule: CommandRule) {
        self.grammar.push_rule(rule);
    }

    pub fn register_action(&mut self, command: Command, action: ActionFn) -> Option<ActionFn> {
        self.registry.register(command, action)
    }

    pub fn start_listening(&mut self) {
        self.apply_feature(FeatureId::Speech, Transition::Start);
    }

    pub fn stop_listening(&mut self) {
        self.apply_feature(FeatureId::Speech, Transition::Stop);
    }

    pub fn handle_recognition(&mut self, event: RecognitionEvent, now: Instant) {
        match self.recognition.handle(event, now) {
            RecognitionOutput::Ignored | RecognitionOutput::RestartScheduled => {}
            RecognitionOutput::Restarted => debug!("recognition restarted"),
            RecognitionOutput::Interim(text) => self.publish(Feedback::Interim { text }),
            RecognitionOutput::LowConfidence { text, confidence } => {
                debug!(confidence, "utterance below sensitivity");
                self.publish(Feedback::LowConfidence { text, confidence });
            }
            RecognitionOutput::Accepted(text) => {
                self.publish(Feedback::Heard { text: text.clone() });
                self.dispatch_text(&text);
            }
            RecognitionOutput::Ended => self.speech_ended(),
            RecognitionOutput::PermissionDenied => {
                self.speech_ended();
                self.publish(Feedback::PermissionDenied);
            }
        }
    }

    /// Fire due timers. Only the recognition auto-restart is timed.
    pub fn poll_timers(&mut self, now: Instant) {
        if self.recognition.poll(now) == RecognitionOutput::Ended {
            self.speech_ended();
        }
    }

    /// Grammar first, then the remote interpreter, then "not recognized".
    pub fn dispatch_text(&mut self, text: &str) {
        if self.log_content {
            debug!(text, "dispatching utterance");
        }
        if !self.grammar.is_addressed(text) {
            debug!("utterance without command prefix ignored");
            return;
        }
        if let Some((index, resolved)) = self.grammar.match_indexed(text) {
            debug!(rule = index, command = %resolved.command, "grammar match");
            self.run_command(&resolved);
            return;
        }
        match self.remote.interpret(text) {
            Some(resolved) => {
                debug!(command = %resolved.command, "remote interpretation");
                self.run_command(&resolved);
            }
            None => self.publish(Feedback::NotRecognized {
                text: text.to_string(),
            }),
        }
    }

    pub fn run_command(&mut self, resolved: &ResolvedCommand) {
        let mut ctx = ActionContext {
            page: &mut self.page,
            reader: &mut self.reader,
            speaker: &mut self.speaker,
            features: &mut self.features,
            recognition: &mut self.recognition,
            hooks: self.hooks.as_mut(),
            remote: self.remote.as_mut(),
        };
        let result = self.registry.execute(&mut ctx, resolved);
        self.report(resolved.command.as_str(), result);
    }

    /// Panel, remote, or shortcut toggle. Screen-reader transitions go through
    /// their commands so they announce the same way voice does.
    pub fn apply_feature(&mut self, id: FeatureId, transition: Transition) {
        if id == FeatureId::ScreenReader {
            let command = match transition {
                Transition::Toggle => Command::ToggleScreenReader,
                Transition::Start => Command::StartScreenReader,
                Transition::Stop => Command::StopScreenReader,
            };
            self.run_command(&ResolvedCommand::bare(command));
            return;
        }
        let mut ctx = ActionContext {
            page: &mut self.page,
            reader: &mut self.reader,
            speaker: &mut self.speaker,
            features: &mut self.features,
            recognition: &mut self.recognition,
            hooks: self.hooks.as_mut(),
            remote: self.remote.as_mut(),
        };
        let result = ctx.set_feature(id, transition).map(ActionOutcome::feature);
        self.report(id.as_str(), result);
    }

    pub fn handle_shortcut(&mut self, keys: &str) {
        match self.shortcuts.lookup_str(keys) {
            Some(command) => self.run_command(&ResolvedCommand::bare(command)),
            None => debug!(keys, "unbound shortcut"),
        }
    }

    /// Cancel timers, stop recognition, and forget every feature and cursor.
    pub fn cleanup(&mut self) {
        self.recognition.stop();
        self.reader.reset(&mut self.page, &mut self.speaker);
        let presentation: Vec<FeatureId> = self
            .features
            .iter()
            .filter(|id| !matches!(id, FeatureId::ScreenReader | FeatureId::Speech))
            .collect();
        for id in presentation {
            if let Err(reason) = self.hooks.apply(id, false) {
                warn!(feature = %id, reason, "feature teardown failed");
            }
        }
        self.features.clear();
        self.speaker.silence();
        info!("session cleaned up");
    }

    fn speech_ended(&mut self) {
        self.recognition.stop();
        let change = self
            .features
            .apply(FeatureId::Speech, Transition::Stop, |_, _| {
                Ok::<(), Infallible>(())
            });
        if matches!(change, Ok(change) if change.changed) {
            self.publish(Feedback::Stopped);
        }
    }

    fn report(&mut self, command: &str, result: Result<ActionOutcome, ActionError>) {
        match result {
            Ok(ActionOutcome {
                feature: Some(change),
                ..
            }) if change.changed => {
                debug!(command, feature = %change.feature, enabled = change.enabled, "feature changed");
                let feedback = match (change.feature, change.enabled) {
                    (FeatureId::Speech, true) => Feedback::Listening,
                    (FeatureId::Speech, false) => Feedback::Stopped,
                    (feature, enabled) => Feedback::FeatureChanged { feature, enabled },
                };
                self.publish(feedback);
            }
            Ok(outcome) => self.publish(Feedback::Executed {
                command: command.to_string(),
                message: outcome.message,
            }),
            Err(ActionError::Recognition(RecognitionError::Unavailable)) => {
                if self.recognition.take_unavailable_notice() {
                    self.publish(Feedback::Unavailable);
                }
            }
            Err(ActionError::Recognition(RecognitionError::PermissionDenied)) => {
                self.publish(Feedback::PermissionDenied);
            }
            Err(err) => {
                warn!(command, %err, "command failed");
                self.publish(Feedback::Failed {
                    command: command.to_string(),
                    reason: err.to_string(),
                });
            }
        }
    }

    fn publish(&mut self, feedback: Feedback) {
        self.feedback.publish(feedback);
    }
}

impl<P: SnapshotPage> Session<P> {
    /// Handle one event. Returns `false` once the session has shut down.
    pub fn handle(&mut self, event: SessionEvent, now: Instant) -> bool {
        match event {
            SessionEvent::Recognition(event) => self.handle_recognition(event, now),
            SessionEvent::Command(resolved) => self.run_command(&resolved),
            SessionEvent::Feature { id, transition } => self.apply_feature(id, transition),
            SessionEvent::Shortcut(keys) => self.handle_shortcut(&keys),
            SessionEvent::Document(doc) => self.replace_document(doc),
            SessionEvent::RegisterRule(rule) => self.register_rule(rule),
            SessionEvent::Shutdown => {
                self.cleanup();
                return false;
            }
        }
        true
    }

    /// Swap the page snapshot. Node ids from the old snapshot are
    /// meaningless afterwards, so an active reader rescans immediately.
    pub fn replace_document(&mut self, doc: MemoryDocument) {
        let reading = self.features.is_active(FeatureId::ScreenReader);
        if reading {
            self.reader.stop(&mut self.page, &mut self.speaker);
        }
        self.page.load_snapshot(doc);
        if reading {
            let count = self.reader.scan_page(&self.page);
            debug!(count, "page rescanned after snapshot");
        }
    }
}
