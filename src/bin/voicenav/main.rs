//! VoiceNav host entrypoint: one page session per process over JSON lines.
//!
//! - Stdin reader thread: parses client messages into session events
//! - Main thread: runs the session event loop and writes host messages to stdout
//!
//! Recognition, synthesis and presentation effects all run in the host page;
//! this process owns the grammar, the feature state and the reading cursor.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{bounded, unbounded};
use tracing::{info, warn};

use voicenav::command::custom_rules;
use voicenav::config::AppConfig;
use voicenav::dom::{ElementSpec, MemoryDocument, MemoryPage};
use voicenav::ipc::{
    new_session_id, spawn_reader, ChannelRemote, HostFeatureHooks, HostFeedback, HostMessage,
    HostSpeechToText, HostSynthesizer, MessageSink, StdoutSink,
};
use voicenav::prefs::Preferences;
use voicenav::session::{run_event_loop, Session, SessionParts, SESSION_QUEUE_CAPACITY};
use voicenav::{telemetry, Transition};

fn load_document(path: Option<&Path>) -> Result<MemoryDocument> {
    let Some(path) = path else {
        return Ok(MemoryDocument::from_spec(ElementSpec::new("body")));
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read document {}", path.display()))?;
    MemoryDocument::from_json(&raw)
        .with_context(|| format!("invalid document snapshot {}", path.display()))
}

fn flush_page_actions(session: &mut Session<MemoryPage>, sink: &impl MessageSink) {
    for action in session.page_mut().take_actions() {
        sink.send(&HostMessage::PageAction { action });
    }
}

fn main() -> Result<()> {
    let config = AppConfig::parse();
    if let Some(path) = telemetry::init_tracing(&config) {
        info!(path = %path.display(), "trace logging enabled");
    }

    // Persisted preferences fill whatever the CLI left unset.
    let prefs = config.merged_prefs(&Preferences::load());
    if config.save_prefs {
        match prefs.save() {
            Ok(path) => info!(path = %path.display(), "preferences updated"),
            Err(err) => warn!(%err, "preferences not saved"),
        }
    }
    let settings = config.session_settings(&prefs);
    let document = load_document(config.document.as_deref())?;

    let sink = StdoutSink;
    let speech_input = !config.no_speech_input;
    let (reply_tx, reply_rx) = unbounded();
    let parts = SessionParts {
        page: MemoryPage::new(document),
        engine: Box::new(HostSpeechToText::new(
            sink,
            speech_input,
            &settings.speech.lang,
            settings.recognition.continuous,
        )),
        synthesizer: Box::new(HostSynthesizer::new(sink)),
        hooks: Box::new(HostFeatureHooks::new(sink)),
        remote: Box::new(ChannelRemote::new(sink, reply_rx, prefs.remote.timeout())),
        feedback: Box::new(HostFeedback::new(sink)),
    };
    let mut session = Session::new(parts, settings);
    if let Some(path) = config.rules.as_deref() {
        for rule in custom_rules::load_from_path(path) {
            session.register_rule(rule);
        }
    }

    sink.send(&HostMessage::Ready {
        session_id: new_session_id(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        rules: session.grammar().len(),
        speech_input,
    });

    for id in &prefs.features.enabled {
        session.apply_feature(*id, Transition::Start);
    }
    if prefs.recognition.auto_start {
        session.start_listening();
    }
    flush_page_actions(&mut session, &sink);

    let (event_tx, event_rx) = bounded(SESSION_QUEUE_CAPACITY);
    // Not joined: the reader stays blocked on stdin after a `shutdown` command.
    let _reader = spawn_reader(io::BufReader::new(io::stdin()), event_tx, reply_tx, sink);
    run_event_loop(&mut session, &event_rx, |session| {
        flush_page_actions(session, &sink);
    });

    info!("voicenav exiting");
    Ok(())
}
