//! Integration tests that drive the main binary over its JSON-lines channel.

use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

fn scratch_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time should be after epoch")
        .as_nanos();
    let dir = env::temp_dir().join(format!("voicenav-bin-{name}-{nanos}"));
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

const START: &str = r#"{"cmd":"start_listening"}"#;

const PAGE: &str = r#"{
  "tag": "body",
  "children": [
    {"tag": "h1", "text": "Welcome", "top": 0},
    {"tag": "a", "attrs": {"href": "/feedback"}, "text": "Submit feedback", "top": 10},
    {"tag": "button", "text": "Submit", "top": 20}
  ]
}"#;

/// Run the binary with `input` on stdin and return every stdout message.
fn run_session(name: &str, args: &[&str], input: &[&str]) -> Vec<Value> {
    let dir = scratch_dir(name);
    let document = dir.join("page.json");
    fs::write(&document, PAGE).expect("write document");

    let mut child = Command::new(env!("CARGO_BIN_EXE_voicenav"))
        .arg("--document")
        .arg(&document)
        .args(args)
        .env("VOICENAV_CONFIG_DIR", &dir)
        .env_remove("VOICENAV_COMMAND_PREFIX")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("run voicenav");
    {
        let stdin = child.stdin.as_mut().expect("stdin piped");
        for line in input {
            writeln!(stdin, "{line}").expect("write command");
        }
    }
    let output = child.wait_with_output().expect("wait for voicenav");
    assert!(output.status.success());
    let _ = fs::remove_dir_all(&dir);

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout line is JSON"))
        .collect()
}

fn events<'a>(messages: &'a [Value], event: &str) -> Vec<&'a Value> {
    messages.iter().filter(|m| m["event"] == event).collect()
}

#[test]
fn startup_announces_ready_with_rule_count() {
    let messages = run_session("ready", &[], &[r#"{"cmd":"shutdown"}"#]);
    let ready = &messages[0];
    assert_eq!(ready["event"], "ready");
    assert_eq!(ready["speech_input"], true);
    assert!(ready["rules"].as_u64().expect("rule count") > 30);
    assert!(!ready["session_id"].as_str().expect("session id").is_empty());
}

#[test]
fn spoken_scroll_down_emits_single_scroll_action() {
    let messages = run_session(
        "scroll",
        &[],
        &[
            START,
            r#"{"cmd":"result","text":"Scroll down","confidence":0.9}"#,
            r#"{"cmd":"shutdown"}"#,
        ],
    );
    let actions = events(&messages, "page_action");
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0]["action"]["action"], "scroll_by");
    assert_eq!(actions[0]["action"]["dy"], 300);
}

#[test]
fn click_the_button_submit_clicks_the_button_node() {
    let messages = run_session(
        "click",
        &[],
        &[
            START,
            r#"{"cmd":"result","text":"click the button Submit","confidence":0.95}"#,
        ],
    );
    let clicks: Vec<&Value> = events(&messages, "page_action")
        .into_iter()
        .filter(|m| m["action"]["action"] == "click")
        .collect();
    assert_eq!(clicks.len(), 1);
    assert_eq!(clicks[0]["action"]["node"], 3);
}

#[test]
fn low_confidence_result_is_reported_not_executed() {
    let messages = run_session(
        "confidence",
        &["--sensitivity", "0.8"],
        &[START, r#"{"cmd":"result","text":"go back","confidence":0.75}"#],
    );
    assert!(events(&messages, "page_action").is_empty());
    let feedback = events(&messages, "feedback");
    assert!(feedback
        .iter()
        .any(|m| m["feedback"]["kind"] == "low_confidence"));
}

#[test]
fn unmatched_text_asks_remote_and_times_out_to_not_recognized() {
    let messages = run_session(
        "remote",
        &["--remote-timeout-ms", "50"],
        &[
            START,
            r#"{"cmd":"result","text":"make it sparkle","confidence":0.9}"#,
        ],
    );
    let interpret = events(&messages, "interpret");
    assert_eq!(interpret.len(), 1);
    assert_eq!(interpret[0]["text"], "make it sparkle");
    assert!(events(&messages, "feedback")
        .iter()
        .any(|m| m["feedback"]["kind"] == "not_recognized"));
}

#[test]
fn start_listening_requests_host_recognition() {
    let messages = run_session(
        "listen",
        &["--lang", "fr-FR"],
        &[START, r#"{"cmd":"shutdown"}"#],
    );
    let starts = events(&messages, "recognition_start");
    assert_eq!(starts.len(), 1);
    assert_eq!(starts[0]["lang"], "fr-FR");
    assert_eq!(events(&messages, "recognition_stop").len(), 1);
}

#[test]
fn presentation_toggle_reaches_host_and_is_undone_on_shutdown() {
    let messages = run_session(
        "feature",
        &[],
        &[
            r#"{"cmd":"feature","feature":"highContrast","transition":"start"}"#,
            r#"{"cmd":"shutdown"}"#,
        ],
    );
    let toggles: Vec<bool> = events(&messages, "feature")
        .iter()
        .map(|m| m["enabled"].as_bool().expect("enabled flag"))
        .collect();
    assert_eq!(toggles, vec![true, false]);
}

#[test]
fn results_after_stop_listening_do_nothing() {
    let messages = run_session(
        "stopped",
        &[],
        &[
            START,
            r#"{"cmd":"stop_listening"}"#,
            r#"{"cmd":"result","text":"scroll down","confidence":0.9}"#,
        ],
    );
    assert!(events(&messages, "page_action").is_empty());
    assert_eq!(events(&messages, "recognition_stop").len(), 1);
}

#[test]
fn malformed_line_reports_recoverable_error_and_continues() {
    let messages = run_session(
        "malformed",
        &[],
        &[
            "{not json",
            r#"{"cmd":"command","command":"scroll_top"}"#,
        ],
    );
    let errors = events(&messages, "error");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["recoverable"], true);
    let actions = events(&messages, "page_action");
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0]["action"]["action"], "scroll_to_top");
}

#[test]
fn missing_document_file_fails_startup() {
    let dir = scratch_dir("missing");
    let output = Command::new(env!("CARGO_BIN_EXE_voicenav"))
        .arg("--document")
        .arg(dir.join("nope.json"))
        .env("VOICENAV_CONFIG_DIR", &dir)
        .stdin(Stdio::null())
        .output()
        .expect("run voicenav");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read document"));
    let _ = fs::remove_dir_all(&dir);
}
