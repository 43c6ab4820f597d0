use super::*;
use crate::dom::{ElementSpec, MemoryDocument, MemoryPage};
use crate::speech::{MemorySynthesizer, SpeechLog, SpeechParams};

fn page_with(children: Vec<ElementSpec>) -> MemoryPage {
    let mut body = ElementSpec::new("body");
    for child in children {
        body = body.child(child);
    }
    MemoryPage::new(MemoryDocument::from_spec(body))
}

fn speaker() -> (Speaker, SpeechLog) {
    let (synth, log) = MemorySynthesizer::with_log();
    (Speaker::new(Box::new(synth), SpeechParams::default()), log)
}

/// Three headings and two paragraphs, deliberately out of document order.
fn article() -> MemoryPage {
    page_with(vec![
        ElementSpec::new("p").text("Second paragraph").top(400.0),
        ElementSpec::new("h1").text("Title").top(10.0),
        ElementSpec::new("h2").text("Background").top(120.0),
        ElementSpec::new("p").text("First paragraph").top(150.0),
        ElementSpec::new("h2").text("Details").top(300.0),
        ElementSpec::new("div").text("   ").top(500.0),
    ])
}

#[test]
fn scan_orders_headings_and_paragraphs_by_vertical_position() {
    let page = article();
    let mut reader = ScreenReader::new();
    assert_eq!(reader.scan_page(&page), 5);
    let spoken: Vec<&str> = reader.elements().iter().map(|e| e.spoken.as_str()).collect();
    assert_eq!(
        spoken,
        vec![
            "Heading level 1, Title",
            "Heading level 2, Background",
            "First paragraph",
            "Heading level 2, Details",
            "Second paragraph",
        ]
    );
    assert_eq!(reader.elements()[0].level, Some(1));
    assert_eq!(reader.cursor(), None);
}

#[test]
fn read_page_speaks_first_element_and_highlights_it() {
    let mut page = article();
    let (mut speaker, log) = speaker();
    let mut reader = ScreenReader::new();
    assert!(reader.read_page(&mut page, &mut speaker));
    assert_eq!(reader.cursor(), Some(0));
    assert_eq!(log.spoken(), vec!["Heading level 1, Title".to_string()]);
    let first = reader.elements()[0].node;
    assert_eq!(page.highlighted(), vec![first]);
}

#[test]
fn next_and_previous_wrap_at_both_ends() {
    let mut page = article();
    let (mut speaker, log) = speaker();
    let mut reader = ScreenReader::new();
    reader.scan_page(&page);

    assert!(reader.next(&mut page, &mut speaker));
    assert!(reader.previous(&mut page, &mut speaker));
    assert_eq!(reader.cursor(), Some(4));
    assert!(reader.next(&mut page, &mut speaker));
    assert_eq!(reader.cursor(), Some(0));
    assert_eq!(
        log.last_spoken().as_deref(),
        Some("Heading level 1, Title")
    );
}

#[test]
fn moving_replaces_previous_highlight() {
    let mut page = article();
    let (mut speaker, _log) = speaker();
    let mut reader = ScreenReader::new();
    reader.scan_page(&page);
    reader.next(&mut page, &mut speaker);
    reader.next(&mut page, &mut speaker);
    let second = reader.elements()[1].node;
    assert_eq!(page.highlighted(), vec![second]);

    reader.stop(&mut page, &mut speaker);
    assert!(page.highlighted().is_empty());
    assert_eq!(reader.cursor(), Some(1));
}

#[test]
fn empty_sequence_makes_navigation_a_no_op() {
    let mut page = page_with(vec![ElementSpec::new("div")]);
    let (mut speaker, log) = speaker();
    let mut reader = ScreenReader::new();
    assert_eq!(reader.scan_page(&page), 0);
    assert!(!reader.next(&mut page, &mut speaker));
    assert!(!reader.previous(&mut page, &mut speaker));
    assert!(!reader.read_page(&mut page, &mut speaker));
    assert!(log.entries().is_empty());
    assert!(page.actions().is_empty());
}

#[test]
fn rescan_invalidates_cursor() {
    let mut page = article();
    let (mut speaker, _log) = speaker();
    let mut reader = ScreenReader::new();
    reader.read_page(&mut page, &mut speaker);
    reader.next(&mut page, &mut speaker);
    assert_eq!(reader.cursor(), Some(1));
    reader.scan_page(&page);
    assert_eq!(reader.cursor(), None);
}

#[test]
fn form_controls_speak_role_and_state() {
    let page = page_with(vec![
        ElementSpec::new("label").attr("for", "news").text("Subscribe").top(10.0),
        ElementSpec::new("input")
            .attr("id", "news")
            .attr("type", "checkbox")
            .attr("checked", "")
            .top(10.0),
        ElementSpec::new("input").attr("aria-label", "Email").top(20.0),
        ElementSpec::new("input")
            .attr("type", "radio")
            .attr("name", "plan")
            .top(30.0),
        ElementSpec::new("select")
            .attr("aria-label", "Country")
            .top(40.0)
            .child(ElementSpec::new("option").text("Chile"))
            .child(ElementSpec::new("option").attr("selected", "").text("Peru")),
        ElementSpec::new("input")
            .attr("type", "password")
            .attr("placeholder", "Password")
            .attr("value", "hunter2")
            .top(50.0),
    ]);
    let mut reader = ScreenReader::new();
    reader.scan_page(&page);
    let spoken: Vec<&str> = reader.elements().iter().map(|e| e.spoken.as_str()).collect();
    assert_eq!(
        spoken,
        vec![
            "Subscribe, checkbox, checked",
            "Email, edit text, blank",
            "plan, radio button, not selected",
            "Country, combo box, Peru",
            "Password, edit text, protected",
        ]
    );
    assert_eq!(reader.elements()[0].state.as_deref(), Some("checked"));
}

#[test]
fn links_buttons_lists_and_captioned_images_are_announced() {
    let page = page_with(vec![
        ElementSpec::new("a").attr("href", "/").text("Home").top(1.0),
        ElementSpec::new("button").attr("aria-label", "Open menu").top(2.0),
        ElementSpec::new("li").text("Milk").top(3.0),
        ElementSpec::new("figure")
            .top(4.0)
            .child(ElementSpec::new("img").attr("alt", "ignored alt"))
            .child(ElementSpec::new("figcaption").text("A calm lake")),
        ElementSpec::new("img").attr("alt", "Logo").top(5.0),
        ElementSpec::new("img").top(6.0),
        ElementSpec::new("p").attr("hidden", "").text("Secret").top(7.0),
    ]);
    let mut reader = ScreenReader::new();
    reader.scan_page(&page);
    let spoken: Vec<&str> = reader.elements().iter().map(|e| e.spoken.as_str()).collect();
    assert_eq!(
        spoken,
        vec![
            "Link, Home",
            "Button, Open menu",
            "List item, Milk",
            "Image, A calm lake",
            "Image, Logo",
        ]
    );
}

#[test]
fn select_jumps_to_one_based_position() {
    let mut page = article();
    let (mut speaker, log) = speaker();
    let mut reader = ScreenReader::new();
    reader.scan_page(&page);
    assert!(reader.select(&mut page, &mut speaker, 3));
    assert_eq!(reader.cursor(), Some(2));
    assert_eq!(log.last_spoken().as_deref(), Some("First paragraph"));
    assert!(!reader.select(&mut page, &mut speaker, 0));
    assert!(!reader.select(&mut page, &mut speaker, 9));
}
