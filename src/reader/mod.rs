//! Screen-reader traversal: linearize the page, then walk it with speech and highlight.
//!
//! The element sequence is a snapshot. After the host mutates the DOM it stays
//! stale until the next `scan_page`, which always invalidates the cursor
//! before rebuilding so no step can index into the old sequence.

mod cursor;
#[cfg(test)]
mod tests;

use tracing::debug;

use crate::dom::{ancestors, field_label, role_of, Document, NodeId, Page, Role};
use crate::speech::Speaker;

use cursor::step_cursor;

/// One node of the linearized reading order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadableElement {
    pub node: NodeId,
    pub spoken: String,
    pub role: Role,
    pub level: Option<u8>,
    /// Current control state for form controls ("checked", "blank", ...).
    pub state: Option<String>,
    pub top: f64,
}

#[derive(Debug, Default)]
pub struct ScreenReader {
    elements: Vec<ReadableElement>,
    cursor: Option<usize>,
    highlighted: Option<NodeId>,
}

impl ScreenReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn elements(&self) -> &[ReadableElement] {
        &self.elements
    }

    /// Index under the cursor; `None` while idle.
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    #[must_use]
    pub fn current(&self) -> Option<&ReadableElement> {
        self.cursor.and_then(|idx| self.elements.get(idx))
    }

    /// Rebuild the reading order and reset the cursor. Returns the element count.
    pub fn scan_page<D: Document + ?Sized>(&mut self, doc: &D) -> usize {
        self.cursor = None;
        self.elements.clear();

        let mut found: Vec<ReadableElement> = doc
            .elements()
            .into_iter()
            .filter(|node| !doc.is_hidden(*node))
            .filter_map(|node| readable_element(doc, node))
            .collect();
        // Stable sort keeps document order for elements on the same line.
        found.sort_by(|a, b| a.top.total_cmp(&b.top));
        self.elements = found;
        debug!(count = self.elements.len(), "screen reader scan complete");
        self.elements.len()
    }

    pub fn next<P: Page + ?Sized>(&mut self, page: &mut P, speaker: &mut Speaker) -> bool {
        self.step(page, speaker, 1)
    }

    pub fn previous<P: Page + ?Sized>(&mut self, page: &mut P, speaker: &mut Speaker) -> bool {
        self.step(page, speaker, -1)
    }

    /// Jump to a 1-based position in the reading order.
    pub fn select<P: Page + ?Sized>(
        &mut self,
        page: &mut P,
        speaker: &mut Speaker,
        position: usize,
    ) -> bool {
        if position == 0 || position > self.elements.len() {
            return false;
        }
        self.move_to(page, speaker, position - 1);
        true
    }

    /// Read from the top: rescan when empty, reset the cursor, speak the first element.
    pub fn read_page<P: Page + ?Sized>(&mut self, page: &mut P, speaker: &mut Speaker) -> bool {
        if self.elements.is_empty() {
            self.scan_page(&*page);
        }
        self.cursor = None;
        self.next(page, speaker)
    }

    /// Silence speech and drop the highlight, keeping the cursor position.
    pub fn stop<P: Page + ?Sized>(&mut self, page: &mut P, speaker: &mut Speaker) {
        speaker.silence();
        self.clear_highlight(page);
    }

    /// Teardown: silence, unhighlight, forget the sequence and cursor.
    pub fn reset<P: Page + ?Sized>(&mut self, page: &mut P, speaker: &mut Speaker) {
        self.stop(page, speaker);
        self.elements.clear();
        self.cursor = None;
    }

    fn step<P: Page + ?Sized>(&mut self, page: &mut P, speaker: &mut Speaker, direction: i32) -> bool {
        let Some(idx) = step_cursor(self.cursor, self.elements.len(), direction) else {
            return false;
        };
        self.move_to(page, speaker, idx);
        true
    }

    fn move_to<P: Page + ?Sized>(&mut self, page: &mut P, speaker: &mut Speaker, idx: usize) {
        let Some(element) = self.elements.get(idx) else {
            return;
        };
        let node = element.node;
        let spoken = element.spoken.clone();
        self.clear_highlight(page);
        page.set_highlight(node, true);
        page.scroll_into_view(node);
        self.highlighted = Some(node);
        self.cursor = Some(idx);
        speaker.say(&spoken);
    }

    fn clear_highlight<P: Page + ?Sized>(&mut self, page: &mut P) {
        if let Some(previous) = self.highlighted.take() {
            page.set_highlight(previous, false);
        }
    }
}

fn readable_element<D: Document + ?Sized>(doc: &D, node: NodeId) -> Option<ReadableElement> {
    let role = role_of(doc, node);
    let mut state = None;
    let mut level = None;
    let spoken = match role {
        Role::Heading(lvl) => {
            level = Some(lvl);
            prefixed(&format!("Heading level {lvl}"), &doc.text_content(node))?
        }
        Role::Paragraph => non_empty(doc.text_content(node))?,
        Role::ListItem => prefixed("List item", &doc.text_content(node))?,
        Role::Link => prefixed("Link", &element_name(doc, node))?,
        Role::Button => prefixed("Button", &element_name(doc, node))?,
        Role::Image => {
            if inside_captioned_figure(doc, node) {
                return None;
            }
            prefixed("Image", doc.attribute(node, "alt").unwrap_or_default())?
        }
        Role::Figure => prefixed("Image", &figure_caption(doc, node)?)?,
        Role::TextField | Role::TextArea | Role::Checkbox | Role::Radio | Role::Select => {
            let current = control_state(doc, node, role);
            let spoken = match field_label(doc, node) {
                Some(label) => format!("{label}, {}, {current}", role.spoken_label()),
                None => format!("{}, {current}", role.spoken_label()),
            };
            state = Some(current);
            spoken
        }
        Role::Other => return None,
    };
    Some(ReadableElement {
        node,
        spoken,
        role,
        level,
        state,
        top: doc.bounding_top(node),
    })
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn prefixed(prefix: &str, text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| format!("{prefix}, {text}"))
}

/// Text, then `aria-label`, then the alt text of a contained image.
fn element_name<D: Document + ?Sized>(doc: &D, node: NodeId) -> String {
    let text = doc.text_content(node);
    if !text.is_empty() {
        return text;
    }
    if let Some(label) = doc.attribute(node, "aria-label") {
        return label.trim().to_string();
    }
    if doc.tag_name(node) == "input" {
        if let Some(value) = doc.attribute(node, "value") {
            return value.trim().to_string();
        }
    }
    doc.elements()
        .into_iter()
        .filter(|candidate| ancestors(doc, *candidate).any(|ancestor| ancestor == node))
        .find_map(|candidate| doc.attribute(candidate, "alt"))
        .map(|alt| alt.trim().to_string())
        .unwrap_or_default()
}

fn figure_caption<D: Document + ?Sized>(doc: &D, figure: NodeId) -> Option<String> {
    doc.query_tags(&["figcaption"])
        .into_iter()
        .find(|caption| doc.parent(*caption) == Some(figure))
        .map(|caption| doc.text_content(caption))
        .filter(|text| !text.is_empty())
}

fn inside_captioned_figure<D: Document + ?Sized>(doc: &D, node: NodeId) -> bool {
    ancestors(doc, node)
        .any(|ancestor| doc.tag_name(ancestor) == "figure" && figure_caption(doc, ancestor).is_some())
}

fn control_state<D: Document + ?Sized>(doc: &D, node: NodeId, role: Role) -> String {
    match role {
        Role::Checkbox if doc.is_checked(node) => "checked".to_string(),
        Role::Checkbox => "not checked".to_string(),
        Role::Radio if doc.is_checked(node) => "selected".to_string(),
        Role::Radio => "not selected".to_string(),
        Role::Select => selected_option(doc, node).unwrap_or_else(|| "no selection".to_string()),
        _ if doc.attribute(node, "type") == Some("password") => {
            match doc.attribute(node, "value") {
                Some(value) if !value.is_empty() => "protected".to_string(),
                _ => "blank".to_string(),
            }
        }
        _ => doc
            .attribute(node, "value")
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map_or_else(|| "blank".to_string(), str::to_string),
    }
}

fn selected_option<D: Document + ?Sized>(doc: &D, select: NodeId) -> Option<String> {
    let options: Vec<NodeId> = doc
        .query_tags(&["option"])
        .into_iter()
        .filter(|option| ancestors(doc, *option).any(|ancestor| ancestor == select))
        .collect();
    options
        .iter()
        .copied()
        .find(|option| doc.attribute(*option, "selected").is_some())
        .or_else(|| options.first().copied())
        .map(|option| doc.text_content(option))
        .filter(|text| !text.is_empty())
}
