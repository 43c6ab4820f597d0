//! In-memory document snapshot so sessions run without a live browser.
//!
//! The host ships the page as a nested JSON element tree; tests build the same
//! tree with [`ElementSpec`]'s builder methods.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::document::{Document, NodeId, Page, PageActions};

/// Nested element description, deserialized from the host's snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub tag: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    /// Text owned directly by this element (not its children).
    #[serde(default)]
    pub text: String,
    /// Top edge in document coordinates; inherits the parent's when absent.
    #[serde(default)]
    pub top: Option<f64>,
    #[serde(default)]
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    #[must_use]
    pub fn top(mut self, top: f64) -> Self {
        self.top = Some(top);
        self
    }

    #[must_use]
    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attrs: BTreeMap<String, String>,
    own_text: String,
    top: f64,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Flattened, index-addressed element tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    nodes: Vec<Node>,
}

impl MemoryDocument {
    #[must_use]
    pub fn from_spec(root: ElementSpec) -> Self {
        let mut doc = Self::default();
        doc.push(root, None, 0.0);
        doc
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        let root: ElementSpec = serde_json::from_str(raw)?;
        Ok(Self::from_spec(root))
    }

    fn push(&mut self, spec: ElementSpec, parent: Option<NodeId>, inherited_top: f64) -> NodeId {
        let id = NodeId(self.nodes.len());
        let top = spec.top.unwrap_or(inherited_top);
        self.nodes.push(Node {
            tag: spec.tag.to_ascii_lowercase(),
            attrs: spec.attrs,
            own_text: spec.text,
            top,
            parent,
            children: Vec::new(),
        });
        for child in spec.children {
            let child_id = self.push(child, Some(id), top);
            self.nodes[id.0].children.push(child_id);
        }
        id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn collect_text(&self, node: NodeId, out: &mut Vec<String>) {
        let Some(entry) = self.nodes.get(node.0) else {
            return;
        };
        if !entry.own_text.trim().is_empty() {
            out.push(entry.own_text.clone());
        }
        for child in &entry.children {
            self.collect_text(*child, out);
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(entry) = self.nodes.get_mut(node.0) {
            entry.attrs.insert(name.to_string(), value.to_string());
        }
    }
}

impl Document for MemoryDocument {
    fn elements(&self) -> Vec<NodeId> {
        (0..self.nodes.len()).map(NodeId).collect()
    }

    fn tag_name(&self, node: NodeId) -> &str {
        self.nodes.get(node.0).map_or("", |entry| entry.tag.as_str())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(node.0)
            .and_then(|entry| entry.attrs.get(name))
            .map(String::as_str)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|entry| entry.parent)
    }

    fn text_content(&self, node: NodeId) -> String {
        let mut parts = Vec::new();
        self.collect_text(node, &mut parts);
        parts
            .iter()
            .flat_map(|part| part.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn bounding_top(&self, node: NodeId) -> f64 {
        self.nodes.get(node.0).map_or(0.0, |entry| entry.top)
    }
}

/// Side effect recorded by [`MemoryPage`], in the order it was requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PageAction {
    ScrollBy { dy: i64 },
    ScrollToTop,
    ScrollToBottom,
    HistoryBack,
    HistoryForward,
    Reload,
    Click { node: NodeId },
    Focus { node: NodeId },
    SetValue { node: NodeId, value: String },
    Submit { form: NodeId },
    ScrollIntoView { node: NodeId },
    Highlight { node: NodeId, on: bool },
}

/// Pages rebuilt from host snapshots instead of queried live.
pub trait SnapshotPage: Page {
    /// Swap in a fresh snapshot after the host reports a DOM mutation.
    fn load_snapshot(&mut self, doc: MemoryDocument);
}

/// Document snapshot plus a log of every side effect applied to it.
#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    doc: MemoryDocument,
    scroll_y: i64,
    focused: Option<NodeId>,
    highlighted: BTreeSet<NodeId>,
    actions: Vec<PageAction>,
}

impl MemoryPage {
    #[must_use]
    pub fn new(doc: MemoryDocument) -> Self {
        Self {
            doc,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn scroll_y(&self) -> i64 {
        self.scroll_y
    }

    #[must_use]
    pub fn is_highlighted(&self, node: NodeId) -> bool {
        self.highlighted.contains(&node)
    }

    #[must_use]
    pub fn highlighted(&self) -> Vec<NodeId> {
        self.highlighted.iter().copied().collect()
    }

    #[must_use]
    pub fn actions(&self) -> &[PageAction] {
        &self.actions
    }

    pub fn take_actions(&mut self) -> Vec<PageAction> {
        std::mem::take(&mut self.actions)
    }

    fn document_height(&self) -> i64 {
        self.doc
            .elements()
            .into_iter()
            .map(|node| self.doc.bounding_top(node))
            .fold(0.0_f64, f64::max) as i64
    }
}

impl SnapshotPage for MemoryPage {
    fn load_snapshot(&mut self, doc: MemoryDocument) {
        self.doc = doc;
        self.focused = None;
        self.highlighted.clear();
    }
}

impl Document for MemoryPage {
    fn elements(&self) -> Vec<NodeId> {
        self.doc.elements()
    }

    fn tag_name(&self, node: NodeId) -> &str {
        self.doc.tag_name(node)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.doc.attribute(node, name)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.doc.parent(node)
    }

    fn text_content(&self, node: NodeId) -> String {
        self.doc.text_content(node)
    }

    fn bounding_top(&self, node: NodeId) -> f64 {
        self.doc.bounding_top(node)
    }
}

impl PageActions for MemoryPage {
    fn scroll_by(&mut self, dy: i64) {
        self.scroll_y = (self.scroll_y + dy).max(0);
        self.actions.push(PageAction::ScrollBy { dy });
    }

    fn scroll_to_top(&mut self) {
        self.scroll_y = 0;
        self.actions.push(PageAction::ScrollToTop);
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll_y = self.document_height();
        self.actions.push(PageAction::ScrollToBottom);
    }

    fn history_back(&mut self) {
        self.actions.push(PageAction::HistoryBack);
    }

    fn history_forward(&mut self) {
        self.actions.push(PageAction::HistoryForward);
    }

    fn reload(&mut self) {
        self.actions.push(PageAction::Reload);
    }

    fn click(&mut self, node: NodeId) {
        self.actions.push(PageAction::Click { node });
    }

    fn focus(&mut self, node: NodeId) {
        self.focused = Some(node);
        self.actions.push(PageAction::Focus { node });
    }

    fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    fn set_value(&mut self, node: NodeId, value: &str) {
        self.doc.set_attribute(node, "value", value);
        self.actions.push(PageAction::SetValue {
            node,
            value: value.to_string(),
        });
    }

    fn submit(&mut self, form: NodeId) {
        self.actions.push(PageAction::Submit { form });
    }

    fn scroll_into_view(&mut self, node: NodeId) {
        self.scroll_y = self.doc.bounding_top(node) as i64;
        self.actions.push(PageAction::ScrollIntoView { node });
    }

    fn set_highlight(&mut self, node: NodeId, highlighted: bool) {
        if highlighted {
            self.highlighted.insert(node);
        } else {
            self.highlighted.remove(&node);
        }
        self.actions.push(PageAction::Highlight {
            node,
            on: highlighted,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ancestors;

    fn sample() -> MemoryDocument {
        MemoryDocument::from_spec(
            ElementSpec::new("body")
                .child(
                    ElementSpec::new("div")
                        .top(40.0)
                        .child(ElementSpec::new("span").text("  Hello "))
                        .child(ElementSpec::new("b").text("world\n")),
                )
                .child(ElementSpec::new("p").text("tail").top(90.0)),
        )
    }

    #[test]
    fn text_content_joins_descendants_with_collapsed_whitespace() {
        let doc = sample();
        assert_eq!(doc.text_content(NodeId(1)), "Hello world");
        assert_eq!(doc.text_content(NodeId(0)), "Hello world tail");
    }

    #[test]
    fn children_inherit_parent_top_when_unset() {
        let doc = sample();
        assert_eq!(doc.bounding_top(NodeId(2)), 40.0);
        assert_eq!(doc.bounding_top(NodeId(4)), 90.0);
    }

    #[test]
    fn ancestors_walk_nearest_first() {
        let doc = sample();
        let chain: Vec<NodeId> = ancestors(&doc, NodeId(3)).collect();
        assert_eq!(chain, vec![NodeId(1), NodeId(0)]);
    }

    #[test]
    fn from_json_reads_nested_snapshot() {
        let doc = MemoryDocument::from_json(
            r#"{"tag":"BODY","children":[{"tag":"button","text":"Go","attrs":{"id":"go"}}]}"#,
        )
        .expect("valid snapshot");
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.tag_name(NodeId(0)), "body");
        assert_eq!(doc.find_by_id("go"), Some(NodeId(1)));
    }

    #[test]
    fn hidden_ancestor_hides_descendants() {
        let doc = MemoryDocument::from_spec(
            ElementSpec::new("body").child(
                ElementSpec::new("div")
                    .attr("aria-hidden", "true")
                    .child(ElementSpec::new("button").text("Ghost")),
            ),
        );
        assert!(doc.is_hidden(NodeId(2)));
        assert!(!doc.is_hidden(NodeId(0)));
    }

    #[test]
    fn memory_page_records_actions_and_highlight_state() {
        let mut page = MemoryPage::new(sample());
        page.scroll_by(300);
        page.set_highlight(NodeId(4), true);
        assert!(page.is_highlighted(NodeId(4)));
        page.set_highlight(NodeId(4), false);
        assert!(page.highlighted().is_empty());
        assert_eq!(page.scroll_y(), 300);
        assert_eq!(page.actions().len(), 3);
        assert_eq!(page.take_actions()[0], PageAction::ScrollBy { dy: 300 });
        assert!(page.actions().is_empty());
    }
}
