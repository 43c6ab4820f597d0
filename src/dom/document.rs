//! Read-only document queries and the narrow set of page side effects commands may perform.

use serde::{Deserialize, Serialize};

/// Opaque handle to one element of the hosting document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Query surface over the hosting document.
///
/// Implementations must never mutate content while answering these calls;
/// every method is a pure read of the current tree.
pub trait Document {
    /// Every element in document (pre-)order.
    fn elements(&self) -> Vec<NodeId>;

    /// Lower-case tag name, empty for unknown nodes.
    fn tag_name(&self, node: NodeId) -> &str;

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Concatenated descendant text with whitespace collapsed.
    fn text_content(&self, node: NodeId) -> String;

    /// Distance from the top of the document to the element's top edge.
    fn bounding_top(&self, node: NodeId) -> f64;

    fn query_tags(&self, tags: &[&str]) -> Vec<NodeId> {
        self.elements()
            .into_iter()
            .filter(|node| tags.contains(&self.tag_name(*node)))
            .collect()
    }

    fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.elements()
            .into_iter()
            .find(|node| self.attribute(*node, "id") == Some(id))
    }

    /// True when the element or any ancestor is removed from the accessibility tree.
    fn is_hidden(&self, node: NodeId) -> bool {
        let hidden_here = |candidate: NodeId| {
            self.attribute(candidate, "hidden").is_some()
                || self.attribute(candidate, "aria-hidden") == Some("true")
        };
        hidden_here(node) || ancestors(self, node).any(hidden_here)
    }

    /// Checkbox/radio state: present and not literally `"false"`.
    fn is_checked(&self, node: NodeId) -> bool {
        matches!(self.attribute(node, "checked"), Some(value) if value != "false")
    }
}

/// Strict ancestors of `node`, nearest first.
pub fn ancestors<D: Document + ?Sized>(doc: &D, node: NodeId) -> Ancestors<'_, D> {
    Ancestors {
        doc,
        next: doc.parent(node),
    }
}

/// Iterator returned by [`ancestors`].
pub struct Ancestors<'a, D: ?Sized> {
    doc: &'a D,
    next: Option<NodeId>,
}

impl<D: Document + ?Sized> Iterator for Ancestors<'_, D> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

/// Side effects the command registry and screen reader may request.
///
/// Highlighting only touches presentation (outline/class); nothing here edits
/// document text except `set_value` on form controls the user asked to fill.
pub trait PageActions {
    fn scroll_by(&mut self, dy: i64);
    fn scroll_to_top(&mut self);
    fn scroll_to_bottom(&mut self);
    fn history_back(&mut self);
    fn history_forward(&mut self);
    fn reload(&mut self);
    fn click(&mut self, node: NodeId);
    fn focus(&mut self, node: NodeId);
    fn focused(&self) -> Option<NodeId>;
    fn set_value(&mut self, node: NodeId, value: &str);
    fn submit(&mut self, form: NodeId);
    fn scroll_into_view(&mut self, node: NodeId);
    fn set_highlight(&mut self, node: NodeId, highlighted: bool);
}

/// A live page: queryable and drivable.
pub trait Page: Document + PageActions {}

impl<T: Document + PageActions> Page for T {}
