//! Element role classification shared by the resolver and the screen reader.

use super::document::{Document, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Heading(u8),
    Paragraph,
    ListItem,
    Link,
    Button,
    Image,
    Figure,
    TextField,
    TextArea,
    Checkbox,
    Radio,
    Select,
    Other,
}

impl Role {
    #[must_use]
    pub fn is_interactive(self) -> bool {
        matches!(
            self,
            Role::Link
                | Role::Button
                | Role::TextField
                | Role::TextArea
                | Role::Checkbox
                | Role::Radio
                | Role::Select
        )
    }

    #[must_use]
    pub fn is_form_control(self) -> bool {
        matches!(
            self,
            Role::TextField | Role::TextArea | Role::Checkbox | Role::Radio | Role::Select
        )
    }

    /// Label spoken after the element name.
    #[must_use]
    pub fn spoken_label(self) -> &'static str {
        match self {
            Role::Heading(_) => "heading",
            Role::Paragraph | Role::Other => "",
            Role::ListItem => "list item",
            Role::Link => "link",
            Role::Button => "button",
            Role::Image | Role::Figure => "image",
            Role::TextField | Role::TextArea => "edit text",
            Role::Checkbox => "checkbox",
            Role::Radio => "radio button",
            Role::Select => "combo box",
        }
    }
}

/// Classify an element, preferring an explicit ARIA `role` over its tag.
pub fn role_of<D: Document + ?Sized>(doc: &D, node: NodeId) -> Role {
    if let Some(role) = doc.attribute(node, "role") {
        if let Some(explicit) = explicit_role(doc, node, role) {
            return explicit;
        }
    }
    match doc.tag_name(node) {
        "h1" => Role::Heading(1),
        "h2" => Role::Heading(2),
        "h3" => Role::Heading(3),
        "h4" => Role::Heading(4),
        "h5" => Role::Heading(5),
        "h6" => Role::Heading(6),
        "p" => Role::Paragraph,
        "li" => Role::ListItem,
        "a" if doc.attribute(node, "href").is_some() => Role::Link,
        "button" => Role::Button,
        "img" => Role::Image,
        "figure" => Role::Figure,
        "textarea" => Role::TextArea,
        "select" => Role::Select,
        "input" => input_role(doc.attribute(node, "type").unwrap_or("text")),
        _ => Role::Other,
    }
}

fn explicit_role<D: Document + ?Sized>(doc: &D, node: NodeId, role: &str) -> Option<Role> {
    let role = match role.trim().to_ascii_lowercase().as_str() {
        "button" => Role::Button,
        "link" => Role::Link,
        "checkbox" | "switch" => Role::Checkbox,
        "radio" => Role::Radio,
        "textbox" | "searchbox" => Role::TextField,
        "combobox" | "listbox" => Role::Select,
        "listitem" => Role::ListItem,
        "img" => Role::Image,
        "heading" => {
            let level = doc
                .attribute(node, "aria-level")
                .and_then(|level| level.trim().parse::<u8>().ok())
                .unwrap_or(2)
                .clamp(1, 6);
            Role::Heading(level)
        }
        _ => return None,
    };
    Some(role)
}

fn input_role(input_type: &str) -> Role {
    match input_type.trim().to_ascii_lowercase().as_str() {
        "button" | "submit" | "reset" | "image" => Role::Button,
        "checkbox" => Role::Checkbox,
        "radio" => Role::Radio,
        "hidden" => Role::Other,
        _ => Role::TextField,
    }
}
