//! Target resolution: map a spoken phrase to the element it most likely names.
//!
//! Pages label controls inconsistently, so every lookup is a cascade of
//! progressively looser heuristics that returns on the first hit. Buttons,
//! links, and generic interactive targets share one cascade parameterized by
//! [`CandidateRole`].

use super::document::{ancestors, Document, NodeId};
use super::role::{role_of, Role};

/// Which elements a cascade may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateRole {
    Interactive,
    Button,
    Link,
}

impl CandidateRole {
    #[must_use]
    pub fn accepts(self, role: Role) -> bool {
        match self {
            CandidateRole::Interactive => role.is_interactive(),
            CandidateRole::Button => role == Role::Button,
            CandidateRole::Link => role == Role::Link,
        }
    }
}

pub(crate) fn normalize_phrase(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Visible name of an element: its text, or the value of button-like inputs.
fn visible_text<D: Document + ?Sized>(doc: &D, node: NodeId) -> String {
    let text = doc.text_content(node);
    if !text.is_empty() {
        return text;
    }
    if doc.tag_name(node) == "input" {
        if let Some(value) = doc.attribute(node, "value") {
            return value.to_string();
        }
    }
    String::new()
}

fn label_attribute<D: Document + ?Sized>(doc: &D, node: NodeId) -> Option<String> {
    doc.attribute(node, "aria-label")
        .or_else(|| doc.attribute(node, "title"))
        .map(normalize_phrase)
        .filter(|label| !label.is_empty())
}

/// Resolve `phrase` to an element accepted by `candidate`.
///
/// Cascade: exact text, substring text, label attribute, then any element
/// whose descendant text (or image alt) contains the phrase, walked up to the
/// nearest accepted ancestor.
pub fn resolve<D: Document + ?Sized>(
    doc: &D,
    phrase: &str,
    candidate: CandidateRole,
) -> Option<NodeId> {
    let needle = normalize_phrase(phrase);
    if needle.is_empty() {
        return None;
    }

    let candidates: Vec<(NodeId, String)> = doc
        .elements()
        .into_iter()
        .filter(|node| !doc.is_hidden(*node) && candidate.accepts(role_of(doc, *node)))
        .map(|node| (node, normalize_phrase(&visible_text(doc, node))))
        .collect();

    if let Some((node, _)) = candidates.iter().find(|(_, text)| *text == needle) {
        return Some(*node);
    }
    if let Some((node, _)) = candidates
        .iter()
        .find(|(_, text)| !text.is_empty() && text.contains(&needle))
    {
        return Some(*node);
    }
    if let Some((node, _)) = candidates.iter().find(|(node, _)| {
        label_attribute(doc, *node).is_some_and(|label| label.contains(&needle))
    }) {
        return Some(*node);
    }

    descendant_fallback(doc, &needle, candidate)
}

fn descendant_fallback<D: Document + ?Sized>(
    doc: &D,
    needle: &str,
    candidate: CandidateRole,
) -> Option<NodeId> {
    doc.elements()
        .into_iter()
        .filter(|node| !doc.is_hidden(*node))
        .filter(|node| {
            let text = normalize_phrase(&doc.text_content(*node));
            let alt = doc.attribute(*node, "alt").map(normalize_phrase);
            text.contains(needle) || alt.is_some_and(|alt| alt.contains(needle))
        })
        .find_map(|node| {
            std::iter::once(node)
                .chain(ancestors(doc, node))
                .find(|ancestor| candidate.accepts(role_of(doc, *ancestor)))
        })
}

/// Spellings of a spoken field name that commonly appear in ids and names.
fn identifier_variants(needle: &str) -> Vec<String> {
    let mut variants = vec![
        needle.to_string(),
        needle.replace(' ', "-"),
        needle.replace(' ', "_"),
        needle.replace(' ', ""),
    ];
    variants.dedup();
    variants
}

fn attribute_matches<D: Document + ?Sized>(
    doc: &D,
    node: NodeId,
    attribute: &str,
    variants: &[String],
) -> bool {
    doc.attribute(node, attribute).is_some_and(|value| {
        let value = value.trim().to_lowercase();
        variants.iter().any(|variant| *variant == value)
    })
}

fn attribute_contains<D: Document + ?Sized>(
    doc: &D,
    node: NodeId,
    attribute: &str,
    needle: &str,
) -> bool {
    doc.attribute(node, attribute)
        .is_some_and(|value| normalize_phrase(value).contains(needle))
}

/// Resolve a spoken field name to a form control.
///
/// Cascade: id, name, placeholder substring, `aria-label` substring, then the
/// control associated with a `<label>` whose text contains the phrase.
pub fn resolve_field<D: Document + ?Sized>(doc: &D, phrase: &str) -> Option<NodeId> {
    let needle = normalize_phrase(phrase);
    if needle.is_empty() {
        return None;
    }
    let fields: Vec<NodeId> = doc
        .elements()
        .into_iter()
        .filter(|node| !doc.is_hidden(*node) && role_of(doc, *node).is_form_control())
        .collect();
    let variants = identifier_variants(&needle);

    fields
        .iter()
        .copied()
        .find(|node| attribute_matches(doc, *node, "id", &variants))
        .or_else(|| {
            fields
                .iter()
                .copied()
                .find(|node| attribute_matches(doc, *node, "name", &variants))
        })
        .or_else(|| {
            fields
                .iter()
                .copied()
                .find(|node| attribute_contains(doc, *node, "placeholder", &needle))
        })
        .or_else(|| {
            fields
                .iter()
                .copied()
                .find(|node| attribute_contains(doc, *node, "aria-label", &needle))
        })
        .or_else(|| field_for_label_text(doc, &fields, &needle))
}

fn field_for_label_text<D: Document + ?Sized>(
    doc: &D,
    fields: &[NodeId],
    needle: &str,
) -> Option<NodeId> {
    doc.query_tags(&["label"])
        .into_iter()
        .filter(|label| normalize_phrase(&doc.text_content(*label)).contains(needle))
        .find_map(|label| associated_field(doc, fields, label))
}

/// Control a `<label>` points at: its `for` target, a nested control, or the
/// first control after it in document order.
fn associated_field<D: Document + ?Sized>(
    doc: &D,
    fields: &[NodeId],
    label: NodeId,
) -> Option<NodeId> {
    if let Some(target) = doc
        .attribute(label, "for")
        .and_then(|id| doc.find_by_id(id.trim()))
    {
        if fields.contains(&target) {
            return Some(target);
        }
    }
    if let Some(nested) = fields
        .iter()
        .copied()
        .find(|field| ancestors(doc, *field).any(|ancestor| ancestor == label))
    {
        return Some(nested);
    }
    let order = doc.elements();
    let label_pos = order.iter().position(|node| *node == label)?;
    order[label_pos + 1..]
        .iter()
        .copied()
        .find(|node| fields.contains(node))
}

/// Name spoken for a form control: `aria-label`, associated label text,
/// placeholder, `name`, then `title`.
pub fn field_label<D: Document + ?Sized>(doc: &D, node: NodeId) -> Option<String> {
    if let Some(label) = doc.attribute(node, "aria-label") {
        let label = label.trim();
        if !label.is_empty() {
            return Some(label.to_string());
        }
    }
    let node_id = doc.attribute(node, "id").map(str::trim);
    let from_label = doc.query_tags(&["label"]).into_iter().find_map(|label| {
        let points_here =
            node_id.is_some() && doc.attribute(label, "for").map(str::trim) == node_id;
        let wraps_node = ancestors(doc, node).any(|ancestor| ancestor == label);
        if !points_here && !wraps_node {
            return None;
        }
        let text = doc.text_content(label);
        (!text.is_empty()).then_some(text)
    });
    from_label.or_else(|| {
        ["placeholder", "name", "title"]
            .iter()
            .find_map(|attr| doc.attribute(node, attr))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::{ElementSpec, MemoryDocument};

    fn doc(children: Vec<ElementSpec>) -> MemoryDocument {
        let mut body = ElementSpec::new("body");
        for child in children {
            body = body.child(child);
        }
        MemoryDocument::from_spec(body)
    }

    #[test]
    fn exact_match_beats_earlier_substring_match() {
        let page = doc(vec![
            ElementSpec::new("button").text("Submit order"),
            ElementSpec::new("button").text("Submit"),
        ]);
        assert_eq!(
            resolve(&page, "submit", CandidateRole::Button),
            Some(NodeId(2))
        );
    }

    #[test]
    fn substring_match_used_when_no_exact_text() {
        let page = doc(vec![
            ElementSpec::new("a").attr("href", "/a").text("About us"),
            ElementSpec::new("a").attr("href", "/c").text("Contact the team"),
        ]);
        assert_eq!(
            resolve(&page, "  CONTACT ", CandidateRole::Link),
            Some(NodeId(2))
        );
    }

    #[test]
    fn label_attribute_matches_icon_only_button() {
        let page = doc(vec![ElementSpec::new("button").attr("aria-label", "Close dialog")]);
        assert_eq!(
            resolve(&page, "close", CandidateRole::Button),
            Some(NodeId(1))
        );
    }

    #[test]
    fn fallback_walks_up_from_image_alt_to_link() {
        let page = doc(vec![ElementSpec::new("a")
            .attr("href", "/")
            .child(ElementSpec::new("img").attr("alt", "Company logo"))]);
        assert_eq!(
            resolve(&page, "company logo", CandidateRole::Link),
            Some(NodeId(1))
        );
        assert_eq!(resolve(&page, "company logo", CandidateRole::Button), None);
    }

    #[test]
    fn candidate_role_filters_out_other_kinds() {
        let page = doc(vec![
            ElementSpec::new("a").attr("href", "/help").text("Help"),
            ElementSpec::new("button").text("Help"),
        ]);
        assert_eq!(resolve(&page, "help", CandidateRole::Button), Some(NodeId(2)));
        assert_eq!(resolve(&page, "help", CandidateRole::Link), Some(NodeId(1)));
        assert_eq!(
            resolve(&page, "help", CandidateRole::Interactive),
            Some(NodeId(1))
        );
    }

    #[test]
    fn hidden_elements_are_never_targets() {
        let page = doc(vec![ElementSpec::new("button").attr("hidden", "").text("Save")]);
        assert_eq!(resolve(&page, "save", CandidateRole::Interactive), None);
        assert_eq!(resolve(&page, "   ", CandidateRole::Interactive), None);
    }

    #[test]
    fn field_cascade_prefers_id_then_name_then_placeholder() {
        let page = doc(vec![
            ElementSpec::new("input").attr("placeholder", "Your email address"),
            ElementSpec::new("input").attr("name", "email"),
            ElementSpec::new("input").attr("id", "email"),
        ]);
        assert_eq!(resolve_field(&page, "Email"), Some(NodeId(3)));

        let without_id = doc(vec![
            ElementSpec::new("input").attr("placeholder", "Your email address"),
            ElementSpec::new("input").attr("name", "email"),
        ]);
        assert_eq!(resolve_field(&without_id, "email"), Some(NodeId(2)));
        assert_eq!(resolve_field(&without_id, "email address"), Some(NodeId(1)));
    }

    #[test]
    fn field_id_matches_hyphenated_spoken_name() {
        let page = doc(vec![ElementSpec::new("input").attr("id", "first-name")]);
        assert_eq!(resolve_field(&page, "first name"), Some(NodeId(1)));
    }

    #[test]
    fn field_resolves_through_label_for_nested_and_following() {
        let page = doc(vec![
            ElementSpec::new("label").attr("for", "pw").text("Password"),
            ElementSpec::new("label")
                .text("Remember me")
                .child(ElementSpec::new("input").attr("type", "checkbox")),
            ElementSpec::new("label").text("Nickname"),
            ElementSpec::new("input"),
            ElementSpec::new("input").attr("id", "pw").attr("type", "password"),
        ]);
        assert_eq!(resolve_field(&page, "password"), Some(NodeId(6)));
        assert_eq!(resolve_field(&page, "remember"), Some(NodeId(3)));
        assert_eq!(resolve_field(&page, "nickname"), Some(NodeId(5)));
        assert_eq!(resolve_field(&page, "phone"), None);
    }

    #[test]
    fn field_label_reads_label_text_then_attributes() {
        let page = doc(vec![
            ElementSpec::new("label").attr("for", "mail").text("Email"),
            ElementSpec::new("input").attr("id", "mail"),
            ElementSpec::new("input").attr("placeholder", "Search"),
        ]);
        assert_eq!(field_label(&page, NodeId(2)).as_deref(), Some("Email"));
        assert_eq!(field_label(&page, NodeId(3)).as_deref(), Some("Search"));
    }
}
