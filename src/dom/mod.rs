//! Document abstraction, role classification, and target resolution.

mod document;
pub mod memory;
pub mod resolver;
mod role;

pub use document::{ancestors, Ancestors, Document, NodeId, Page, PageActions};
pub use memory::{ElementSpec, MemoryDocument, MemoryPage, PageAction, SnapshotPage};
pub use resolver::{field_label, resolve, resolve_field, CandidateRole};
pub use role::{role_of, Role};
