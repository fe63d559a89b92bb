//! Document store gateway for the catalog.
//!
//! Records live in named collections as JSON documents keyed by an opaque
//! [`RecordId`] stored under [`ID_FIELD`]. [`DocumentStore`] is the untyped
//! backend contract; [`Collection`] layers typed access on top of it.

use std::sync::Arc;

pub mod collection;
pub mod error;
pub mod filter;
pub mod memory;
pub mod store;

pub use collection::{Collection, Entity, Projection, Record};
pub use error::{DbError, Result};
pub use filter::Filter;
pub use memory::InMemoryStore;
pub use store::DocumentStore;

/// Identity assigned by the store when a document is inserted.
pub type RecordId = uuid::Uuid;

/// Raw stored form of a record.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Field holding a document's identity.
pub const ID_FIELD: &str = "_id";

/// Store handle shared between modules and request handlers.
pub type SharedStore = Arc<dyn DocumentStore>;

/// Parse a user-supplied identifier, returning `None` for anything malformed.
pub fn parse_id(raw: &str) -> Option<RecordId> {
    raw.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_hyphenated_uuid() {
        let id = uuid::Uuid::now_v7();
        assert_eq!(parse_id(&format!(" {id} ")), Some(id));
    }

    #[test]
    fn parse_id_rejects_garbage() {
        assert_eq!(parse_id("not-an-id"), None);
        assert_eq!(parse_id(""), None);
    }
}
