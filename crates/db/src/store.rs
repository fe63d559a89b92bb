use async_trait::async_trait;

use crate::{Document, Filter, RecordId, Result};

/// Backend contract for a document store.
///
/// Every call either succeeds or fails with a [`crate::DbError`]. Absence is
/// not an error: lookups return `None` and removals report `false`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Make sure a collection exists. Idempotent.
    async fn ensure_collection(&self, collection: &str) -> Result<()>;

    async fn find_by_id(&self, collection: &str, id: RecordId) -> Result<Option<Document>>;

    /// Documents matching `filter` in insertion order. A projection keeps only
    /// the listed fields plus the identity.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&[&str]>,
    ) -> Result<Vec<Document>>;

    async fn count_documents(&self, collection: &str, filter: &Filter) -> Result<u64>;

    /// Store a new document; any identity it carries is replaced by a fresh one.
    async fn insert(&self, collection: &str, document: Document) -> Result<RecordId>;

    /// Replace the document stored under `id`, returning the stored result or
    /// `None` when nothing was stored under that id.
    async fn replace(
        &self,
        collection: &str,
        id: RecordId,
        document: Document,
    ) -> Result<Option<Document>>;

    async fn remove(&self, collection: &str, id: RecordId) -> Result<bool>;
}
