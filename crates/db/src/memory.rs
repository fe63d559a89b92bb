//! In-process document store.

use std::collections::HashMap;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{DbError, Document, DocumentStore, Filter, RecordId, Result, ID_FIELD};

type Table = IndexMap<RecordId, Document>;

/// Collections held in memory, each preserving insertion order.
///
/// Only collections registered through [`DocumentStore::ensure_collection`]
/// can be queried; anything else fails with [`DbError::UnknownCollection`].
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store with the given collections already registered.
    pub fn with_collections<I, S>(collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tables = collections
            .into_iter()
            .map(|name| (name.into(), Table::new()))
            .collect();
        Self {
            tables: RwLock::new(tables),
        }
    }
}

fn unknown(collection: &str) -> DbError {
    DbError::UnknownCollection(collection.to_string())
}

fn project(document: &Document, fields: &[&str]) -> Document {
    document
        .iter()
        .filter(|(key, _)| key.as_str() == ID_FIELD || fields.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn stamp(mut document: Document, id: RecordId) -> Document {
    document.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    document
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn ensure_collection(&self, collection: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.contains_key(collection) {
            tracing::debug!(target: "locallib-db", collection, "registering collection");
            tables.insert(collection.to_string(), Table::new());
        }
        Ok(())
    }

    async fn find_by_id(&self, collection: &str, id: RecordId) -> Result<Option<Document>> {
        let tables = self.tables.read().await;
        let table = tables.get(collection).ok_or_else(|| unknown(collection))?;
        Ok(table.get(&id).cloned())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&[&str]>,
    ) -> Result<Vec<Document>> {
        let tables = self.tables.read().await;
        let table = tables.get(collection).ok_or_else(|| unknown(collection))?;
        let found = table
            .values()
            .filter(|document| filter.matches(document))
            .map(|document| match projection {
                Some(fields) => project(document, fields),
                None => document.clone(),
            })
            .collect();
        Ok(found)
    }

    async fn count_documents(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let tables = self.tables.read().await;
        let table = tables.get(collection).ok_or_else(|| unknown(collection))?;
        let count = table.values().filter(|document| filter.matches(document)).count();
        Ok(count as u64)
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<RecordId> {
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(collection)
            .ok_or_else(|| unknown(collection))?;
        let id = RecordId::now_v7();
        table.insert(id, stamp(document, id));
        tracing::debug!(target: "locallib-db", collection, %id, "document inserted");
        Ok(id)
    }

    async fn replace(
        &self,
        collection: &str,
        id: RecordId,
        document: Document,
    ) -> Result<Option<Document>> {
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(collection)
            .ok_or_else(|| unknown(collection))?;
        match table.get_mut(&id) {
            Some(slot) => {
                *slot = stamp(document, id);
                tracing::debug!(target: "locallib-db", collection, %id, "document replaced");
                Ok(Some(slot.clone()))
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, collection: &str, id: RecordId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(collection)
            .ok_or_else(|| unknown(collection))?;
        let removed = table.shift_remove(&id).is_some();
        if removed {
            tracing::debug!(target: "locallib-db", collection, %id, "document removed");
        }
        Ok(removed)
    }
}
