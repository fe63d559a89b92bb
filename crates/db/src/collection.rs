//! Typed access to a collection.

use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{DbError, Document, Filter, RecordId, Result, SharedStore};

/// A record type stored in its own collection.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;
}

/// A partial view of an entity loaded with a field projection.
pub trait Projection: DeserializeOwned + Send {
    type Of: Entity;
    const FIELDS: &'static [&'static str];
}

/// A stored value together with its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    #[serde(rename = "_id")]
    pub id: RecordId,
    #[serde(flatten)]
    pub data: T,
}

impl<T> std::ops::Deref for Record<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

fn decode<T: DeserializeOwned>(collection: &str, document: Document) -> Result<T> {
    serde_json::from_value(Value::Object(document)).map_err(|e| DbError::mapping(collection, e))
}

fn encode<T: Serialize>(collection: &str, data: &T) -> Result<Document> {
    match serde_json::to_value(data).map_err(|e| DbError::mapping(collection, e))? {
        Value::Object(document) => Ok(document),
        _ => Err(DbError::NotAnObject {
            collection: collection.to_string(),
        }),
    }
}

/// Typed handle over one collection of a [`crate::DocumentStore`].
pub struct Collection<T> {
    store: SharedStore,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Collection<T> {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub async fn find_by_id(&self, id: RecordId) -> Result<Option<Record<T>>> {
        match self.store.find_by_id(T::COLLECTION, id).await? {
            Some(document) => decode(T::COLLECTION, document).map(Some),
            None => Ok(None),
        }
    }

    pub async fn find(&self, filter: &Filter) -> Result<Vec<Record<T>>> {
        self.store
            .find(T::COLLECTION, filter, None)
            .await?
            .into_iter()
            .map(|document| decode(T::COLLECTION, document))
            .collect()
    }

    /// Load only the fields named by the projection `P`.
    pub async fn find_projected<P>(&self, filter: &Filter) -> Result<Vec<Record<P>>>
    where
        P: Projection<Of = T>,
    {
        self.store
            .find(T::COLLECTION, filter, Some(P::FIELDS))
            .await?
            .into_iter()
            .map(|document| decode(T::COLLECTION, document))
            .collect()
    }

    pub async fn count(&self, filter: &Filter) -> Result<u64> {
        self.store.count_documents(T::COLLECTION, filter).await
    }

    pub async fn insert(&self, data: &T) -> Result<RecordId> {
        let document = encode(T::COLLECTION, data)?;
        self.store.insert(T::COLLECTION, document).await
    }

    /// Full replace of the stored fields; `None` when `id` is not stored.
    pub async fn replace(&self, id: RecordId, data: &T) -> Result<Option<Record<T>>> {
        let document = encode(T::COLLECTION, data)?;
        match self.store.replace(T::COLLECTION, id, document).await? {
            Some(stored) => decode(T::COLLECTION, stored).map(Some),
            None => Ok(None),
        }
    }

    pub async fn remove(&self, id: RecordId) -> Result<bool> {
        self.store.remove(T::COLLECTION, id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::InMemoryStore;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Shelf {
        label: String,
        floor: u8,
        tags: Vec<String>,
    }

    impl Entity for Shelf {
        const COLLECTION: &'static str = "shelves";
    }

    #[derive(Debug, Deserialize)]
    struct ShelfLabel {
        label: String,
    }

    impl Projection for ShelfLabel {
        type Of = Shelf;
        const FIELDS: &'static [&'static str] = &["label"];
    }

    fn shelves() -> Collection<Shelf> {
        Collection::new(Arc::new(InMemoryStore::with_collections([Shelf::COLLECTION])))
    }

    fn shelf(label: &str, tags: &[&str]) -> Shelf {
        Shelf {
            label: label.to_string(),
            floor: 1,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn insert_then_find_by_id_round_trips() {
        let shelves = shelves();
        let id = shelves.insert(&shelf("A1", &["fiction"])).await.unwrap();

        let record = shelves.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.data, shelf("A1", &["fiction"]));
        assert_eq!(record.label, "A1");
    }

    #[tokio::test]
    async fn filters_match_array_membership() {
        let shelves = shelves();
        shelves.insert(&shelf("A1", &["fiction"])).await.unwrap();
        shelves.insert(&shelf("B2", &["poetry", "fiction"])).await.unwrap();
        shelves.insert(&shelf("C3", &[])).await.unwrap();

        let fiction = shelves.find(&Filter::eq("tags", "fiction")).await.unwrap();
        assert_eq!(fiction.len(), 2);
        assert_eq!(shelves.count(&Filter::eq("tags", "poetry")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn projection_loads_only_named_fields() {
        let shelves = shelves();
        let id = shelves.insert(&shelf("A1", &[])).await.unwrap();

        let labels = shelves
            .find_projected::<ShelfLabel>(&Filter::all())
            .await
            .unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].id, id);
        assert_eq!(labels[0].label, "A1");
    }

    #[tokio::test]
    async fn replace_and_remove() {
        let shelves = shelves();
        let id = shelves.insert(&shelf("A1", &[])).await.unwrap();

        let replaced = shelves.replace(id, &shelf("A2", &["new"])).await.unwrap();
        assert_eq!(replaced.map(|r| r.data), Some(shelf("A2", &["new"])));

        assert!(shelves.remove(id).await.unwrap());
        assert!(shelves.find_by_id(id).await.unwrap().is_none());
        assert!(shelves.replace(id, &shelf("A3", &[])).await.unwrap().is_none());
    }
}
