//! In-memory document store for testing.
//!
//! Records every call it receives and can be told to fail reads of a
//! collection or updates of given documents, so callers' error paths can be
//! exercised without a database.

use crate::document::{Document, FieldUpdate, Query};
use crate::store::DocumentStore;
use ::async_trait::async_trait;
use fiches_core::{Collection, FichesResult, StorageError};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// A call received by [`MockStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    GetAll(Collection),
    Query(Collection, Query),
    Update {
        collection: Collection,
        id: String,
        update: FieldUpdate,
    },
}

#[derive(Debug, Default)]
struct Failures {
    reads: HashSet<Collection>,
    updates: HashSet<(Collection, String)>,
    unhealthy: bool,
}

/// In-memory mock document store.
///
/// Clones share the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    collections: Arc<RwLock<HashMap<Collection, BTreeMap<String, Value>>>>,
    calls: Arc<RwLock<Vec<StoreCall>>>,
    failures: Arc<RwLock<Failures>>,
}

impl MockStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a raw document.
    pub fn insert(&self, collection: Collection, id: impl Into<String>, data: Value) {
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        collections.entry(collection).or_default().insert(id.into(), data);
    }

    /// Insert or replace a typed record.
    pub fn insert_record<T: Serialize>(
        &self,
        collection: Collection,
        id: impl Into<String>,
        record: &T,
    ) -> FichesResult<()> {
        let id = id.into();
        let data = serde_json::to_value(record).map_err(|e| StorageError::UpdateFailed {
            collection,
            id: id.clone(),
            reason: e.to_string(),
        })?;
        self.insert(collection, id, data);
        Ok(())
    }

    /// Raw data of a stored document.
    pub fn get(&self, collection: Collection, id: &str) -> Option<Value> {
        let collections = self
            .collections
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        collections.get(&collection).and_then(|docs| docs.get(id)).cloned()
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: Collection) -> usize {
        let collections = self
            .collections
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        collections.get(&collection).map_or(0, BTreeMap::len)
    }

    /// Every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Queries received on one collection.
    pub fn queries(&self, collection: Collection) -> Vec<Query> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Query(c, query) if c == collection => Some(query),
                _ => None,
            })
            .collect()
    }

    /// Updates received on one collection, as `(document id, update)` pairs.
    pub fn updates(&self, collection: Collection) -> Vec<(String, FieldUpdate)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Update {
                    collection: c,
                    id,
                    update,
                } if c == collection => Some((id, update)),
                _ => None,
            })
            .collect()
    }

    /// Forget recorded calls, keeping the data.
    pub fn clear_calls(&self) {
        self.calls
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    /// Make every read (get-all and query) of a collection fail.
    pub fn fail_reads(&self, collection: Collection) {
        self.failures
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .reads
            .insert(collection);
    }

    /// Make updates of one document fail.
    pub fn fail_updates_for(&self, collection: Collection, id: impl Into<String>) {
        self.failures
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .updates
            .insert((collection, id.into()));
    }

    /// Make the health check fail.
    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.failures
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .unhealthy = unhealthy;
    }

    fn record(&self, call: StoreCall) -> FichesResult<()> {
        self.calls
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .push(call);
        Ok(())
    }

    fn check_read(&self, collection: Collection) -> FichesResult<()> {
        let failures = self.failures.read().map_err(|_| StorageError::LockPoisoned)?;
        if failures.reads.contains(&collection) {
            return Err(StorageError::QueryFailed {
                collection,
                reason: "injected read failure".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn snapshot(&self, collection: Collection) -> FichesResult<Vec<Document>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document::new(collection, id.clone(), data.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl DocumentStore for MockStore {
    async fn get_all(&self, collection: Collection) -> FichesResult<Vec<Document>> {
        self.record(StoreCall::GetAll(collection))?;
        self.check_read(collection)?;
        self.snapshot(collection)
    }

    async fn query(&self, collection: Collection, query: &Query) -> FichesResult<Vec<Document>> {
        self.record(StoreCall::Query(collection, query.clone()))?;
        query.validate(collection)?;
        self.check_read(collection)?;

        let matching = self
            .snapshot(collection)?
            .into_iter()
            .filter(|doc| query.filter.matches(&doc.data));

        Ok(match query.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        update: &FieldUpdate,
    ) -> FichesResult<()> {
        self.record(StoreCall::Update {
            collection,
            id: id.to_string(),
            update: update.clone(),
        })?;

        {
            let failures = self.failures.read().map_err(|_| StorageError::LockPoisoned)?;
            if failures.updates.contains(&(collection, id.to_string())) {
                return Err(StorageError::UpdateFailed {
                    collection,
                    id: id.to_string(),
                    reason: "injected update failure".to_string(),
                }
                .into());
            }
        }

        let mut collections = self
            .collections
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        let data = collections
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StorageError::NotFound {
                collection,
                id: id.to_string(),
            })?;
        update.apply_to(data);
        Ok(())
    }

    async fn health_check(&self) -> FichesResult<()> {
        let failures = self.failures.read().map_err(|_| StorageError::LockPoisoned)?;
        if failures.unhealthy {
            return Err(StorageError::Unavailable {
                reason: "mock store marked unhealthy".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use fiches_core::FichesError;
    use serde_json::json;

    fn seeded() -> MockStore {
        let store = MockStore::new();
        store.insert(Collection::Events, "e1", json!({"id": "e1", "course": "A"}));
        store.insert(Collection::Events, "e2", json!({"id": "e2", "course": "B"}));
        store.insert(Collection::Sheets, "s1", json!({"relatedEventsIds": ["e1"]}));
        store.insert(Collection::Sheets, "s2", json!({"relatedEventsIds": ["e2", "e1"]}));
        store.insert(Collection::Sheets, "s3", json!({"relatedEventsIds": []}));
        store
    }

    #[tokio::test]
    async fn test_get_all_returns_collection() {
        let store = seeded();
        let sheets = store.get_all(Collection::Sheets).await.unwrap();
        assert_eq!(sheets.len(), 3);
        assert!(store.get_all(Collection::Users).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_array_contains_query() {
        let store = seeded();
        let docs = store
            .query(Collection::Sheets, &Query::array_contains("relatedEventsIds", "e1"))
            .await
            .unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2"]);
    }

    #[tokio::test]
    async fn test_query_respects_limit() {
        let store = seeded();
        let docs = store
            .query(
                Collection::Sheets,
                &Query::array_contains("relatedEventsIds", "e1").limit(1),
            )
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = seeded();
        store
            .update(Collection::Events, "e1", &FieldUpdate::new().set("course", "Z"))
            .await
            .unwrap();
        assert_eq!(
            store.get(Collection::Events, "e1"),
            Some(json!({"id": "e1", "course": "Z"}))
        );
    }

    #[tokio::test]
    async fn test_update_missing_document_is_not_found() {
        let store = seeded();
        let err = store
            .update(Collection::Sheets, "nope", &FieldUpdate::new().set("a", 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FichesError::Storage(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = seeded();
        store.fail_reads(Collection::Events);
        store.fail_updates_for(Collection::Sheets, "s1");

        assert!(store.get_all(Collection::Events).await.is_err());
        assert!(store
            .query(Collection::Events, &Query::equals("id", "e1"))
            .await
            .is_err());
        assert!(store
            .update(Collection::Sheets, "s1", &FieldUpdate::new().set("a", 1))
            .await
            .is_err());
        assert!(store
            .update(Collection::Sheets, "s2", &FieldUpdate::new().set("a", 1))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_calls_are_recorded() {
        let store = seeded();
        store.get_all(Collection::Sheets).await.unwrap();
        store
            .query(Collection::Events, &Query::equals("id", "e2"))
            .await
            .unwrap();
        store
            .update(Collection::Sheets, "s3", &FieldUpdate::new().set("x", true))
            .await
            .unwrap();

        assert_eq!(store.calls().len(), 3);
        assert_eq!(store.queries(Collection::Events), vec![Query::equals("id", "e2")]);
        let updates = store.updates(Collection::Sheets);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "s3");

        store.clear_calls();
        assert!(store.calls().is_empty());
        assert_eq!(store.count(Collection::Sheets), 3);
    }

    #[tokio::test]
    async fn test_health_check_toggle() {
        let store = MockStore::new();
        assert!(store.health_check().await.is_ok());
        store.set_unhealthy(true);
        assert!(store.health_check().await.is_err());
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
