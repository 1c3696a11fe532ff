//! In-process document store.
//!
//! Backs tests and `STORE_BACKEND=memory` local runs. Behaves like the hosted
//! database where it matters to callers: writes are visible to watchers
//! immediately, batches are atomic, and preconditions are checked against a
//! per-document revision.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::watch;

use crate::document::{
    Document, Fields, Precondition, Revision, Snapshot, Write, new_document_id,
};
use crate::error::StoreError;
use crate::port::DocumentStore;

/// Document store held entirely in memory.
///
/// Cloning shares the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    collections: RwLock<HashMap<String, Collection>>,
    revision: AtomicU64,
    fail_writes: AtomicBool,
}

struct Collection {
    documents: BTreeMap<String, Document>,
    sender: watch::Sender<Snapshot>,
}

impl Default for Collection {
    fn default() -> Self {
        let (sender, _) = watch::channel(Snapshot::empty());
        Self {
            documents: BTreeMap::new(),
            sender,
        }
    }
}

impl Collection {
    fn publish(&self) {
        let documents: Vec<Document> = self.documents.values().cloned().collect();
        self.sender.send_modify(|snapshot| {
            *snapshot = Snapshot::new(snapshot.sequence + 1, documents);
        });
    }
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with [`StoreError::Unavailable`].
    ///
    /// Reads and subscriptions keep working.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes are disabled".to_string()));
        }
        Ok(())
    }

    fn next_revision(&self) -> Revision {
        let n = self.inner.revision.fetch_add(1, Ordering::SeqCst) + 1;
        Revision::new(n.to_string())
    }

    fn check_precondition(
        collections: &HashMap<String, Collection>,
        write: &Write,
    ) -> Result<(), StoreError> {
        let existing = |collection: &str, id: &str| {
            collections
                .get(collection)
                .and_then(|c| c.documents.get(id))
        };

        match write {
            Write::Create { collection, id, .. } => {
                if existing(collection, id).is_some() {
                    return Err(StoreError::Conflict(format!(
                        "{collection}/{id} already exists"
                    )));
                }
            }
            Write::Update {
                collection,
                id,
                precondition,
                ..
            } => match (existing(collection, id), precondition) {
                (None, _) => {
                    return Err(StoreError::Conflict(format!(
                        "{collection}/{id} does not exist"
                    )));
                }
                (Some(doc), Precondition::Revision(expected)) if &doc.revision != expected => {
                    return Err(StoreError::Conflict(format!(
                        "{collection}/{id} changed since revision {expected}"
                    )));
                }
                _ => {}
            },
            Write::Delete { .. } => {}
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self.inner.collections.read();
        Ok(collections
            .get(collection)
            .map(|c| c.documents.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.inner.collections.read();
        Ok(collections
            .get(collection)
            .and_then(|c| c.documents.get(id))
            .cloned())
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<Document, StoreError> {
        self.check_writable()?;
        let document = Document {
            id: new_document_id(),
            fields,
            revision: self.next_revision(),
        };

        let mut collections = self.inner.collections.write();
        let entry = collections.entry(collection.to_owned()).or_default();
        entry
            .documents
            .insert(document.id.clone(), document.clone());
        entry.publish();
        drop(collections);

        Ok(document)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.check_writable()?;
        let revision = self.next_revision();

        let mut collections = self.inner.collections.write();
        let entry = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound(format!("{collection}/{id}")))?;
        let document = entry
            .documents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("{collection}/{id}")))?;
        document.fields.extend(fields);
        document.revision = revision;
        entry.publish();
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.check_writable()?;

        let mut collections = self.inner.collections.write();
        if let Some(entry) = collections.get_mut(collection)
            && entry.documents.remove(id).is_some()
        {
            entry.publish();
        }
        Ok(())
    }

    async fn commit(&self, writes: Vec<Write>) -> Result<(), StoreError> {
        self.check_writable()?;

        let mut collections = self.inner.collections.write();
        for write in &writes {
            Self::check_precondition(&collections, write)?;
        }

        let mut touched: Vec<String> = Vec::new();
        for write in writes {
            let name = write.collection().to_owned();
            let revision = self.next_revision();
            let entry = collections.entry(name.clone()).or_default();
            match write {
                Write::Create { id, fields, .. } => {
                    entry.documents.insert(
                        id.clone(),
                        Document {
                            id,
                            fields,
                            revision,
                        },
                    );
                }
                Write::Update { id, fields, .. } => {
                    if let Some(document) = entry.documents.get_mut(&id) {
                        document.fields.extend(fields);
                        document.revision = revision;
                    }
                }
                Write::Delete { id, .. } => {
                    entry.documents.remove(&id);
                }
            }
            if !touched.contains(&name) {
                touched.push(name);
            }
        }

        for name in &touched {
            if let Some(entry) = collections.get(name) {
                entry.publish();
            }
        }
        Ok(())
    }

    async fn watch(&self, collection: &str) -> Result<watch::Receiver<Snapshot>, StoreError> {
        let mut collections = self.inner.collections.write();
        let entry = collections.entry(collection.to_owned()).or_default();
        Ok(entry.sender.subscribe())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::document::Value;

    const PRODUCTS: &str = "artifacts/test/public/data/products";

    fn fields(name: &str, stock: i64) -> Fields {
        Fields::from([
            ("name".to_string(), Value::from(name)),
            ("stock".to_string(), Value::Integer(stock)),
        ])
    }

    #[tokio::test]
    async fn test_create_then_get_and_list() {
        let store = MemoryStore::new();
        let doc = store.create(PRODUCTS, fields("Mug", 3)).await.unwrap();

        let fetched = store.get(PRODUCTS, &doc.id).await.unwrap().unwrap();
        assert_eq!(fetched, doc);
        assert_eq!(store.list(PRODUCTS).await.unwrap().len(), 1);
        assert!(store.list("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_fields_and_bumps_revision() {
        let store = MemoryStore::new();
        let doc = store.create(PRODUCTS, fields("Mug", 3)).await.unwrap();

        store
            .update(
                PRODUCTS,
                &doc.id,
                Fields::from([("stock".to_string(), Value::Integer(1))]),
            )
            .await
            .unwrap();

        let fetched = store.get(PRODUCTS, &doc.id).await.unwrap().unwrap();
        assert_eq!(fetched.get("name"), Some(&Value::from("Mug")));
        assert_eq!(fetched.get("stock"), Some(&Value::Integer(1)));
        assert_ne!(fetched.revision, doc.revision);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update(PRODUCTS, "nope", Fields::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        let doc = store.create(PRODUCTS, fields("Mug", 3)).await.unwrap();
        store.delete(PRODUCTS, &doc.id).await.unwrap();
        store.delete(PRODUCTS, &doc.id).await.unwrap();
        assert!(store.get(PRODUCTS, &doc.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_watch_sees_every_write() {
        let store = MemoryStore::new();
        let mut rx = store.watch(PRODUCTS).await.unwrap();
        assert!(rx.borrow_and_update().documents.is_empty());

        let doc = store.create(PRODUCTS, fields("Mug", 3)).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().documents.len(), 1);

        store.delete(PRODUCTS, &doc.id).await.unwrap();
        rx.changed().await.unwrap();
        let snapshot = rx.borrow_and_update().clone();
        assert!(snapshot.documents.is_empty());
        assert_eq!(snapshot.sequence, 2);
    }

    #[tokio::test]
    async fn test_watch_after_writes_starts_with_current_state() {
        let store = MemoryStore::new();
        store.create(PRODUCTS, fields("Mug", 3)).await.unwrap();
        let rx = store.watch(PRODUCTS).await.unwrap();
        assert_eq!(rx.borrow().documents.len(), 1);
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let store = MemoryStore::new();
        let doc = store.create(PRODUCTS, fields("Mug", 3)).await.unwrap();
        let stale = Revision::new("stale");

        let err = store
            .commit(vec![
                Write::Create {
                    collection: "orders".to_string(),
                    id: "o1".to_string(),
                    fields: Fields::new(),
                },
                Write::Update {
                    collection: PRODUCTS.to_string(),
                    id: doc.id.clone(),
                    fields: fields("Mug", 2),
                    precondition: Precondition::Revision(stale),
                },
            ])
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        assert!(store.get("orders", "o1").await.unwrap().is_none());
        assert_eq!(
            store.get(PRODUCTS, &doc.id).await.unwrap().unwrap().fields,
            doc.fields
        );
    }

    #[tokio::test]
    async fn test_commit_applies_with_matching_revision() {
        let store = MemoryStore::new();
        let doc = store.create(PRODUCTS, fields("Mug", 3)).await.unwrap();

        store
            .commit(vec![
                Write::Create {
                    collection: "orders".to_string(),
                    id: "o1".to_string(),
                    fields: Fields::new(),
                },
                Write::Update {
                    collection: PRODUCTS.to_string(),
                    id: doc.id.clone(),
                    fields: Fields::from([("stock".to_string(), Value::Integer(2))]),
                    precondition: Precondition::Revision(doc.revision.clone()),
                },
            ])
            .await
            .unwrap();

        assert!(store.get("orders", "o1").await.unwrap().is_some());
        let updated = store.get(PRODUCTS, &doc.id).await.unwrap().unwrap();
        assert_eq!(updated.get("stock"), Some(&Value::Integer(2)));
    }

    #[tokio::test]
    async fn test_commit_create_rejects_existing_id() {
        let store = MemoryStore::new();
        let doc = store.create(PRODUCTS, fields("Mug", 3)).await.unwrap();
        let err = store
            .commit(vec![Write::Create {
                collection: PRODUCTS.to_string(),
                id: doc.id,
                fields: Fields::new(),
            }])
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_fail_writes_blocks_writes_but_not_reads() {
        let store = MemoryStore::new();
        let doc = store.create(PRODUCTS, fields("Mug", 3)).await.unwrap();
        store.fail_writes(true);

        assert!(matches!(
            store.create(PRODUCTS, fields("Cup", 1)).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.delete(PRODUCTS, &doc.id).await.is_err());
        assert!(store.commit(Vec::new()).await.is_err());
        assert_eq!(store.list(PRODUCTS).await.unwrap().len(), 1);

        store.fail_writes(false);
        store.delete(PRODUCTS, &doc.id).await.unwrap();
    }
}
