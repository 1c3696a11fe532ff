//! Typed snapshot feeds.
//!
//! A [`SnapshotFeed`] turns a collection subscription into an always-current,
//! decoded `Arc<[T]>` that request handlers can read without touching the
//! network. Documents that fail to decode are logged and left out.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::document::{Document, Snapshot};
use crate::error::StoreError;

/// Decoder from a raw document to a domain record.
pub type Decoder<T> = fn(&Document) -> Result<T, StoreError>;

/// Latest decoded state of one collection.
pub struct SnapshotFeed<T> {
    receiver: watch::Receiver<Arc<[T]>>,
}

impl<T> Clone for SnapshotFeed<T> {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> SnapshotFeed<T> {
    /// Decode `source` now and keep decoding every new snapshot in the
    /// background until all feeds for it are dropped.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        mut source: watch::Receiver<Snapshot>,
        decode: Decoder<T>,
        label: &'static str,
    ) -> Self {
        let initial = decode_all(&source.borrow_and_update(), decode, label);
        let (sender, receiver) = watch::channel(initial);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = sender.closed() => break,
                    changed = source.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let records = decode_all(&source.borrow_and_update(), decode, label);
                        sender.send_replace(records);
                    }
                }
            }
            debug!(feed = label, "Snapshot feed stopped");
        });

        Self { receiver }
    }

    /// A feed that never changes. Useful in tests.
    #[must_use]
    pub fn fixed(records: Vec<T>) -> Self {
        let (_sender, receiver) = watch::channel(Arc::from(records));
        Self { receiver }
    }
}

impl<T> SnapshotFeed<T> {
    /// The latest decoded records.
    #[must_use]
    pub fn current(&self) -> Arc<[T]> {
        Arc::clone(&self.receiver.borrow())
    }

    /// Wait until the collection changes, then return the new records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] once the underlying subscription has
    /// ended.
    pub async fn changed(&mut self) -> Result<Arc<[T]>, StoreError> {
        self.receiver
            .changed()
            .await
            .map_err(|_| StoreError::Unavailable("snapshot subscription ended".to_string()))?;
        Ok(Arc::clone(&self.receiver.borrow_and_update()))
    }
}

fn decode_all<T>(snapshot: &Snapshot, decode: Decoder<T>, label: &'static str) -> Arc<[T]> {
    snapshot
        .documents
        .iter()
        .filter_map(|doc| match decode(doc) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(feed = label, document_id = %doc.id, error = %e, "Skipping undecodable document");
                None
            }
        })
        .collect()
}
