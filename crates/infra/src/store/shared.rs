//! In-process document collection with snapshot notifications.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::sync::broadcast;

use invoicer_core::InvoiceId;
use invoicer_invoicing::Invoice;

use crate::store::{DocumentStore, InvoicePatch, StoreError, WatchStore};
use crate::watch::SnapshotChannel;

/// Shared in-process collection: the reference implementation of the
/// real-time store contract, and the test double for multi-client runs.
///
/// Several repository handles over one `Arc<SharedStore>` behave like
/// independently-connected clients of a hosted collection: every mutation
/// broadcasts the full snapshot to all watchers, and concurrent writes to
/// the same document are last-write-wins with no conflict resolution.
#[derive(Debug)]
pub struct SharedStore {
    docs: RwLock<HashMap<InvoiceId, Invoice>>,
    changes: SnapshotChannel<Vec<Invoice>>,
}

impl SharedStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
            changes: SnapshotChannel::default(),
        }
    }

    fn snapshot(&self) -> Result<Vec<Invoice>, StoreError> {
        let docs = self
            .docs
            .read()
            .map_err(|_| StoreError::transport("document collection lock poisoned"))?;
        Ok(docs.values().cloned().collect())
    }

    fn publish_snapshot(&self) {
        match self.snapshot() {
            Ok(snapshot) => self.changes.publish(snapshot),
            Err(err) => tracing::error!("failed to snapshot collection for watchers: {err}"),
        }
    }
}

impl Default for SharedStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for SharedStore {
    async fn list_once(&self) -> Result<Vec<Invoice>, StoreError> {
        self.snapshot()
    }

    async fn insert(&self, invoice: Invoice) -> Result<InvoiceId, StoreError> {
        let id = invoice.id.clone();
        {
            let mut docs = self
                .docs
                .write()
                .map_err(|_| StoreError::transport("document collection lock poisoned"))?;
            docs.insert(id.clone(), invoice);
        }
        self.publish_snapshot();
        Ok(id)
    }

    async fn replace(&self, id: &InvoiceId, invoice: Invoice) -> Result<(), StoreError> {
        {
            let mut docs = self
                .docs
                .write()
                .map_err(|_| StoreError::transport("document collection lock poisoned"))?;
            let slot = docs.get_mut(id).ok_or(StoreError::NotFound)?;
            *slot = invoice;
        }
        self.publish_snapshot();
        Ok(())
    }

    async fn patch(&self, id: &InvoiceId, patch: InvoicePatch) -> Result<(), StoreError> {
        {
            let mut docs = self
                .docs
                .write()
                .map_err(|_| StoreError::transport("document collection lock poisoned"))?;
            let doc = docs.get_mut(id).ok_or(StoreError::NotFound)?;
            patch.apply(doc);
        }
        self.publish_snapshot();
        Ok(())
    }

    async fn remove(&self, id: &InvoiceId) -> Result<(), StoreError> {
        {
            let mut docs = self
                .docs
                .write()
                .map_err(|_| StoreError::transport("document collection lock poisoned"))?;
            docs.remove(id).ok_or(StoreError::NotFound)?;
        }
        self.publish_snapshot();
        Ok(())
    }
}

impl WatchStore for SharedStore {
    fn watch(&self) -> broadcast::Receiver<Vec<Invoice>> {
        self.changes.subscribe()
    }
}
