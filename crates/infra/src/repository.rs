//! Invoice repositories: two backing strategies behind one contract.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use invoicer_core::{DomainError, DomainResult, InvoiceId, OwnerId};
use invoicer_invoicing::{Invoice, InvoiceDraft, InvoiceStatus};

use crate::store::{DocumentStore, InvoicePatch, WatchStore};

/// CRUD contract shared by both strategies.
///
/// `list()` returns the current known set in arbitrary order; consumers
/// sort and filter through the computation engine.
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn list(&self) -> DomainResult<Vec<Invoice>>;

    /// Validate the draft, derive the stored fields, persist, and return
    /// the stored record. A failed create leaves no partial record.
    async fn create(&self, draft: InvoiceDraft) -> DomainResult<Invoice>;

    /// Full-record replace-on-save; `id`, `owner_id` and `created_at`
    /// survive, `total` is recomputed, and the stored status is preserved
    /// unless the draft explicitly changes it.
    async fn update(&self, id: &InvoiceId, draft: InvoiceDraft) -> DomainResult<Invoice>;

    /// Persist only the status field.
    async fn set_status(&self, id: &InvoiceId, status: InvoiceStatus) -> DomainResult<()>;

    /// Remove the record from all future `list()` results. Unknown ids are
    /// `NotFound` (see DESIGN.md).
    async fn delete(&self, id: &InvoiceId) -> DomainResult<()>;
}

/// Validate a draft and derive the stored record for it.
fn build_record(owner: &OwnerId, draft: InvoiceDraft) -> DomainResult<Invoice> {
    draft.validate()?;
    Ok(Invoice::from_draft(
        InvoiceId::generate(),
        owner.clone(),
        Utc::now(),
        draft,
    ))
}

async fn find_record<S>(store: &S, id: &InvoiceId) -> DomainResult<Invoice>
where
    S: DocumentStore + ?Sized,
{
    let invoices = store.list_once().await?;
    invoices
        .into_iter()
        .find(|invoice| invoice.id == *id)
        .ok_or(DomainError::NotFound)
}

/// Local-only strategy: read-through to the backing store; every mutation
/// rewrites the mirrored collection.
#[derive(Debug)]
pub struct LocalRepository<S> {
    store: S,
    owner: OwnerId,
}

impl<S: DocumentStore> LocalRepository<S> {
    pub fn new(store: S, owner: OwnerId) -> Self {
        Self { store, owner }
    }
}

#[async_trait]
impl<S: DocumentStore> InvoiceRepository for LocalRepository<S> {
    async fn list(&self) -> DomainResult<Vec<Invoice>> {
        Ok(self.store.list_once().await?)
    }

    async fn create(&self, draft: InvoiceDraft) -> DomainResult<Invoice> {
        let record = build_record(&self.owner, draft)?;
        let id = self.store.insert(record.clone()).await?;
        tracing::debug!(%id, "invoice created");
        Ok(record)
    }

    async fn update(&self, id: &InvoiceId, draft: InvoiceDraft) -> DomainResult<Invoice> {
        draft.validate()?;
        let mut record = find_record(&self.store, id).await?;
        record.apply_draft(draft);
        self.store.replace(id, record.clone()).await?;
        Ok(record)
    }

    async fn set_status(&self, id: &InvoiceId, status: InvoiceStatus) -> DomainResult<()> {
        self.store.patch(id, InvoicePatch::status(status)).await?;
        Ok(())
    }

    async fn delete(&self, id: &InvoiceId) -> DomainResult<()> {
        self.store.remove(id).await?;
        tracing::debug!(%id, "invoice deleted");
        Ok(())
    }
}

/// Remote-synced strategy.
///
/// Writes go to the backing store and are acknowledged independently of
/// read visibility: the authoritative list is whatever the most recent
/// snapshot notification delivered, not a locally mutated copy. A write's
/// acknowledgment may land before or after the snapshot reflecting it.
pub struct SyncedRepository<S> {
    store: S,
    owner: OwnerId,
    snapshot: Arc<RwLock<Vec<Invoice>>>,
    listener: JoinHandle<()>,
}

impl<S: WatchStore + 'static> SyncedRepository<S> {
    /// Take an initial snapshot, then keep following the store's change
    /// feed for as long as this handle lives.
    pub async fn connect(store: S, owner: OwnerId) -> DomainResult<Self> {
        let initial = store.list_once().await?;
        let snapshot = Arc::new(RwLock::new(initial));

        let mut changes = store.watch();
        let cache = Arc::clone(&snapshot);
        let listener = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(invoices) => {
                        if let Ok(mut snapshot) = cache.write() {
                            *snapshot = invoices;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Skipped snapshots are stale anyway; the next one wins.
                        tracing::debug!(skipped, "snapshot listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(Self {
            store,
            owner,
            snapshot,
            listener,
        })
    }

    /// Register for full-list notifications. Dropping the receiver is the
    /// unsubscription.
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<Invoice>> {
        self.store.watch()
    }
}

impl<S> Drop for SyncedRepository<S> {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

#[async_trait]
impl<S: WatchStore + 'static> InvoiceRepository for SyncedRepository<S> {
    async fn list(&self) -> DomainResult<Vec<Invoice>> {
        match self.snapshot.read() {
            Ok(snapshot) => Ok(snapshot.clone()),
            Err(_) => Err(DomainError::transport("snapshot cache poisoned")),
        }
    }

    async fn create(&self, draft: InvoiceDraft) -> DomainResult<Invoice> {
        let record = build_record(&self.owner, draft)?;
        let id = self.store.insert(record.clone()).await?;
        // Visibility in list() arrives with the next snapshot, not here.
        tracing::debug!(%id, "invoice created");
        Ok(record)
    }

    async fn update(&self, id: &InvoiceId, draft: InvoiceDraft) -> DomainResult<Invoice> {
        draft.validate()?;
        // Read the store, not the cached snapshot: a record written moments
        // ago must be updatable before the snapshot catches up.
        let mut record = find_record(&self.store, id).await?;
        record.apply_draft(draft);
        self.store.replace(id, record.clone()).await?;
        Ok(record)
    }

    async fn set_status(&self, id: &InvoiceId, status: InvoiceStatus) -> DomainResult<()> {
        self.store.patch(id, InvoicePatch::status(status)).await?;
        Ok(())
    }

    async fn delete(&self, id: &InvoiceId) -> DomainResult<()> {
        self.store.remove(id).await?;
        tracing::debug!(%id, "invoice deleted");
        Ok(())
    }
}
