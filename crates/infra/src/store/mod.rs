//! Persistence adapter boundary.
//!
//! The repositories run against these traits; implementations surface
//! transport failures unmodified (there is no retry layer in the core).

pub mod json_file;
pub mod shared;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use invoicer_core::{DomainError, InvoiceId};
use invoicer_invoicing::{Invoice, InvoiceStatus};

pub use json_file::JsonFileStore;
pub use shared::SharedStore;

/// Storage-layer error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced document does not exist (anymore).
    #[error("document not found")]
    NotFound,

    /// The backing medium was unreachable or rejected the operation.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl StoreError {
    pub fn transport(msg: impl core::fmt::Display) -> Self {
        Self::Transport(msg.to_string())
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => DomainError::NotFound,
            StoreError::Transport(msg) => DomainError::Transport(msg),
        }
    }
}

/// Partial document update.
///
/// Status is the only field the system ever patches; everything else is
/// full-record replace-on-save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoicePatch {
    pub status: Option<InvoiceStatus>,
}

impl InvoicePatch {
    pub fn status(status: InvoiceStatus) -> Self {
        Self {
            status: Some(status),
        }
    }

    pub fn apply(&self, invoice: &mut Invoice) {
        if let Some(status) = self.status {
            invoice.status = status;
        }
    }
}

/// Document-collection contract the repositories run against.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// One-shot read of the full collection, arbitrary order.
    async fn list_once(&self) -> Result<Vec<Invoice>, StoreError>;

    /// Persist a new record under `invoice.id` and echo the stored id.
    async fn insert(&self, invoice: Invoice) -> Result<InvoiceId, StoreError>;

    /// Replace the record stored under `id` wholesale.
    async fn replace(&self, id: &InvoiceId, invoice: Invoice) -> Result<(), StoreError>;

    /// Apply a partial update to the record stored under `id`.
    async fn patch(&self, id: &InvoiceId, patch: InvoicePatch) -> Result<(), StoreError>;

    /// Remove the record stored under `id`.
    async fn remove(&self, id: &InvoiceId) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn list_once(&self) -> Result<Vec<Invoice>, StoreError> {
        (**self).list_once().await
    }

    async fn insert(&self, invoice: Invoice) -> Result<InvoiceId, StoreError> {
        (**self).insert(invoice).await
    }

    async fn replace(&self, id: &InvoiceId, invoice: Invoice) -> Result<(), StoreError> {
        (**self).replace(id, invoice).await
    }

    async fn patch(&self, id: &InvoiceId, patch: InvoicePatch) -> Result<(), StoreError> {
        (**self).patch(id, patch).await
    }

    async fn remove(&self, id: &InvoiceId) -> Result<(), StoreError> {
        (**self).remove(id).await
    }
}

/// A store that can notify about contents changes.
///
/// Watchers receive the full collection snapshot after every mutation,
/// whether it came from this handle or any other. Dropping the receiver is
/// the unsubscription.
pub trait WatchStore: DocumentStore {
    fn watch(&self) -> broadcast::Receiver<Vec<Invoice>>;
}

impl<S> WatchStore for Arc<S>
where
    S: WatchStore + ?Sized,
{
    fn watch(&self) -> broadcast::Receiver<Vec<Invoice>> {
        (**self).watch()
    }
}
