//! File-backed local store: one JSON array, read whole, written whole.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use invoicer_core::InvoiceId;
use invoicer_invoicing::Invoice;

use crate::store::{DocumentStore, InvoicePatch, StoreError};

/// JSON-file-backed document store (the local durable variant).
///
/// The whole collection lives in one file as a single JSON array, mirrored
/// in memory and rewritten on every mutation. Loading is lazy; a missing
/// file reads as an empty collection.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    /// Lazily loaded mirror of the file contents.
    cache: Mutex<Option<Vec<Invoice>>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    /// Resolve the default data file: `{os data dir}/invoicer/invoices.json`.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let base = dirs::data_dir()
            .or_else(|| {
                dirs::home_dir().map(|mut home| {
                    home.push(".local");
                    home.push("share");
                    home
                })
            })
            .ok_or_else(|| StoreError::transport("failed to resolve OS app data directory"))?;

        let mut path = base;
        path.push("invoicer");
        path.push("invoices.json");
        Ok(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<Invoice>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
                StoreError::transport(format!(
                    "failed to decode {}: {err}",
                    self.path.display()
                ))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(StoreError::transport(format!(
                "failed to read {}: {err}",
                self.path.display()
            ))),
        }
    }

    async fn persist(&self, invoices: &[Invoice]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|err| {
                StoreError::transport(format!(
                    "failed to create data directory {}: {err}",
                    parent.display()
                ))
            })?;
        }

        let payload = serde_json::to_vec_pretty(invoices)
            .map_err(|err| StoreError::transport(format!("failed to encode invoices: {err}")))?;

        tokio::fs::write(&self.path, payload).await.map_err(|err| {
            StoreError::transport(format!("failed to write {}: {err}", self.path.display()))
        })
    }

    /// Run `mutate` over the mirrored collection, then rewrite the file.
    ///
    /// A failed write leaves the mirror unset so the next operation reloads
    /// from disk instead of trusting a state the file never saw.
    async fn mutate<R>(
        &self,
        mutate: impl FnOnce(&mut Vec<Invoice>) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut guard = self.cache.lock().await;
        let mut invoices = match guard.take() {
            Some(invoices) => invoices,
            None => self.load().await?,
        };

        match mutate(&mut invoices) {
            Ok(value) => {
                self.persist(&invoices).await?;
                *guard = Some(invoices);
                Ok(value)
            }
            Err(err) => {
                *guard = Some(invoices);
                Err(err)
            }
        }
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn list_once(&self) -> Result<Vec<Invoice>, StoreError> {
        let mut guard = self.cache.lock().await;
        match guard.as_ref() {
            Some(invoices) => Ok(invoices.clone()),
            None => {
                let loaded = self.load().await?;
                *guard = Some(loaded.clone());
                Ok(loaded)
            }
        }
    }

    async fn insert(&self, invoice: Invoice) -> Result<InvoiceId, StoreError> {
        let id = invoice.id.clone();
        self.mutate(move |invoices| {
            invoices.push(invoice);
            Ok(())
        })
        .await?;
        tracing::debug!(path = %self.path.display(), "invoice collection rewritten");
        Ok(id)
    }

    async fn replace(&self, id: &InvoiceId, invoice: Invoice) -> Result<(), StoreError> {
        self.mutate(move |invoices| {
            let slot = invoices
                .iter_mut()
                .find(|stored| stored.id == *id)
                .ok_or(StoreError::NotFound)?;
            *slot = invoice;
            Ok(())
        })
        .await
    }

    async fn patch(&self, id: &InvoiceId, patch: InvoicePatch) -> Result<(), StoreError> {
        self.mutate(move |invoices| {
            let stored = invoices
                .iter_mut()
                .find(|stored| stored.id == *id)
                .ok_or(StoreError::NotFound)?;
            patch.apply(stored);
            Ok(())
        })
        .await
    }

    async fn remove(&self, id: &InvoiceId) -> Result<(), StoreError> {
        self.mutate(move |invoices| {
            let before = invoices.len();
            invoices.retain(|stored| stored.id != *id);
            if invoices.len() == before {
                Err(StoreError::NotFound)
            } else {
                Ok(())
            }
        })
        .await
    }
}
