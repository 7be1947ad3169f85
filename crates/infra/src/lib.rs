//! Infrastructure for the invoicing core: persistence adapters, the two
//! repository strategies, snapshot notifications, and the tabular export.

pub mod export;
pub mod repository;
pub mod store;
pub mod watch;

pub use repository::{InvoiceRepository, LocalRepository, SyncedRepository};
pub use store::{
    DocumentStore, InvoicePatch, JsonFileStore, SharedStore, StoreError, WatchStore,
};
pub use watch::SnapshotChannel;
