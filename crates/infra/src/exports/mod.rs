//! Data export pipeline: request storage, snapshot assembly and the worker
//! that turns pending requests into downloadable `data:` URLs.

pub mod postgres;
pub mod source;
pub mod store;
pub mod worker;

pub use postgres::PostgresExportStore;
pub use source::{MarketplaceDataSource, UserDataSource};
pub use store::{ExportRequestStore, InMemoryExportStore, STALLED_REASON};
pub use worker::{BatchReport, ExportWorker, ExportWorkerHandle, WorkerStats};
