//! User data export ("download my data") domain module.
//!
//! - `request`: the export request record and its status lifecycle
//! - `snapshot`: the assembled user data, as named sections of flat records
//! - `render`: JSON, CSV and PDF renderers
//! - `data_url`: base64 `data:` URL packing of the rendered file

pub mod data_url;
pub mod render;
pub mod request;
pub mod snapshot;

pub use data_url::{decode_data_url, encode_data_url};
pub use render::{RenderError, render};
pub use request::{DataExportRequest, ExportFormat, ExportStatus, DEFAULT_EXPORT_TTL_DAYS, DEFAULT_PROCESSING_TIMEOUT_MINS};
pub use snapshot::{SnapshotRecord, SnapshotSection, UserDataSnapshot};
