//! Snapshot renderers.

use thiserror::Error;

use crate::request::ExportFormat;
use crate::snapshot::UserDataSnapshot;

pub mod csv;
pub mod json;
pub mod pdf;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Render a snapshot to the bytes of a file in `format`.
pub fn render(snapshot: &UserDataSnapshot, format: ExportFormat) -> Result<Vec<u8>, RenderError> {
    match format {
        ExportFormat::Json => json::render(snapshot),
        ExportFormat::Csv => Ok(csv::render(snapshot).into_bytes()),
        ExportFormat::Pdf => Ok(pdf::render(snapshot)),
    }
}

/// Display form of a field value: strings unquoted, null empty, rest as JSON.
pub(crate) fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
