use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{ExportRequestId, Money};
use bazaar_exports::{DataExportRequest, ExportFormat, ExportStatus};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub points: u64,
}

#[derive(Debug, Deserialize)]
pub struct CreateExportRequest {
    pub format: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ApplyVendorRequest {
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct PayoutRequest {
    /// Amount in cents.
    pub amount: Money,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleCampaignRequest {
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

/// Export row as listed to its owner. The download is only present while the
/// export is completed.
#[derive(Debug, Serialize)]
pub struct ExportView {
    pub id: ExportRequestId,
    pub format: ExportFormat,
    pub status: ExportStatus,
    pub requested_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub download_url: Option<String>,
    pub failure_reason: Option<String>,
}

impl From<DataExportRequest> for ExportView {
    fn from(r: DataExportRequest) -> Self {
        Self {
            id: r.id,
            format: r.format,
            status: r.status,
            requested_at: r.requested_at,
            completed_at: r.completed_at,
            expires_at: r.expires_at,
            download_url: r.download_url,
            failure_reason: r.failure_reason,
        }
    }
}
