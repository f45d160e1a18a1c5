use core::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult, ExportRequestId, TenantId, UserId};

/// Days a completed export stays downloadable.
pub const DEFAULT_EXPORT_TTL_DAYS: i64 = 7;
/// Processing rows older than this are assumed abandoned by their worker.
pub const DEFAULT_PROCESSING_TIMEOUT_MINS: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(DomainError::validation(format!(
                "unsupported export format '{other}' (expected json, csv or pdf)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Expired,
}

impl ExportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportStatus::Pending => "pending",
            ExportStatus::Processing => "processing",
            ExportStatus::Completed => "completed",
            ExportStatus::Failed => "failed",
            ExportStatus::Expired => "expired",
        }
    }

    /// Pending or processing: the user cannot open another request.
    pub fn is_open(self) -> bool {
        matches!(self, ExportStatus::Pending | ExportStatus::Processing)
    }
}

impl FromStr for ExportStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ExportStatus::Pending),
            "processing" => Ok(ExportStatus::Processing),
            "completed" => Ok(ExportStatus::Completed),
            "failed" => Ok(ExportStatus::Failed),
            "expired" => Ok(ExportStatus::Expired),
            other => Err(DomainError::validation(format!("unknown export status '{other}'"))),
        }
    }
}

/// One "download my data" job, tracked as a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataExportRequest {
    pub id: ExportRequestId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub format: ExportFormat,
    pub status: ExportStatus,
    pub requested_at: DateTime<Utc>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub download_url: Option<String>,
    pub failure_reason: Option<String>,
}

impl DataExportRequest {
    pub fn new(tenant_id: TenantId, user_id: UserId, format: ExportFormat, now: DateTime<Utc>) -> Self {
        Self {
            id: ExportRequestId::new(),
            tenant_id,
            user_id,
            format,
            status: ExportStatus::Pending,
            requested_at: now,
            processing_started_at: None,
            completed_at: None,
            expires_at: None,
            download_url: None,
            failure_reason: None,
        }
    }

    fn transition(&mut self, from: &[ExportStatus], to: ExportStatus) -> DomainResult<()> {
        if !from.contains(&self.status) {
            return Err(DomainError::invariant(format!(
                "cannot move export {} from {} to {}",
                self.id,
                self.status.as_str(),
                to.as_str()
            )));
        }
        self.status = to;
        Ok(())
    }

    pub fn start_processing(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(&[ExportStatus::Pending], ExportStatus::Processing)?;
        self.processing_started_at = Some(now);
        Ok(())
    }

    pub fn complete(&mut self, download_url: String, now: DateTime<Utc>, ttl: Duration) -> DomainResult<()> {
        self.transition(&[ExportStatus::Processing], ExportStatus::Completed)?;
        self.download_url = Some(download_url);
        self.completed_at = Some(now);
        self.expires_at = Some(now + ttl);
        self.failure_reason = None;
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(&[ExportStatus::Processing], ExportStatus::Failed)?;
        self.failure_reason = Some(reason.into());
        self.completed_at = Some(now);
        Ok(())
    }

    /// Still processing after being claimed at or before `started_before`.
    pub fn is_stalled(&self, started_before: DateTime<Utc>) -> bool {
        self.status == ExportStatus::Processing
            && self.processing_started_at.is_some_and(|at| at <= started_before)
    }

    pub fn is_due_for_expiry(&self, now: DateTime<Utc>) -> bool {
        self.status == ExportStatus::Completed && self.expires_at.is_some_and(|at| now >= at)
    }

    /// Drop the download once its TTL has passed.
    pub fn expire(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.is_due_for_expiry(now) {
            return Err(DomainError::invariant(format!("export {} is not due for expiry", self.id)));
        }
        self.status = ExportStatus::Expired;
        self.download_url = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> DataExportRequest {
        DataExportRequest::new(TenantId::new(), UserId::new(), ExportFormat::Csv, Utc::now())
    }

    #[test]
    fn happy_path_pending_processing_completed_expired() {
        let now = Utc::now();
        let mut r = request();
        assert!(r.status.is_open());

        r.start_processing(now).unwrap();
        assert_eq!(r.status, ExportStatus::Processing);

        r.complete("data:text/csv;base64,".into(), now, Duration::days(7)).unwrap();
        assert_eq!(r.expires_at, Some(now + Duration::days(7)));
        assert!(!r.status.is_open());

        assert!(r.expire(now + Duration::days(6)).is_err());
        r.expire(now + Duration::days(7)).unwrap();
        assert_eq!(r.status, ExportStatus::Expired);
        assert!(r.download_url.is_none());
    }

    #[test]
    fn failure_records_reason() {
        let now = Utc::now();
        let mut r = request();
        r.start_processing(now).unwrap();
        r.fail("snapshot source unavailable", now).unwrap();
        assert_eq!(r.status, ExportStatus::Failed);
        assert_eq!(r.failure_reason.as_deref(), Some("snapshot source unavailable"));
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        let now = Utc::now();
        let mut r = request();
        assert!(matches!(
            r.complete(String::new(), now, Duration::days(1)),
            Err(DomainError::InvariantViolation(_))
        ));
        assert!(r.fail("x", now).is_err());

        r.start_processing(now).unwrap();
        assert!(r.start_processing(now).is_err());
    }

    #[test]
    fn format_parsing_is_case_insensitive() {
        assert_eq!("PDF".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
