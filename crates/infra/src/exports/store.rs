use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use bazaar_core::{DomainError, ExportRequestId, TenantId, UserId};
use bazaar_exports::DataExportRequest;

use crate::error::StoreError;

/// Failure reason recorded on requests abandoned mid-processing.
pub const STALLED_REASON: &str = "processing timed out";

/// Persistence for export requests.
#[async_trait]
pub trait ExportRequestStore: Send + Sync {
    /// Insert a new request. `Conflict` if the user already has an open one.
    async fn insert(&self, request: &DataExportRequest) -> Result<(), StoreError>;

    async fn get(&self, tenant_id: TenantId, id: ExportRequestId) -> Result<Option<DataExportRequest>, StoreError>;

    /// Newest first.
    async fn list_for_user(&self, tenant_id: TenantId, user_id: UserId) -> Result<Vec<DataExportRequest>, StoreError>;

    /// Move up to `limit` of the oldest pending requests to processing and
    /// return them. Concurrent callers never receive the same request.
    async fn claim_pending(&self, limit: usize, now: DateTime<Utc>) -> Result<Vec<DataExportRequest>, StoreError>;

    async fn save(&self, request: &DataExportRequest) -> Result<(), StoreError>;

    /// Fail requests still processing since `started_before` (their worker
    /// died or could not store the result). Returns how many changed.
    async fn fail_stalled(&self, started_before: DateTime<Utc>, now: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Expire completed requests past their TTL. Returns how many changed.
    async fn expire_due(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    fn backend(&self) -> &'static str;
}

/// In-memory export store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryExportStore {
    rows: RwLock<HashMap<ExportRequestId, DataExportRequest>>,
}

impl InMemoryExportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExportRequestStore for InMemoryExportStore {
    async fn insert(&self, request: &DataExportRequest) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::poisoned())?;
        let open = rows.values().any(|r| {
            r.tenant_id == request.tenant_id && r.user_id == request.user_id && r.status.is_open()
        });
        if open {
            return Err(DomainError::conflict("an export is already in progress").into());
        }
        rows.insert(request.id, request.clone());
        Ok(())
    }

    async fn get(&self, tenant_id: TenantId, id: ExportRequestId) -> Result<Option<DataExportRequest>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::poisoned())?;
        Ok(rows.get(&id).filter(|r| r.tenant_id == tenant_id).cloned())
    }

    async fn list_for_user(&self, tenant_id: TenantId, user_id: UserId) -> Result<Vec<DataExportRequest>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::poisoned())?;
        let mut out: Vec<DataExportRequest> = rows
            .values()
            .filter(|r| r.tenant_id == tenant_id && r.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by_key(|r| std::cmp::Reverse(r.requested_at));
        Ok(out)
    }

    async fn claim_pending(&self, limit: usize, now: DateTime<Utc>) -> Result<Vec<DataExportRequest>, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::poisoned())?;
        let mut pending: Vec<(DateTime<Utc>, ExportRequestId)> = rows
            .values()
            .filter(|r| r.status == bazaar_exports::ExportStatus::Pending)
            .map(|r| (r.requested_at, r.id))
            .collect();
        pending.sort();

        let mut claimed = Vec::new();
        for (_, id) in pending.into_iter().take(limit) {
            if let Some(row) = rows.get_mut(&id) {
                row.start_processing(now)?;
                claimed.push(row.clone());
            }
        }
        Ok(claimed)
    }

    async fn save(&self, request: &DataExportRequest) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::poisoned())?;
        match rows.get_mut(&request.id) {
            Some(row) if row.tenant_id == request.tenant_id => {
                *row = request.clone();
                Ok(())
            }
            _ => Err(DomainError::NotFound.into()),
        }
    }

    async fn fail_stalled(&self, started_before: DateTime<Utc>, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::poisoned())?;
        let mut failed = 0;
        for row in rows.values_mut().filter(|r| r.is_stalled(started_before)) {
            row.fail(STALLED_REASON, now)?;
            failed += 1;
        }
        Ok(failed)
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::poisoned())?;
        let mut expired = 0;
        for row in rows.values_mut().filter(|r| r.is_due_for_expiry(now)) {
            row.expire(now)?;
            expired += 1;
        }
        Ok(expired)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
