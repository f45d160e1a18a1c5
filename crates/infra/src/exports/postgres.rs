//! Postgres-backed export request store.
//!
//! At most one open request per user is enforced by a partial unique index,
//! so a racing second insert surfaces as `DomainError::Conflict` (SQLSTATE
//! `23505`). Claims use `FOR UPDATE SKIP LOCKED`, which lets several API
//! instances run the export cron concurrently without double-processing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use bazaar_core::{ExportRequestId, TenantId, UserId};
use bazaar_exports::{DataExportRequest, ExportFormat, ExportStatus};

use super::store::{ExportRequestStore, STALLED_REASON};
use crate::error::StoreError;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS data_export_requests (
        id UUID PRIMARY KEY,
        tenant_id UUID NOT NULL,
        user_id UUID NOT NULL,
        format TEXT NOT NULL,
        status TEXT NOT NULL,
        requested_at TIMESTAMPTZ NOT NULL,
        processing_started_at TIMESTAMPTZ,
        completed_at TIMESTAMPTZ,
        expires_at TIMESTAMPTZ,
        download_url TEXT,
        failure_reason TEXT
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS data_export_requests_one_open
        ON data_export_requests (tenant_id, user_id)
        WHERE status IN ('pending', 'processing')
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS data_export_requests_pending
        ON data_export_requests (requested_at)
        WHERE status = 'pending'
    "#,
];

const COLUMNS: &str = "id, tenant_id, user_id, format, status, requested_at, processing_started_at, \
                       completed_at, expires_at, download_url, failure_reason";

#[derive(Debug, Clone)]
pub struct PostgresExportStore {
    pool: PgPool,
}

impl PostgresExportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Create the table and indexes if they are missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn from_row(row: &PgRow) -> Result<DataExportRequest, StoreError> {
    let format: String = row.try_get("format")?;
    let status: String = row.try_get("status")?;
    Ok(DataExportRequest {
        id: ExportRequestId::from_uuid(row.try_get("id")?),
        tenant_id: TenantId::from_uuid(row.try_get("tenant_id")?),
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        format: format
            .parse::<ExportFormat>()
            .map_err(|e| StoreError::backend(format!("bad format column: {e}")))?,
        status: status
            .parse::<ExportStatus>()
            .map_err(|e| StoreError::backend(format!("bad status column: {e}")))?,
        requested_at: row.try_get("requested_at")?,
        processing_started_at: row.try_get("processing_started_at")?,
        completed_at: row.try_get("completed_at")?,
        expires_at: row.try_get("expires_at")?,
        download_url: row.try_get("download_url")?,
        failure_reason: row.try_get("failure_reason")?,
    })
}

#[async_trait]
impl ExportRequestStore for PostgresExportStore {
    #[instrument(skip(self, request), fields(export_id = %request.id))]
    async fn insert(&self, request: &DataExportRequest) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO data_export_requests ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(request.id.as_uuid())
        .bind(request.tenant_id.as_uuid())
        .bind(request.user_id.as_uuid())
        .bind(request.format.as_str())
        .bind(request.status.as_str())
        .bind(request.requested_at)
        .bind(request.processing_started_at)
        .bind(request.completed_at)
        .bind(request.expires_at)
        .bind(request.download_url.as_deref())
        .bind(request.failure_reason.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, tenant_id: TenantId, id: ExportRequestId) -> Result<Option<DataExportRequest>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM data_export_requests WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(from_row).transpose()
    }

    async fn list_for_user(&self, tenant_id: TenantId, user_id: UserId) -> Result<Vec<DataExportRequest>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM data_export_requests \
             WHERE tenant_id = $1 AND user_id = $2 ORDER BY requested_at DESC"
        ))
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(from_row).collect()
    }

    #[instrument(skip(self))]
    async fn claim_pending(&self, limit: usize, now: DateTime<Utc>) -> Result<Vec<DataExportRequest>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(&format!(
            "UPDATE data_export_requests \
             SET status = 'processing', processing_started_at = $2 \
             WHERE id IN ( \
                 SELECT id FROM data_export_requests \
                 WHERE status = 'pending' \
                 ORDER BY requested_at \
                 LIMIT $1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        ))
        .bind(limit)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        let mut claimed = rows.iter().map(from_row).collect::<Result<Vec<_>, _>>()?;
        claimed.sort_by_key(|r| r.requested_at);
        Ok(claimed)
    }

    async fn save(&self, request: &DataExportRequest) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE data_export_requests \
             SET status = $3, processing_started_at = $4, completed_at = $5, expires_at = $6, \
                 download_url = $7, failure_reason = $8 \
             WHERE tenant_id = $1 AND id = $2",
        )
        .bind(request.tenant_id.as_uuid())
        .bind(request.id.as_uuid())
        .bind(request.status.as_str())
        .bind(request.processing_started_at)
        .bind(request.completed_at)
        .bind(request.expires_at)
        .bind(request.download_url.as_deref())
        .bind(request.failure_reason.as_deref())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(bazaar_core::DomainError::NotFound.into());
        }
        Ok(())
    }

    async fn fail_stalled(&self, started_before: DateTime<Utc>, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE data_export_requests \
             SET status = 'failed', failure_reason = $2, completed_at = $3 \
             WHERE status = 'processing' AND processing_started_at <= $1",
        )
        .bind(started_before)
        .bind(STALLED_REASON)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE data_export_requests SET status = 'expired', download_url = NULL \
             WHERE status = 'completed' AND expires_at <= $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
