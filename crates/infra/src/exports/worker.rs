//! Export worker: claims pending requests in batches, renders them and stores
//! the result. Driven either by the cron endpoint (`run_once`) or by a
//! background polling loop (`spawn`).

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use bazaar_exports::{
    DEFAULT_EXPORT_TTL_DAYS, DEFAULT_PROCESSING_TIMEOUT_MINS, DataExportRequest, encode_data_url, render,
};

use super::source::UserDataSource;
use super::store::ExportRequestStore;
use crate::error::StoreError;

/// Outcome of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub claimed: usize,
    pub completed: usize,
    pub failed: usize,
    /// Abandoned processing rows failed before claiming.
    pub stalled: u64,
}

/// Runtime statistics for a spawned worker.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkerStats {
    pub cycles: u64,
    pub exports_completed: u64,
    pub exports_failed: u64,
    pub exports_expired: u64,
    pub uptime_secs: u64,
}

pub struct ExportWorker {
    store: Arc<dyn ExportRequestStore>,
    source: Arc<dyn UserDataSource>,
    batch_size: usize,
    ttl: chrono::Duration,
    processing_timeout: chrono::Duration,
}

impl ExportWorker {
    pub fn new(store: Arc<dyn ExportRequestStore>, source: Arc<dyn UserDataSource>) -> Self {
        Self {
            store,
            source,
            batch_size: 5,
            ttl: chrono::Duration::days(DEFAULT_EXPORT_TTL_DAYS),
            processing_timeout: chrono::Duration::minutes(DEFAULT_PROCESSING_TIMEOUT_MINS),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_processing_timeout(mut self, timeout: chrono::Duration) -> Self {
        self.processing_timeout = timeout;
        self
    }

    /// Fail abandoned requests, then claim and process one batch of pending
    /// ones.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<BatchReport, StoreError> {
        let stalled = self.store.fail_stalled(now - self.processing_timeout, now).await?;
        if stalled > 0 {
            warn!(stalled, "failed exports stuck in processing");
        }

        let claimed = self.store.claim_pending(self.batch_size, now).await?;
        let mut report = BatchReport {
            claimed: claimed.len(),
            stalled,
            ..BatchReport::default()
        };

        for mut request in claimed {
            debug!(export_id = %request.id, format = request.format.as_str(), "processing export");
            let outcome = self
                .build(&request, now)
                .and_then(|url| request.complete(url, now, self.ttl).map_err(|e| e.to_string()));

            match outcome {
                Ok(()) => match self.store.save(&request).await {
                    Ok(()) => {
                        info!(export_id = %request.id, tenant_id = %request.tenant_id, "export completed");
                        report.completed += 1;
                    }
                    Err(e) => {
                        error!(export_id = %request.id, error = %e, "failed to store completed export");
                        report.failed += 1;
                    }
                },
                Err(reason) => {
                    warn!(export_id = %request.id, reason = %reason, "export failed");
                    report.failed += 1;
                    if let Err(e) = request.fail(reason, now) {
                        error!(export_id = %request.id, error = %e, "could not mark export failed");
                    } else if let Err(e) = self.store.save(&request).await {
                        error!(export_id = %request.id, error = %e, "failed to store export failure");
                    }
                }
            }
        }

        Ok(report)
    }

    fn build(&self, request: &DataExportRequest, now: DateTime<Utc>) -> Result<String, String> {
        let snapshot = self
            .source
            .snapshot(request.tenant_id, request.user_id, now)
            .map_err(|e| e.to_string())?;
        let bytes = render(&snapshot, request.format).map_err(|e| e.to_string())?;
        Ok(encode_data_url(request.format.mime_type(), &bytes))
    }

    /// Expire completed exports past their TTL.
    pub async fn expire_stale(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let expired = self.store.expire_due(now).await?;
        if expired > 0 {
            info!(expired, "expired stale exports");
        }
        Ok(expired)
    }

    /// Run `run_once` + `expire_stale` every `poll_interval` until shut down.
    pub fn spawn(self: Arc<Self>, poll_interval: Duration) -> ExportWorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let stats = Arc::new(Mutex::new(WorkerStats::default()));
        let loop_stats = stats.clone();

        let join = tokio::spawn(async move {
            info!(poll_secs = poll_interval.as_secs(), "export worker started");
            let started = Instant::now();
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {}
                }

                let now = Utc::now();
                let batch = self.run_once(now).await;
                let expired = self.expire_stale(now).await;

                if let Ok(mut s) = loop_stats.lock() {
                    s.cycles += 1;
                    s.uptime_secs = started.elapsed().as_secs();
                    match &batch {
                        Ok(r) => {
                            s.exports_completed += r.completed as u64;
                            s.exports_failed += r.failed as u64;
                        }
                        Err(e) => error!(error = %e, "export batch failed"),
                    }
                    match &expired {
                        Ok(n) => s.exports_expired += n,
                        Err(e) => error!(error = %e, "export expiry sweep failed"),
                    }
                }
            }
            info!("export worker stopped");
        });

        ExportWorkerHandle {
            shutdown: shutdown_tx,
            join,
            stats,
        }
    }
}

/// Handle to control a running worker.
#[derive(Debug)]
pub struct ExportWorkerHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
    stats: Arc<Mutex<WorkerStats>>,
}

impl ExportWorkerHandle {
    /// Request shutdown and wait for the current cycle to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.join.await;
    }

    pub fn stats(&self) -> WorkerStats {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exports::InMemoryExportStore;
    use bazaar_core::{DomainError, TenantId, UserId};
    use bazaar_exports::{
        ExportFormat, ExportStatus, SnapshotRecord, SnapshotSection, UserDataSnapshot, decode_data_url,
    };

    struct FixedSource;

    impl UserDataSource for FixedSource {
        fn snapshot(&self, tenant_id: TenantId, user_id: UserId, now: DateTime<Utc>) -> Result<UserDataSnapshot, StoreError> {
            Ok(UserDataSnapshot::new(tenant_id, user_id, now).with_section(SnapshotSection::new(
                "profile",
                vec![SnapshotRecord::new().field("email", "me@shop.test")],
            )))
        }
    }

    struct BrokenSource;

    impl UserDataSource for BrokenSource {
        fn snapshot(&self, _: TenantId, _: UserId, _: DateTime<Utc>) -> Result<UserDataSnapshot, StoreError> {
            Err(StoreError::Domain(DomainError::invariant("profile service offline")))
        }
    }

    async fn enqueue(store: &InMemoryExportStore, n: usize, format: ExportFormat) -> Vec<DataExportRequest> {
        let mut out = Vec::new();
        for i in 0..n {
            let req = DataExportRequest::new(
                TenantId::new(),
                UserId::new(),
                format,
                Utc::now() - chrono::Duration::seconds((n - i) as i64),
            );
            store.insert(&req).await.unwrap();
            out.push(req);
        }
        out
    }

    #[tokio::test]
    async fn batch_completes_with_data_url() {
        let store = Arc::new(InMemoryExportStore::new());
        let reqs = enqueue(&store, 1, ExportFormat::Csv).await;
        let worker = ExportWorker::new(store.clone(), Arc::new(FixedSource));

        let report = worker.run_once(Utc::now()).await.unwrap();
        assert_eq!(report, BatchReport { claimed: 1, completed: 1, failed: 0, stalled: 0 });

        let done = store.get(reqs[0].tenant_id, reqs[0].id).await.unwrap().unwrap();
        assert_eq!(done.status, ExportStatus::Completed);
        let (mime, bytes) = decode_data_url(done.download_url.as_deref().unwrap()).unwrap();
        assert_eq!(mime, "text/csv");
        assert!(String::from_utf8(bytes).unwrap().contains("me@shop.test"));
        assert!(done.expires_at.unwrap() > done.completed_at.unwrap());
    }

    #[tokio::test]
    async fn batch_size_bounds_each_run() {
        let store = Arc::new(InMemoryExportStore::new());
        enqueue(&store, 7, ExportFormat::Json).await;
        let worker = ExportWorker::new(store.clone(), Arc::new(FixedSource));

        assert_eq!(worker.run_once(Utc::now()).await.unwrap().completed, 5);
        assert_eq!(worker.run_once(Utc::now()).await.unwrap().completed, 2);
        assert_eq!(worker.run_once(Utc::now()).await.unwrap().claimed, 0);
    }

    #[tokio::test]
    async fn source_errors_mark_request_failed() {
        let store = Arc::new(InMemoryExportStore::new());
        let reqs = enqueue(&store, 1, ExportFormat::Pdf).await;
        let worker = ExportWorker::new(store.clone(), Arc::new(BrokenSource));

        let report = worker.run_once(Utc::now()).await.unwrap();
        assert_eq!(report.failed, 1);

        let failed = store.get(reqs[0].tenant_id, reqs[0].id).await.unwrap().unwrap();
        assert_eq!(failed.status, ExportStatus::Failed);
        assert!(failed.failure_reason.unwrap().contains("profile service offline"));
        assert!(failed.download_url.is_none());
    }

    /// Accepts claims but refuses to store results while `broken` is set.
    struct ReadOnlyStore {
        inner: InMemoryExportStore,
        broken: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl ExportRequestStore for ReadOnlyStore {
        async fn insert(&self, request: &DataExportRequest) -> Result<(), StoreError> {
            self.inner.insert(request).await
        }
        async fn get(&self, tenant_id: TenantId, id: bazaar_core::ExportRequestId) -> Result<Option<DataExportRequest>, StoreError> {
            self.inner.get(tenant_id, id).await
        }
        async fn list_for_user(&self, tenant_id: TenantId, user_id: UserId) -> Result<Vec<DataExportRequest>, StoreError> {
            self.inner.list_for_user(tenant_id, user_id).await
        }
        async fn claim_pending(&self, limit: usize, now: DateTime<Utc>) -> Result<Vec<DataExportRequest>, StoreError> {
            self.inner.claim_pending(limit, now).await
        }
        async fn save(&self, request: &DataExportRequest) -> Result<(), StoreError> {
            if self.broken.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(StoreError::backend("disk full"));
            }
            self.inner.save(request).await
        }
        async fn fail_stalled(&self, started_before: DateTime<Utc>, now: DateTime<Utc>) -> Result<u64, StoreError> {
            self.inner.fail_stalled(started_before, now).await
        }
        async fn expire_due(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
            self.inner.expire_due(now).await
        }
        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
        fn backend(&self) -> &'static str {
            "memory"
        }
    }

    #[tokio::test]
    async fn unsaved_results_are_failed_after_processing_timeout() {
        let store = Arc::new(ReadOnlyStore {
            inner: InMemoryExportStore::new(),
            broken: std::sync::atomic::AtomicBool::new(true),
        });
        let (t, u, now) = (TenantId::new(), UserId::new(), Utc::now());
        let req = DataExportRequest::new(t, u, ExportFormat::Json, now);
        store.insert(&req).await.unwrap();
        let worker = ExportWorker::new(store.clone(), Arc::new(FixedSource))
            .with_processing_timeout(chrono::Duration::minutes(10));

        let report = worker.run_once(now).await.unwrap();
        assert_eq!((report.claimed, report.completed, report.failed), (1, 0, 1));
        let stuck = store.get(t, req.id).await.unwrap().unwrap();
        assert_eq!(stuck.status, ExportStatus::Processing);
        assert!(store.insert(&DataExportRequest::new(t, u, ExportFormat::Csv, now)).await.is_err());

        store.broken.store(false, std::sync::atomic::Ordering::SeqCst);
        assert_eq!(worker.run_once(now + chrono::Duration::minutes(5)).await.unwrap().stalled, 0);
        let report = worker.run_once(now + chrono::Duration::minutes(10)).await.unwrap();
        assert_eq!(report.stalled, 1);

        let failed = store.get(t, req.id).await.unwrap().unwrap();
        assert_eq!(failed.status, ExportStatus::Failed);
        assert_eq!(failed.failure_reason.as_deref(), Some(crate::exports::STALLED_REASON));
        store
            .insert(&DataExportRequest::new(t, u, ExportFormat::Csv, now + chrono::Duration::minutes(10)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn expiry_drops_download_after_ttl() {
        let store = Arc::new(InMemoryExportStore::new());
        let reqs = enqueue(&store, 1, ExportFormat::Json).await;
        let worker = ExportWorker::new(store.clone(), Arc::new(FixedSource)).with_ttl(chrono::Duration::days(7));
        let now = Utc::now();
        worker.run_once(now).await.unwrap();

        assert_eq!(worker.expire_stale(now + chrono::Duration::days(6)).await.unwrap(), 0);
        assert_eq!(worker.expire_stale(now + chrono::Duration::days(7)).await.unwrap(), 1);

        let expired = store.get(reqs[0].tenant_id, reqs[0].id).await.unwrap().unwrap();
        assert_eq!(expired.status, ExportStatus::Expired);
        assert!(expired.download_url.is_none());
    }

    #[tokio::test]
    async fn spawned_worker_processes_and_stops() {
        let store = Arc::new(InMemoryExportStore::new());
        let reqs = enqueue(&store, 2, ExportFormat::Json).await;
        let worker = Arc::new(ExportWorker::new(store.clone(), Arc::new(FixedSource)));

        let handle = worker.spawn(Duration::from_millis(10));
        for _ in 0..100 {
            if handle.stats().exports_completed == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(handle.stats().exports_completed, 2);
        handle.shutdown().await;

        let done = store.get(reqs[1].tenant_id, reqs[1].id).await.unwrap().unwrap();
        assert_eq!(done.status, ExportStatus::Completed);
    }
}
