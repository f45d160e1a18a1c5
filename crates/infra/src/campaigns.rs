//! Email campaign administration, the outbox and due-campaign dispatch.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use bazaar_campaigns::{Campaign, CampaignDraft, CampaignUpdate, OutboundEmail, build_outbox};
use bazaar_core::{CampaignId, DomainError, TenantId};

use crate::error::StoreError;
use crate::profiles::ProfileDirectory;
use crate::read_model::{InMemoryTenantStore, TenantStore};

/// Append-only queue of rendered emails for the delivery consumer.
pub trait Outbox: Send + Sync {
    fn enqueue(&self, emails: Vec<OutboundEmail>) -> Result<usize, StoreError>;
    fn list(&self, tenant_id: TenantId, campaign_id: Option<CampaignId>) -> Result<Vec<OutboundEmail>, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryOutbox {
    rows: RwLock<Vec<OutboundEmail>>,
}

impl Outbox for InMemoryOutbox {
    fn enqueue(&self, emails: Vec<OutboundEmail>) -> Result<usize, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::poisoned())?;
        let n = emails.len();
        rows.extend(emails);
        Ok(n)
    }

    fn list(&self, tenant_id: TenantId, campaign_id: Option<CampaignId>) -> Result<Vec<OutboundEmail>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::poisoned())?;
        Ok(rows
            .iter()
            .filter(|r| r.tenant_id == tenant_id)
            .filter(|r| campaign_id.is_none() || r.campaign_id == campaign_id)
            .cloned()
            .collect())
    }
}

pub struct CampaignService {
    campaigns: Arc<dyn TenantStore<CampaignId, Campaign>>,
    outbox: Arc<dyn Outbox>,
    profiles: Arc<ProfileDirectory>,
}

impl CampaignService {
    pub fn new(profiles: Arc<ProfileDirectory>) -> Self {
        Self {
            campaigns: Arc::new(InMemoryTenantStore::new()),
            outbox: Arc::new(InMemoryOutbox::default()),
            profiles,
        }
    }

    pub fn with_outbox(mut self, outbox: Arc<dyn Outbox>) -> Self {
        self.outbox = outbox;
        self
    }

    pub fn create(&self, tenant_id: TenantId, draft: CampaignDraft, now: DateTime<Utc>) -> Result<Campaign, StoreError> {
        let campaign = Campaign::create(tenant_id, draft, now)?;
        self.campaigns.upsert(tenant_id, campaign.id, campaign.clone())?;
        tracing::info!(tenant_id = %tenant_id, campaign_id = %campaign.id, "campaign created");
        Ok(campaign)
    }

    pub fn get(&self, tenant_id: TenantId, id: CampaignId) -> Result<Campaign, StoreError> {
        self.campaigns
            .get(tenant_id, &id)?
            .ok_or_else(|| DomainError::NotFound.into())
    }

    pub fn list(&self, tenant_id: TenantId) -> Result<Vec<Campaign>, StoreError> {
        let mut campaigns = self.campaigns.list(tenant_id)?;
        campaigns.sort_by_key(|c| std::cmp::Reverse(c.created_at));
        Ok(campaigns)
    }

    pub fn update(&self, tenant_id: TenantId, id: CampaignId, update: CampaignUpdate, now: DateTime<Utc>) -> Result<Campaign, StoreError> {
        self.campaigns
            .modify(tenant_id, &id, &mut |c| c.update(update.clone(), now))
    }

    pub fn schedule(&self, tenant_id: TenantId, id: CampaignId, at: DateTime<Utc>, now: DateTime<Utc>) -> Result<Campaign, StoreError> {
        let campaign = self.campaigns.modify(tenant_id, &id, &mut |c| c.schedule(at, now))?;
        tracing::info!(tenant_id = %tenant_id, campaign_id = %id, scheduled_at = %at, "campaign scheduled");
        Ok(campaign)
    }

    pub fn unschedule(&self, tenant_id: TenantId, id: CampaignId, now: DateTime<Utc>) -> Result<Campaign, StoreError> {
        self.campaigns.modify(tenant_id, &id, &mut |c| c.unschedule(now))
    }

    /// Delete a draft. Anything past draft is kept for the record.
    pub fn delete(&self, tenant_id: TenantId, id: CampaignId) -> Result<(), StoreError> {
        self.get(tenant_id, id)?.ensure_deletable()?;
        self.campaigns.remove(tenant_id, &id)?;
        tracing::info!(tenant_id = %tenant_id, campaign_id = %id, "campaign deleted");
        Ok(())
    }

    /// Queue one email per opted-in recipient and mark the campaign sent.
    pub fn send(&self, tenant_id: TenantId, id: CampaignId, now: DateTime<Utc>) -> Result<Campaign, StoreError> {
        // Claiming the campaign (-> sending) first makes a second sender fail.
        let campaign = self.campaigns.modify(tenant_id, &id, &mut |c| c.begin_sending(now))?;

        let queued = match self.queue_emails(&campaign, now) {
            Ok(queued) => queued,
            Err(e) => {
                tracing::warn!(tenant_id = %tenant_id, campaign_id = %id, error = %e, "campaign send aborted");
                self.campaigns.modify(tenant_id, &id, &mut |c| c.abort_sending(now))?;
                return Err(e);
            }
        };
        let count = u32::try_from(queued).unwrap_or(u32::MAX);

        let sent = self.campaigns.modify(tenant_id, &id, &mut |c| c.mark_sent(count, now))?;
        tracing::info!(tenant_id = %tenant_id, campaign_id = %id, recipients = queued, "campaign sent");
        Ok(sent)
    }

    fn queue_emails(&self, campaign: &Campaign, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let recipients = self.profiles.campaign_recipients(campaign.tenant_id)?;
        self.outbox.enqueue(build_outbox(campaign, &recipients, now))
    }

    pub fn outbox(&self, tenant_id: TenantId, id: CampaignId) -> Result<Vec<OutboundEmail>, StoreError> {
        self.outbox.list(tenant_id, Some(id))
    }

    /// Send every scheduled campaign whose time has come, across tenants.
    /// Returns how many were sent; one failure does not stop the others.
    pub fn dispatch_due(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let due: Vec<Campaign> = self.campaigns.scan()?.into_iter().filter(|c| c.is_due(now)).collect();
        let mut sent = 0;
        for campaign in due {
            match self.send(campaign.tenant_id, campaign.id, now) {
                Ok(_) => sent += 1,
                Err(e) => {
                    tracing::warn!(campaign_id = %campaign.id, error = %e, "scheduled campaign dispatch failed");
                }
            }
        }
        Ok(sent)
    }
}
