use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{CampaignId, DomainError, DomainResult, TenantId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Sending,
    Sent,
}

impl CampaignStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Scheduled => "scheduled",
            CampaignStatus::Sending => "sending",
            CampaignStatus::Sent => "sent",
        }
    }
}

/// Fields supplied when creating a campaign.
#[derive(Debug, Clone, Deserialize)]
pub struct CampaignDraft {
    pub name: String,
    pub subject: String,
    pub body_template: String,
}

/// Partial edit; `None` keeps the current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampaignUpdate {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub body_template: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub tenant_id: TenantId,
    pub name: String,
    pub subject: String,
    pub body_template: String,
    pub status: CampaignStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub recipients_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn require_text(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        Err(DomainError::validation(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

impl Campaign {
    pub fn create(tenant_id: TenantId, draft: CampaignDraft, now: DateTime<Utc>) -> DomainResult<Self> {
        require_text("name", &draft.name)?;
        require_text("subject", &draft.subject)?;
        require_text("body_template", &draft.body_template)?;
        Ok(Self {
            id: CampaignId::new(),
            tenant_id,
            name: draft.name,
            subject: draft.subject,
            body_template: draft.body_template,
            status: CampaignStatus::Draft,
            scheduled_at: None,
            sent_at: None,
            recipients_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    fn require_status(&self, allowed: &[CampaignStatus], action: &str) -> DomainResult<()> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(DomainError::invariant(format!(
                "cannot {action} a {} campaign",
                self.status.as_str()
            )))
        }
    }

    pub fn update(&mut self, update: CampaignUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        self.require_status(&[CampaignStatus::Draft, CampaignStatus::Scheduled], "edit")?;
        if let Some(name) = update.name {
            require_text("name", &name)?;
            self.name = name;
        }
        if let Some(subject) = update.subject {
            require_text("subject", &subject)?;
            self.subject = subject;
        }
        if let Some(body) = update.body_template {
            require_text("body_template", &body)?;
            self.body_template = body;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn schedule(&mut self, at: DateTime<Utc>, now: DateTime<Utc>) -> DomainResult<()> {
        self.require_status(&[CampaignStatus::Draft], "schedule")?;
        if at <= now {
            return Err(DomainError::validation("scheduled time must be in the future"));
        }
        self.status = CampaignStatus::Scheduled;
        self.scheduled_at = Some(at);
        self.updated_at = now;
        Ok(())
    }

    pub fn unschedule(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.require_status(&[CampaignStatus::Scheduled], "unschedule")?;
        self.status = CampaignStatus::Draft;
        self.scheduled_at = None;
        self.updated_at = now;
        Ok(())
    }

    pub fn begin_sending(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.require_status(&[CampaignStatus::Draft, CampaignStatus::Scheduled], "send")?;
        self.status = CampaignStatus::Sending;
        self.updated_at = now;
        Ok(())
    }

    /// Undo `begin_sending` when nothing was queued: back to scheduled if a
    /// send time was set, otherwise to draft.
    pub fn abort_sending(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.require_status(&[CampaignStatus::Sending], "abort")?;
        self.status = if self.scheduled_at.is_some() {
            CampaignStatus::Scheduled
        } else {
            CampaignStatus::Draft
        };
        self.updated_at = now;
        Ok(())
    }

    pub fn mark_sent(&mut self, recipients: u32, now: DateTime<Utc>) -> DomainResult<()> {
        self.require_status(&[CampaignStatus::Sending], "complete")?;
        self.status = CampaignStatus::Sent;
        self.recipients_count = recipients;
        self.sent_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Only drafts may be deleted.
    pub fn ensure_deletable(&self) -> DomainResult<()> {
        self.require_status(&[CampaignStatus::Draft], "delete")
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == CampaignStatus::Scheduled && self.scheduled_at.is_some_and(|at| at <= now)
    }
}
