use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_core::{CampaignId, TenantId};

use crate::campaign::Campaign;
use crate::template::render_template;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailStatus {
    Pending,
    Sent,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    pub name: String,
}

/// A queued email waiting for the delivery consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEmail {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub campaign_id: Option<CampaignId>,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub status: EmailStatus,
    pub created_at: DateTime<Utc>,
}

/// Render one pending email per recipient. Addresses without an `@` are
/// skipped.
pub fn build_outbox(campaign: &Campaign, recipients: &[Recipient], now: DateTime<Utc>) -> Vec<OutboundEmail> {
    recipients
        .iter()
        .filter(|r| r.email.contains('@'))
        .map(|r| {
            let vars = [("name", r.name.as_str()), ("email", r.email.as_str())];
            OutboundEmail {
                id: Uuid::now_v7(),
                tenant_id: campaign.tenant_id,
                campaign_id: Some(campaign.id),
                to: r.email.clone(),
                subject: render_template(&campaign.subject, &vars),
                body: render_template(&campaign.body_template, &vars),
                status: EmailStatus::Pending,
                created_at: now,
            }
        })
        .collect()
}
