//! Per-tenant user profiles: contact details and marketing consent.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, TenantId, UserId};
use bazaar_campaigns::Recipient;

use crate::error::StoreError;
use crate::read_model::{InMemoryTenantStore, TenantStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub marketing_opt_in: bool,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    fn blank(tenant_id: TenantId, user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            tenant_id,
            user_id,
            email: None,
            display_name: None,
            marketing_opt_in: false,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub marketing_opt_in: Option<bool>,
}

pub struct ProfileDirectory {
    store: Arc<dyn TenantStore<UserId, UserProfile>>,
}

impl Default for ProfileDirectory {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryTenantStore::new()))
    }
}

impl ProfileDirectory {
    pub fn new(store: Arc<dyn TenantStore<UserId, UserProfile>>) -> Self {
        Self { store }
    }

    /// The stored profile, or an empty one for users who never saved theirs.
    pub fn get(&self, tenant_id: TenantId, user_id: UserId, now: DateTime<Utc>) -> Result<UserProfile, StoreError> {
        Ok(self
            .store
            .get(tenant_id, &user_id)?
            .unwrap_or_else(|| UserProfile::blank(tenant_id, user_id, now)))
    }

    pub fn update(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        update: ProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, StoreError> {
        let email = match update.email {
            Some(email) => {
                let email = email.trim().to_string();
                if !email.contains('@') {
                    return Err(DomainError::validation("email must contain '@'").into());
                }
                Some(email)
            }
            None => None,
        };
        let display_name = update
            .display_name
            .map(|name| Some(name.trim().to_string()).filter(|n| !n.is_empty()));

        self.store.modify_or_insert(
            tenant_id,
            user_id,
            UserProfile::blank(tenant_id, user_id, now),
            &mut |profile| {
                if let Some(email) = &email {
                    profile.email = Some(email.clone());
                }
                if let Some(name) = &display_name {
                    profile.display_name = name.clone();
                }
                if let Some(opt_in) = update.marketing_opt_in {
                    profile.marketing_opt_in = opt_in;
                }
                profile.updated_at = now;
                Ok(())
            },
        )
    }

    /// Opted-in users with an email address.
    pub fn campaign_recipients(&self, tenant_id: TenantId) -> Result<Vec<Recipient>, StoreError> {
        let mut recipients: Vec<Recipient> = self
            .store
            .list(tenant_id)?
            .into_iter()
            .filter(|p| p.marketing_opt_in)
            .filter_map(|p| {
                let email = p.email?;
                let name = p.display_name.unwrap_or_else(|| email.clone());
                Some(Recipient { email, name })
            })
            .collect();
        recipients.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(recipients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_opted_in_profiles_receive_campaigns() {
        let dir = ProfileDirectory::default();
        let tenant = TenantId::new();
        let now = Utc::now();
        let (a, b) = (UserId::new(), UserId::new());

        dir.update(
            tenant,
            a,
            ProfileUpdate {
                email: Some("ann@shop.test".into()),
                display_name: Some("Ann".into()),
                marketing_opt_in: Some(true),
            },
            now,
        )
        .unwrap();
        dir.update(
            tenant,
            b,
            ProfileUpdate {
                email: Some("bob@shop.test".into()),
                ..Default::default()
            },
            now,
        )
        .unwrap();

        let recipients = dir.campaign_recipients(tenant).unwrap();
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].name, "Ann");
        assert!(dir.campaign_recipients(TenantId::new()).unwrap().is_empty());
    }

    #[test]
    fn concurrent_partial_updates_keep_each_field() {
        let dir = ProfileDirectory::default();
        let (tenant, user) = (TenantId::new(), UserId::new());

        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..200 {
                    let update = ProfileUpdate { email: Some(format!("u{i}@shop.test")), ..Default::default() };
                    dir.update(tenant, user, update, Utc::now()).unwrap();
                }
            });
            s.spawn(|| {
                for i in 0..200 {
                    let update = ProfileUpdate { display_name: Some(format!("User {i}")), ..Default::default() };
                    dir.update(tenant, user, update, Utc::now()).unwrap();
                }
            });
        });

        let profile = dir.get(tenant, user, Utc::now()).unwrap();
        assert_eq!(profile.email.as_deref(), Some("u199@shop.test"));
        assert_eq!(profile.display_name.as_deref(), Some("User 199"));
    }

    #[test]
    fn invalid_email_is_rejected() {
        let dir = ProfileDirectory::default();
        let res = dir.update(
            TenantId::new(),
            UserId::new(),
            ProfileUpdate {
                email: Some("nope".into()),
                ..Default::default()
            },
            Utc::now(),
        );
        assert!(matches!(res, Err(StoreError::Domain(DomainError::Validation(_)))));
    }
}
