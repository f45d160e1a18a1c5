//! Shared-secret check for cron-triggered endpoints.

use sha2::{Digest, Sha256};

/// Secret expected in the cron header.
///
/// Comparison is done on SHA-256 digests so the time taken does not depend on
/// how many leading bytes of the presented value match.
#[derive(Clone)]
pub struct CronSecret {
    digest: Option<[u8; 32]>,
}

impl CronSecret {
    /// An empty secret disables every cron endpoint.
    pub fn new(secret: impl AsRef<str>) -> Self {
        let secret = secret.as_ref();
        let digest = if secret.is_empty() {
            None
        } else {
            Some(Sha256::digest(secret.as_bytes()).into())
        };
        Self { digest }
    }

    pub fn is_configured(&self) -> bool {
        self.digest.is_some()
    }

    pub fn verify(&self, presented: &str) -> bool {
        let Some(expected) = self.digest else {
            return false;
        };
        let actual: [u8; 32] = Sha256::digest(presented.as_bytes()).into();
        expected
            .iter()
            .zip(actual.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl core::fmt::Debug for CronSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CronSecret")
            .field("configured", &self.is_configured())
            .finish()
    }
}
