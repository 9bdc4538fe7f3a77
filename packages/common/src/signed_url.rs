use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

use crate::store::StoreError;

/// Issues time-limited URLs for objects in a storage bucket.
#[async_trait]
pub trait SignedUrlIssuer: Send + Sync {
    /// Returns `None` when the object does not exist or may not be shared.
    async fn issue(
        &self,
        bucket: &str,
        path: &str,
        ttl: Duration,
    ) -> Result<Option<String>, StoreError>;
}

#[derive(Debug, Clone)]
struct CachedUrl {
    url: String,
    expires_at: Instant,
}

/// Per-owner cache of signed URLs keyed by `bucket/path`.
///
/// Entries expire `safety_margin` before the URL itself does, so a cached URL
/// is never handed out after it stopped working.
#[derive(Debug)]
pub struct SignedUrlCache {
    ttl: Duration,
    safety_margin: Duration,
    entries: HashMap<String, CachedUrl>,
}

impl SignedUrlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            safety_margin: Duration::from_secs(60).min(ttl / 2),
            entries: HashMap::new(),
        }
    }

    pub fn key(bucket: &str, path: &str) -> String {
        format!("{bucket}/{path}")
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .filter(|cached| cached.expires_at > Instant::now())
            .map(|cached| cached.url.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, url: impl Into<String>) {
        let expires_at = Instant::now() + self.ttl.saturating_sub(self.safety_margin);
        self.entries.insert(
            key.into(),
            CachedUrl {
                url: url.into(),
                expires_at,
            },
        );
    }

    pub fn invalidate(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, cached| cached.expires_at > now);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serve from cache, or issue a fresh URL and remember it.
    pub async fn get_or_issue(
        &mut self,
        issuer: &dyn SignedUrlIssuer,
        bucket: &str,
        path: &str,
    ) -> Result<Option<String>, StoreError> {
        let key = Self::key(bucket, path);
        if let Some(url) = self.get(&key) {
            return Ok(Some(url.to_string()));
        }

        debug!(bucket, path, "Issuing signed URL");
        let issued = issuer.issue(bucket, path, self.ttl).await?;
        if let Some(ref url) = issued {
            self.set(key, url.clone());
        }
        Ok(issued)
    }
}
