use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use folio_rate_limit_contracts::{
    RateLimitDecision, RateLimitEntry, RateLimitPolicy, RateLimitStore,
};
use tokio::sync::Mutex;
use tracing::trace;

/// Process local [`RateLimitStore`].
///
/// Counters are lost when the process exits, which only resets every client to
/// a fresh window.
#[derive(Debug, Clone, Default)]
pub struct MemoryRateLimitStore {
    entries: Arc<Mutex<HashMap<String, RateLimitEntry>>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn get(&self, key: &str) -> Option<RateLimitEntry> {
        self.entries.lock().await.get(key).copied()
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    async fn hit(
        &self,
        key: &str,
        now: DateTime<Utc>,
        policy: RateLimitPolicy,
    ) -> anyhow::Result<RateLimitDecision> {
        let mut entries = self.entries.lock().await;

        if let Some(entry) = entries.get_mut(key) {
            if !entry.is_expired(now) {
                return Ok(entry.hit(policy));
            }
            trace!(key, "discarding expired rate limit window");
        }

        let (entry, decision) = RateLimitEntry::open(now, policy);
        entries.insert(key.to_owned(), entry);
        Ok(decision)
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn sweep(&self, now: DateTime<Utc>) -> anyhow::Result<usize> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        Ok(before - entries.len())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    const POLICY: RateLimitPolicy = RateLimitPolicy {
        max_requests: 5,
        window: Duration::from_secs(3600),
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn limits_after_max_requests() {
        // Arrange
        let sut = MemoryRateLimitStore::new();

        // Act
        let mut decisions = Vec::new();
        for _ in 0..6 {
            decisions.push(sut.hit("1.2.3.4", now(), POLICY).await.unwrap());
        }

        // Assert
        assert!(decisions[..5].iter().all(RateLimitDecision::is_allowed));
        assert!(!decisions[5].is_allowed());
        assert_eq!(sut.get("1.2.3.4").await.unwrap().count, 5);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        // Arrange
        let sut = MemoryRateLimitStore::new();
        for _ in 0..5 {
            sut.hit("1.2.3.4", now(), POLICY).await.unwrap();
        }

        // Act
        let result = sut.hit("5.6.7.8", now(), POLICY).await.unwrap();

        // Assert
        assert!(result.is_allowed());
    }

    #[tokio::test]
    async fn expired_window_starts_fresh() {
        // Arrange
        let sut = MemoryRateLimitStore::new();
        for _ in 0..6 {
            sut.hit("1.2.3.4", now(), POLICY).await.unwrap();
        }
        let later = now() + POLICY.window + Duration::from_secs(1);

        // Act
        let result = sut.hit("1.2.3.4", later, POLICY).await.unwrap();

        // Assert
        assert!(result.is_allowed());
        assert_eq!(
            sut.get("1.2.3.4").await.unwrap(),
            RateLimitEntry {
                count: 1,
                reset_time: later + POLICY.window
            }
        );
    }

    #[tokio::test]
    async fn remove() {
        // Arrange
        let sut = MemoryRateLimitStore::new();
        for _ in 0..6 {
            sut.hit("1.2.3.4", now(), POLICY).await.unwrap();
        }

        // Act
        sut.remove("1.2.3.4").await.unwrap();
        sut.remove("unknown").await.unwrap();

        // Assert
        assert!(sut.hit("1.2.3.4", now(), POLICY).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn sweep_is_idempotent() {
        // Arrange
        let sut = MemoryRateLimitStore::new();
        sut.hit("old", now(), POLICY).await.unwrap();
        let later = now() + POLICY.window + Duration::from_secs(1);
        sut.hit("new", later, POLICY).await.unwrap();

        // Act
        let first = sut.sweep(later).await.unwrap();
        let second = sut.sweep(later).await.unwrap();

        // Assert
        assert_eq!(first, 1);
        assert_eq!(second, 0);
        assert_eq!(sut.len().await, 1);
        assert!(sut.get("old").await.is_none());
        assert!(!sut.get("new").await.unwrap().is_expired(later));
    }

    #[tokio::test]
    async fn concurrent_hits_never_exceed_max() {
        // Arrange
        let sut = MemoryRateLimitStore::new();

        // Act
        let results = futures::future::join_all((0..50).map(|_| {
            let sut = sut.clone();
            tokio::spawn(async move { sut.hit("1.2.3.4", now(), POLICY).await.unwrap() })
        }))
        .await;

        // Assert
        let allowed = results
            .into_iter()
            .map(Result::unwrap)
            .filter(RateLimitDecision::is_allowed)
            .count();
        assert_eq!(allowed, 5);
    }
}
