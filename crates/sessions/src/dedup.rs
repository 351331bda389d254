use {async_trait::async_trait, dashmap::DashSet};

use crate::Result;

/// Idempotency guard keyed by platform message id.
///
/// Membership only grows; nothing is evicted during normal operation.
#[async_trait]
pub trait DedupCache: Send + Sync {
    /// Record `msg_id` and return `true` if it was not seen before.
    ///
    /// Check and record happen atomically, so two concurrent deliveries of
    /// the same id never both observe `true`.
    async fn check_and_record(&self, msg_id: &str) -> Result<bool>;

    async fn contains(&self, msg_id: &str) -> Result<bool>;

    async fn len(&self) -> Result<usize>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}

#[derive(Debug, Default)]
pub struct MemoryDedupCache {
    seen: DashSet<String>,
}

impl MemoryDedupCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DedupCache for MemoryDedupCache {
    async fn check_and_record(&self, msg_id: &str) -> Result<bool> {
        Ok(self.seen.insert(msg_id.to_string()))
    }

    async fn contains(&self, msg_id: &str) -> Result<bool> {
        Ok(self.seen.contains(msg_id))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.seen.len())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, std::sync::Arc};

    #[tokio::test]
    async fn first_delivery_wins() {
        let cache = MemoryDedupCache::new();
        assert!(cache.check_and_record("om_1").await.unwrap());
        assert!(!cache.check_and_record("om_1").await.unwrap());
        assert!(cache.contains("om_1").await.unwrap());
        assert!(!cache.contains("om_2").await.unwrap());
        assert_eq!(cache.len().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_redelivery_admits_exactly_one() {
        let cache = Arc::new(MemoryDedupCache::new());
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.check_and_record("om_dup").await.unwrap() })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 1);
    }
}
