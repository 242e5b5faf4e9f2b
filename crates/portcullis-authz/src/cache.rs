//! Bounded TTL cache for authorization decisions.
//!
//! Owned by an engine instance, never process-global, so parallel engines
//! (tests included) share no hidden state. The client IP is part of the key
//! because rule constraints make decisions IP-dependent; two callers behind
//! different addresses must never share an entry.
use crate::engine::AuthDecision;
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub(crate) type DecisionKey = (String, String, String, Option<IpAddr>);

struct CachedDecision {
    decision: AuthDecision,
    inserted_at: Instant,
}

pub(crate) struct DecisionCache {
    ttl: Duration,
    capacity: usize,
    entries: RwLock<HashMap<DecisionKey, CachedDecision>>,
}

impl DecisionCache {
    pub(crate) fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) async fn get(&self, key: &DecisionKey) -> Option<AuthDecision> {
        let entries = self.entries.read().await;
        let cached = entries.get(key)?;
        if cached.inserted_at.elapsed() >= self.ttl {
            return None;
        }
        Some(cached.decision.clone())
    }

    /// Expired entries are evicted before insertion; if the table is still
    /// full the write is skipped rather than evicting live entries.
    pub(crate) async fn insert(&self, key: DecisionKey, decision: AuthDecision) {
        let mut entries = self.entries.write().await;
        if entries.len() >= self.capacity {
            let ttl = self.ttl;
            entries.retain(|_, cached| cached.inserted_at.elapsed() < ttl);
            if entries.len() >= self.capacity {
                return;
            }
        }
        entries.insert(
            key,
            CachedDecision {
                decision,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Full invalidation, published before a rule mutation returns.
    pub(crate) async fn clear(&self) {
        self.entries.write().await.clear();
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::REASON_NO_MATCHING_POLICY;

    fn key(user: &str) -> DecisionKey {
        (
            user.to_string(),
            "b1".to_string(),
            "exec".to_string(),
            None,
        )
    }

    #[tokio::test]
    async fn hit_within_ttl_miss_after() {
        let cache = DecisionCache::new(Duration::from_secs(60), 16);
        cache.insert(key("u1"), AuthDecision::allowed()).await;
        assert!(cache.get(&key("u1")).await.unwrap().allow);

        let expired = DecisionCache::new(Duration::ZERO, 16);
        expired.insert(key("u1"), AuthDecision::allowed()).await;
        assert!(expired.get(&key("u1")).await.is_none());
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let cache = DecisionCache::new(Duration::from_secs(60), 16);
        cache.insert(key("u1"), AuthDecision::allowed()).await;
        cache
            .insert(key("u2"), AuthDecision::deny(REASON_NO_MATCHING_POLICY))
            .await;
        assert_eq!(cache.len().await, 2);
        cache.clear().await;
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn full_cache_skips_writes_but_evicts_expired() {
        let cache = DecisionCache::new(Duration::from_secs(60), 1);
        cache.insert(key("u1"), AuthDecision::allowed()).await;
        cache.insert(key("u2"), AuthDecision::allowed()).await;
        assert_eq!(cache.len().await, 1);
        assert!(cache.get(&key("u2")).await.is_none());

        let expiring = DecisionCache::new(Duration::ZERO, 1);
        expiring.insert(key("u1"), AuthDecision::allowed()).await;
        expiring.insert(key("u2"), AuthDecision::allowed()).await;
        assert_eq!(expiring.len().await, 1);
    }
}
