//! In-memory implementation of the identity and rule stores.
//!
//! # Purpose
//! Implements both store traits entirely in memory using `HashMap`s guarded
//! by `tokio::sync::RwLock`. It exists for:
//! - local development and tests (no external dependencies)
//! - as the reference backend a durable implementation is checked against
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - **Single-process consistency**: write locks for mutations, read locks
//!   for reads; rule scans see a consistent snapshot per call.
//!
//! # Performance characteristics
//! - Lookups are keyed reads; rule scans are linear in the table, which is
//!   acceptable at in-memory scale. Durable backends should filter by
//!   `ptype` in the query instead.
use crate::store::{IdentityStore, RuleStore, StoreResult};
use async_trait::async_trait;
use portcullis_model::{PolicyRule, Secret, Target, TargetSecret, User};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory bastion directory. Cloning shares the underlying maps, so one
/// instance can back both store seams of an engine and be mutated from tests.
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    users: Arc<RwLock<HashMap<String, User>>>,
    targets: Arc<RwLock<HashMap<String, Target>>>,
    secrets: Arc<RwLock<HashMap<String, Secret>>>,
    bindings: Arc<RwLock<HashMap<String, TargetSecret>>>,
    rules: Arc<RwLock<HashMap<String, PolicyRule>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }

    pub async fn insert_target(&self, target: Target) {
        self.targets.write().await.insert(target.id.clone(), target);
    }

    pub async fn insert_secret(&self, secret: Secret) {
        self.secrets.write().await.insert(secret.id.clone(), secret);
    }

    pub async fn insert_binding(&self, binding: TargetSecret) {
        self.bindings
            .write()
            .await
            .insert(binding.id.clone(), binding);
    }

    /// Bulk seed for fixtures; upserts by rule id.
    pub async fn seed_rules(&self, rules: impl IntoIterator<Item = PolicyRule>) {
        let mut table = self.rules.write().await;
        for rule in rules {
            table.insert(rule.id.clone(), rule);
        }
    }

    pub async fn rule_count(&self) -> usize {
        self.rules.read().await.len()
    }
}

#[async_trait]
impl IdentityStore for MemoryDirectory {
    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn get_target(&self, id: &str) -> StoreResult<Option<Target>> {
        Ok(self.targets.read().await.get(id).cloned())
    }

    async fn get_secret(&self, id: &str) -> StoreResult<Option<Secret>> {
        Ok(self.secrets.read().await.get(id).cloned())
    }

    async fn get_target_secret(&self, id: &str) -> StoreResult<Option<TargetSecret>> {
        Ok(self.bindings.read().await.get(id).cloned())
    }
}

#[async_trait]
impl RuleStore for MemoryDirectory {
    async fn list_rules(
        &self,
        ptype: &str,
        member: Option<&str>,
    ) -> StoreResult<Vec<PolicyRule>> {
        let table = self.rules.read().await;
        Ok(table
            .values()
            .filter(|rule| rule.ptype == ptype)
            .filter(|rule| member.map_or(true, |m| rule.v0 == m))
            .cloned()
            .collect())
    }

    async fn put_rule(&self, rule: PolicyRule) -> StoreResult<()> {
        self.rules.write().await.insert(rule.id.clone(), rule);
        Ok(())
    }

    async fn delete_rule(&self, id: &str) -> StoreResult<bool> {
        Ok(self.rules.write().await.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portcullis_model::PTYPE_SUBJECT_GROUPING;

    #[tokio::test]
    async fn lookups_miss_as_none() {
        let directory = MemoryDirectory::new();
        assert!(directory.get_user("nope").await.unwrap().is_none());
        assert!(directory.get_target_secret("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rules_scan_by_ptype_and_member() {
        let directory = MemoryDirectory::new();
        directory
            .seed_rules([
                PolicyRule::subject_grouping("u1", "login_group", "admin"),
                PolicyRule::subject_grouping("u2", "login_group", "admin"),
                PolicyRule::permission("u1", "apple", "exec", "admin"),
            ])
            .await;

        let g1 = directory
            .list_rules(PTYPE_SUBJECT_GROUPING, None)
            .await
            .unwrap();
        assert_eq!(g1.len(), 2);

        let u1 = directory
            .list_rules(PTYPE_SUBJECT_GROUPING, Some("u1"))
            .await
            .unwrap();
        assert_eq!(u1.len(), 1);
        assert_eq!(u1[0].v1, "login_group");
    }

    #[tokio::test]
    async fn put_upserts_and_delete_reports_presence() {
        let directory = MemoryDirectory::new();
        let rule = PolicyRule::permission("u1", "apple", "exec", "admin");
        let id = rule.id.clone();

        directory.put_rule(rule.clone()).await.unwrap();
        let mut updated = rule;
        updated.v2 = "shell".to_string();
        directory.put_rule(updated).await.unwrap();
        assert_eq!(directory.rule_count().await, 1);

        assert!(directory.delete_rule(&id).await.unwrap());
        assert!(!directory.delete_rule(&id).await.unwrap());
    }
}
