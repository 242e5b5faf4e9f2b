//! Store seams the engine reads through.
//!
//! # Purpose
//! The identity store holds users, targets, secrets, and target-secret
//! bindings; the rule store holds grouping and permission rules. Both are
//! external collaborators behind async traits so the engine never depends on
//! a concrete backend.
//!
//! # Error semantics
//! "Not found" is the `None` arm of a lookup, not an error. `Unavailable`
//! covers transient infrastructure failure and always propagates to the
//! caller — deciding whether to fail closed on infrastructure failure is the
//! caller's call, not the engine's.
use async_trait::async_trait;
use portcullis_model::{PolicyRule, Secret, Target, TargetSecret, User};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Lookup surface over the bastion directory. Implementations filter nothing;
/// activity checks belong to the engine.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn get_user(&self, id: &str) -> StoreResult<Option<User>>;
    async fn get_target(&self, id: &str) -> StoreResult<Option<Target>>;
    async fn get_secret(&self, id: &str) -> StoreResult<Option<Secret>>;
    async fn get_target_secret(&self, id: &str) -> StoreResult<Option<TargetSecret>>;
}

/// Persistence surface for policy rules.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Full scan of one rule type, optionally narrowed to rows whose `v0`
    /// equals `member`.
    async fn list_rules(&self, ptype: &str, member: Option<&str>)
        -> StoreResult<Vec<PolicyRule>>;
    /// Insert or replace a rule by id. Administrative, low-frequency.
    async fn put_rule(&self, rule: PolicyRule) -> StoreResult<()>;
    /// Remove a rule by id; returns whether a row existed.
    async fn delete_rule(&self, id: &str) -> StoreResult<bool>;
}
