//! The authorization engine: single decision API over the two stores.
//!
//! # Purpose and responsibility
//! Orchestrates one connection-time decision: activity checks on the binding
//! chain, transitive group resolution for subject and resource, permission
//! matching, and decision caching.
//!
//! # Key invariants and assumptions
//! - Fail-closed: a missing or deactivated binding, target, secret, or user
//!   denies immediately; group and policy evaluation is skipped.
//! - Stateless per call: resolution and matching are pure reads over a
//!   snapshot fetched per call. The decision cache is the only shared
//!   mutable structure, and it is owned by the instance.
//! - Rule mutations through the engine publish cache invalidation before
//!   returning success.
//!
//! # Security considerations
//! - `StoreUnavailable` is an error, never a Deny; callers decide the
//!   fail-closed posture for infrastructure failure.
//! - Dangling rule references match nothing and are harmless.
use crate::cache::{DecisionCache, DecisionKey};
use crate::config::EngineConfig;
use crate::constraint::AccessContext;
use crate::errors::AuthzResult;
use crate::matcher::PolicyIndex;
use crate::resolver::resolve_groups;
use crate::store::{IdentityStore, RuleStore};
use portcullis_model::{PolicyRule, PTYPE_PERMISSION, PTYPE_RESOURCE_GROUPING, PTYPE_SUBJECT_GROUPING};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

pub const REASON_ALLOWED: &str = "allowed";
pub const REASON_INACTIVE_RESOURCE: &str = "inactive-resource";
pub const REASON_INACTIVE_USER: &str = "inactive-user";
pub const REASON_NOT_FOUND: &str = "resource-not-found";
pub const REASON_NO_MATCHING_POLICY: &str = "no-matching-policy";

/// Outcome of one authorization call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthDecision {
    pub allow: bool,
    pub reason: String,
}

impl AuthDecision {
    pub fn allowed() -> Self {
        Self {
            allow: true,
            reason: REASON_ALLOWED.to_string(),
        }
    }

    pub fn deny(reason: &str) -> Self {
        Self {
            allow: false,
            reason: reason.to_string(),
        }
    }
}

/// Connection-time decision engine over an identity store and a rule store.
///
/// Cheap to clone and safe for many concurrent `authorize` callers; no
/// exclusive lock is held across calls.
pub struct AuthzEngine<I, R> {
    identity: Arc<I>,
    rules: Arc<R>,
    cache: Arc<DecisionCache>,
}

impl<I, R> Clone for AuthzEngine<I, R> {
    fn clone(&self) -> Self {
        Self {
            identity: Arc::clone(&self.identity),
            rules: Arc::clone(&self.rules),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<I, R> AuthzEngine<I, R>
where
    I: IdentityStore,
    R: RuleStore,
{
    pub fn new(identity: I, rules: R, config: EngineConfig) -> Self {
        Self {
            identity: Arc::new(identity),
            rules: Arc::new(rules),
            cache: Arc::new(DecisionCache::new(
                config.decision_ttl,
                config.cache_capacity,
            )),
        }
    }

    /// Decide whether `user_id` may perform `action` through the
    /// target-secret binding `binding_id`, with no caller context.
    pub async fn authorize(
        &self,
        user_id: &str,
        binding_id: &str,
        action: &str,
    ) -> AuthzResult<AuthDecision> {
        self.authorize_with_context(user_id, binding_id, action, &AccessContext::default())
            .await
    }

    /// Decide with caller context (source address), which rule constraints
    /// are evaluated against.
    pub async fn authorize_with_context(
        &self,
        user_id: &str,
        binding_id: &str,
        action: &str,
        ctx: &AccessContext,
    ) -> AuthzResult<AuthDecision> {
        let key: DecisionKey = (
            user_id.to_string(),
            binding_id.to_string(),
            action.to_string(),
            ctx.ip,
        );
        if let Some(hit) = self.cache.get(&key).await {
            debug!(user_id, binding_id, action, allow = hit.allow, "decision cache hit");
            return Ok(hit);
        }

        let decision = self.evaluate(user_id, binding_id, action, ctx).await?;
        debug!(
            user_id,
            binding_id,
            action,
            allow = decision.allow,
            reason = %decision.reason,
            "authorization decided"
        );
        self.cache.insert(key, decision.clone()).await;
        Ok(decision)
    }

    async fn evaluate(
        &self,
        user_id: &str,
        binding_id: &str,
        action: &str,
        ctx: &AccessContext,
    ) -> AuthzResult<AuthDecision> {
        // Activity checks first: a deactivated link anywhere in the binding
        // chain denies without touching rules.
        let Some(binding) = self.identity.get_target_secret(binding_id).await? else {
            return Ok(AuthDecision::deny(REASON_NOT_FOUND));
        };
        if !binding.is_active {
            return Ok(AuthDecision::deny(REASON_INACTIVE_RESOURCE));
        }

        let Some(target) = self.identity.get_target(&binding.target_id).await? else {
            return Ok(AuthDecision::deny(REASON_NOT_FOUND));
        };
        if !target.is_active {
            return Ok(AuthDecision::deny(REASON_INACTIVE_RESOURCE));
        }

        let Some(secret) = self.identity.get_secret(&binding.secret_id).await? else {
            return Ok(AuthDecision::deny(REASON_NOT_FOUND));
        };
        if !secret.is_active {
            return Ok(AuthDecision::deny(REASON_INACTIVE_RESOURCE));
        }

        let Some(user) = self.identity.get_user(user_id).await? else {
            return Ok(AuthDecision::deny(REASON_NOT_FOUND));
        };
        if !user.is_active {
            return Ok(AuthDecision::deny(REASON_INACTIVE_USER));
        }

        let subject_groups =
            resolve_groups(self.rules.as_ref(), user_id, PTYPE_SUBJECT_GROUPING).await?;
        let resource_groups =
            resolve_groups(self.rules.as_ref(), binding_id, PTYPE_RESOURCE_GROUPING).await?;

        let permission_rules = self.rules.list_rules(PTYPE_PERMISSION, None).await?;
        let index = PolicyIndex::build(&permission_rules);

        if index.matches(user_id, &subject_groups, &resource_groups, action, ctx) {
            Ok(AuthDecision::allowed())
        } else {
            Ok(AuthDecision::deny(REASON_NO_MATCHING_POLICY))
        }
    }

    /// Insert or replace a rule, then invalidate cached decisions before
    /// returning. Administrative, low-frequency.
    pub async fn put_rule(&self, rule: PolicyRule) -> AuthzResult<()> {
        self.rules.put_rule(rule).await?;
        self.cache.clear().await;
        Ok(())
    }

    /// Remove a rule by id, then invalidate cached decisions before
    /// returning. Returns whether a rule existed.
    pub async fn delete_rule(&self, id: &str) -> AuthzResult<bool> {
        let existed = self.rules.delete_rule(id).await?;
        self.cache.clear().await;
        Ok(existed)
    }
}
