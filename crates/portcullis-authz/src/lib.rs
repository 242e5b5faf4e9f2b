//! Authorization engine for the portcullis bastion.
//!
//! # Purpose
//! Decides, at connection time, whether a user may perform an action through
//! a target-secret binding: transitive group resolution over `g1`/`g2`
//! grouping rules, permission matching over `p` rules, activity checks on
//! the whole binding chain, and a bounded TTL cache over repeated decisions.
//!
//! # How it fits
//! A connection gateway calls [`AuthzEngine::authorize`] with the ids it
//! extracted from the session; the identity and rule stores behind the engine
//! are external collaborators reached through the traits in [`store`].
//!
//! # Key invariants
//! - Fail-closed: missing or deactivated records deny; no policy lookup can
//!   override a deactivation.
//! - Permissions are additive. There is no deny rule type; absence of a
//!   matching rule is the only deny path.
//! - Store unavailability is an error, never a silent Deny.
//!
//! # Important configuration
//! - [`EngineConfig::decision_ttl`] is the bounded staleness window for
//!   cached decisions (default 5 s). Mutations through the engine invalidate
//!   immediately.
//!
//! # Examples
//! ```rust,no_run
//! use portcullis_authz::{AuthzEngine, EngineConfig, MemoryDirectory};
//!
//! # async fn demo() -> portcullis_authz::AuthzResult<()> {
//! let directory = MemoryDirectory::new();
//! let engine = AuthzEngine::new(directory.clone(), directory, EngineConfig::default());
//! let decision = engine.authorize("user-id", "binding-id", "exec").await?;
//! assert!(!decision.allow);
//! # Ok(())
//! # }
//! ```
//!
//! # Common pitfalls
//! - Authorizing against a target or secret id; the binding id is the unit
//!   of resource identity.
//! - Mutating rules behind the engine's back: the cache only self-heals
//!   after the TTL window.

mod cache;
mod config;
mod constraint;
mod engine;
mod errors;
mod matcher;
mod memory;
mod resolver;
mod store;

pub use config::{EngineConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_DECISION_TTL};
pub use constraint::{
    in_window, ip_in_range, AccessContext, Constraint, ConstraintError, DailyTime, IpPolicy,
};
pub use engine::{
    AuthDecision, AuthzEngine, REASON_ALLOWED, REASON_INACTIVE_RESOURCE, REASON_INACTIVE_USER,
    REASON_NOT_FOUND, REASON_NO_MATCHING_POLICY,
};
pub use errors::{AuthzError, AuthzResult};
pub use matcher::PolicyIndex;
pub use memory::MemoryDirectory;
pub use resolver::{resolve_groups, GroupGraph};
pub use store::{IdentityStore, RuleStore, StoreError, StoreResult};
