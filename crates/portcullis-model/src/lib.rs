//! Record types shared by the portcullis stores and authorization engine.
//!
//! # Purpose
//! Defines the persisted shapes of the bastion directory — users, managed
//! targets, shared secrets, target-secret bindings — and the flat policy-rule
//! row together with its typed view.
//!
//! # How it fits
//! The identity and rule stores persist these records; the authorization
//! engine reads them and never mutates them. The `TargetSecret` binding id is
//! the unit of resource identity for authorization, not the raw target or
//! secret id.
//!
//! # Key invariants
//! - Ids are opaque strings. They are UUID-shaped in practice but never
//!   parsed for structure.
//! - Timestamps are millisecond epoch integers.
//! - `ptype` values are exactly `"g1"`, `"g2"`, and `"p"`.
//! - Records are deactivated (`is_active = false`), never physically deleted.
//!
//! # Common pitfalls
//! - Granting policy against a target or secret id instead of the binding id;
//!   permissions attach to specific (target, secret) pairings.
//! - Treating a malformed rule row as fatal; callers classify rows via
//!   [`PolicyRule::kind`] and skip the ones that fail.

mod action;
mod error;
mod rule;
mod secret;
mod target;
mod user;

pub use action::{ACT_ANY, ACT_DIRECT_TCPIP, ACT_EXEC, ACT_LOGIN, ACT_PTY, ACT_SHELL};
pub use error::ValidateError;
pub use rule::{
    PolicyRule, RuleError, RuleKind, PTYPE_PERMISSION, PTYPE_RESOURCE_GROUPING,
    PTYPE_SUBJECT_GROUPING,
};
pub use secret::{Secret, TargetSecret};
pub use target::Target;
pub use user::User;

/// Current time as a millisecond epoch timestamp, the format every record's
/// `updated_at` carries.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
