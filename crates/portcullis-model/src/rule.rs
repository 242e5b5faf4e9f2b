//! Policy-rule rows and their typed view.
//!
//! # Purpose
//! `PolicyRule` mirrors the persisted `casbin_rule` row: a `ptype`
//! discriminator plus six string slots whose meaning depends on it. The flat
//! shape is what stores persist bit-for-bit; [`PolicyRule::kind`] recovers a
//! tagged view so the engine never reasons about raw slot indices.
//!
//! # Slot semantics
//! - `g1`: v0 = user id or group name, v1 = group name (subject grouping).
//! - `g2`: v0 = binding id or group name, v1 = group name (resource grouping).
//! - `p`:  v0 = subject (user id or group name), v1 = resource-group name,
//!   v2 = action name, v3 = optional constraint string.
//!
//! # Key invariants
//! - Classification failures are data errors ([`RuleError`]), not panics;
//!   scans skip and log bad rows so one bad rule never blocks the rest.
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Subject-grouping rules (`g1`): user → login group membership.
pub const PTYPE_SUBJECT_GROUPING: &str = "g1";
/// Resource-grouping rules (`g2`): binding → resource group membership.
pub const PTYPE_RESOURCE_GROUPING: &str = "g2";
/// Permission rules (`p`): subject may perform action on resource group.
pub const PTYPE_PERMISSION: &str = "p";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub id: String,
    pub ptype: String,
    pub v0: String,
    pub v1: String,
    pub v2: String,
    pub v3: String,
    pub v4: String,
    pub v5: String,
    pub updated_by: String,
    pub updated_at: i64,
}

impl PolicyRule {
    fn blank(ptype: &str, updated_by: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            ptype: ptype.to_string(),
            v0: String::new(),
            v1: String::new(),
            v2: String::new(),
            v3: String::new(),
            v4: String::new(),
            v5: String::new(),
            updated_by: updated_by.into(),
            updated_at: crate::now_millis(),
        }
    }

    /// `g1` membership: `member` (user id or group name) belongs to `group`.
    pub fn subject_grouping(
        member: impl Into<String>,
        group: impl Into<String>,
        updated_by: impl Into<String>,
    ) -> Self {
        let mut rule = Self::blank(PTYPE_SUBJECT_GROUPING, updated_by);
        rule.v0 = member.into();
        rule.v1 = group.into();
        rule
    }

    /// `g2` membership: `member` (binding id or group name) belongs to `group`.
    pub fn resource_grouping(
        member: impl Into<String>,
        group: impl Into<String>,
        updated_by: impl Into<String>,
    ) -> Self {
        let mut rule = Self::blank(PTYPE_RESOURCE_GROUPING, updated_by);
        rule.v0 = member.into();
        rule.v1 = group.into();
        rule
    }

    /// `p` grant: `subject` may perform `action` on `resource_group`.
    pub fn permission(
        subject: impl Into<String>,
        resource_group: impl Into<String>,
        action: impl Into<String>,
        updated_by: impl Into<String>,
    ) -> Self {
        let mut rule = Self::blank(PTYPE_PERMISSION, updated_by);
        rule.v0 = subject.into();
        rule.v1 = resource_group.into();
        rule.v2 = action.into();
        rule
    }

    /// `p` grant carrying a constraint string in `v3` (source IP range,
    /// time-of-day window, expiry).
    pub fn permission_with_constraint(
        subject: impl Into<String>,
        resource_group: impl Into<String>,
        action: impl Into<String>,
        constraint: impl Into<String>,
        updated_by: impl Into<String>,
    ) -> Self {
        let mut rule = Self::permission(subject, resource_group, action, updated_by);
        rule.v3 = constraint.into();
        rule
    }

    /// Classify the row into its typed view, borrowing the slots.
    pub fn kind(&self) -> Result<RuleKind<'_>, RuleError> {
        match self.ptype.as_str() {
            PTYPE_SUBJECT_GROUPING => {
                self.require_slot(0, &self.v0)?;
                self.require_slot(1, &self.v1)?;
                Ok(RuleKind::SubjectGrouping {
                    member: &self.v0,
                    group: &self.v1,
                })
            }
            PTYPE_RESOURCE_GROUPING => {
                self.require_slot(0, &self.v0)?;
                self.require_slot(1, &self.v1)?;
                Ok(RuleKind::ResourceGrouping {
                    member: &self.v0,
                    group: &self.v1,
                })
            }
            PTYPE_PERMISSION => {
                self.require_slot(0, &self.v0)?;
                self.require_slot(1, &self.v1)?;
                self.require_slot(2, &self.v2)?;
                Ok(RuleKind::Permission {
                    subject: &self.v0,
                    resource_group: &self.v1,
                    action: &self.v2,
                    constraint: if self.v3.is_empty() {
                        None
                    } else {
                        Some(&self.v3)
                    },
                })
            }
            other => Err(RuleError::UnknownPtype(other.to_string())),
        }
    }

    fn require_slot(&self, slot: usize, value: &str) -> Result<(), RuleError> {
        if value.is_empty() {
            return Err(RuleError::EmptySlot {
                ptype: self.ptype.clone(),
                slot,
            });
        }
        Ok(())
    }
}

/// Typed view over a [`PolicyRule`] row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind<'a> {
    SubjectGrouping {
        member: &'a str,
        group: &'a str,
    },
    ResourceGrouping {
        member: &'a str,
        group: &'a str,
    },
    Permission {
        subject: &'a str,
        resource_group: &'a str,
        action: &'a str,
        constraint: Option<&'a str>,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("unknown ptype: {0}")]
    UnknownPtype(String),
    #[error("{ptype} rule is missing required slot v{slot}")]
    EmptySlot { ptype: String, slot: usize },
}
