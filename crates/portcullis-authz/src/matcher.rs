//! Permission matching against an indexed rule snapshot.
//!
//! # Purpose
//! Decides whether any permission rule authorizes a (subject, resource
//! groups, action) combination. Rules are indexed by resource group and
//! action at snapshot build time so a decision touches only the matching
//! subset instead of scanning every rule — rule counts scale with tenants.
//!
//! # Matching semantics
//! A rule matches when its subject equals the literal subject id or is one of
//! the resolved subject groups, its resource group is one of the resolved
//! resource groups, its action equals the requested action, and its
//! constraint (if any) is satisfied by the request context. Permissions are
//! additive: the first match wins and there is no deny rule type — absence of
//! a match is the only deny path.
//!
//! The only wildcard is the explicit `"*"` action sentinel ([`ACT_ANY`]): a
//! rule stored with that exact action value matches any requested action.
//! Resource-group wildcards do not exist.
use crate::constraint::{AccessContext, Constraint};
use portcullis_model::{PolicyRule, RuleKind, ACT_ANY};
use std::collections::{HashMap, HashSet};
use tracing::warn;

struct IndexedGrant {
    subject: String,
    constraint: Option<Constraint>,
}

/// Permission rules of one snapshot, indexed as resource group → action →
/// grants.
#[derive(Default)]
pub struct PolicyIndex {
    by_group: HashMap<String, HashMap<String, Vec<IndexedGrant>>>,
}

impl PolicyIndex {
    /// Index a snapshot of `p` rules. Rows that fail classification or carry
    /// an unparseable constraint are skipped and logged.
    pub fn build<'a>(rules: impl IntoIterator<Item = &'a PolicyRule>) -> Self {
        let mut by_group: HashMap<String, HashMap<String, Vec<IndexedGrant>>> = HashMap::new();
        for rule in rules {
            let (subject, resource_group, action, constraint) = match rule.kind() {
                Ok(RuleKind::Permission {
                    subject,
                    resource_group,
                    action,
                    constraint,
                }) => (subject, resource_group, action, constraint),
                Ok(_) => {
                    warn!(rule_id = %rule.id, "grouping rule in permission scan, skipping");
                    continue;
                }
                Err(err) => {
                    warn!(rule_id = %rule.id, error = %err, "skipping malformed permission rule");
                    continue;
                }
            };
            let constraint = match constraint {
                None => None,
                Some(raw) => match raw.parse::<Constraint>() {
                    Ok(parsed) => Some(parsed),
                    Err(err) => {
                        warn!(rule_id = %rule.id, error = %err, "skipping rule with unparseable constraint");
                        continue;
                    }
                },
            };
            by_group
                .entry(resource_group.to_string())
                .or_default()
                .entry(action.to_string())
                .or_default()
                .push(IndexedGrant {
                    subject: subject.to_string(),
                    constraint,
                });
        }
        Self { by_group }
    }

    /// True when any indexed rule authorizes the combination.
    pub fn matches(
        &self,
        subject_id: &str,
        subject_groups: &HashSet<String>,
        resource_groups: &HashSet<String>,
        action: &str,
        ctx: &AccessContext,
    ) -> bool {
        for group in resource_groups {
            let Some(actions) = self.by_group.get(group) else {
                continue;
            };
            let buckets = [actions.get(action), actions.get(ACT_ANY)];
            for grant in buckets.into_iter().flatten().flatten() {
                let subject_matches = grant.subject == subject_id
                    || subject_groups.contains(grant.subject.as_str());
                if !subject_matches {
                    continue;
                }
                match &grant.constraint {
                    None => return true,
                    Some(constraint) if constraint.satisfied_by(ctx) => return true,
                    Some(_) => {}
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portcullis_model::PolicyRule;

    fn groups(names: &[&str]) -> HashSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn literal_subject_matches() {
        let rules = vec![PolicyRule::permission("u1", "apple", "exec", "admin")];
        let index = PolicyIndex::build(&rules);
        let ctx = AccessContext::default();

        assert!(index.matches("u1", &groups(&[]), &groups(&["apple"]), "exec", &ctx));
        assert!(!index.matches("u2", &groups(&[]), &groups(&["apple"]), "exec", &ctx));
        assert!(!index.matches("u1", &groups(&[]), &groups(&["banana"]), "exec", &ctx));
    }

    #[test]
    fn group_subject_matches_through_resolved_set() {
        let rules = vec![PolicyRule::permission(
            "login_group",
            "apple",
            "exec",
            "admin",
        )];
        let index = PolicyIndex::build(&rules);
        let ctx = AccessContext::default();

        assert!(index.matches(
            "u1",
            &groups(&["login_group"]),
            &groups(&["apple"]),
            "exec",
            &ctx
        ));
        assert!(!index.matches("u1", &groups(&[]), &groups(&["apple"]), "exec", &ctx));
    }

    #[test]
    fn actions_gate_independently() {
        let rules = vec![
            PolicyRule::permission("u1", "apple", "exec", "admin"),
            PolicyRule::permission("u1", "apple", "shell", "admin"),
        ];
        let index = PolicyIndex::build(&rules);
        let ctx = AccessContext::default();

        assert!(index.matches("u1", &groups(&[]), &groups(&["apple"]), "exec", &ctx));
        assert!(index.matches("u1", &groups(&[]), &groups(&["apple"]), "shell", &ctx));
        assert!(!index.matches("u1", &groups(&[]), &groups(&["apple"]), "pty", &ctx));
    }

    #[test]
    fn any_action_sentinel_is_explicit() {
        let rules = vec![PolicyRule::permission("u1", "apple", "*", "admin")];
        let index = PolicyIndex::build(&rules);
        let ctx = AccessContext::default();

        assert!(index.matches("u1", &groups(&[]), &groups(&["apple"]), "exec", &ctx));
        assert!(index.matches("u1", &groups(&[]), &groups(&["apple"]), "shell", &ctx));
        // No implicit wildcarding: a concrete action does not match others.
        let rules = vec![PolicyRule::permission("u1", "apple", "exec", "admin")];
        let index = PolicyIndex::build(&rules);
        assert!(!index.matches("u1", &groups(&[]), &groups(&["apple"]), "shell", &ctx));
    }

    #[test]
    fn malformed_rules_do_not_block_the_rest() {
        let mut bad = PolicyRule::permission("u1", "apple", "exec", "admin");
        bad.v1 = String::new();
        let broken_constraint = PolicyRule::permission_with_constraint(
            "u1",
            "apple",
            "shell",
            "not-a-cidr,,",
            "admin",
        );
        let good = PolicyRule::permission("u1", "apple", "exec", "admin");
        let index = PolicyIndex::build(&[bad, broken_constraint, good]);
        let ctx = AccessContext::default();

        assert!(index.matches("u1", &groups(&[]), &groups(&["apple"]), "exec", &ctx));
        assert!(!index.matches("u1", &groups(&[]), &groups(&["apple"]), "shell", &ctx));
    }

    #[test]
    fn constraints_gate_matches() {
        let rules = vec![PolicyRule::permission_with_constraint(
            "u1",
            "apple",
            "exec",
            "10.0.0.0/8,,,",
            "admin",
        )];
        let index = PolicyIndex::build(&rules);

        let inside = AccessContext::new(Some("10.1.2.3".parse().unwrap()));
        assert!(index.matches("u1", &groups(&[]), &groups(&["apple"]), "exec", &inside));

        let outside = AccessContext::new(Some("192.168.1.1".parse().unwrap()));
        assert!(!index.matches("u1", &groups(&[]), &groups(&["apple"]), "exec", &outside));

        // Constraint present but no caller IP: fail closed.
        let unknown = AccessContext::new(None);
        assert!(!index.matches("u1", &groups(&[]), &groups(&["apple"]), "exec", &unknown));
    }
}
