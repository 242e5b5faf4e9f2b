//! Transitive group resolution over grouping rules.
//!
//! # Purpose
//! Grouping rules form a directed graph: `v0` names either a concrete entity
//! (user id, binding id) or another group, `v1` names the parent group. This
//! module builds an explicit adjacency map from one rule snapshot and
//! computes the transitive membership set with cycle-safe breadth-first
//! traversal — no recursion, no way to hang on `g1(x, y)` + `g1(y, x)`.
//!
//! # Key invariants
//! - An empty result is a valid outcome ("ungrouped"), never an error.
//! - Duplicate (member, group) rows collapse in the set representation.
//! - Malformed rows are skipped and logged, never fatal.
use crate::store::{RuleStore, StoreResult};
use portcullis_model::{PolicyRule, RuleKind};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::warn;

/// Adjacency view of one grouping-rule snapshot: name → parent group names.
#[derive(Debug, Default)]
pub struct GroupGraph {
    parents: HashMap<String, HashSet<String>>,
}

impl GroupGraph {
    /// Build the adjacency map from grouping rules of a single type. Rows
    /// that fail classification are skipped.
    pub fn build<'a>(rules: impl IntoIterator<Item = &'a PolicyRule>) -> Self {
        let mut parents: HashMap<String, HashSet<String>> = HashMap::new();
        for rule in rules {
            let (member, group) = match rule.kind() {
                Ok(RuleKind::SubjectGrouping { member, group })
                | Ok(RuleKind::ResourceGrouping { member, group }) => (member, group),
                Ok(RuleKind::Permission { .. }) => {
                    warn!(rule_id = %rule.id, "permission rule in grouping scan, skipping");
                    continue;
                }
                Err(err) => {
                    warn!(rule_id = %rule.id, error = %err, "skipping malformed grouping rule");
                    continue;
                }
            };
            parents
                .entry(member.to_string())
                .or_default()
                .insert(group.to_string());
        }
        Self { parents }
    }

    /// Transitive closure of group membership from `start`. The start node
    /// itself is not part of the result.
    pub fn resolve(&self, start: &str) -> HashSet<String> {
        let mut found = HashSet::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();

        visited.insert(start);
        queue.push_back(start);

        while let Some(name) = queue.pop_front() {
            let Some(groups) = self.parents.get(name) else {
                continue;
            };
            for group in groups {
                if visited.insert(group.as_str()) {
                    found.insert(group.clone());
                    queue.push_back(group.as_str());
                }
            }
        }

        found
    }
}

/// Expand `subject` into its transitive group set by scanning grouping rules
/// of `ptype` from the store. Store failures propagate; "no groups" does not.
pub async fn resolve_groups<R: RuleStore + ?Sized>(
    store: &R,
    subject: &str,
    ptype: &str,
) -> StoreResult<HashSet<String>> {
    let rules = store.list_rules(ptype, None).await?;
    Ok(GroupGraph::build(&rules).resolve(subject))
}
