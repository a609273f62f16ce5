//! Membership changes for a project update.
//!
//! A single `invites` list carries both intents: ids that are not members yet
//! get invited, ids that already are members get removed. The current owner
//! and the requested new owner are never removed.

use std::collections::{BTreeSet, HashSet};

use crate::domain::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MembershipDiff {
    /// In order of first appearance, without duplicates.
    pub to_invite: Vec<String>,
    /// In order of first appearance, without duplicates.
    pub to_remove: Vec<String>,
}

/// Compute invites and removals for a membership update.
///
/// A requested new owner must already be a member; otherwise the whole update
/// is rejected before any diff is produced. Empty ids are ignored.
pub fn compute_membership_diff(
    current: &BTreeSet<String>,
    owner: &str,
    invites: &[String],
    new_owner: Option<&str>,
) -> Result<MembershipDiff, DomainError> {
    let new_owner = new_owner.filter(|id| !id.is_empty());
    if let Some(candidate) = new_owner {
        if !current.contains(candidate) {
            return Err(DomainError::owner_not_member(candidate));
        }
    }

    let mut seen = HashSet::new();
    let mut diff = MembershipDiff::default();
    for id in invites {
        if id.is_empty() || !seen.insert(id.as_str()) {
            continue;
        }
        if !current.contains(id) {
            diff.to_invite.push(id.clone());
        } else if id != owner && Some(id.as_str()) != new_owner {
            diff.to_remove.push(id.clone());
        }
    }
    Ok(diff)
}
