//! Agenda groups (focus phases) and activation groups (mutual exclusion)
//!
//! Both kinds of group are created lazily on first reference by name and
//! persist, possibly empty, for the life of the session.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use super::activation::{ActivationId, OrderKey};

/// Named phase partition; only the group holding focus yields activations
///
/// Members are kept ordered by the total firing order, so the group's own
/// next-to-fire lookup is a cheap first-element read.
#[derive(Debug)]
pub struct AgendaGroup {
    name: String,
    members: BTreeSet<(Reverse<OrderKey>, ActivationId)>,
    active: bool,
}

impl AgendaGroup {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: BTreeSet::new(),
            active: false,
        }
    }

    /// Group name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True iff this group currently holds focus
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn add(&mut self, key: OrderKey, id: ActivationId) {
        self.members.insert((Reverse(key), id));
    }

    pub(crate) fn remove(&mut self, key: OrderKey, id: ActivationId) -> bool {
        self.members.remove(&(Reverse(key), id))
    }

    /// Member that would fire next under the total order
    pub fn next(&self) -> Option<ActivationId> {
        self.members.first().map(|(_, id)| *id)
    }

    /// Number of pending members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no pending members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member IDs in firing order
    pub fn member_ids(&self) -> Vec<ActivationId> {
        self.members.iter().map(|(_, id)| *id).collect()
    }
}

/// Named mutual-exclusion set: firing one member cancels the rest
///
/// Of N members sharing a group, at most one ever fires.
#[derive(Debug)]
pub struct ActivationGroup {
    name: String,
    members: Vec<ActivationId>,
}

impl ActivationGroup {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Group name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn add(&mut self, id: ActivationId) {
        debug_assert!(!self.members.contains(&id));
        self.members.push(id);
    }

    pub(crate) fn remove(&mut self, id: ActivationId) -> bool {
        match self.members.iter().position(|member| *member == id) {
            Some(index) => {
                self.members.remove(index);
                true
            }
            None => false,
        }
    }

    /// Whether the activation belongs to this group
    pub fn contains(&self, id: ActivationId) -> bool {
        self.members.contains(&id)
    }

    /// Member IDs in population order
    pub fn members(&self) -> &[ActivationId] {
        &self.members
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
