//! Agenda coordination: partitions, focus stack, and the firing protocol
//!
//! The agenda owns every pending activation and decides which one fires
//! next under the current focus and group constraints. All operations are
//! synchronous and complete before they return; a session drives the
//! agenda from a single control point, so cancellation is never observable
//! mid-flight.

use std::collections::HashMap;

use super::activation::{Activation, ActivationArena, ActivationId, ActivationSeed, FireCallback};
use super::error::{AgendaResult, FireError, FireResult};
use super::event::{ActivationEvent, AgendaEventListener, CancelCause, GroupEvent};
use super::group::{ActivationGroup, AgendaGroup};
use super::queue::ActivationQueue;
use super::rule::{ConsequenceContext, PartitionId};

/// Agenda group ungrouped activations are filed under
pub const DEFAULT_AGENDA_GROUP: &str = "MAIN";

/// Coordinator for pending activations
///
/// Owns the activation arena, one priority queue per rule-base partition,
/// the agenda groups with their focus stack, and the activation groups.
/// Containers store activation handles, never aliased references; the
/// arena is the single home of each activation until it fires or is
/// canceled.
pub struct Agenda {
    activations: ActivationArena,
    partitions: HashMap<PartitionId, ActivationQueue>,
    agenda_groups: HashMap<String, AgendaGroup>,
    activation_groups: HashMap<String, ActivationGroup>,
    focus_stack: Vec<String>,
    next_number: u64,
    implicit_main_focus: bool,
    listeners: Vec<Box<dyn AgendaEventListener>>,
}

impl Agenda {
    pub(crate) fn new(implicit_main_focus: bool) -> Self {
        Self {
            activations: HashMap::new(),
            partitions: HashMap::new(),
            agenda_groups: HashMap::new(),
            activation_groups: HashMap::new(),
            focus_stack: Vec::new(),
            next_number: 1,
            implicit_main_focus,
            listeners: Vec::new(),
        }
    }

    pub(crate) fn register_listener(&mut self, listener: Box<dyn AgendaEventListener>) {
        self.listeners.push(listener);
    }

    /// Number of pending activations across all partitions
    pub fn size(&self) -> usize {
        self.partitions.values().map(ActivationQueue::len).sum()
    }

    /// Inspect a live activation
    pub fn activation(&self, id: ActivationId) -> Option<&Activation> {
        self.activations.get(&id)
    }

    /// Read view of an agenda group
    pub fn agenda_group(&self, name: &str) -> Option<&AgendaGroup> {
        self.agenda_groups.get(name)
    }

    /// Read view of an activation group
    pub fn activation_group(&self, name: &str) -> Option<&ActivationGroup> {
        self.activation_groups.get(name)
    }

    /// The focus stack, bottom to top
    pub fn focus_stack(&self) -> &[String] {
        &self.focus_stack
    }

    /// Name of the agenda group currently holding focus
    ///
    /// With an empty stack this is the default group when implicit main
    /// focus is configured, otherwise nothing holds focus.
    pub fn current_focus(&self) -> Option<&str> {
        self.focus_stack
            .last()
            .map(String::as_str)
            .or_else(|| self.implicit_main_focus.then_some(DEFAULT_AGENDA_GROUP))
    }

    /// Activation that would fire next, without removing it
    ///
    /// Eligibility: member of the focused group, maximum under the total
    /// firing order within that group.
    pub fn next(&self) -> Option<ActivationId> {
        let focus = self.current_focus()?;
        self.agenda_groups.get(focus).and_then(AgendaGroup::next)
    }

    /// Whether any activation is currently eligible to fire
    pub fn has_eligible_activation(&self) -> bool {
        self.next().is_some()
    }

    /// True when the focused group has no pending members
    ///
    /// Also true when nothing holds focus; the firing loop uses this to
    /// decide when to advance the focus stack.
    pub fn focused_group_is_empty(&self) -> bool {
        match self.current_focus() {
            Some(name) => self
                .agenda_groups
                .get(name)
                .map_or(true, AgendaGroup::is_empty),
            None => true,
        }
    }

    /// Register a freshly matched activation in every container it belongs to
    ///
    /// The insertion is one logical operation: on error nothing is left
    /// behind in any container.
    pub(crate) fn add(&mut self, seed: ActivationSeed) -> AgendaResult<ActivationId> {
        let agenda_group_name = seed
            .agenda_group
            .clone()
            .unwrap_or_else(|| DEFAULT_AGENDA_GROUP.to_string());
        let activation_group_name = seed.activation_group.clone();

        let id = ActivationId(self.next_number);
        let mut activation = seed.into_activation(id);
        activation.agenda_group = Some(agenda_group_name.clone());

        let key = activation.order_key();
        let partition = activation.partition.clone();
        let event = ActivationEvent::new(id, activation.rule.name.clone(), activation.salience);
        self.activations.insert(id, activation);

        let queue = self.partitions.entry(partition).or_default();
        if let Err(error) = queue.insert(&mut self.activations, id) {
            self.activations.remove(&id);
            return Err(error);
        }

        self.agenda_groups
            .entry(agenda_group_name.clone())
            .or_insert_with(|| AgendaGroup::new(agenda_group_name))
            .add(key, id);

        if let Some(name) = activation_group_name {
            self.activation_groups
                .entry(name.clone())
                .or_insert_with(|| ActivationGroup::new(name))
                .add(id);
        }

        self.next_number += 1;
        self.refresh_focus_flags();
        tracing::trace!(activation = id.0, "activation queued");
        for listener in &mut self.listeners {
            listener.activation_created(&event);
        }
        Ok(id)
    }

    /// Cancel an activation, removing it from every container
    ///
    /// Idempotent: canceling an unknown or already-canceled activation is
    /// a no-op. Returns whether a cancellation took place.
    pub(crate) fn cancel(&mut self, id: ActivationId, cause: CancelCause) -> bool {
        let Some(activation) = self.activations.get_mut(&id) else {
            return false;
        };
        if activation.canceled {
            return false;
        }

        activation.canceled = true;
        if cause == CancelCause::Retracted {
            activation.matched = false;
        }
        let key = activation.order_key();
        let partition = activation.partition.clone();
        let agenda_group = activation.agenda_group.clone();
        let activation_group = activation.activation_group.clone();
        let event = ActivationEvent::new(id, activation.rule.name.clone(), activation.salience);

        if let Some(queue) = self.partitions.get_mut(&partition) {
            queue.remove(&mut self.activations, id);
        }
        if let Some(name) = agenda_group {
            if let Some(group) = self.agenda_groups.get_mut(&name) {
                group.remove(key, id);
            }
        }
        if let Some(name) = activation_group {
            if let Some(group) = self.activation_groups.get_mut(&name) {
                group.remove(id);
            }
        }
        self.activations.remove(&id);

        tracing::debug!(activation = id.0, ?cause, "activation canceled");
        for listener in &mut self.listeners {
            listener.activation_canceled(&event, cause);
        }
        true
    }

    /// Fire an activation
    ///
    /// Dequeues it from every container, cancels its activation-group
    /// siblings, then brackets the consequence callback with the active
    /// flag. Bookkeeping commits before the callback runs, so a callback
    /// failure never leaves the activation queued.
    pub(crate) fn fire(&mut self, id: ActivationId) -> FireResult<()> {
        let Some(activation) = self.activations.get(&id) else {
            return Err(FireError::Unknown(id));
        };
        if activation.canceled {
            return Err(FireError::Canceled(id));
        }
        if !activation.queued {
            return Err(FireError::NotQueued(id));
        }

        let rule = activation.rule.clone();
        let consequence = activation.consequence_handler();
        let tuple = activation.tuple.clone();
        let key = activation.order_key();
        let salience = activation.salience;
        let partition = activation.partition.clone();
        let agenda_group = activation.agenda_group.clone();
        let activation_group = activation.activation_group.clone();
        let event = ActivationEvent::new(id, rule.name.clone(), salience);

        if let Some(queue) = self.partitions.get_mut(&partition) {
            queue.remove(&mut self.activations, id);
        }
        if let Some(name) = &agenda_group {
            if let Some(group) = self.agenda_groups.get_mut(name) {
                group.remove(key, id);
            }
        }

        // Exclusive-or semantics: siblings are canceled over an explicit
        // worklist, never recursively.
        if let Some(name) = &activation_group {
            let mut worklist = Vec::new();
            if let Some(group) = self.activation_groups.get_mut(name) {
                group.remove(id);
                worklist.extend(group.members().iter().copied());
            }
            for sibling in worklist {
                self.cancel(sibling, CancelCause::Excluded);
            }
        }

        if let Some(activation) = self.activations.get_mut(&id) {
            activation.active = true;
        }
        tracing::debug!(activation = id.0, rule = %rule.name, "firing activation");
        for listener in &mut self.listeners {
            listener.before_activation_fired(&event);
        }

        let mut context = ConsequenceContext::new(&rule, &tuple, id.0, salience);
        let outcome = consequence.evaluate(&mut context);

        if let Some(callback) = self
            .activations
            .get_mut(&id)
            .and_then(|activation| activation.callback.take())
        {
            callback();
        }
        if let Some(activation) = self.activations.get_mut(&id) {
            activation.active = false;
        }
        for listener in &mut self.listeners {
            listener.after_activation_fired(&event);
        }
        self.activations.remove(&id);

        outcome.map_err(|source| FireError::Consequence {
            rule: rule.name.clone(),
            source: source.into(),
        })
    }

    /// Update an activation's salience and re-sort it within its containers
    ///
    /// No-op (returns false) for handles that are unknown or no longer
    /// queued; a retraction racing a salience update is benign.
    pub(crate) fn update_salience(&mut self, id: ActivationId, salience: i32) -> bool {
        let Some(activation) = self.activations.get_mut(&id) else {
            return false;
        };
        if !activation.queued {
            return false;
        }
        if activation.salience == salience {
            return true;
        }

        let old_key = activation.order_key();
        activation.salience = salience;
        let new_key = activation.order_key();
        let partition = activation.partition.clone();
        let agenda_group = activation.agenda_group.clone();

        if let Some(queue) = self.partitions.get_mut(&partition) {
            queue.reposition(&mut self.activations, id);
        }
        if let Some(name) = agenda_group {
            if let Some(group) = self.agenda_groups.get_mut(&name) {
                group.remove(old_key, id);
                group.add(new_key, id);
            }
        }
        tracing::trace!(activation = id.0, salience, "salience updated");
        true
    }

    /// Attach a post-fire hook to a pending activation
    pub(crate) fn set_callback(&mut self, id: ActivationId, callback: FireCallback) -> bool {
        match self.activations.get_mut(&id) {
            Some(activation) => {
                activation.callback = Some(callback);
                true
            }
            None => false,
        }
    }

    /// Push a phase onto the focus stack, creating the group on first use
    ///
    /// The same name may be pushed repeatedly; each push is a distinct
    /// stack frame.
    pub(crate) fn push_focus(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.agenda_groups
            .entry(name.clone())
            .or_insert_with(|| AgendaGroup::new(name.clone()));
        self.focus_stack.push(name.clone());
        self.refresh_focus_flags();
        tracing::debug!(group = %name, "focus pushed");
        let event = GroupEvent::new(name);
        for listener in &mut self.listeners {
            listener.agenda_group_pushed(&event);
        }
    }

    /// Pop the top focus frame, returning the popped group name
    ///
    /// Focus reverts to the group named by the next frame down, or to the
    /// implicit default when the stack empties.
    pub(crate) fn pop_focus(&mut self) -> Option<String> {
        let name = self.focus_stack.pop()?;
        self.refresh_focus_flags();
        tracing::debug!(group = %name, "focus popped");
        let event = GroupEvent::new(name.clone());
        for listener in &mut self.listeners {
            listener.agenda_group_popped(&event);
        }
        Some(name)
    }

    /// Cancel every member of an agenda group without touching the focus stack
    pub(crate) fn clear_agenda_group(&mut self, name: &str) {
        let members = self
            .agenda_groups
            .get(name)
            .map(AgendaGroup::member_ids)
            .unwrap_or_default();
        for id in members {
            self.cancel(id, CancelCause::Cleared);
        }
    }

    /// Cancel every member of an activation group
    pub(crate) fn clear_activation_group(&mut self, name: &str) {
        let members = self
            .activation_groups
            .get(name)
            .map(|group| group.members().to_vec())
            .unwrap_or_default();
        for id in members {
            self.cancel(id, CancelCause::Cleared);
        }
    }

    // Exactly zero or one group holds focus: the one named by the top
    // stack frame, or the implicit default with an empty stack.
    fn refresh_focus_flags(&mut self) {
        let focused = self.current_focus().map(str::to_string);
        for group in self.agenda_groups.values_mut() {
            let active = focused.as_deref() == Some(group.name());
            group.set_active(active);
        }
    }
}
