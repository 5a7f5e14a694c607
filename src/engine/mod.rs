//! Session orchestrator and public API
//!
//! This module provides the `Session` struct that ties an agenda to a
//! rule-set snapshot and exposes the producer boundary (the pattern
//! network reporting and withdrawing matches) and the consumer boundary
//! (the firing loop asking for and firing the next activation).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

// Submodules
pub mod activation;
pub mod agenda;
pub mod error;
pub mod event;
pub mod group;
pub mod queue;
pub mod rule;
pub mod tuple;

use activation::{ActivationSeed, FireCallback};
use agenda::Agenda;
use error::{AgendaError, FireResult};
use event::{AgendaEventListener, CancelCause};
use rule::{RuleId, RuleSet, DEFAULT_CONSEQUENCE_NAME};
use tuple::Tuple;

// Re-export commonly used types
pub use activation::{Activation, ActivationId};

/// Configuration for a reasoning session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Whether the default agenda group implicitly holds focus while the
    /// focus stack is empty
    pub implicit_main_focus: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            implicit_main_focus: true,
        }
    }
}

/// A match reported by the pattern network
///
/// Override fields left unset fall back to the matched rule's declared
/// metadata.
#[derive(Debug, Clone)]
pub struct Match {
    /// Rule that matched
    pub rule: RuleId,
    /// Named consequence to fire; `None` selects the rule's default
    pub consequence: Option<String>,
    /// Facts satisfying the match
    pub tuple: Arc<Tuple>,
    /// Salience override
    pub salience: Option<i32>,
    /// Agenda group override
    pub agenda_group: Option<String>,
    /// Activation group override
    pub activation_group: Option<String>,
}

impl Match {
    /// Create a match for a rule with no overrides
    pub fn new(rule: RuleId, tuple: Arc<Tuple>) -> Self {
        Self {
            rule,
            consequence: None,
            tuple,
            salience: None,
            agenda_group: None,
            activation_group: None,
        }
    }
}

/// A reasoning session: one agenda plus the rule set it schedules for
///
/// All operations are synchronous and non-blocking. A session is a single
/// logical control point: at most one activation fires at a time, and
/// cancellation completes before the next scheduling query. Independent
/// sessions share nothing mutable and may live on separate threads.
pub struct Session {
    config: SessionConfig,
    rules: RuleSet,
    agenda: Agenda,
}

impl Session {
    /// Create a session over a rule-set snapshot
    pub fn new(rules: RuleSet, config: SessionConfig) -> Self {
        let agenda = Agenda::new(config.implicit_main_focus);
        Self {
            config,
            rules,
            agenda,
        }
    }

    /// The session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The rule-set snapshot this session schedules for
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Read access to the agenda
    pub fn agenda(&self) -> &Agenda {
        &self.agenda
    }

    /// Register an agenda event listener
    pub fn register_listener(&mut self, listener: Box<dyn AgendaEventListener>) {
        self.agenda.register_listener(listener);
    }

    /// Register a newly satisfied match, assigning the next activation number
    ///
    /// The activation enters its partition queue, its agenda group, and
    /// (if declared) its activation group as one logical operation; on
    /// error nothing is inserted anywhere.
    pub fn notify_match(&mut self, m: Match) -> error::Result<ActivationId> {
        let rule = self
            .rules
            .get(&m.rule)
            .cloned()
            .ok_or_else(|| AgendaError::InvalidActivation(format!("unknown rule {}", m.rule)))?;

        let consequence_name = m
            .consequence
            .unwrap_or_else(|| DEFAULT_CONSEQUENCE_NAME.to_string());
        let consequence = rule.consequence(Some(&consequence_name)).ok_or_else(|| {
            AgendaError::InvalidActivation(format!(
                "rule '{}' has no consequence named '{}'",
                rule.name, consequence_name
            ))
        })?;

        if let Some(position) = rule.max_declaration_position() {
            if position >= m.tuple.len() {
                return Err(AgendaError::InvalidActivation(format!(
                    "declaration position {} out of bounds for tuple of {} facts",
                    position,
                    m.tuple.len()
                ))
                .into());
            }
        }

        let seed = ActivationSeed {
            salience: m.salience.unwrap_or(rule.salience),
            partition: rule.partition.clone(),
            agenda_group: m.agenda_group.or_else(|| rule.agenda_group.clone()),
            activation_group: m.activation_group.or_else(|| rule.activation_group.clone()),
            rule,
            consequence_name,
            consequence,
            tuple: m.tuple,
        };
        Ok(self.agenda.add(seed)?)
    }

    /// Withdraw a match; equivalent to canceling its activation
    ///
    /// Idempotent. Returns whether a pending activation was canceled.
    pub fn notify_retract(&mut self, id: ActivationId) -> bool {
        self.agenda.cancel(id, CancelCause::Retracted)
    }

    /// Change a pending activation's salience, repositioning it
    ///
    /// Returns false for handles that are unknown or no longer queued.
    pub fn update_salience(&mut self, id: ActivationId, salience: i32) -> bool {
        self.agenda.update_salience(id, salience)
    }

    /// Attach a post-fire hook invoked once when the activation fires
    pub fn set_fire_callback(&mut self, id: ActivationId, callback: FireCallback) -> bool {
        self.agenda.set_callback(id, callback)
    }

    /// Whether any activation is eligible under the current focus
    pub fn has_eligible_activation(&self) -> bool {
        self.agenda.has_eligible_activation()
    }

    /// The activation to fire next, or `None` if nothing is eligible
    pub fn next(&self) -> Option<ActivationId> {
        self.agenda.next()
    }

    /// Fire an activation
    pub fn fire(&mut self, id: ActivationId) -> FireResult<()> {
        self.agenda.fire(id)
    }

    /// Push a phase onto the focus stack
    pub fn push_focus(&mut self, name: impl Into<String>) {
        self.agenda.push_focus(name);
    }

    /// Pop the top focus frame, returning the popped group name
    pub fn pop_focus(&mut self) -> Option<String> {
        self.agenda.pop_focus()
    }

    /// Name of the agenda group currently holding focus
    pub fn current_focus(&self) -> Option<&str> {
        self.agenda.current_focus()
    }

    /// True when the focused group has no pending members
    pub fn focused_group_is_empty(&self) -> bool {
        self.agenda.focused_group_is_empty()
    }

    /// Cancel every member of an agenda group, leaving the stack untouched
    pub fn clear_agenda_group(&mut self, name: &str) {
        self.agenda.clear_agenda_group(name);
    }

    /// Cancel every member of an activation group
    pub fn clear_activation_group(&mut self, name: &str) {
        self.agenda.clear_activation_group(name);
    }

    /// Inspect a pending activation
    pub fn activation(&self, id: ActivationId) -> Option<&Activation> {
        self.agenda.activation(id)
    }

    /// Number of pending activations
    pub fn agenda_size(&self) -> usize {
        self.agenda.size()
    }
}
