//! Activation records and the total firing order
//!
//! An activation is one candidate rule firing: the rule and consequence
//! that would execute, the tuple of facts that satisfied the match, and
//! the bookkeeping the agenda needs to order, cancel, and fire it.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::rule::{Consequence, PartitionId, Rule};
use super::tuple::Tuple;

/// Activation identifier: the session-monotonic activation number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActivationId(pub u64);

impl fmt::Display for ActivationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Total firing order for activations
///
/// Higher salience fires first; ties break toward the earlier activation
/// number, giving FIFO semantics within equal priority. A greater key
/// fires first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderKey {
    /// Firing priority
    pub salience: i32,
    /// Activation number (creation order)
    pub number: u64,
}

impl Ord for OrderKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.salience
            .cmp(&other.salience)
            .then_with(|| other.number.cmp(&self.number))
    }
}

impl PartialOrd for OrderKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Post-fire hook invoked once when the activation fires
pub type FireCallback = Box<dyn FnOnce() + Send>;

/// Live activations keyed by activation number
pub(crate) type ActivationArena = HashMap<ActivationId, Activation>;

/// Ingredients for a new activation, resolved by the session boundary
pub(crate) struct ActivationSeed {
    pub rule: Arc<Rule>,
    pub consequence_name: String,
    pub consequence: Arc<dyn Consequence>,
    pub tuple: Arc<Tuple>,
    pub salience: i32,
    pub partition: PartitionId,
    pub agenda_group: Option<String>,
    pub activation_group: Option<String>,
}

impl ActivationSeed {
    pub(crate) fn into_activation(self, id: ActivationId) -> Activation {
        Activation {
            id,
            rule: self.rule,
            consequence_name: self.consequence_name,
            consequence: self.consequence,
            tuple: self.tuple,
            salience: self.salience,
            partition: self.partition,
            queue_index: None,
            queued: false,
            agenda_group: self.agenda_group,
            activation_group: self.activation_group,
            matched: true,
            canceled: false,
            active: false,
            callback: None,
        }
    }
}

/// One candidate rule match awaiting or undergoing firing
pub struct Activation {
    pub(crate) id: ActivationId,
    pub(crate) rule: Arc<Rule>,
    pub(crate) consequence_name: String,
    pub(crate) consequence: Arc<dyn Consequence>,
    pub(crate) tuple: Arc<Tuple>,
    pub(crate) salience: i32,
    pub(crate) partition: PartitionId,
    pub(crate) queue_index: Option<usize>,
    pub(crate) queued: bool,
    pub(crate) agenda_group: Option<String>,
    pub(crate) activation_group: Option<String>,
    pub(crate) matched: bool,
    pub(crate) canceled: bool,
    pub(crate) active: bool,
    pub(crate) callback: Option<FireCallback>,
}

impl Activation {
    /// Activation number
    pub fn id(&self) -> ActivationId {
        self.id
    }

    /// The rule that matched
    pub fn rule(&self) -> &Arc<Rule> {
        &self.rule
    }

    /// Name of the consequence this activation fires
    pub fn consequence_name(&self) -> &str {
        &self.consequence_name
    }

    /// The facts that satisfied the match
    pub fn tuple(&self) -> &Arc<Tuple> {
        &self.tuple
    }

    /// Current firing priority
    pub fn salience(&self) -> i32 {
        self.salience
    }

    /// Rule-base partition this activation is queued under
    pub fn partition(&self) -> &PartitionId {
        &self.partition
    }

    /// Position in the partition queue, if queued
    pub fn queue_index(&self) -> Option<usize> {
        self.queue_index
    }

    /// Whether the activation currently sits in a queue
    pub fn is_queued(&self) -> bool {
        self.queued
    }

    /// Agenda group the activation is filed under
    pub fn agenda_group(&self) -> Option<&str> {
        self.agenda_group.as_deref()
    }

    /// Activation group the activation belongs to
    pub fn activation_group(&self) -> Option<&str> {
        self.activation_group.as_deref()
    }

    /// Whether the justifying match still holds
    pub fn is_matched(&self) -> bool {
        self.matched
    }

    /// Whether the activation was canceled (terminal)
    pub fn is_canceled(&self) -> bool {
        self.canceled
    }

    /// Whether the activation is currently firing
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Key under the total firing order
    pub fn order_key(&self) -> OrderKey {
        OrderKey {
            salience: self.salience,
            number: self.id.0,
        }
    }

    pub(crate) fn consequence_handler(&self) -> Arc<dyn Consequence> {
        self.consequence.clone()
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Activation rule={}, act#={}, salience={}]",
            self.rule.name, self.id, self.salience
        )
    }
}

impl fmt::Debug for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Activation")
            .field("id", &self.id)
            .field("rule", &self.rule.name)
            .field("consequence", &self.consequence_name)
            .field("salience", &self.salience)
            .field("partition", &self.partition)
            .field("queue_index", &self.queue_index)
            .field("queued", &self.queued)
            .field("agenda_group", &self.agenda_group)
            .field("activation_group", &self.activation_group)
            .field("matched", &self.matched)
            .field("canceled", &self.canceled)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}
