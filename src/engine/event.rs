//! Agenda lifecycle events and listener hooks
//!
//! Listeners observe agenda state transitions synchronously, at the point
//! where each transition has committed. Timestamps are for observability
//! only and play no part in ordering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::activation::ActivationId;

/// Why an activation was canceled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelCause {
    /// The underlying match was withdrawn by the producer
    Retracted,
    /// A sibling in the same activation group fired
    Excluded,
    /// The enclosing group was cleared
    Cleared,
}

/// Snapshot of an activation at an event boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationEvent {
    /// Activation number
    pub activation: ActivationId,
    /// Name of the rule that matched
    pub rule: String,
    /// Salience at the time of the event
    pub salience: i32,
    /// Debug timestamp
    pub timestamp: DateTime<Utc>,
}

impl ActivationEvent {
    /// Create an event stamped with the current time
    pub fn new(activation: ActivationId, rule: impl Into<String>, salience: i32) -> Self {
        Self {
            activation,
            rule: rule.into(),
            salience,
            timestamp: Utc::now(),
        }
    }
}

/// Focus-stack transition record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupEvent {
    /// Name of the agenda group
    pub group: String,
    /// Debug timestamp
    pub timestamp: DateTime<Utc>,
}

impl GroupEvent {
    /// Create an event stamped with the current time
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Observer of agenda state transitions
///
/// All hooks default to no-ops; implement the ones of interest.
pub trait AgendaEventListener: Send {
    /// A new match was registered and queued
    fn activation_created(&mut self, _event: &ActivationEvent) {}

    /// An activation was canceled and removed from every container
    fn activation_canceled(&mut self, _event: &ActivationEvent, _cause: CancelCause) {}

    /// An activation is about to fire; bookkeeping has already committed
    fn before_activation_fired(&mut self, _event: &ActivationEvent) {}

    /// An activation finished firing
    fn after_activation_fired(&mut self, _event: &ActivationEvent) {}

    /// A group was pushed onto the focus stack
    fn agenda_group_pushed(&mut self, _event: &GroupEvent) {}

    /// A focus frame was popped
    fn agenda_group_popped(&mut self, _event: &GroupEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_event_json_round_trip() {
        let event = ActivationEvent::new(ActivationId(3), "route-order", 10);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["activation"], 3);
        assert_eq!(json["rule"], "route-order");
        assert_eq!(json["salience"], 10);

        let back: ActivationEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.activation, ActivationId(3));
    }

    #[test]
    fn test_cancel_cause_serializes_as_name() {
        let json = serde_json::to_value(CancelCause::Excluded).unwrap();
        assert_eq!(json, "Excluded");
    }
}
