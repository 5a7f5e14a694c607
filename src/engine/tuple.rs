//! Fact tuples backing an activation
//!
//! A tuple is the ordered list of facts that satisfied a rule's pattern.
//! Fact payloads are preserves values; the tuple itself is shared between
//! the matcher, the agenda, and consequence code via `Arc`.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Handle for a fact asserted into a session (unique per session)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactHandle(pub Uuid);

impl FactHandle {
    /// Create a new random fact handle
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FactHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single fact: its handle plus the asserted payload value
#[derive(Debug, Clone)]
pub struct Fact {
    /// Handle identifying the fact within its session
    pub handle: FactHandle,
    /// Asserted payload
    pub value: preserves::IOValue,
}

impl Fact {
    /// Create a fact with a fresh handle
    pub fn new(value: preserves::IOValue) -> Self {
        Self {
            handle: FactHandle::new(),
            value,
        }
    }
}

/// The ordered facts that satisfied a rule's pattern
#[derive(Debug, Clone, Default)]
pub struct Tuple {
    facts: Vec<Fact>,
}

impl Tuple {
    /// Create a tuple from existing facts
    pub fn new(facts: Vec<Fact>) -> Self {
        Self { facts }
    }

    /// Create a tuple of fresh facts from raw payload values
    pub fn from_values(values: impl IntoIterator<Item = preserves::IOValue>) -> Self {
        Self {
            facts: values.into_iter().map(Fact::new).collect(),
        }
    }

    /// Number of facts in the tuple
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Whether the tuple holds no facts
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Fact at the given position
    pub fn get(&self, position: usize) -> Option<&Fact> {
        self.facts.get(position)
    }

    /// Payload value at the given position
    pub fn value(&self, position: usize) -> Option<&preserves::IOValue> {
        self.facts.get(position).map(|fact| &fact.value)
    }

    /// All facts, in match order
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    /// Handles of all facts, in match order
    pub fn fact_handles(&self) -> Vec<FactHandle> {
        self.facts.iter().map(|fact| fact.handle.clone()).collect()
    }
}
