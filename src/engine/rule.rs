//! Rule metadata, consequences, and the shared rule catalog
//!
//! The agenda schedules activations; rules supply the scheduling metadata
//! (salience, group declarations, partition) and the executable
//! consequences those activations fire. Rule definitions are registered in
//! a catalog and snapshotted into an immutable set per session.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tuple::Tuple;

/// Consequence a rule fires when no named consequence is requested
pub const DEFAULT_CONSEQUENCE_NAME: &str = "default";

/// Rule identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub Uuid);

impl RuleId {
    /// Create a new random rule ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RuleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rule-base partition a rule (and its activations) belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionId(pub String);

impl PartitionId {
    /// Create a new partition ID
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The main partition
    pub fn main() -> Self {
        Self("main".to_string())
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Consequence: the executable action invoked when an activation fires
///
/// Implementations must be `Send + Sync` so sessions can move across
/// threads. The agenda brackets the call but never inspects the result
/// beyond propagating failure.
pub trait Consequence: Send + Sync {
    /// Execute against the matched tuple
    fn evaluate(&self, context: &mut ConsequenceContext<'_>) -> anyhow::Result<()>;
}

/// Execution context handed to a consequence when its activation fires
pub struct ConsequenceContext<'a> {
    rule: &'a Rule,
    tuple: &'a Tuple,
    activation_number: u64,
    salience: i32,
}

impl<'a> ConsequenceContext<'a> {
    pub(crate) fn new(rule: &'a Rule, tuple: &'a Tuple, activation_number: u64, salience: i32) -> Self {
        Self {
            rule,
            tuple,
            activation_number,
            salience,
        }
    }

    /// The rule being fired
    pub fn rule(&self) -> &Rule {
        self.rule
    }

    /// The facts that satisfied the match
    pub fn tuple(&self) -> &Tuple {
        self.tuple
    }

    /// Activation number of the firing activation
    pub fn activation_number(&self) -> u64 {
        self.activation_number
    }

    /// Salience the activation fired at
    pub fn salience(&self) -> i32 {
        self.salience
    }

    /// Resolve a declared variable to the fact value bound to it
    pub fn declaration_value(&self, name: &str) -> Option<&preserves::IOValue> {
        let position = *self.rule.declarations.get(name)?;
        self.tuple.value(position)
    }

    /// Declaration identifiers visible to this consequence, sorted
    pub fn declaration_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.rule.declarations.keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// A production rule's scheduling metadata and executable consequences
pub struct Rule {
    /// Unique rule ID
    pub id: RuleId,
    /// Rule name
    pub name: String,
    /// Default firing priority for this rule's activations
    pub salience: i32,
    /// Agenda group (phase) this rule's activations are filed under
    pub agenda_group: Option<String>,
    /// Mutual-exclusion group this rule's activations join
    pub activation_group: Option<String>,
    /// Rule-base partition this rule belongs to
    pub partition: PartitionId,
    /// Declaration table: variable name to position in the matched tuple
    pub declarations: HashMap<String, usize>,
    consequences: HashMap<String, Arc<dyn Consequence>>,
}

impl Rule {
    /// Create a rule with the given default consequence
    pub fn new(name: impl Into<String>, consequence: Arc<dyn Consequence>) -> Self {
        let mut consequences: HashMap<String, Arc<dyn Consequence>> = HashMap::new();
        consequences.insert(DEFAULT_CONSEQUENCE_NAME.to_string(), consequence);

        Self {
            id: RuleId::new(),
            name: name.into(),
            salience: 0,
            agenda_group: None,
            activation_group: None,
            partition: PartitionId::main(),
            declarations: HashMap::new(),
            consequences,
        }
    }

    /// Register a named consequence
    pub fn add_consequence(&mut self, name: impl Into<String>, consequence: Arc<dyn Consequence>) {
        self.consequences.insert(name.into(), consequence);
    }

    /// Declare a variable bound to a tuple position
    pub fn declare(&mut self, name: impl Into<String>, position: usize) {
        self.declarations.insert(name.into(), position);
    }

    /// Resolve a consequence by name, falling back to the default
    pub fn consequence(&self, name: Option<&str>) -> Option<Arc<dyn Consequence>> {
        match name {
            Some(name) if name != DEFAULT_CONSEQUENCE_NAME => self.consequences.get(name).cloned(),
            _ => self.consequences.get(DEFAULT_CONSEQUENCE_NAME).cloned(),
        }
    }

    /// Highest tuple position any declaration refers to
    pub(crate) fn max_declaration_position(&self) -> Option<usize> {
        self.declarations.values().copied().max()
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("salience", &self.salience)
            .field("agenda_group", &self.agenda_group)
            .field("activation_group", &self.activation_group)
            .field("partition", &self.partition)
            .finish_non_exhaustive()
    }
}

/// Mutable catalog of rule definitions
///
/// The compiler front end registers rules here; each session takes an
/// immutable snapshot so later registrations never perturb a live agenda.
pub struct RuleCatalog {
    rules: RwLock<HashMap<RuleId, Arc<Rule>>>,
}

impl RuleCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(HashMap::new()),
        }
    }

    /// Register a rule, returning its ID
    pub fn register(&self, rule: Rule) -> RuleId {
        let id = rule.id.clone();
        self.rules.write().insert(id.clone(), Arc::new(rule));
        id
    }

    /// Produce an immutable snapshot for a session
    pub fn snapshot(&self) -> RuleSet {
        RuleSet {
            rules: Arc::new(self.rules.read().clone()),
        }
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable session view of the rule catalog
#[derive(Clone)]
pub struct RuleSet {
    rules: Arc<HashMap<RuleId, Arc<Rule>>>,
}

impl RuleSet {
    /// Look up a rule by ID
    pub fn get(&self, id: &RuleId) -> Option<&Arc<Rule>> {
        self.rules.get(id)
    }

    /// Look up a rule by name
    pub fn by_name(&self, name: &str) -> Option<&Arc<Rule>> {
        self.rules.values().find(|rule| rule.name == name)
    }

    /// Number of rules in the snapshot
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the snapshot holds no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
