//! Integration tests for activation-group mutual exclusion and cancellation
//!
//! Covers exclusive-or firing within an activation group, idempotent
//! retraction, and the event trail the agenda leaves behind.

use std::sync::Arc;

use parking_lot::Mutex;

use cadence::engine::event::{ActivationEvent, AgendaEventListener, CancelCause};
use cadence::engine::rule::{Consequence, ConsequenceContext, Rule, RuleCatalog, RuleId};
use cadence::engine::tuple::Tuple;
use cadence::{Match, Session, SessionConfig};

struct Recorder {
    log: Arc<Mutex<Vec<String>>>,
}

impl Consequence for Recorder {
    fn evaluate(&self, context: &mut ConsequenceContext<'_>) -> anyhow::Result<()> {
        self.log.lock().push(context.rule().name.clone());
        Ok(())
    }
}

fn exclusive_rule(name: &str, group: &str, log: &Arc<Mutex<Vec<String>>>) -> Rule {
    let mut rule = Rule::new(name, Arc::new(Recorder { log: log.clone() }));
    rule.activation_group = Some(group.to_string());
    rule
}

fn empty_tuple() -> Arc<Tuple> {
    Arc::new(Tuple::default())
}

fn register_all(catalog: &RuleCatalog, rules: Vec<Rule>) -> Vec<RuleId> {
    rules.into_iter().map(|rule| catalog.register(rule)).collect()
}

#[test]
fn test_firing_one_member_cancels_the_rest() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let catalog = RuleCatalog::new();
    let ids = register_all(
        &catalog,
        vec![
            exclusive_rule("first", "X", &log),
            exclusive_rule("second", "X", &log),
            exclusive_rule("third", "X", &log),
        ],
    );

    let mut session = Session::new(catalog.snapshot(), SessionConfig::default());
    let first = session
        .notify_match(Match::new(ids[0].clone(), empty_tuple()))
        .unwrap();
    let second = session
        .notify_match(Match::new(ids[1].clone(), empty_tuple()))
        .unwrap();
    let third = session
        .notify_match(Match::new(ids[2].clone(), empty_tuple()))
        .unwrap();

    assert_eq!(session.next(), Some(first));
    session.fire(first).unwrap();

    assert_eq!(*log.lock(), vec!["first"]);
    assert!(session.agenda().activation_group("X").unwrap().is_empty());
    assert!(session.activation(second).is_none());
    assert!(session.activation(third).is_none());
    assert!(session.next().is_none());
    assert_eq!(session.agenda_size(), 0);
}

#[test]
fn test_retraction_can_leave_no_member_to_fire() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let catalog = RuleCatalog::new();
    let ids = register_all(
        &catalog,
        vec![
            exclusive_rule("one", "X", &log),
            exclusive_rule("two", "X", &log),
        ],
    );

    let mut session = Session::new(catalog.snapshot(), SessionConfig::default());
    let one = session
        .notify_match(Match::new(ids[0].clone(), empty_tuple()))
        .unwrap();
    let two = session
        .notify_match(Match::new(ids[1].clone(), empty_tuple()))
        .unwrap();

    assert!(session.notify_retract(one));
    assert!(session.notify_retract(two));

    assert!(session.next().is_none());
    assert!(log.lock().is_empty());
    assert!(session.agenda().activation_group("X").unwrap().is_empty());
}

#[test]
fn test_retraction_is_idempotent() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let catalog = RuleCatalog::new();
    let id = catalog.register(exclusive_rule("only", "X", &log));

    let mut session = Session::new(catalog.snapshot(), SessionConfig::default());
    let activation = session.notify_match(Match::new(id, empty_tuple())).unwrap();

    assert!(session.notify_retract(activation));
    let size_after_first = session.agenda_size();
    assert!(!session.notify_retract(activation));
    assert_eq!(session.agenda_size(), size_after_first);
    assert_eq!(size_after_first, 0);
}

#[test]
fn test_clear_activation_group_cancels_members() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let catalog = RuleCatalog::new();
    let ids = register_all(
        &catalog,
        vec![
            exclusive_rule("one", "X", &log),
            exclusive_rule("two", "X", &log),
        ],
    );

    let mut session = Session::new(catalog.snapshot(), SessionConfig::default());
    for id in &ids {
        session
            .notify_match(Match::new(id.clone(), empty_tuple()))
            .unwrap();
    }

    session.clear_activation_group("X");

    assert_eq!(session.agenda_size(), 0);
    assert!(session.next().is_none());
    assert!(log.lock().is_empty());
}

struct EventTrail {
    log: Arc<Mutex<Vec<String>>>,
}

impl AgendaEventListener for EventTrail {
    fn activation_created(&mut self, event: &ActivationEvent) {
        self.log.lock().push(format!("created:{}", event.rule));
    }

    fn activation_canceled(&mut self, event: &ActivationEvent, cause: CancelCause) {
        self.log
            .lock()
            .push(format!("canceled:{}:{:?}", event.rule, cause));
    }

    fn before_activation_fired(&mut self, event: &ActivationEvent) {
        self.log.lock().push(format!("before:{}", event.rule));
    }

    fn after_activation_fired(&mut self, event: &ActivationEvent) {
        self.log.lock().push(format!("after:{}", event.rule));
    }
}

#[test]
fn test_event_trail_for_exclusive_fire() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let fired = Arc::new(Mutex::new(Vec::new()));
    let catalog = RuleCatalog::new();
    let ids = register_all(
        &catalog,
        vec![
            exclusive_rule("winner", "X", &fired),
            exclusive_rule("loser", "X", &fired),
        ],
    );

    let mut session = Session::new(catalog.snapshot(), SessionConfig::default());
    session.register_listener(Box::new(EventTrail { log: log.clone() }));

    let winner = session
        .notify_match(Match::new(ids[0].clone(), empty_tuple()))
        .unwrap();
    session
        .notify_match(Match::new(ids[1].clone(), empty_tuple()))
        .unwrap();
    session.fire(winner).unwrap();

    assert_eq!(
        *log.lock(),
        vec![
            "created:winner",
            "created:loser",
            "canceled:loser:Excluded",
            "before:winner",
            "after:winner",
        ]
    );
}
