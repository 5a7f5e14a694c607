//! Integration tests for agenda-group focus control
//!
//! Covers phase transitions through the focus stack: pushing and popping
//! frames, empty focused groups masking eligible work in lower frames,
//! clearing a phase in place, and the implicit default focus.

use std::sync::Arc;

use parking_lot::Mutex;

use cadence::engine::event::{AgendaEventListener, GroupEvent};
use cadence::engine::rule::{Consequence, ConsequenceContext, Rule, RuleCatalog, RuleId};
use cadence::engine::tuple::Tuple;
use cadence::{Match, Session, SessionConfig};

struct Noop;

impl Consequence for Noop {
    fn evaluate(&self, _context: &mut ConsequenceContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

fn grouped_rule(name: &str, agenda_group: Option<&str>) -> Rule {
    let mut rule = Rule::new(name, Arc::new(Noop));
    rule.agenda_group = agenda_group.map(str::to_string);
    rule
}

fn session_with(rules: Vec<Rule>) -> (Session, Vec<RuleId>) {
    let catalog = RuleCatalog::new();
    let ids = rules.into_iter().map(|rule| catalog.register(rule)).collect();
    (
        Session::new(catalog.snapshot(), SessionConfig::default()),
        ids,
    )
}

fn empty_tuple() -> Arc<Tuple> {
    Arc::new(Tuple::default())
}

#[test]
fn test_focus_serves_top_group_until_popped() {
    let (mut session, ids) = session_with(vec![
        grouped_rule("a-rule", Some("A")),
        grouped_rule("b-rule", Some("B")),
    ]);

    session.push_focus("A");
    let a_activation = session
        .notify_match(Match::new(ids[0].clone(), empty_tuple()))
        .unwrap();
    session.push_focus("B");
    let b_activation = session
        .notify_match(Match::new(ids[1].clone(), empty_tuple()))
        .unwrap();

    assert_eq!(session.current_focus(), Some("B"));
    assert_eq!(session.next(), Some(b_activation));
    session.fire(b_activation).unwrap();

    // B is exhausted; the loop pops it and A becomes eligible again.
    assert!(session.focused_group_is_empty());
    assert_eq!(session.pop_focus(), Some("B".to_string()));
    assert_eq!(session.current_focus(), Some("A"));
    assert_eq!(session.next(), Some(a_activation));
}

#[test]
fn test_empty_focused_group_masks_lower_frames() {
    let (mut session, ids) = session_with(vec![grouped_rule("alpha-rule", Some("alpha"))]);

    session.push_focus("alpha");
    session
        .notify_match(Match::new(ids[0].clone(), empty_tuple()))
        .unwrap();
    session.push_focus("beta");

    assert_eq!(session.current_focus(), Some("beta"));
    assert!(session.next().is_none());
    assert!(!session.has_eligible_activation());
    assert!(session.focused_group_is_empty());

    assert_eq!(session.pop_focus(), Some("beta".to_string()));
    assert!(session.has_eligible_activation());
}

#[test]
fn test_duplicate_frames_keep_group_focused() {
    let (mut session, ids) = session_with(vec![grouped_rule("a-rule", Some("A"))]);

    session.push_focus("A");
    session.push_focus("A");
    let activation = session
        .notify_match(Match::new(ids[0].clone(), empty_tuple()))
        .unwrap();

    assert_eq!(session.pop_focus(), Some("A".to_string()));
    assert_eq!(session.current_focus(), Some("A"));
    assert!(session.agenda().agenda_group("A").unwrap().is_active());
    assert_eq!(session.next(), Some(activation));
}

#[test]
fn test_pop_on_empty_stack_is_a_noop() {
    let (mut session, _) = session_with(vec![]);

    assert_eq!(session.pop_focus(), None);
    assert_eq!(session.current_focus(), Some("MAIN"));
}

#[test]
fn test_clear_abandons_phase_without_popping() {
    let (mut session, ids) = session_with(vec![
        grouped_rule("first", Some("triage")),
        grouped_rule("second", Some("triage")),
    ]);

    session.push_focus("triage");
    let first = session
        .notify_match(Match::new(ids[0].clone(), empty_tuple()))
        .unwrap();
    session
        .notify_match(Match::new(ids[1].clone(), empty_tuple()))
        .unwrap();

    session.clear_agenda_group("triage");

    assert_eq!(session.current_focus(), Some("triage"));
    assert!(session.focused_group_is_empty());
    assert_eq!(session.agenda_size(), 0);
    assert!(session.activation(first).is_none());
}

#[test]
fn test_without_implicit_main_focus_nothing_is_eligible() {
    let catalog = RuleCatalog::new();
    let id = catalog.register(grouped_rule("ungrouped", None));

    let config = SessionConfig {
        implicit_main_focus: false,
    };
    let mut session = Session::new(catalog.snapshot(), config);
    session.notify_match(Match::new(id, empty_tuple())).unwrap();

    assert_eq!(session.current_focus(), None);
    assert!(session.next().is_none());

    // Explicitly focusing the default group exposes the pending work.
    session.push_focus("MAIN");
    assert!(session.next().is_some());
}

struct FocusLog {
    log: Arc<Mutex<Vec<String>>>,
}

impl AgendaEventListener for FocusLog {
    fn agenda_group_pushed(&mut self, event: &GroupEvent) {
        self.log.lock().push(format!("pushed:{}", event.group));
    }

    fn agenda_group_popped(&mut self, event: &GroupEvent) {
        self.log.lock().push(format!("popped:{}", event.group));
    }
}

#[test]
fn test_focus_transitions_are_observable() {
    let (mut session, _) = session_with(vec![]);
    let log = Arc::new(Mutex::new(Vec::new()));
    session.register_listener(Box::new(FocusLog { log: log.clone() }));

    session.push_focus("A");
    session.push_focus("B");
    assert_eq!(session.pop_focus(), Some("B".to_string()));

    assert_eq!(*log.lock(), vec!["pushed:A", "pushed:B", "popped:B"]);
}
