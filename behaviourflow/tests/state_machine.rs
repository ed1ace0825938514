use std::{cell::Cell, rc::Rc};

use behaviourflow::prelude::*;
use nodes::{leaf_tree, owner};

mod nodes;

fn waiting(name: &'static str, frames: u32) -> impl Fn() -> BehaviourTree {
    move || leaf_tree(name, Wait::frames(frames))
}

fn instant(name: &'static str, succeeds: bool) -> impl Fn() -> BehaviourTree {
    move || {
        if succeeds {
            leaf_tree(name, AlwaysSuccess)
        } else {
            leaf_tree(name, AlwaysFailure)
        }
    }
}

struct Alarm;

#[test]
fn dead_end_finishes_the_machine_with_success() {
    let mut machine = StateMachine::new("dead-end");
    let s1 = machine.add_state("s1", waiting("s1", 1));
    let s2 = machine.add_state("s2", waiting("s2", 1));
    machine.add_transition(s1, StateTransition::on_success(s2));
    machine.initialize(&owner()).unwrap();

    assert_eq!(machine.start(), ExecutionStatus::Running);
    assert_eq!(machine.active_state(), Some(s1));

    assert_eq!(machine.tick(), ExecutionStatus::Running);
    assert_eq!(machine.active_state_name(), Some("s2"));
    assert_eq!(machine.state_status(s1), ActionStatus::Success);

    assert_eq!(machine.tick(), ExecutionStatus::Success);
    assert_eq!(machine.status(), ActionStatus::Success);
    assert_eq!(machine.state_status(s2), ActionStatus::Success);

    // No looping once finished.
    assert_eq!(machine.tick(), ExecutionStatus::Success);
    assert_eq!(machine.active_state(), Some(s2));
}

#[test]
fn first_matching_transition_wins() {
    let mut machine = StateMachine::new("selection");
    let start = machine.add_state("start", instant("start", false));
    let won = machine.add_state("won", waiting("won", 5));
    let lost = machine.add_state("lost", waiting("lost", 5));
    let guarded = machine.add_state("guarded", waiting("guarded", 5));
    let any = machine.add_state("any", waiting("any", 5));

    machine.add_transition(start, StateTransition::on_success(won));
    machine.add_transition(
        start,
        StateTransition::on_failure(guarded).when(FnCondition::new(|_: &Owner| false)),
    );
    machine.add_transition(start, StateTransition::on_failure(lost));
    machine.add_transition(start, StateTransition::on_finish(any));
    machine.initialize(&owner()).unwrap();

    assert_eq!(machine.start(), ExecutionStatus::Running);
    assert_eq!(machine.active_state(), Some(lost));
    assert_eq!(machine.state_status(guarded), ActionStatus::Inactive);
}

#[test]
fn on_tick_transition_preempts_a_running_state() {
    let owner = owner();
    let mut machine = StateMachine::new("guard");
    let patrol = machine.add_state("patrol", waiting("patrol", 100));
    let chase = machine.add_state("chase", waiting("chase", 100));
    machine.add_transition(
        patrol,
        StateTransition::on_tick(chase).when(EventCondition::<Alarm>::new()),
    );
    machine.initialize(&owner).unwrap();

    // Events before the state is entered do not count.
    owner.send_event(&Alarm).unwrap();
    machine.start();
    assert_eq!(owner.events().listener_count::<Alarm>(), 1);
    assert_eq!(machine.tick(), ExecutionStatus::Running);
    assert_eq!(machine.active_state(), Some(patrol));

    owner.send_event(&Alarm).unwrap();
    assert_eq!(machine.tick(), ExecutionStatus::Running);
    assert_eq!(machine.active_state(), Some(chase));
    assert_eq!(machine.state_status(patrol), ActionStatus::Failure);
    assert_eq!(machine.state_status(chase), ActionStatus::Running);
    assert_eq!(owner.events().listener_count::<Alarm>(), 0);
}

#[test]
fn states_are_built_lazily_and_reused() {
    let builds = Rc::new(Cell::new(0));
    let factory = |name: &'static str, builds: Rc<Cell<u32>>| {
        move || {
            builds.set(builds.get() + 1);
            leaf_tree(name, Wait::frames(1))
        }
    };

    let mut machine = StateMachine::new("ping-pong");
    let ping = machine.add_state("ping", factory("ping", builds.clone()));
    let pong = machine.add_state("pong", factory("pong", builds.clone()));
    machine.add_transition(ping, StateTransition::on_success(pong));
    machine.add_transition(pong, StateTransition::on_success(ping));
    machine.initialize(&owner()).unwrap();

    assert!(!machine.state(ping).unwrap().is_instantiated());
    machine.start();
    assert!(machine.state(ping).unwrap().is_instantiated());
    assert!(!machine.state(pong).unwrap().is_instantiated());

    for expected in [pong, ping, pong, ping] {
        assert_eq!(machine.tick(), ExecutionStatus::Running);
        assert_eq!(machine.active_state(), Some(expected));
    }
    assert_eq!(builds.get(), 2);
}

#[test]
fn instant_states_chain_within_a_bounded_number_of_hops() {
    let mut machine = StateMachine::new("spin");
    let a = machine.add_state("a", instant("a", true));
    let b = machine.add_state("b", instant("b", true));
    machine.add_transition(a, StateTransition::on_finish(b));
    machine.add_transition(b, StateTransition::on_finish(a));
    machine.initialize(&owner()).unwrap();

    assert_eq!(machine.start(), ExecutionStatus::Running);
    assert_eq!(machine.tick(), ExecutionStatus::Running);
}

#[test]
fn guards_are_evaluated_once_per_hop_taken() {
    let evaluations = Rc::new(Cell::new(0));
    let counter = evaluations.clone();

    let mut machine = StateMachine::new("spin");
    let a = machine.add_state("a", instant("a", true));
    let b = machine.add_state("b", instant("b", true));
    machine.add_transition(
        a,
        StateTransition::on_finish(b).when(FnCondition::new(move |_: &Owner| {
            counter.set(counter.get() + 1);
            true
        })),
    );
    machine.add_transition(b, StateTransition::on_finish(a));
    machine.initialize(&owner()).unwrap();

    // a -> b -> a, then the hop bound ends the frame before a is checked again.
    assert_eq!(machine.start(), ExecutionStatus::Running);
    assert_eq!(machine.active_state(), Some(a));
    assert_eq!(evaluations.get(), 1);

    assert_eq!(machine.tick(), ExecutionStatus::Running);
    assert_eq!(machine.active_state(), Some(a));
    assert_eq!(evaluations.get(), 2);
}

#[test]
fn instant_state_chains_into_its_transitions() {
    let mut machine = StateMachine::new("chain");
    let check = machine.add_state("check", instant("check", true));
    let act = machine.add_state("act", waiting("act", 1));
    machine.add_transition(check, StateTransition::on_success(act));
    machine.initialize(&owner()).unwrap();

    assert_eq!(machine.start(), ExecutionStatus::Running);
    assert_eq!(machine.active_state(), Some(act));
    assert_eq!(machine.tick(), ExecutionStatus::Success);
}

#[test]
fn missing_entry_refuses_to_initialize() {
    let mut machine = StateMachine::new("empty");

    assert!(matches!(
        machine.initialize(&owner()),
        Err(BehaviourError::MissingEntry(_))
    ));
    assert!(!machine.is_initialized());
    assert_eq!(machine.start(), ExecutionStatus::Failure);
}

#[test]
fn unknown_transition_target_is_rejected() {
    let mut other = StateMachine::new("other");
    other.add_state("x", waiting("x", 1));
    other.add_state("y", waiting("y", 1));
    let foreign = other.add_state("z", waiting("z", 1));

    let mut machine = StateMachine::new("broken");
    let only = machine.add_state("only", waiting("only", 1));
    machine.add_transition(only, StateTransition::on_finish(foreign));

    assert!(matches!(
        machine.initialize(&owner()),
        Err(BehaviourError::InvalidGraph { .. })
    ));
}

#[test]
fn machines_nest_inside_states() {
    let mut machine = StateMachine::new("outer");
    machine.add_state("inner", || {
        let mut inner = StateMachine::new("inner");
        let first = inner.add_state("first", waiting("first", 1));
        let second = inner.add_state("second", waiting("second", 1));
        inner.add_transition(first, StateTransition::on_success(second));
        inner
    });
    machine.initialize(&owner()).unwrap();

    assert_eq!(machine.start(), ExecutionStatus::Running);
    assert_eq!(machine.tick(), ExecutionStatus::Running);
    assert_eq!(machine.tick(), ExecutionStatus::Success);
}

#[test]
fn trees_and_machines_nest_each_other() {
    let owner = owner();
    let mut machine = StateMachine::new("nested");
    let s1 = machine.add_state("s1", waiting("s1", 1));
    let s2 = machine.add_state("s2", instant("s2", true));
    machine.add_transition(s1, StateTransition::on_success(s2));

    let mut tree = BehaviourTree::new("host");
    let root = tree.add_action("root", Sequence);
    tree.add_child(root, "machine", NestedBehaviour::new(machine));
    tree.add_child(root, "after", SetVariable::new("after", true));
    tree.initialize(&owner).unwrap();

    assert_eq!(tree.start(), ExecutionStatus::Running);
    assert_eq!(tree.tick(), ExecutionStatus::Success);
    assert!(owner.blackboard().get_by_name::<bool>("after").unwrap());
}

#[test]
fn stop_interrupts_the_active_state() {
    let owner = owner();
    let mut machine = StateMachine::new("stop");
    let patrol = machine.add_state("patrol", waiting("patrol", 10));
    let chase = machine.add_state("chase", waiting("chase", 10));
    machine.add_transition(
        patrol,
        StateTransition::on_tick(chase).when(EventCondition::<Alarm>::new()),
    );
    machine.initialize(&owner).unwrap();

    machine.start();
    machine.tick();
    machine.stop();

    assert_eq!(machine.status(), ActionStatus::Inactive);
    assert_eq!(machine.active_state(), None);
    assert_eq!(machine.state_status(patrol), ActionStatus::Inactive);
    assert_eq!(owner.events().listener_count::<Alarm>(), 0);

    assert_eq!(machine.tick(), ExecutionStatus::Running);
    assert_eq!(machine.active_state(), Some(patrol));
}

#[test]
fn state_breakpoints_are_recorded() {
    let mut machine = StateMachine::new("debug");
    let s1 = machine.add_state("s1", waiting("s1", 1));
    machine.set_breakpoint(s1, true);
    machine.initialize(&owner()).unwrap();

    machine.start();
    assert_eq!(machine.take_breakpoint(), Some(s1));
    assert_eq!(machine.take_breakpoint(), None);
}
