// Copyright © 2024 Stephan Kunz

//! Custom types on the blackboard and a state nested inside a tree.
//!
//! A `Route` is stored as a dynamic blackboard value. The tree first checks an
//! expression over plain variables, then runs a small state machine that
//! walks the route, and finally retries until the route is completed.

use behaviourflow::prelude::*;

#[derive(Clone, Debug, Default)]
struct Route {
    stops: Vec<String>,
    next: usize,
}

impl BlackboardValue for Route {
    fn as_string(&self) -> Option<String> {
        Some(self.stops.join(" -> "))
    }
}

/// Visits one stop of the `route` variable per enter.
struct VisitStop {
    route: BlackboardRef<Route>,
}

impl Action for VisitStop {
    fn on_initialize(&mut self, ctx: &InitContext<'_>) {
        ctx.bind(&mut self.route);
    }

    fn on_enter(&mut self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        let Ok(mut route) = self.route.get(ctx.blackboard()) else {
            return ExecutionStatus::Failure;
        };
        let Some(stop) = route.stops.get(route.next).cloned() else {
            return ExecutionStatus::Failure;
        };

        println!("visiting {stop}");
        route.next += 1;
        match self.route.set(ctx.blackboard(), route) {
            Ok(()) => ExecutionStatus::Success,
            Err(_) => ExecutionStatus::Failure,
        }
    }
}

fn visit_tree() -> BehaviourTree {
    let mut tree = BehaviourTree::new("visit");
    let root = tree.add_action("visit", Sequence);
    tree.add_child(
        root,
        "stop",
        VisitStop {
            route: BlackboardRef::named("route"),
        },
    );
    tree.add_child(root, "linger", Wait::frames(1));
    tree
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let owner = Owner::new("courier");
    owner.blackboard().declare(
        "route",
        Route {
            stops: vec!["depot".into(), "market".into(), "harbour".into()],
            next: 0,
        },
    );
    owner.blackboard().declare("fuel", 2.5);

    let mut machine = StateMachine::new("route");
    let visit = machine.add_state("visit", visit_tree);
    machine.add_transition(visit, StateTransition::on_success(visit).when(FnCondition::new(
        |owner: &Owner| {
            owner
                .blackboard()
                .get_by_name::<Route>("route")
                .is_ok_and(|route| route.next < route.stops.len())
        },
    )));

    let mut tree = BehaviourTree::new("courier");
    let root = tree.add_action("deliver", Sequence);
    tree.add_child(root, "fuelled", CheckCondition::expression("fuel > 1.0")?);
    tree.add_child(root, "route", NestedBehaviour::new(machine));

    let config = RunnerConfig {
        repeat: RepeatMode::UntilSuccess,
        ..RunnerConfig::default()
    };
    let mut runner = BehaviourRunner::new(tree, owner.clone(), config)?;
    let status = runner.run_frames(20);

    let route = owner
        .blackboard()
        .value_by_name("route")
        .and_then(|value| value.as_string())
        .unwrap_or_default();
    println!("{status} after {} frames on route {route}", runner.frames());

    Ok(())
}
