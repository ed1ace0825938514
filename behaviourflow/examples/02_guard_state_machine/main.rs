// Copyright © 2024 Stephan Kunz

//! A guard switches between patrolling, chasing and resting.
//!
//! - `patrol` is preempted by an `OnTick` transition once a loud enough noise
//!   was heard,
//! - `chase` drains stamina and hands over to `rest` when it is used up,
//! - `rest` recovers stamina and returns to `patrol`.
//!
//! Noises are sent to the owner's event bus at random frames.

use behaviourflow::prelude::*;
use rand::Rng;

struct Noise {
    volume: u32,
}

/// Adds `delta` to the `stamina` variable every frame until `until` holds.
struct Stamina {
    delta: i64,
    until: ExpressionCondition,
}

impl Action for Stamina {
    fn on_enter(&mut self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        ctx.enable_ticking();
        ExecutionStatus::Running
    }

    fn on_tick(&mut self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        let blackboard = ctx.blackboard();
        let stamina = blackboard.get_by_name::<i64>("stamina").unwrap_or(0) + self.delta;
        if blackboard.set_by_name("stamina", stamina).is_err() {
            return ExecutionStatus::Failure;
        }

        match self.until.evaluate_with(blackboard) {
            Ok(true) => ExecutionStatus::Success,
            Ok(false) => ExecutionStatus::Running,
            Err(error) => {
                log::error!("stamina check failed: {error}");
                ExecutionStatus::Failure
            }
        }
    }
}

fn stamina_tree(name: &str, delta: i64, until: &str) -> anyhow::Result<BehaviourTree> {
    let mut tree = BehaviourTree::new(name).with_variable("stamina", 10);
    tree.add_action(
        name,
        Stamina {
            delta,
            until: ExpressionCondition::new(until)?,
        },
    );
    Ok(tree)
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    // validate the expressions once up front
    stamina_tree("chase", -3, "stamina <= 0")?;
    stamina_tree("rest", 2, "stamina >= 10")?;

    let mut machine = StateMachine::new("guard");
    let patrol = machine.add_state("patrol", || {
        let mut tree = BehaviourTree::new("patrol");
        tree.add_action("walk", Wait::frames(1000));
        tree
    });
    let chase = machine.add_state("chase", || {
        stamina_tree("chase", -3, "stamina <= 0").unwrap_or_else(|_| BehaviourTree::new("chase"))
    });
    let rest = machine.add_state("rest", || {
        stamina_tree("rest", 2, "stamina >= 10").unwrap_or_else(|_| BehaviourTree::new("rest"))
    });

    machine.add_transition(
        patrol,
        StateTransition::on_tick(chase)
            .when(EventCondition::<Noise>::matching(|noise| noise.volume > 5)),
    );
    machine.add_transition(chase, StateTransition::on_success(rest));
    machine.add_transition(rest, StateTransition::on_success(patrol));

    let owner = Owner::new("guard");
    let mut runner = BehaviourRunner::new(machine, owner.clone(), RunnerConfig::default())?;

    let mut rng = rand::thread_rng();
    let mut previous = None;
    for frame in 0..40 {
        if rng.gen_bool(0.2) {
            let volume = rng.gen_range(0..10);
            if let Err(error) = owner.send_event(&Noise { volume }) {
                log::warn!("noise listeners failed: {error}");
            }
        }

        runner.tick();
        let state = runner.behaviour().active_state_name().map(str::to_owned);
        if state != previous {
            let stamina: i64 = owner.blackboard().get_by_name("stamina").unwrap_or(0);
            println!("frame {frame:2}: {} (stamina {stamina})", state.as_deref().unwrap_or("-"));
            previous = state;
        }
    }

    Ok(())
}
