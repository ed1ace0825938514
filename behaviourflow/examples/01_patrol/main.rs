// Copyright © 2024 Stephan Kunz

//! A guard walks between random waypoints, resting a few frames at each one.
//!
//! Shows targeted actions acting on an owner component, blackboard
//! variables declared by the tree and a runner repeating the tree forever.
//!
//! Run with `RUST_LOG=behaviourflow=debug` to follow the executor.

use behaviourflow::prelude::*;
use rand::Rng;

#[derive(Debug, Default)]
struct Position {
    x: i32,
    y: i32,
}

/// Moves the target one step per frame towards `goal`.
struct MoveTo {
    goal: Option<(i32, i32)>,
}

impl TargetedAction<Position> for MoveTo {
    fn on_enter(&mut self, target: &mut Position, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        let goal = (rand::thread_rng().gen_range(-4..=4), rand::thread_rng().gen_range(-4..=4));
        println!("[{}] heading from ({}, {}) to {goal:?}", ctx.owner().name(), target.x, target.y);
        self.goal = Some(goal);
        ExecutionStatus::Running
    }

    fn on_tick(&mut self, target: &mut Position, _ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        let Some((x, y)) = self.goal else {
            return ExecutionStatus::Failure;
        };

        target.x += (x - target.x).signum();
        target.y += (y - target.y).signum();
        if (target.x, target.y) == (x, y) {
            ExecutionStatus::Success
        } else {
            ExecutionStatus::Running
        }
    }
}

/// Counts finished patrol legs on the blackboard.
struct CountLeg {
    legs: BlackboardRef<i64>,
}

impl Action for CountLeg {
    fn on_initialize(&mut self, ctx: &InitContext<'_>) {
        ctx.bind(&mut self.legs);
    }

    fn on_enter(&mut self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        let legs = self.legs.get(ctx.blackboard()).unwrap_or(0) + 1;
        match self.legs.set(ctx.blackboard(), legs) {
            Ok(()) => {
                println!("[{}] leg {legs} done", ctx.owner().name());
                ExecutionStatus::Success
            }
            Err(_) => ExecutionStatus::Failure,
        }
    }
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let owner = Owner::new("guard");
    let position = owner.add_component(Position::default());

    let mut tree = BehaviourTree::new("patrol").with_variable("legs", 0);
    let root = tree.add_action("patrol", Sequence);
    tree.add_child(root, "walk", Targeted::<_, Position>::new(MoveTo { goal: None }));
    tree.add_child(root, "rest", Wait::frames(2));
    tree.add_child(
        root,
        "count",
        CountLeg {
            legs: BlackboardRef::named("legs"),
        },
    );

    let config = RunnerConfig {
        repeat: RepeatMode::Forever,
        ..RunnerConfig::default()
    };
    let mut runner = BehaviourRunner::new(tree, owner, config)?;
    runner.run_frames(60);

    let legs: i64 = runner.owner().blackboard().get_by_name("legs")?;
    let position = position.read();
    println!(
        "after {} frames: {legs} legs, standing at ({}, {})",
        runner.frames(),
        position.x,
        position.y
    );

    Ok(())
}
