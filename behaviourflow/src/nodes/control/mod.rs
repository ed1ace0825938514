//! Composite actions that drive several children.
//!
//! Composites never tick themselves. They enter children from `on_enter` and
//! react to finished children in `on_traversal`.

mod parallel;

pub use parallel::{Parallel, ParallelPolicy};

use crate::{
    basic_types::{ExecutionStatus, NodeId},
    nodes::Action,
    tree::ActionContext,
};

/// Enters children left to right from `from`, stopping at the first child
/// that is still running or that finished with `stop_on`.
fn advance(ctx: &mut ActionContext<'_>, from: usize, stop_on: ExecutionStatus) -> ExecutionStatus {
    let mut position = from;
    while let Some(child) = ctx.child(position) {
        let status = ctx.enter(child);
        if status == ExecutionStatus::Running || status == stop_on {
            return status;
        }
        position += 1;
    }

    match stop_on {
        ExecutionStatus::Failure => ExecutionStatus::Success,
        _ => ExecutionStatus::Failure,
    }
}

fn traverse(
    ctx: &mut ActionContext<'_>,
    child: NodeId,
    stop_on: ExecutionStatus,
) -> ExecutionStatus {
    let Some(finished) = ctx.status_of(child).execution() else {
        return ExecutionStatus::Running;
    };
    if finished == stop_on {
        return finished;
    }

    match ctx.position_of(child) {
        Some(position) => advance(ctx, position + 1, stop_on),
        None => ExecutionStatus::Failure,
    }
}

/// Succeeds when every child succeeds; fails with the first failing child.
/// An empty sequence succeeds.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sequence;

impl Action for Sequence {
    fn on_enter(&mut self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        advance(ctx, 0, ExecutionStatus::Failure)
    }

    fn on_traversal(&mut self, ctx: &mut ActionContext<'_>, child: NodeId) -> ExecutionStatus {
        traverse(ctx, child, ExecutionStatus::Failure)
    }
}

/// Succeeds with the first succeeding child; fails when every child fails.
/// An empty selector fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct Selector;

impl Action for Selector {
    fn on_enter(&mut self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        advance(ctx, 0, ExecutionStatus::Success)
    }

    fn on_traversal(&mut self, ctx: &mut ActionContext<'_>, child: NodeId) -> ExecutionStatus {
        traverse(ctx, child, ExecutionStatus::Success)
    }
}
