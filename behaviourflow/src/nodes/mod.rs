//! The action extension contract and the stock node catalogue.

pub mod action;
pub mod control;
pub mod decorator;

use crate::{
    basic_types::{ActionResult, ExecutionStatus, NodeId},
    tree::{ActionContext, InitContext},
};

pub use action::{
    condition::CheckCondition, AlwaysFailure, AlwaysSuccess, NestedBehaviour, SetVariable,
    Targeted, TargetedAction, Wait,
};
pub use control::{Parallel, ParallelPolicy, Selector, Sequence};
pub use decorator::{Inverter, Repeat};

/// A unit of behaviour tree logic.
///
/// The executor owns the lifecycle (`Inactive -> Running -> Success | Failure`);
/// implementors only answer the hooks. Every hook has a default, so a leaf
/// that succeeds immediately only needs `on_enter`.
///
/// Actions that keep running across frames must register for ticking with
/// [`ActionContext::enable_ticking`]; leaving the action drops the
/// registration again.
pub trait Action {
    /// Called once when the owning tree is initialized.
    fn on_initialize(&mut self, _ctx: &InitContext<'_>) {}

    fn on_enter(&mut self, _ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        ExecutionStatus::Running
    }

    fn on_tick(&mut self, _ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        ExecutionStatus::Running
    }

    /// Called on a parent when `child` finished during a tick pass. Returning a
    /// finished status finishes this action too and continues the climb.
    fn on_traversal(&mut self, _ctx: &mut ActionContext<'_>, _child: NodeId) -> ExecutionStatus {
        ExecutionStatus::Success
    }

    fn on_interrupt(&mut self, _ctx: &mut ActionContext<'_>) {}

    fn on_result(&mut self, _ctx: &mut ActionContext<'_>, _result: ActionResult) {}

    fn on_exit(&mut self, _ctx: &mut ActionContext<'_>) {}

    /// Called when the action returns to `Inactive`.
    fn on_reset(&mut self) {}
}
