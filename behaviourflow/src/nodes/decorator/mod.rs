//! Single-child actions that alter how their child's result is reported.

mod repeat;

pub use repeat::Repeat;

use crate::{
    basic_types::{ExecutionStatus, NodeId},
    nodes::Action,
    tree::ActionContext,
};

/// Flips the result of its first child. Fails without a child.
#[derive(Clone, Copy, Debug, Default)]
pub struct Inverter;

impl Action for Inverter {
    fn on_enter(&mut self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        let Some(child) = ctx.child(0) else {
            log::error!("action '{}': inverter without child", ctx.name());
            return ExecutionStatus::Failure;
        };

        match ctx.enter(child).result() {
            Some(result) => result.inverted().into(),
            None => ExecutionStatus::Running,
        }
    }

    fn on_traversal(&mut self, ctx: &mut ActionContext<'_>, child: NodeId) -> ExecutionStatus {
        match ctx.status_of(child).result() {
            Some(result) => result.inverted().into(),
            None => ExecutionStatus::Running,
        }
    }
}
