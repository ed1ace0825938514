use crate::{
    basic_types::{ActionStatus, ExecutionStatus, NodeId},
    nodes::Action,
    tree::ActionContext,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParallelPolicy {
    /// Succeed once all children succeed, fail as soon as one fails.
    #[default]
    RequireAll,
    /// Succeed as soon as one child succeeds, fail once all children fail.
    RequireOne,
}

/// Enters every child at once. Children still running when the outcome is
/// decided are interrupted.
#[derive(Clone, Copy, Debug, Default)]
pub struct Parallel {
    policy: ParallelPolicy,
}

impl Parallel {
    pub fn new(policy: ParallelPolicy) -> Self {
        Self { policy }
    }

    fn outcome(&self, ctx: &ActionContext<'_>) -> ExecutionStatus {
        let total = ctx.child_count();
        let (mut succeeded, mut failed) = (0, 0);
        for child in ctx.children() {
            match ctx.status_of(*child) {
                ActionStatus::Success => succeeded += 1,
                ActionStatus::Failure => failed += 1,
                ActionStatus::Inactive | ActionStatus::Running => {}
            }
        }

        match self.policy {
            ParallelPolicy::RequireAll if failed > 0 => ExecutionStatus::Failure,
            ParallelPolicy::RequireAll if succeeded == total => ExecutionStatus::Success,
            ParallelPolicy::RequireOne if succeeded > 0 => ExecutionStatus::Success,
            ParallelPolicy::RequireOne if failed == total => ExecutionStatus::Failure,
            _ => ExecutionStatus::Running,
        }
    }

    fn conclude(&self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        let outcome = self.outcome(ctx);
        if outcome.is_finished() {
            ctx.interrupt_children();
        }
        outcome
    }
}

impl Action for Parallel {
    fn on_enter(&mut self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        let children = ctx.children().to_vec();
        for child in children {
            ctx.enter(child);
            if self.outcome(ctx).is_finished() {
                break;
            }
        }

        self.conclude(ctx)
    }

    fn on_traversal(&mut self, ctx: &mut ActionContext<'_>, _child: NodeId) -> ExecutionStatus {
        self.conclude(ctx)
    }
}
