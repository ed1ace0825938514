use crate::{
    basic_types::ExecutionStatus,
    conditions::{Condition, ConditionGroup, ExpressionCondition},
    error::BlackboardError,
    nodes::Action,
    tree::ActionContext,
};

/// Evaluates a [`ConditionGroup`]: Success when it holds, Failure otherwise.
///
/// Built with [`CheckCondition::wait_until`], the action instead keeps
/// running and re-evaluates every frame until the group holds.
#[derive(Debug)]
pub struct CheckCondition {
    group: ConditionGroup,
    wait: bool,
}

impl CheckCondition {
    pub fn new(group: ConditionGroup) -> Self {
        Self { group, wait: false }
    }

    pub fn single(condition: impl Condition + 'static) -> Self {
        Self::new(ConditionGroup::all().with(condition))
    }

    /// Shorthand for a single blackboard expression such as `ammo > 0`.
    pub fn expression(source: &str) -> Result<Self, BlackboardError> {
        Ok(Self::single(ExpressionCondition::new(source)?))
    }

    pub fn wait_until(group: ConditionGroup) -> Self {
        Self { group, wait: true }
    }

    pub fn group(&self) -> &ConditionGroup {
        &self.group
    }
}

impl Action for CheckCondition {
    fn on_enter(&mut self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        self.group.enable(ctx.owner());
        if self.group.evaluate(ctx.owner()) {
            return ExecutionStatus::Success;
        }

        if self.wait {
            ctx.enable_ticking();
            ExecutionStatus::Running
        } else {
            ExecutionStatus::Failure
        }
    }

    fn on_tick(&mut self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        if self.group.evaluate(ctx.owner()) {
            ExecutionStatus::Success
        } else {
            ExecutionStatus::Running
        }
    }

    fn on_exit(&mut self, ctx: &mut ActionContext<'_>) {
        self.group.disable(ctx.owner());
    }
}
