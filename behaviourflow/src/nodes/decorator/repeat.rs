use crate::{
    basic_types::{ActionStatus, ExecutionStatus, NodeId},
    nodes::Action,
    tree::ActionContext,
};

/// Re-enters its child after every success, a fixed number of times or
/// forever. Fails as soon as the child fails.
///
/// A child that finishes on enter is re-entered at most once per frame; the
/// decorator ticks itself to drive those iterations.
#[derive(Clone, Copy, Debug)]
pub struct Repeat {
    limit: Option<u32>,
    completed: u32,
}

impl Repeat {
    pub fn times(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            completed: 0,
        }
    }

    pub fn forever() -> Self {
        Self {
            limit: None,
            completed: 0,
        }
    }

    pub fn completed(&self) -> u32 {
        self.completed
    }

    fn exhausted(&self) -> bool {
        self.limit.is_some_and(|limit| self.completed >= limit)
    }

    fn step(&mut self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        if self.exhausted() {
            return ExecutionStatus::Success;
        }
        let Some(child) = ctx.child(0) else {
            log::error!("action '{}': repeat without child", ctx.name());
            return ExecutionStatus::Failure;
        };

        match ctx.enter(child) {
            ExecutionStatus::Running => {
                if ctx.is_ticking() {
                    ctx.disable_ticking();
                }
                ExecutionStatus::Running
            }
            ExecutionStatus::Failure => ExecutionStatus::Failure,
            ExecutionStatus::Success => {
                self.completed += 1;
                if self.exhausted() {
                    return ExecutionStatus::Success;
                }
                if !ctx.is_ticking() {
                    ctx.enable_ticking();
                }
                ExecutionStatus::Running
            }
        }
    }
}

impl Action for Repeat {
    fn on_enter(&mut self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        self.completed = 0;
        self.step(ctx)
    }

    fn on_tick(&mut self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        self.step(ctx)
    }

    fn on_traversal(&mut self, ctx: &mut ActionContext<'_>, child: NodeId) -> ExecutionStatus {
        match ctx.status_of(child) {
            ActionStatus::Failure => ExecutionStatus::Failure,
            ActionStatus::Success => {
                self.completed += 1;
                self.step(ctx)
            }
            ActionStatus::Inactive | ActionStatus::Running => ExecutionStatus::Running,
        }
    }

    fn on_reset(&mut self) {
        self.completed = 0;
    }
}
