use std::any::type_name;

use crate::{
    basic_types::{ActionResult, ExecutionStatus},
    nodes::Action,
    owner::Component,
    tree::ActionContext,
};

/// Hooks of an action that acts upon a component `T` of its owner.
///
/// The target is write-locked for the duration of each hook.
pub trait TargetedAction<T> {
    fn on_enter(&mut self, _target: &mut T, _ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        ExecutionStatus::Running
    }

    fn on_tick(&mut self, _target: &mut T, _ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        ExecutionStatus::Running
    }

    fn on_result(&mut self, _target: &mut T, _result: ActionResult) {}

    fn on_interrupt(&mut self, _target: &mut T) {}
}

/// Adapts a [`TargetedAction`] into an [`Action`].
///
/// Without an explicit target the component is looked up on the owner the
/// first time the action is entered. If none can be found the action fails.
/// A running targeted action is ticked every frame.
pub struct Targeted<A, T> {
    action: A,
    target: Option<Component<T>>,
}

impl<A, T> Targeted<A, T>
where
    A: TargetedAction<T>,
    T: Send + Sync + 'static,
{
    pub fn new(action: A) -> Self {
        Self {
            action,
            target: None,
        }
    }

    pub fn with_target(action: A, target: Component<T>) -> Self {
        Self {
            action,
            target: Some(target),
        }
    }

    pub fn target(&self) -> Option<&Component<T>> {
        self.target.as_ref()
    }
}

impl<A, T> Action for Targeted<A, T>
where
    A: TargetedAction<T>,
    T: Send + Sync + 'static,
{
    fn on_enter(&mut self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        if !ctx.owner().resolve_target(&mut self.target) {
            log::error!(
                "action '{}': owner '{}' has no {} target",
                ctx.name(),
                ctx.owner().name(),
                type_name::<T>()
            );
            return ExecutionStatus::Failure;
        }
        let Some(target) = self.target.clone() else {
            return ExecutionStatus::Failure;
        };

        let status = self.action.on_enter(&mut target.write(), ctx);
        if status == ExecutionStatus::Running && !ctx.is_ticking() {
            ctx.enable_ticking();
        }
        status
    }

    fn on_tick(&mut self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        match self.target.clone() {
            Some(target) => self.action.on_tick(&mut target.write(), ctx),
            None => ExecutionStatus::Failure,
        }
    }

    fn on_result(&mut self, _ctx: &mut ActionContext<'_>, result: ActionResult) {
        if let Some(target) = &self.target {
            self.action.on_result(&mut target.write(), result);
        }
    }

    fn on_interrupt(&mut self, _ctx: &mut ActionContext<'_>) {
        if let Some(target) = &self.target {
            self.action.on_interrupt(&mut target.write());
        }
    }
}
