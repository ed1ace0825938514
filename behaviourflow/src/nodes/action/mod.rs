//! Leaf actions.

pub mod condition;
mod nested;
mod targeted;
mod wait;

pub use nested::NestedBehaviour;
pub use targeted::{Targeted, TargetedAction};
pub use wait::Wait;

use crate::{
    basic_types::ExecutionStatus,
    blackboard::BlackboardRef,
    tree::{ActionContext, InitContext},
    value::Value,
};

use super::Action;

/// Succeeds on enter.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysSuccess;

impl Action for AlwaysSuccess {
    fn on_enter(&mut self, _ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        ExecutionStatus::Success
    }
}

/// Fails on enter.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysFailure;

impl Action for AlwaysFailure {
    fn on_enter(&mut self, _ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        ExecutionStatus::Failure
    }
}

/// Writes a value to the owner's blackboard on enter. Fails when the
/// variable holds a value of a different kind.
#[derive(Clone, Debug)]
pub struct SetVariable {
    variable: BlackboardRef<Value>,
    value: Value,
}

impl SetVariable {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            variable: BlackboardRef::named(name),
            value: value.into(),
        }
    }
}

impl Action for SetVariable {
    fn on_initialize(&mut self, ctx: &InitContext<'_>) {
        // Unbound references declare the variable on first write.
        self.variable.bind(ctx.blackboard());
    }

    fn on_enter(&mut self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        match self.variable.set(ctx.blackboard(), self.value.clone()) {
            Ok(()) => ExecutionStatus::Success,
            Err(error) => {
                log::error!("action '{}': {error}", ctx.name());
                ExecutionStatus::Failure
            }
        }
    }
}
