use crate::{
    basic_types::{ActionStatus, ExecutionStatus},
    behaviour::Behaviour,
    error::BehaviourError,
    nodes::Action,
    tree::{ActionContext, InitContext},
};

/// Runs a nested behaviour tree or state machine as a single action.
///
/// The nested behaviour shares the owner of the outer tree. It is restarted
/// every time the action is entered and stopped when the action is
/// interrupted or reset.
pub struct NestedBehaviour {
    behaviour: Box<dyn Behaviour>,
}

impl std::fmt::Debug for NestedBehaviour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NestedBehaviour")
            .field("behaviour", &self.behaviour.name())
            .field("status", &self.behaviour.status())
            .finish()
    }
}

impl NestedBehaviour {
    pub fn new(behaviour: impl Behaviour + 'static) -> Self {
        Self {
            behaviour: Box::new(behaviour),
        }
    }

    pub fn behaviour(&self) -> &dyn Behaviour {
        self.behaviour.as_ref()
    }
}

impl Action for NestedBehaviour {
    fn on_initialize(&mut self, ctx: &InitContext<'_>) {
        if let Err(error) = self.behaviour.initialize(ctx.owner()) {
            log::error!(
                "behaviour tree '{}': nested behaviour of '{}' failed to initialize: {error}",
                ctx.tree_name(),
                ctx.name()
            );
        }
    }

    fn on_enter(&mut self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        if !self.behaviour.is_initialized() {
            let error = BehaviourError::NotInitialized(self.behaviour.name().to_owned());
            log::error!("action '{}': {error}", ctx.name());
            return ExecutionStatus::Failure;
        }

        if self.behaviour.status() != ActionStatus::Inactive {
            self.behaviour.stop();
        }

        let status = self.behaviour.start();
        if status == ExecutionStatus::Running {
            ctx.enable_ticking();
        }
        status
    }

    fn on_tick(&mut self, _ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        self.behaviour.tick()
    }

    fn on_interrupt(&mut self, _ctx: &mut ActionContext<'_>) {
        self.behaviour.stop();
    }

    fn on_reset(&mut self) {
        self.behaviour.stop();
    }
}
