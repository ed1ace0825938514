use crate::{
    basic_types::{ActionStatus, ExecutionStatus},
    error::BehaviourError,
    owner::Owner,
};

/// The surface a host needs to drive a behaviour once per frame.
///
/// Implemented by [`BehaviourTree`](crate::tree::BehaviourTree) and
/// [`StateMachine`](crate::fsm::StateMachine), so either can be the top-level
/// behaviour of an owner or be nested inside the other.
pub trait Behaviour {
    fn name(&self) -> &str;

    /// Binds the behaviour to `owner`. Configuration errors are logged and
    /// returned; an uninitialized behaviour reports `Failure` when started.
    fn initialize(&mut self, owner: &Owner) -> Result<(), BehaviourError>;

    fn start(&mut self) -> ExecutionStatus;

    fn tick(&mut self) -> ExecutionStatus;

    /// Interrupts whatever is running and returns to `Inactive`.
    fn stop(&mut self);

    fn status(&self) -> ActionStatus;

    fn is_initialized(&self) -> bool;
}

impl<B: Behaviour + ?Sized> Behaviour for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn initialize(&mut self, owner: &Owner) -> Result<(), BehaviourError> {
        (**self).initialize(owner)
    }

    fn start(&mut self) -> ExecutionStatus {
        (**self).start()
    }

    fn tick(&mut self) -> ExecutionStatus {
        (**self).tick()
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn status(&self) -> ActionStatus {
        (**self).status()
    }

    fn is_initialized(&self) -> bool {
        (**self).is_initialized()
    }
}
