use crate::{
    basic_types::{ActionStatus, ExecutionStatus, StateId},
    behaviour::Behaviour,
    owner::Owner,
};

use super::transition::StateTransition;

type Factory = Box<dyn Fn() -> Box<dyn Behaviour>>;

/// A state of a [`StateMachine`](super::StateMachine).
///
/// The behaviour it runs is built from the factory the first time the state
/// is entered and reused (restarted) on later entries.
pub struct BehaviourState {
    name: String,
    factory: Factory,
    instance: Option<Box<dyn Behaviour>>,
    transitions: Vec<StateTransition>,
    status: ActionStatus,
    breakpoint: bool,
}

impl std::fmt::Debug for BehaviourState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviourState")
            .field("name", &self.name)
            .field("instantiated", &self.instance.is_some())
            .field("transitions", &self.transitions)
            .field("status", &self.status)
            .finish()
    }
}

impl BehaviourState {
    pub(crate) fn new<B, F>(name: String, factory: F) -> Self
    where
        B: Behaviour + 'static,
        F: Fn() -> B + 'static,
    {
        Self {
            name,
            factory: Box::new(move || Box::new(factory()) as Box<dyn Behaviour>),
            instance: None,
            transitions: Vec::new(),
            status: ActionStatus::Inactive,
            breakpoint: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> ActionStatus {
        self.status
    }

    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    pub fn is_instantiated(&self) -> bool {
        self.instance.is_some()
    }

    pub fn behaviour(&self) -> Option<&dyn Behaviour> {
        self.instance.as_deref()
    }

    pub(crate) fn breakpoint(&self) -> bool {
        self.breakpoint
    }

    pub(crate) fn set_breakpoint(&mut self, enabled: bool) {
        self.breakpoint = enabled;
    }

    pub(crate) fn push_transition(&mut self, transition: StateTransition) {
        self.transitions.push(transition);
    }

    fn instance(&mut self, owner: &Owner) -> Option<&mut Box<dyn Behaviour>> {
        if self.instance.is_none() {
            let mut behaviour = (self.factory)();
            if let Err(error) = behaviour.initialize(owner) {
                log::error!("state '{}': behaviour failed to initialize: {error}", self.name);
                return None;
            }
            self.instance = Some(behaviour);
        }

        self.instance.as_mut()
    }

    /// Enables the transition guards and (re)starts the behaviour.
    pub(crate) fn enter(&mut self, owner: &Owner) -> ExecutionStatus {
        for transition in &mut self.transitions {
            transition.conditions_mut().enable(owner);
        }

        let status = match self.instance(owner) {
            Some(behaviour) => {
                if behaviour.status() != ActionStatus::Inactive {
                    behaviour.stop();
                }
                behaviour.start()
            }
            None => ExecutionStatus::Failure,
        };

        self.status = status.into();
        status
    }

    pub(crate) fn tick(&mut self) -> ExecutionStatus {
        if let Some(result) = self.status.result() {
            return result.into();
        }

        let status = match self.instance.as_mut() {
            Some(behaviour) => behaviour.tick(),
            None => ExecutionStatus::Failure,
        };
        self.status = status.into();
        status
    }

    /// First transition, in list order, whose mode accepts the current
    /// status and whose guard holds.
    pub(crate) fn select_transition(&mut self, owner: &Owner) -> Option<StateId> {
        let status = self.status;
        for transition in &mut self.transitions {
            if transition.mode().accepts(status) && transition.conditions_mut().evaluate(owner) {
                return Some(transition.to());
            }
        }

        None
    }

    /// Disables the transition guards. The behaviour keeps its final status.
    pub(crate) fn leave(&mut self, owner: &Owner) {
        for transition in &mut self.transitions {
            transition.conditions_mut().disable(owner);
        }
    }

    /// Stops a running behaviour and leaves the state with `Failure`.
    pub(crate) fn interrupt(&mut self, owner: &Owner) {
        if self.status == ActionStatus::Running {
            if let Some(behaviour) = self.instance.as_mut() {
                behaviour.stop();
            }
            self.status = ActionStatus::Failure;
        }
        self.leave(owner);
    }

    pub(crate) fn reset(&mut self, owner: &Owner) {
        self.interrupt(owner);
        if let Some(behaviour) = self.instance.as_mut() {
            behaviour.stop();
        }
        self.status = ActionStatus::Inactive;
    }
}
