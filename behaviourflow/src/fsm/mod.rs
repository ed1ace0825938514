//! Hierarchical state machine.
//!
//! Every state runs a nested [`Behaviour`] (a tree or another state machine).
//! When the active state finishes, its transitions are checked in order and
//! the first match becomes the new active state. A finished state without a
//! matching transition ends the machine with `Success`.

mod state;
mod transition;

pub use state::BehaviourState;
pub use transition::{StateTransition, TransitionMode};

use crate::{
    basic_types::{ActionStatus, ExecutionStatus, StateId},
    behaviour::Behaviour,
    error::BehaviourError,
    owner::Owner,
};

pub struct StateMachine {
    name: String,
    states: Vec<BehaviourState>,
    entry: Option<StateId>,
    active: Option<StateId>,
    status: ActionStatus,
    owner: Option<Owner>,
    breakpoint_hit: Option<StateId>,
}

impl std::fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("name", &self.name)
            .field("states", &self.states)
            .field("active", &self.active)
            .field("status", &self.status)
            .finish()
    }
}

impl StateMachine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: Vec::new(),
            entry: None,
            active: None,
            status: ActionStatus::Inactive,
            owner: None,
            breakpoint_hit: None,
        }
    }

    /// Adds a state running the behaviour built by `factory`. The first
    /// state added becomes the entry.
    pub fn add_state<B, F>(&mut self, name: impl Into<String>, factory: F) -> StateId
    where
        B: Behaviour + 'static,
        F: Fn() -> B + 'static,
    {
        let id = StateId(self.states.len());
        self.states.push(BehaviourState::new(name.into(), factory));
        if self.entry.is_none() {
            self.entry = Some(id);
        }
        id
    }

    /// # Panics
    /// If `from` does not belong to this machine.
    pub fn add_transition(&mut self, from: StateId, transition: StateTransition) {
        assert!(
            from.0 < self.states.len(),
            "state {from} does not belong to '{}'",
            self.name
        );
        self.states[from.0].push_transition(transition);
    }

    pub fn set_entry(&mut self, entry: StateId) {
        self.entry = Some(entry);
    }

    pub fn clear_entry(&mut self) {
        self.entry = None;
    }

    pub fn set_breakpoint(&mut self, id: StateId, enabled: bool) {
        if let Some(state) = self.states.get_mut(id.0) {
            state.set_breakpoint(enabled);
        }
    }

    /// Returns and clears the last state whose breakpoint was hit.
    pub fn take_breakpoint(&mut self) -> Option<StateId> {
        self.breakpoint_hit.take()
    }

    pub fn entry(&self) -> Option<StateId> {
        self.entry
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn state(&self, id: StateId) -> Option<&BehaviourState> {
        self.states.get(id.0)
    }

    pub fn find_state(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .position(|state| state.name() == name)
            .map(StateId)
    }

    pub fn active_state(&self) -> Option<StateId> {
        self.active
    }

    pub fn active_state_name(&self) -> Option<&str> {
        self.active.map(|id| self.states[id.0].name())
    }

    pub fn state_status(&self, id: StateId) -> ActionStatus {
        self.states
            .get(id.0)
            .map(BehaviourState::status)
            .unwrap_or_default()
    }

    fn enter_state(&mut self, owner: &Owner, id: StateId) -> ExecutionStatus {
        let state = &mut self.states[id.0];
        if state.breakpoint() {
            log::warn!("state machine '{}': breakpoint on '{}'", self.name, state.name());
            self.breakpoint_hit = Some(id);
        }

        log::debug!(
            "state machine '{}': enter '{}'",
            self.name,
            self.states[id.0].name()
        );
        self.active = Some(id);
        self.states[id.0].enter(owner)
    }

    fn switch(&mut self, owner: &Owner, from: StateId, to: StateId) -> ExecutionStatus {
        log::debug!(
            "state machine '{}': '{}' -> '{}'",
            self.name,
            self.states[from.0].name(),
            self.states[to.0].name()
        );
        self.states[from.0].interrupt(owner);
        self.enter_state(owner, to)
    }

    /// Follows transitions out of finished states until a state keeps
    /// running or a dead end is reached.
    fn follow(&mut self, owner: &Owner, mut current: StateId, mut status: ExecutionStatus) -> ExecutionStatus {
        let mut hops = 0;

        while status.is_finished() {
            if hops == self.states.len() {
                log::warn!(
                    "state machine '{}': states keep finishing on entry, resuming next frame",
                    self.name
                );
                break;
            }

            let Some(to) = self.states[current.0].select_transition(owner) else {
                self.states[current.0].leave(owner);
                log::debug!(
                    "state machine '{}' ended in '{}'",
                    self.name,
                    self.states[current.0].name()
                );
                self.status = ActionStatus::Success;
                return ExecutionStatus::Success;
            };
            hops += 1;

            status = self.switch(owner, current, to);
            current = to;
        }

        self.status = ActionStatus::Running;
        ExecutionStatus::Running
    }
}

impl Behaviour for StateMachine {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, owner: &Owner) -> Result<(), BehaviourError> {
        if self.status != ActionStatus::Inactive {
            self.stop();
        }
        self.owner = None;

        let entry = match self.entry {
            Some(entry) if entry.0 < self.states.len() => entry,
            _ => {
                log::error!("state machine '{}' has no entry state", self.name);
                return Err(BehaviourError::MissingEntry(self.name.clone()));
            }
        };

        for state in &self.states {
            if let Some(transition) = state
                .transitions()
                .iter()
                .find(|transition| transition.to().0 >= self.states.len())
            {
                let reason = format!(
                    "state '{}' has a transition to unknown state {}",
                    state.name(),
                    transition.to()
                );
                log::error!("state machine '{}': {reason}", self.name);
                return Err(BehaviourError::InvalidGraph {
                    behaviour: self.name.clone(),
                    reason,
                });
            }
        }

        self.owner = Some(owner.clone());
        log::debug!(
            "state machine '{}' initialized for '{}' with {} state(s), entry '{}'",
            self.name,
            owner.name(),
            self.states.len(),
            self.states[entry.0].name()
        );
        Ok(())
    }

    fn start(&mut self) -> ExecutionStatus {
        let Some(owner) = self.owner.clone() else {
            log::error!("state machine '{}' cannot start before initialize", self.name);
            return ExecutionStatus::Failure;
        };
        if let Some(status) = self.status.execution() {
            return status;
        }
        let Some(entry) = self.entry else {
            return ExecutionStatus::Failure;
        };

        log::debug!("state machine '{}': start", self.name);
        let status = self.enter_state(&owner, entry);
        self.follow(&owner, entry, status)
    }

    fn tick(&mut self) -> ExecutionStatus {
        let Some(owner) = self.owner.clone() else {
            log::error!("state machine '{}' cannot tick before initialize", self.name);
            return ExecutionStatus::Failure;
        };
        match self.status {
            ActionStatus::Inactive => return self.start(),
            ActionStatus::Success => return ExecutionStatus::Success,
            ActionStatus::Failure => return ExecutionStatus::Failure,
            ActionStatus::Running => {}
        }
        let Some(active) = self.active else {
            return ExecutionStatus::Failure;
        };

        // OnTick transitions preempt a running state before it ticks.
        if self.states[active.0].status() == ActionStatus::Running {
            if let Some(to) = self.states[active.0].select_transition(&owner) {
                let status = self.switch(&owner, active, to);
                return self.follow(&owner, to, status);
            }
        }

        let status = self.states[active.0].tick();
        self.follow(&owner, active, status)
    }

    fn stop(&mut self) {
        if let (Some(active), Some(owner)) = (self.active.take(), self.owner.clone()) {
            self.states[active.0].reset(&owner);
        }

        if self.status != ActionStatus::Inactive {
            log::debug!("state machine '{}': stop", self.name);
        }
        self.status = ActionStatus::Inactive;
    }

    fn status(&self) -> ActionStatus {
        self.status
    }

    fn is_initialized(&self) -> bool {
        self.owner.is_some()
    }
}
