use crate::{
    basic_types::{ActionStatus, StateId},
    conditions::{Condition, ConditionGroup},
};

/// When a transition becomes eligible, relative to its source state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransitionMode {
    /// Every frame, whether the state is running or finished.
    OnTick,
    /// Once the state finished, with any result.
    #[default]
    OnFinish,
    OnSuccess,
    OnFailure,
}

impl TransitionMode {
    pub fn accepts(self, status: ActionStatus) -> bool {
        match self {
            TransitionMode::OnTick => status != ActionStatus::Inactive,
            TransitionMode::OnFinish => status.is_finished(),
            TransitionMode::OnSuccess => status == ActionStatus::Success,
            TransitionMode::OnFailure => status == ActionStatus::Failure,
        }
    }
}

/// Guarded edge from the state it is added to towards `to`.
#[derive(Debug)]
pub struct StateTransition {
    to: StateId,
    mode: TransitionMode,
    conditions: ConditionGroup,
}

impl StateTransition {
    pub fn new(to: StateId, mode: TransitionMode) -> Self {
        Self {
            to,
            mode,
            conditions: ConditionGroup::default(),
        }
    }

    pub fn on_tick(to: StateId) -> Self {
        Self::new(to, TransitionMode::OnTick)
    }

    pub fn on_finish(to: StateId) -> Self {
        Self::new(to, TransitionMode::OnFinish)
    }

    pub fn on_success(to: StateId) -> Self {
        Self::new(to, TransitionMode::OnSuccess)
    }

    pub fn on_failure(to: StateId) -> Self {
        Self::new(to, TransitionMode::OnFailure)
    }

    /// Adds a condition to the guard group.
    pub fn when(mut self, condition: impl Condition + 'static) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Replaces the guard group.
    pub fn with_conditions(mut self, conditions: ConditionGroup) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn to(&self) -> StateId {
        self.to
    }

    pub fn mode(&self) -> TransitionMode {
        self.mode
    }

    pub fn conditions(&self) -> &ConditionGroup {
        &self.conditions
    }

    pub(crate) fn conditions_mut(&mut self) -> &mut ConditionGroup {
        &mut self.conditions
    }
}
