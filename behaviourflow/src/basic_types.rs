use std::fmt::{Display, Formatter};

/// Persisted state of an action, state or whole behaviour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ActionStatus {
    /// Not entered yet, or reset after finishing.
    #[default]
    Inactive,
    Running,
    Success,
    Failure,
}

impl ActionStatus {
    /// `true` for `Success` and `Failure`.
    pub fn is_finished(self) -> bool {
        matches!(self, ActionStatus::Success | ActionStatus::Failure)
    }

    pub fn is_running(self) -> bool {
        self == ActionStatus::Running
    }

    /// The lifecycle view of this status, `None` while inactive.
    pub fn execution(self) -> Option<ExecutionStatus> {
        match self {
            ActionStatus::Inactive => None,
            ActionStatus::Running => Some(ExecutionStatus::Running),
            ActionStatus::Success => Some(ExecutionStatus::Success),
            ActionStatus::Failure => Some(ExecutionStatus::Failure),
        }
    }

    /// The final result, `None` unless finished.
    pub fn result(self) -> Option<ActionResult> {
        match self {
            ActionStatus::Success => Some(ActionResult::Success),
            ActionStatus::Failure => Some(ActionResult::Failure),
            _ => None,
        }
    }
}

impl Display for ActionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ActionStatus::Inactive => "Inactive",
            ActionStatus::Running => "Running",
            ActionStatus::Success => "Success",
            ActionStatus::Failure => "Failure",
        };

        write!(f, "{text}")
    }
}

/// Value returned from lifecycle callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExecutionStatus {
    Running,
    Success,
    Failure,
}

impl ExecutionStatus {
    pub fn is_finished(self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }

    pub fn result(self) -> Option<ActionResult> {
        ActionStatus::from(self).result()
    }

    /// Maps `true` to `Success` and `false` to `Failure`.
    pub fn from_bool(value: bool) -> Self {
        if value {
            ExecutionStatus::Success
        } else {
            ExecutionStatus::Failure
        }
    }
}

impl Display for ExecutionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        ActionStatus::from(*self).fmt(f)
    }
}

impl From<ExecutionStatus> for ActionStatus {
    fn from(value: ExecutionStatus) -> Self {
        match value {
            ExecutionStatus::Running => ActionStatus::Running,
            ExecutionStatus::Success => ActionStatus::Success,
            ExecutionStatus::Failure => ActionStatus::Failure,
        }
    }
}

/// Outcome of a node that is known to be finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionResult {
    Success,
    Failure,
}

impl ActionResult {
    pub fn inverted(self) -> Self {
        match self {
            ActionResult::Success => ActionResult::Failure,
            ActionResult::Failure => ActionResult::Success,
        }
    }
}

impl From<ActionResult> for ExecutionStatus {
    fn from(value: ActionResult) -> Self {
        match value {
            ActionResult::Success => ExecutionStatus::Success,
            ActionResult::Failure => ExecutionStatus::Failure,
        }
    }
}

impl From<ActionResult> for ActionStatus {
    fn from(value: ActionResult) -> Self {
        ExecutionStatus::from(value).into()
    }
}

impl Display for ActionResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        ActionStatus::from(*self).fmt(f)
    }
}

/// Handle of an action inside the arena of its [`BehaviourTree`](crate::tree::BehaviourTree).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn slot(self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle of a state inside its [`StateMachine`](crate::fsm::StateMachine).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(pub(crate) usize);

impl StateId {
    pub fn slot(self) -> usize {
        self.0
    }
}

impl Display for StateId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "state#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::inactive(ActionStatus::Inactive, false, None)]
    #[case::running(ActionStatus::Running, false, None)]
    #[case::success(ActionStatus::Success, true, Some(ActionResult::Success))]
    #[case::failure(ActionStatus::Failure, true, Some(ActionResult::Failure))]
    fn finished_iff_success_or_failure(
        #[case] status: ActionStatus,
        #[case] finished: bool,
        #[case] result: Option<ActionResult>,
    ) {
        assert_eq!(status.is_finished(), finished);
        assert_eq!(status.result(), result);
    }

    #[test]
    fn inactive_has_no_execution_view() {
        assert_eq!(ActionStatus::Inactive.execution(), None);
        assert_eq!(
            ActionStatus::Running.execution(),
            Some(ExecutionStatus::Running)
        );
    }

    #[test]
    fn display_matches_variant() {
        assert_eq!(ExecutionStatus::Failure.to_string(), "Failure");
        assert_eq!(ActionResult::Success.inverted().to_string(), "Failure");
    }
}
