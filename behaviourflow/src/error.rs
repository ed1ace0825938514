use thiserror::Error;

/// Configuration and wiring errors of a behaviour.
#[derive(Debug, Error)]
pub enum BehaviourError {
    #[error("behaviour '{0}' has no entry")]
    MissingEntry(String),
    #[error("behaviour '{0}' was not initialized")]
    NotInitialized(String),
    #[error("behaviour '{behaviour}' is malformed: {reason}")]
    InvalidGraph { behaviour: String, reason: String },
    #[error("owner '{owner}' has no component of type {type_name}")]
    MissingTarget {
        owner: String,
        type_name: &'static str,
    },
    #[error(transparent)]
    Blackboard(#[from] BlackboardError),
    #[error(transparent)]
    Events(#[from] EventError),
}

#[derive(Debug, Error)]
pub enum BlackboardError {
    #[error("blackboard variable '{0}' does not exist")]
    NotFound(String),
    #[error("blackboard variable '{name}' holds {found}, requested {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("couldn't evaluate expression: {0}")]
    Expression(String),
}

#[derive(Debug, Error)]
pub enum EventError {
    /// Raised once every listener was invoked, carrying each listener failure.
    #[error("{} listener(s) failed while handling {event}", .errors.len())]
    Listeners {
        event: &'static str,
        errors: Vec<anyhow::Error>,
    },
}
