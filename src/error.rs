use std::any::Any;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by the terminal outcome of a flow invocation
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("First argument should be an array")]
    NotACollection,

    #[error("Length of first argument must be more than 0")]
    EmptyCollection,

    #[error("All values of first argument (array) should be a function (element {index} is not)")]
    NotCallable {
        index: usize,
    },

    #[error("Incorrect type of 2nd arg. Should be a function or a number")]
    LimitType,

    #[error("Limit must be more than 0")]
    LimitRange,

    #[error("Incorrect type of 2nd arg. Should be a function")]
    FactoryType,

    #[error("Incorrect type of argument. Should be a function")]
    AdapterConstruction,

    #[error("Task {index} failed: {source}")]
    Task {
        index: usize,
        #[source]
        source: TaskError,
    },

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("File error: {path:?} - {message}")]
    File {
        path: PathBuf,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`FlowError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An argument had the wrong shape or type
    Type,
    /// An argument was well-typed but out of range
    Range,
    /// A task reported a failure
    Task,
    /// Files, configuration or the runtime itself
    Environment,
}

impl FlowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlowError::NotACollection
            | FlowError::NotCallable { .. }
            | FlowError::LimitType
            | FlowError::FactoryType
            | FlowError::AdapterConstruction
            | FlowError::InvalidPlan(_) => ErrorKind::Type,
            FlowError::EmptyCollection | FlowError::LimitRange => ErrorKind::Range,
            FlowError::Task { .. } => ErrorKind::Task,
            FlowError::File { .. }
            | FlowError::Serialization(_)
            | FlowError::Config(_)
            | FlowError::Internal(_) => ErrorKind::Environment,
        }
    }

    /// Whether the error was raised before any task was started
    pub fn is_validation(&self) -> bool {
        matches!(self.kind(), ErrorKind::Type | ErrorKind::Range)
    }
}

/// Failure reported by a single task through its completion handle
#[derive(Error, Debug)]
pub enum TaskError {
    #[error(transparent)]
    Failed(#[from] anyhow::Error),

    #[error("task panicked: {0}")]
    Panicked(String),

    #[error("task dropped its completion handle without reporting")]
    Abandoned,
}

impl TaskError {
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        TaskError::Panicked(message)
    }
}

pub type FlowResult<T> = Result<T, FlowError>;
