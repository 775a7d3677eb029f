pub mod builtins;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod plan;

// Re-export main types for easier access
pub use crate::config::Config;
pub use engine::{
    make_async,
    map,
    parallel,
    serial,
    spawn_map,
    spawn_parallel,
    spawn_serial,
    step,
    task,
    AsyncFn,
    Completion,
    Step,
    Task,
};
pub use error::{ErrorKind, FlowError, FlowResult, TaskError};
pub use plan::{PlanRunner, TaskRegistry};
