pub mod app;
mod commands;

pub use app::{exit_code, App};
pub use commands::{execute_command, Args, Commands};
