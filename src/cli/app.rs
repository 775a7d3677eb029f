use anyhow::Result;
use clap::Parser;
use std::str::FromStr;
use tracing::{debug, info, Level};

use crate::builtins::register_builtins;
use crate::config::Config;
use crate::error::FlowError;
use crate::plan::{PlanRunner, TaskRegistry};

use super::commands::{self, Args};

/// The main application struct
pub struct App {
    args: Args,
    config: Config,
}

impl App {
    /// Parse the command line and load configuration
    pub fn from_args() -> Result<Self> {
        let args = Args::parse();
        let config = Config::load(args.config.as_deref())?;
        Ok(Self { args, config })
    }

    /// Level the subscriber should be installed with
    pub fn log_level(&self) -> Level {
        if self.args.verbose {
            return Level::DEBUG;
        }
        Level::from_str(&self.config.logging.level).unwrap_or(Level::INFO)
    }

    /// Build the task registry and plan runner from configuration
    pub fn runner(&self) -> PlanRunner {
        let registry = TaskRegistry::new();
        register_builtins(&registry, &self.config.builtins.root);
        debug!("{} tasks registered", registry.len());
        PlanRunner::new(registry).with_default_limit(self.config.runner.default_limit)
    }

    /// Run the application
    pub async fn run(&self) -> Result<()> {
        info!("Starting taskflow v{}", env!("CARGO_PKG_VERSION"));
        let runner = self.runner();
        commands::execute_command(&self.args.command, &runner).await
    }
}

/// Process exit status for an error: 2 when the input was rejected before any
/// task started, 1 for failures at run time
pub fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<FlowError>() {
        Some(e) if e.is_validation() => 2,
        _ => 1,
    }
}
