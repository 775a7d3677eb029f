use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::Config;
use crate::plan::{self, PlanRunner};

#[derive(Parser, Debug)]
#[command(name = "taskflow")]
#[command(about = "Run serial, bounded-parallel and map task plans")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(long, short, global = true, help = "Path to configuration file")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a plan file
    Run {
        #[arg(help = "Path to plan file (JSON)")]
        plan: PathBuf,

        #[arg(short, long, help = "Write the result to this file instead of stdout")]
        output: Option<PathBuf>,
    },

    /// Validate a plan file without running any task
    Check {
        #[arg(help = "Path to plan file (JSON)")]
        plan: PathBuf,
    },

    /// List the tasks plans can refer to
    Tasks,

    /// Initialize the configuration
    InitConfig {
        #[arg(short, long, help = "Force overwrite existing configuration")]
        force: bool,
    },
}

pub async fn execute_command(command: &Commands, runner: &PlanRunner) -> Result<()> {
    match command {
        Commands::Run { plan, output } => handle_run_command(plan, output.as_deref(), runner).await,
        Commands::Check { plan } => handle_check_command(plan, runner),
        Commands::Tasks => handle_tasks_command(runner),
        Commands::InitConfig { force } => handle_init_command(*force),
    }
}

async fn handle_run_command(plan_path: &Path, output: Option<&Path>, runner: &PlanRunner) -> Result<()> {
    let plan = plan::load_plan(plan_path)?;
    let result = runner.run(&plan).await?;

    match output {
        Some(path) => {
            plan::save_plan(&result, path)?;
            info!("Result written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    Ok(())
}

fn handle_check_command(plan_path: &Path, runner: &PlanRunner) -> Result<()> {
    let plan = plan::load_plan(plan_path)?;
    runner.check(&plan)?;
    println!("{}: ok", plan_path.display());
    Ok(())
}

fn handle_tasks_command(runner: &PlanRunner) -> Result<()> {
    if runner.registry().is_empty() {
        println!("No tasks registered");
        return Ok(());
    }
    for name in runner.registry().names() {
        println!("{}", name);
    }
    Ok(())
}

fn handle_init_command(force: bool) -> Result<()> {
    let path = Config::init(force)?;
    println!("Configuration written to {}", path.display());
    Ok(())
}
