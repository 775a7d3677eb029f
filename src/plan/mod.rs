// src/plan/mod.rs
mod registry;
mod runner;

use std::path::Path;
use serde_json::Value;
use tracing::debug;

use crate::error::{FlowError, FlowResult};

pub use registry::{Handler, TaskRegistry};
pub use runner::PlanRunner;

/// Load a plan document from a JSON file
pub fn load_plan(path: &Path) -> FlowResult<Value> {
    debug!("Loading plan from {}", path.display());
    let content = std::fs::read_to_string(path)
        .map_err(|e| FlowError::File {
            path: path.to_path_buf(),
            message: format!("Failed to read file: {}", e),
        })?;

    serde_json::from_str(&content)
        .map_err(|e| FlowError::Serialization(format!("Failed to parse JSON: {}", e)))
}

/// Save a plan document (or a result) as pretty JSON
pub fn save_plan(value: &Value, path: &Path) -> FlowResult<()> {
    debug!("Saving JSON to {}", path.display());
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| FlowError::Serialization(format!("Failed to serialize: {}", e)))?;

    std::fs::write(path, content)
        .map_err(|e| FlowError::File {
            path: path.to_path_buf(),
            message: format!("Failed to write file: {}", e),
        })?;

    Ok(())
}
