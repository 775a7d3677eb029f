// src/plan/runner.rs
use serde_json::Value;
use tracing::{debug, info};

use crate::engine::{self, validate, Step, Task};
use crate::error::{FlowError, FlowResult};
use super::registry::{Handler, TaskRegistry};

/// Runs JSON plans against a [`TaskRegistry`]
pub struct PlanRunner {
    registry: TaskRegistry,
    default_limit: Option<usize>,
}

/// A plan entry resolved against the registry
struct Resolved {
    handler: Handler,
    input: Value,
}

impl PlanRunner {
    pub fn new(registry: TaskRegistry) -> Self {
        Self {
            registry,
            default_limit: None,
        }
    }

    /// Limit used by parallel plans that do not carry one
    pub fn with_default_limit(mut self, limit: Option<usize>) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Validate a plan without starting any task
    pub fn check(&self, plan: &Value) -> FlowResult<()> {
        match mode(plan)? {
            "serial" => self.resolve_tasks(plan.get("tasks")).map(|_| ()),
            "parallel" => {
                let tasks = self.resolve_tasks(plan.get("tasks"))?;
                self.limit(plan, tasks.len()).map(|_| ())
            }
            "map" => self.resolve_map(plan).map(|_| ()),
            other => Err(FlowError::InvalidPlan(format!("unknown mode '{}'", other))),
        }
    }

    /// Run a plan and return its JSON result
    pub async fn run(&self, plan: &Value) -> FlowResult<Value> {
        let mode = mode(plan)?;
        info!("Running {} plan", mode);

        match mode {
            "serial" => {
                let steps: Vec<Step<Value>> = self
                    .resolve_tasks(plan.get("tasks"))?
                    .into_iter()
                    .map(|entry| {
                        engine::step(move |previous: Option<Value>, done| {
                            (entry.handler)(previous.unwrap_or(entry.input), done)
                        })
                    })
                    .collect();
                engine::serial(steps).await
            }
            "parallel" => {
                let entries = self.resolve_tasks(plan.get("tasks"))?;
                let limit = self.limit(plan, entries.len())?;
                let tasks: Vec<Task<Value>> = entries
                    .into_iter()
                    .map(|entry| engine::task(move |done| (entry.handler)(entry.input, done)))
                    .collect();
                engine::parallel(tasks, limit).await.map(Value::Array)
            }
            "map" => {
                let (values, handler) = self.resolve_map(plan)?;
                engine::map(values, move |value, done| handler(value, done))
                    .await
                    .map(Value::Array)
            }
            other => Err(FlowError::InvalidPlan(format!("unknown mode '{}'", other))),
        }
    }

    fn resolve_tasks(&self, tasks: Option<&Value>) -> FlowResult<Vec<Resolved>> {
        let entries = tasks.and_then(Value::as_array).map(Vec::as_slice);
        validate::check_collection(entries, true, |entry| {
            entry_name(entry).map_or(false, |name| self.registry.contains(name))
        })?;

        let entries = entries.unwrap_or_default();
        let mut resolved = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let found = self.lookup(entry).ok_or(FlowError::NotCallable { index })?;
            resolved.push(found);
        }

        debug!("Resolved {} tasks", resolved.len());
        Ok(resolved)
    }

    fn resolve_map(&self, plan: &Value) -> FlowResult<(Vec<Value>, Handler)> {
        let values = plan.get("values").and_then(Value::as_array);
        validate::check_collection(values.map(Vec::as_slice), false, |_| true)?;

        let handler = plan
            .get("task")
            .and_then(Value::as_str)
            .and_then(|name| self.registry.resolve(name))
            .ok_or(FlowError::FactoryType)?;

        Ok((values.cloned().unwrap_or_default(), handler))
    }

    fn limit(&self, plan: &Value, len: usize) -> FlowResult<Option<usize>> {
        let limit = validate::limit_from_value(plan.get("limit"))?.or(self.default_limit);
        validate::check_limit(limit, len)?;
        Ok(limit)
    }

    fn lookup(&self, entry: &Value) -> Option<Resolved> {
        let handler = self.registry.resolve(entry_name(entry)?)?;
        let input = entry.get("input").cloned().unwrap_or(Value::Null);
        Some(Resolved { handler, input })
    }
}

/// Task name of a plan entry: a bare string or `{ "name": ..., "input": ... }`
fn entry_name(entry: &Value) -> Option<&str> {
    match entry {
        Value::String(name) => Some(name.as_str()),
        Value::Object(fields) => fields.get("name")?.as_str(),
        _ => None,
    }
}

fn mode(plan: &Value) -> FlowResult<&str> {
    plan.get("mode")
        .and_then(Value::as_str)
        .ok_or_else(|| FlowError::InvalidPlan("missing 'mode'".to_string()))
}
