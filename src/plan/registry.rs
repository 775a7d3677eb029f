// src/plan/registry.rs
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::engine::{make_async, AsyncFn, Completion};
use crate::error::{FlowError, FlowResult, TaskError};

/// Callback-style task over JSON values
pub type Handler = Arc<dyn Fn(Value, Completion<Value>) + Send + Sync>;

#[derive(Clone)]
enum Entry {
    Callback(Handler),
    Sync(AsyncFn<Value, Value>),
}

impl Entry {
    fn handler(&self) -> Handler {
        match self {
            Entry::Callback(handler) => handler.clone(),
            Entry::Sync(adapted) => {
                let adapted = adapted.clone();
                Arc::new(move |input, done| adapted.call(input, done))
            }
        }
    }
}

/// Named tasks that plans can refer to
#[derive(Clone, Default)]
pub struct TaskRegistry {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback-style task
    pub fn register<F>(&self, name: &str, handler: F)
    where
        F: Fn(Value, Completion<Value>) + Send + Sync + 'static,
    {
        debug!("Registering task: {}", name);
        self.entries
            .write()
            .insert(name.to_string(), Entry::Callback(Arc::new(handler)));
    }

    /// Register a task written as an async closure
    pub fn register_async<F, Fut>(&self, name: &str, f: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.register(name, move |input, done| {
            let fut = f(input);
            tokio::spawn(async move {
                done.complete(fut.await.map_err(TaskError::from));
            });
        });
    }

    /// Register a synchronous function; it is adapted with [`make_async`]
    pub fn register_sync<F>(&self, name: &str, f: F)
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        debug!("Registering synchronous task: {}", name);
        self.entries
            .write()
            .insert(name.to_string(), Entry::Sync(make_async(f)));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Look up a task by name
    pub fn resolve(&self, name: &str) -> Option<Handler> {
        self.entries.read().get(name).map(Entry::handler)
    }

    /// Adapter for a registered synchronous function.
    ///
    /// Anything other than the name of a synchronous task cannot be adapted.
    pub fn make_async(&self, target: &Value) -> FlowResult<AsyncFn<Value, Value>> {
        let name = target.as_str().ok_or(FlowError::AdapterConstruction)?;
        match self.entries.read().get(name) {
            Some(Entry::Sync(adapted)) => Ok(adapted.clone()),
            _ => Err(FlowError::AdapterConstruction),
        }
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
