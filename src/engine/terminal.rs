// src/engine/terminal.rs
//! Callback-style entry points. Each one runs the invocation on the Tokio
//! runtime and hands the terminal outcome to `callback` exactly once.
use tokio::task::JoinHandle;

use crate::error::FlowResult;
use super::task::{Completion, Step, Task};

pub fn spawn_serial<T, C>(steps: Vec<Step<T>>, callback: C) -> JoinHandle<()>
where
    T: Send + 'static,
    C: FnOnce(FlowResult<T>) + Send + 'static,
{
    tokio::spawn(async move { callback(super::serial(steps).await) })
}

pub fn spawn_parallel<T, C>(tasks: Vec<Task<T>>, limit: Option<usize>, callback: C) -> JoinHandle<()>
where
    T: Send + 'static,
    C: FnOnce(FlowResult<Vec<T>>) + Send + 'static,
{
    tokio::spawn(async move { callback(super::parallel(tasks, limit).await) })
}

pub fn spawn_map<V, T, F, C>(values: Vec<V>, factory: F, callback: C) -> JoinHandle<()>
where
    V: Send + 'static,
    T: Send + 'static,
    F: Fn(V, Completion<T>) + Send + Sync + 'static,
    C: FnOnce(FlowResult<Vec<T>>) + Send + 'static,
{
    tokio::spawn(async move { callback(super::map(values, factory).await) })
}
