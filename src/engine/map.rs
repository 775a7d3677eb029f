// src/engine/map.rs
use std::sync::Arc;
use tracing::debug;

use crate::error::FlowResult;
use super::parallel::BoundedScheduler;
use super::task::{Completion, Task};
use super::validate;

/// Apply `factory` to every value concurrently, collecting results in input order.
///
/// Every per-value task is started right away; the first failure is returned
/// as soon as it is observed.
pub async fn map<V, T, F>(values: Vec<V>, factory: F) -> FlowResult<Vec<T>>
where
    V: Send + 'static,
    T: Send + 'static,
    F: Fn(V, Completion<T>) + Send + Sync + 'static,
{
    validate::check_collection(Some(values.as_slice()), false, |_| true)?;

    let total = values.len();
    debug!("Mapping over {} values", total);

    let factory = Arc::new(factory);
    let tasks: Vec<Task<T>> = values
        .into_iter()
        .map(|value| {
            let factory = factory.clone();
            Box::new(move |done: Completion<T>| factory(value, done)) as Task<T>
        })
        .collect();

    BoundedScheduler::new(tasks, total).run().await
}
