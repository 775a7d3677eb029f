// src/engine/task.rs
use std::fmt;

use crate::error::TaskError;

/// A unit of asynchronous work that reports through its [`Completion`]
pub type Task<T> = Box<dyn FnOnce(Completion<T>) + Send>;

/// A link in a serial chain: receives the previous link's value (`None` for the first link)
pub type Step<T> = Box<dyn FnOnce(Option<T>, Completion<T>) + Send>;

/// Box a closure as a [`Task`]
pub fn task<T, F>(f: F) -> Task<T>
where
    F: FnOnce(Completion<T>) + Send + 'static,
{
    Box::new(f)
}

/// Box a closure as a [`Step`]
pub fn step<T, F>(f: F) -> Step<T>
where
    F: FnOnce(Option<T>, Completion<T>) + Send + 'static,
{
    Box::new(f)
}

type Callback<T> = Box<dyn FnOnce(Result<T, TaskError>) + Send>;

/// Single-shot completion handle handed to every task.
///
/// The handle is consumed when it reports, so a task cannot complete twice.
/// Dropping it without reporting completes it with [`TaskError::Abandoned`].
pub struct Completion<T> {
    callback: Option<Callback<T>>,
}

impl<T> Completion<T> {
    /// Wrap a callback that will receive the task's outcome exactly once
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(Result<T, TaskError>) + Send + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    /// Report the task's outcome
    pub fn complete(mut self, outcome: Result<T, TaskError>) {
        if let Some(callback) = self.callback.take() {
            callback(outcome);
        }
    }

    /// Report success
    pub fn succeed(self, value: T) {
        self.complete(Ok(value));
    }

    /// Report failure
    pub fn fail<E>(self, error: E)
    where
        E: Into<anyhow::Error>,
    {
        self.complete(Err(TaskError::Failed(error.into())));
    }
}

impl<T> Drop for Completion<T> {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            callback(Err(TaskError::Abandoned));
        }
    }
}

impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("reported", &self.callback.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording() -> (Completion<u32>, Arc<Mutex<Vec<Result<u32, String>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let completion = Completion::new(move |outcome: Result<u32, TaskError>| {
            sink.lock().unwrap().push(outcome.map_err(|e| e.to_string()));
        });
        (completion, seen)
    }

    #[test]
    fn test_succeed_reports_once() {
        let (completion, seen) = recording();
        completion.succeed(7);
        assert_eq!(*seen.lock().unwrap(), vec![Ok(7)]);
    }

    #[test]
    fn test_fail_carries_error() {
        let (completion, seen) = recording();
        completion.fail(anyhow::anyhow!("no such file"));
        assert_eq!(*seen.lock().unwrap(), vec![Err("no such file".to_string())]);
    }

    #[test]
    fn test_drop_reports_abandoned() {
        let (completion, seen) = recording();
        drop(completion);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].as_ref().unwrap_err().contains("without reporting"));
    }
}
