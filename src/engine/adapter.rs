// src/engine/adapter.rs
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::TaskError;
use super::task::{Completion, Task};

type SyncFn<A, R> = dyn Fn(A) -> Result<R, TaskError> + Send + Sync;

/// A synchronous function exposed through the completion-handle interface.
///
/// Multiple positional arguments are passed as a tuple.
pub struct AsyncFn<A, R> {
    inner: Arc<SyncFn<A, R>>,
}

/// Adapt a synchronous function so that it reports through a [`Completion`].
///
/// An `Err` return, or a panic, becomes the task's error.
pub fn make_async<A, R, E, F>(f: F) -> AsyncFn<A, R>
where
    F: Fn(A) -> Result<R, E> + Send + Sync + 'static,
    E: Into<anyhow::Error>,
{
    AsyncFn {
        inner: Arc::new(move |args| f(args).map_err(|e| TaskError::Failed(e.into()))),
    }
}

impl<A, R> AsyncFn<A, R>
where
    A: 'static,
    R: Send + 'static,
{
    /// Run the function now and report its outcome on a later scheduler turn.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn call(&self, args: A, done: Completion<R>) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| (self.inner)(args)))
            .unwrap_or_else(|payload| Err(TaskError::from_panic(payload)));

        tokio::spawn(async move {
            done.complete(outcome);
        });
    }

    /// Turn one call into a [`Task`]
    pub fn bind(&self, args: A) -> Task<R>
    where
        A: Send,
    {
        let this = self.clone();
        Box::new(move |done| this.call(args, done))
    }
}

impl<A, R> Clone for AsyncFn<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A, R> fmt::Debug for AsyncFn<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AsyncFn")
    }
}
