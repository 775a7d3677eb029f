// src/engine/serial.rs
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{FlowError, FlowResult, TaskError};
use super::task::{Completion, Step};
use super::validate;

/// Run `steps` one after another, feeding each step the previous step's value.
///
/// A step starts only after the previous one completed successfully. The first
/// failure ends the chain; later steps are never started.
pub async fn serial<T>(steps: Vec<Step<T>>) -> FlowResult<T>
where
    T: Send + 'static,
{
    validate::check_collection(Some(steps.as_slice()), true, |_| true)?;

    let run_id = Uuid::new_v4();
    let total = steps.len();
    info!("Serial run {} with {} steps", run_id, total);

    let mut carried: Option<T> = None;
    for (index, step) in steps.into_iter().enumerate() {
        debug!("Serial run {}: starting step {}/{}", run_id, index + 1, total);

        let (tx, rx) = oneshot::channel::<Result<T, TaskError>>();
        step(carried.take(), Completion::new(move |outcome| {
            let _ = tx.send(outcome);
        }));

        let outcome = rx
            .await
            .map_err(|_| FlowError::Internal(format!("step {} lost its completion", index)))?;

        match outcome {
            Ok(value) => carried = Some(value),
            Err(source) => {
                warn!("Serial run {}: step {} failed: {}", run_id, index, source);
                return Err(FlowError::Task { index, source });
            }
        }
    }

    debug!("Serial run {} finished", run_id);
    carried.ok_or_else(|| FlowError::Internal("serial run produced no value".to_string()))
}
