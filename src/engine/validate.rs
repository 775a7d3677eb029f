// src/engine/validate.rs
//! Argument checks shared by every entry point. All of them run before the
//! first task is started.
use serde_json::Value;

use crate::error::{FlowError, FlowResult};

/// Check the shape of a task or value collection.
///
/// `None` stands for an argument that is not an ordered collection at all.
/// With `require_callable` set, the first element rejected by `is_callable`
/// is reported by index.
pub fn check_collection<T, P>(
    collection: Option<&[T]>,
    require_callable: bool,
    is_callable: P,
) -> FlowResult<()>
where
    P: Fn(&T) -> bool,
{
    let items = collection.ok_or(FlowError::NotACollection)?;
    if items.is_empty() {
        return Err(FlowError::EmptyCollection);
    }

    if require_callable {
        if let Some(index) = items.iter().position(|item| !is_callable(item)) {
            return Err(FlowError::NotCallable { index });
        }
    }

    Ok(())
}

/// Resolve the concurrency limit for `len` tasks. An absent limit admits everything at once.
pub fn check_limit(limit: Option<usize>, len: usize) -> FlowResult<usize> {
    match limit {
        None => Ok(len.max(1)),
        Some(0) => Err(FlowError::LimitRange),
        Some(limit) => Ok(limit),
    }
}

/// Read a limit out of a loosely typed JSON argument
pub fn limit_from_value(limit: Option<&Value>) -> FlowResult<Option<usize>> {
    let number = match limit {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(number)) => number,
        Some(_) => return Err(FlowError::LimitType),
    };

    if let Some(limit) = number.as_u64() {
        if limit == 0 {
            return Err(FlowError::LimitRange);
        }
        return Ok(Some(usize::try_from(limit).unwrap_or(usize::MAX)));
    }

    match number.as_f64() {
        Some(limit) if limit <= 0.0 => Err(FlowError::LimitRange),
        _ => Err(FlowError::LimitType),
    }
}
