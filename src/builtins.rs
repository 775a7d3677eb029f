// src/builtins.rs
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{anyhow, Context as _};
use serde_json::{json, Value};
use tracing::debug;

use crate::plan::TaskRegistry;

/// Names of the tasks installed by [`register_builtins`]
pub const BUILTIN_TASKS: &[&str] = &[
    "double", "echo", "fail", "list_dir", "read_file", "sleep", "stat",
];

/// Install the built-in tasks; file-system tasks resolve paths against `root`
pub fn register_builtins(registry: &TaskRegistry, root: &Path) {
    debug!("Registering built-in tasks rooted at {}", root.display());

    let base = root.to_path_buf();
    registry.register_async("list_dir", move |input| {
        let base = base.clone();
        async move {
            let dir = resolve(&base, &input, true)?;
            let mut reader = tokio::fs::read_dir(&dir)
                .await
                .with_context(|| format!("Failed to read directory {}", dir.display()))?;

            let mut names = Vec::new();
            while let Some(entry) = reader.next_entry().await? {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
            names.sort();
            Ok::<_, anyhow::Error>(json!(names))
        }
    });

    let base = root.to_path_buf();
    registry.register_async("read_file", move |input| {
        let base = base.clone();
        async move {
            let path = resolve(&base, &input, false)?;
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read file {}", path.display()))?;
            Ok::<_, anyhow::Error>(Value::String(content))
        }
    });

    let base = root.to_path_buf();
    registry.register_async("stat", move |input| {
        let base = base.clone();
        async move {
            let path = resolve(&base, &input, true)?;
            let metadata = tokio::fs::metadata(&path)
                .await
                .with_context(|| format!("Failed to stat {}", path.display()))?;
            Ok::<_, anyhow::Error>(json!({
                "path": path.display().to_string(),
                "is_dir": metadata.is_dir(),
                "is_file": metadata.is_file(),
                "len": metadata.len(),
                "readonly": metadata.permissions().readonly(),
            }))
        }
    });

    registry.register_async("sleep", |input| async move {
        let millis = match &input {
            Value::Null => 0,
            other => other
                .as_u64()
                .ok_or_else(|| anyhow!("sleep expects milliseconds, got {}", other))?,
        };
        tokio::time::sleep(Duration::from_millis(millis)).await;
        Ok::<_, anyhow::Error>(input)
    });

    registry.register_sync("echo", Ok);

    registry.register_sync("double", |input| {
        if let Some(n) = input.as_i64() {
            return Ok(json!(n * 2));
        }
        input
            .as_f64()
            .map(|n| json!(n * 2.0))
            .ok_or_else(|| anyhow!("double expects a number, got {}", input))
    });

    registry.register("fail", |input, done| {
        let message = input.as_str().unwrap_or("task failed").to_string();
        done.fail(anyhow!(message));
    });
}

/// Turn a task input into a path under `base`.
///
/// Accepts a string, or an array whose first element is a string, so a
/// directory listing can be piped straight into `read_file`.
fn resolve(base: &Path, input: &Value, allow_empty: bool) -> anyhow::Result<PathBuf> {
    let relative = match input {
        Value::String(path) => Some(path.as_str()),
        Value::Array(items) => items.first().and_then(Value::as_str),
        Value::Null => None,
        other => return Err(anyhow!("expected a path, got {}", other)),
    };

    match relative {
        Some(relative) => Ok(base.join(relative)),
        None if allow_empty => Ok(base.to_path_buf()),
        None => Err(anyhow!("expected a path, got {}", input)),
    }
}
