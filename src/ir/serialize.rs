//! Stable-key JSON emission
//!
//! Serialization recursively sorts object keys alphabetically before
//! stringifying with fixed two-space indentation and a trailing newline.
//! Together with [`crate::ir::canonical::canonicalize`] this guarantees
//! byte-identical output for semantically identical models.

use std::path::Path;

use anyhow::Context;
use serde_json::Value;

use crate::error::ExtractError;
use crate::ir::model::IrModel;

/// Serialize a model to its canonical JSON text
pub fn to_canonical_json(model: &IrModel) -> Result<String, ExtractError> {
    let value = serde_json::to_value(model)
        .context("failed to convert model to JSON value")
        .map_err(ExtractError::Internal)?;
    let sorted = sort_keys(value);
    let text = serde_json::to_string_pretty(&sorted)
        .context("failed to stringify model")
        .map_err(ExtractError::Internal)?;
    Ok(format!("{}\n", text))
}

/// Write the canonical JSON to disk
///
/// The document is fully rendered in memory before any I/O happens, so a
/// serialization failure never leaves a partially-written output file.
pub fn write_model(path: &Path, model: &IrModel) -> Result<(), ExtractError> {
    let text = to_canonical_json(model)?;
    std::fs::write(path, text)?;
    tracing::debug!("Wrote IR model to {}", path.display());
    Ok(())
}

/// Recursively rebuild a JSON value with alphabetically sorted object keys
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let mut sorted = serde_json::Map::new();
            for (key, child) in entries {
                sorted.insert(key, sort_keys(child));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
