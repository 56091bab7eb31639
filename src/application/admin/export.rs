use serde::Serialize;
use serde_json::{Value, json};

use crate::application::errors::Result;

/// Export a changelist as a JSON document
pub fn export_json<T: Serialize>(model: &str, rows: &[T]) -> Result<String> {
    let rows: Vec<Value> = rows
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<_, _>>()?;
    let document = json!({
        "model": model,
        "count": rows.len(),
        "rows": rows,
    });
    Ok(serde_json::to_string_pretty(&document)?)
}
