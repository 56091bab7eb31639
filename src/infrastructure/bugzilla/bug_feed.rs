use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::domain::entities::bug::BugRecord;

/// Read a JSON array of tracker records. A missing file is an empty feed.
pub fn load_bug_feed(path: &Path) -> Result<Vec<BugRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read bug feed {}", path.display()))?;
    let records: Vec<BugRecord> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid bug feed {}", path.display()))?;
    Ok(records)
}
