//! Removal of empty raw records
//!
//! A record is empty when it has no accepted answer and no comments. Such
//! discussions carry nothing for the dataset and are deleted.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::storage::is_temp_file;
use crate::Result;

/// Outcome of a prune run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PruneReport {
    /// Files inspected
    pub scanned: usize,
    /// Files removed, or that would be removed on a dry run
    pub removed: Vec<PathBuf>,
    /// Files that were not UTF-8 JSON
    pub skipped: usize,
}

/// Whether a parsed record has `answer: null` and `comments: []`
pub fn is_empty_record(value: &Value) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };
    let answer_missing = object.get("answer").is_some_and(Value::is_null);
    let no_comments = object
        .get("comments")
        .and_then(Value::as_array)
        .is_some_and(|comments| comments.is_empty());
    answer_missing && no_comments
}

/// Delete every empty record below `root`
///
/// Directories are walked with an explicit worklist, so nesting depth never
/// grows the call stack. Unreadable or non-JSON files are left in place.
pub fn prune(root: &Path, dry_run: bool) -> Result<PruneReport> {
    let mut report = PruneReport::default();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();

        for path in entries {
            let file_type = fs::symlink_metadata(&path)?.file_type();
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() && !is_temp_file(&path) {
                report.scanned += 1;
                prune_file(&path, dry_run, &mut report)?;
            }
        }
    }

    info!(
        root = %root.display(),
        scanned = report.scanned,
        removed = report.removed.len(),
        skipped = report.skipped,
        dry_run,
        "Prune finished"
    );
    Ok(report)
}

fn prune_file(path: &Path, dry_run: bool, report: &mut PruneReport) -> Result<()> {
    let value = match fs::read_to_string(path)
        .ok()
        .and_then(|text| serde_json::from_str::<Value>(&text).ok())
    {
        Some(value) => value,
        None => {
            debug!(path = %path.display(), "Skipping file that is not UTF-8 JSON");
            report.skipped += 1;
            return Ok(());
        }
    };

    if is_empty_record(&value) {
        if !dry_run {
            fs::remove_file(path)?;
        }
        info!(path = %path.display(), dry_run, "Removed empty record");
        report.removed.push(path.to_path_buf());
    }
    Ok(())
}
