//! Raw record storage
//!
//! Every discussion is written to `<root>/<repo-name>/<number>` as 2-space
//! pretty-printed JSON. Writes go through a hidden temporary sibling that is
//! renamed into place, so readers never observe a truncated record.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::model::Discussion;
use crate::repository::RepoRef;
use crate::Result;

/// Suffix of in-flight temporary files
pub const TEMP_SUFFIX: &str = ".tmp";

/// Whether a file name belongs to an unfinished write
pub fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.') && n.ends_with(TEMP_SUFFIX))
}

/// Folder-per-repository store of raw discussion records
#[derive(Debug, Clone)]
pub struct RawStore {
    root: PathBuf,
}

impl RawStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Folder holding a repository's records
    pub fn repo_dir(&self, repo: &RepoRef) -> PathBuf {
        self.root.join(&repo.name)
    }

    /// Path of one discussion record
    pub fn record_path(&self, repo: &RepoRef, number: u64) -> PathBuf {
        self.repo_dir(repo).join(number.to_string())
    }

    /// Write a discussion, replacing any previous record with the same number
    pub fn write(&self, repo: &RepoRef, number: u64, discussion: &Discussion) -> Result<PathBuf> {
        let dir = self.repo_dir(repo);
        fs::create_dir_all(&dir)?;

        let path = dir.join(number.to_string());
        let temp = dir.join(format!(".{}{}", number, TEMP_SUFFIX));

        let json = serde_json::to_string_pretty(discussion)?;
        if let Err(e) = fs::write(&temp, json).and_then(|()| fs::rename(&temp, &path)) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }

        debug!(path = %path.display(), "Stored discussion");
        Ok(path)
    }

    /// Read back a stored record
    pub fn read(&self, repo: &RepoRef, number: u64) -> Result<Discussion> {
        read_record(&self.record_path(repo, number))
    }
}

/// Deserialize a record file
pub fn read_record(path: &Path) -> Result<Discussion> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
