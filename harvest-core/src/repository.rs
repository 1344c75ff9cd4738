//! Repository references and the repository list file

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// A GitHub repository, identified by owner and name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    /// Account or organization that owns the repository
    pub owner: String,
    /// Repository name; also names the storage folder
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Parses `owner/name`, `https://github.com/owner/name` or
/// `git@github.com:owner/name.git`
impl FromStr for RepoRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidRepository(s.to_string());

        let path = if let Some(rest) = s
            .strip_prefix("https://")
            .or_else(|| s.strip_prefix("http://"))
        {
            // drop the host
            rest.split_once('/').map(|(_, path)| path).ok_or_else(invalid)?
        } else if let Some(rest) = s.strip_prefix("git@") {
            rest.split_once(':').map(|(_, path)| path).ok_or_else(invalid)?
        } else {
            s
        };

        let path = path.trim_matches('/').trim_end_matches(".git");
        let mut parts = path.split('/');
        match (parts.next(), parts.next()) {
            (Some(owner), Some(name)) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self::new(owner, name))
            }
            _ => Err(invalid()),
        }
    }
}

/// Parse the contents of a repository list file
///
/// The first line is a header and is skipped. Every other non-blank line
/// holds `<owner> <name>` separated by whitespace; extra fields are ignored.
pub fn parse_repository_list(text: &str) -> Result<Vec<RepoRef>> {
    let mut repositories = Vec::new();

    for (index, line) in text.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next()) {
            (Some(owner), Some(name)) => repositories.push(RepoRef::new(owner, name)),
            _ => {
                return Err(Error::RepositoryLine {
                    line: index + 1,
                    content: line.to_string(),
                })
            }
        }
    }

    Ok(repositories)
}

/// Read and parse a repository list file
pub fn load_repository_list(path: &Path) -> Result<Vec<RepoRef>> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::RepositoryList {
        path: path.to_path_buf(),
        source,
    })?;
    let repositories = parse_repository_list(&text)?;
    debug!(path = %path.display(), count = repositories.len(), "Loaded repository list");
    Ok(repositories)
}

fn csv_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([^;]+);([^;]+)").expect("valid repository csv pattern"))
}

/// Convert a `name;repo` CSV export into repository list lines
///
/// Lines that do not start with two `;`-separated fields are dropped.
/// Nothing is prepended, so a CSV header row becomes the list's header line.
pub fn convert_repository_csv(text: &str) -> String {
    let mut out = String::new();
    for line in text.lines() {
        if let Some(caps) = csv_line_pattern().captures(line) {
            let owner = &caps[1];
            let name = caps[2].trim_end_matches(['\r', '\n']);
            out.push_str(owner);
            out.push(' ');
            out.push_str(name);
            out.push('\n');
        }
    }
    out
}
