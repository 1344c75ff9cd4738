//! Flattening of raw records into `,__,`-delimited text rows
//!
//! One row per discussion, fields in this order: discussion number, title,
//! category, comment count, publish date, answered flag (1/0), answer date
//! (or `None`).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use crate::model::Discussion;
use crate::storage::is_temp_file;
use crate::{Error, Result};

/// Field delimiter of exported rows
pub const DELIMITER: &str = ",__,";

/// Placeholder written when a discussion has no answer
pub const NO_ANSWER: &str = "None";

fn discussion_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"discussions/(\d+)").expect("valid discussion url pattern"))
}

/// Extract the discussion number from a discussion URL
pub fn discussion_number(url: &str) -> Option<&str> {
    discussion_number_pattern()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Render one record as a row, without the trailing newline
///
/// Returns `None` when the URL carries no discussion number.
pub fn csv_row(discussion: &Discussion) -> Option<String> {
    let number = discussion_number(&discussion.url)?;
    let (answered, answer_date) = match &discussion.answer {
        Some(answer) => ("1", answer.published_at.as_str()),
        None => ("0", NO_ANSWER),
    };
    let comment_count = discussion.comments.len().to_string();

    Some(
        [
            number,
            discussion.title.as_str(),
            discussion.category.name.as_str(),
            comment_count.as_str(),
            discussion.date.as_str(),
            answered,
            answer_date,
        ]
        .join(DELIMITER),
    )
}

/// Record files of one repository folder, ordered by discussion number
fn record_files(repo_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(repo_dir)? {
        let path = entry?.path();
        if path.is_file() && !is_temp_file(&path) {
            files.push(path);
        }
    }

    files.sort_by_key(|path| {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let number = name.parse::<u64>().ok();
        (number.is_none(), number, name)
    });
    Ok(files)
}

/// Export one repository folder into `out_file`, replacing its contents
///
/// Returns the number of rows written.
pub fn export_repository(repo_dir: &Path, out_file: &Path) -> Result<usize> {
    let mut out = String::new();
    let mut rows = 0;

    for path in record_files(repo_dir)? {
        let contents = fs::read_to_string(&path)?;
        let discussion: Discussion =
            serde_json::from_str(&contents).map_err(|e| Error::Export {
                path: path.clone(),
                reason: format!("not a discussion record: {}", e),
            })?;
        let row = csv_row(&discussion).ok_or_else(|| Error::Export {
            path: path.clone(),
            reason: format!("no discussion number in url {:?}", discussion.url),
        })?;
        out.push_str(&row);
        out.push('\n');
        rows += 1;
    }

    fs::write(out_file, out)?;
    info!(repo_dir = %repo_dir.display(), out = %out_file.display(), rows, "Exported repository");
    Ok(rows)
}

/// Totals of an [`export_all`] run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Repositories exported successfully
    pub repositories: usize,
    /// Rows written across all repositories
    pub rows: usize,
    /// Names of repositories whose export failed
    pub failed: Vec<String>,
}

/// Export every repository folder under `raw_root` to `<transformed_root>/<repo>.txt`
///
/// A failing repository is logged and skipped; the rest are still exported.
pub fn export_all(raw_root: &Path, transformed_root: &Path) -> Result<ExportSummary> {
    fs::create_dir_all(transformed_root)?;

    let mut repo_dirs = Vec::new();
    for entry in fs::read_dir(raw_root)? {
        let path = entry?.path();
        if path.is_dir() {
            repo_dirs.push(path);
        }
    }
    repo_dirs.sort();

    let mut summary = ExportSummary::default();
    for repo_dir in repo_dirs {
        let name = repo_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let out_file = transformed_root.join(format!("{}.txt", name));

        match export_repository(&repo_dir, &out_file) {
            Ok(rows) => {
                summary.repositories += 1;
                summary.rows += rows;
            }
            Err(e) => {
                warn!(repo = %name, error = %e, "Failed to export repository");
                summary.failed.push(name);
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Answer, Category, Comment};
    use tempfile::tempdir;

    fn comment(n: usize) -> Comment {
        Comment {
            id: format!("DC_{n}"),
            database_id: Some(n as i64),
            url: String::new(),
            body_html: String::new(),
            date: String::new(),
            is_answer: false,
            upvote_count: 0,
            reactions: vec![],
        }
    }

    fn discussion(number: u64, answer: Option<&str>) -> Discussion {
        Discussion {
            id: format!("D_{number}"),
            url: format!("https://github.com/o/r/discussions/{number}"),
            title: "T".to_string(),
            body_html: String::new(),
            date: "2021-01-01".to_string(),
            upvote_count: 0,
            category: Category {
                name: "Q&A".to_string(),
            },
            reactions: vec![],
            answer: answer.map(|published_at| Answer {
                id: "DC_a".to_string(),
                url: String::new(),
                body_html: String::new(),
                published_at: published_at.to_string(),
                upvote_count: 0,
            }),
            comments: (0..3).map(comment).collect(),
        }
    }

    #[test]
    fn test_answered_row() {
        let row = csv_row(&discussion(42, Some("2021-01-02"))).unwrap();
        assert_eq!(row, "42,__,T,__,Q&A,__,3,__,2021-01-01,__,1,__,2021-01-02");
    }

    #[test]
    fn test_unanswered_row() {
        let mut d = discussion(7, None);
        d.comments.clear();
        assert_eq!(csv_row(&d).unwrap(), "7,__,T,__,Q&A,__,0,__,2021-01-01,__,0,__,None");
    }

    #[test]
    fn test_url_without_number() {
        let mut d = discussion(1, None);
        d.url = "https://github.com/o/r/issues/1".to_string();
        assert!(csv_row(&d).is_none());
        assert_eq!(discussion_number("https://x/discussions/123#c"), Some("123"));
    }

    #[test]
    fn test_export_repository_sorted_by_number() {
        let dir = tempdir().unwrap();
        let repo_dir = dir.path().join("r");
        fs::create_dir(&repo_dir).unwrap();
        for n in [10u64, 2, 1] {
            let json = serde_json::to_string_pretty(&discussion(n, None)).unwrap();
            fs::write(repo_dir.join(n.to_string()), json).unwrap();
        }
        let out = dir.path().join("r.txt");

        let rows = export_repository(&repo_dir, &out).unwrap();

        assert_eq!(rows, 3);
        let text = fs::read_to_string(&out).unwrap();
        let numbers: Vec<&str> = text.lines().map(|l| l.split(DELIMITER).next().unwrap()).collect();
        assert_eq!(numbers, vec!["1", "2", "10"]);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_export_rejects_foreign_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("1"), r#"{"answer": null}"#).unwrap();

        let err = export_repository(dir.path(), &dir.path().join("out.txt")).unwrap_err();
        assert!(matches!(err, Error::Export { .. }));
    }

    #[test]
    fn test_export_all_continues_after_failure() {
        let dir = tempdir().unwrap();
        let raw = dir.path().join("raw");
        let good = raw.join("good");
        let bad = raw.join("bad");
        fs::create_dir_all(&good).unwrap();
        fs::create_dir_all(&bad).unwrap();
        fs::write(
            good.join("5"),
            serde_json::to_string(&discussion(5, Some("2021-02-02"))).unwrap(),
        )
        .unwrap();
        fs::write(bad.join("1"), "not json").unwrap();
        let transformed = dir.path().join("transformed");

        let summary = export_all(&raw, &transformed).unwrap();

        assert_eq!(summary.repositories, 1);
        assert_eq!(summary.rows, 1);
        assert_eq!(summary.failed, vec!["bad".to_string()]);
        let text = fs::read_to_string(transformed.join("good.txt")).unwrap();
        assert_eq!(text, "5,__,T,__,Q&A,__,3,__,2021-01-01,__,1,__,2021-02-02\n");
    }
}
