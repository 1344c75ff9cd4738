//! Convert command - Build a repository list from a `name;repo` CSV

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use harvest_core::repository::convert_repository_csv;

/// Arguments for the convert-repos command
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// CSV file with `name;repo` lines
    pub input: PathBuf,

    /// Repository list to write
    pub output: PathBuf,
}

impl ConvertArgs {
    /// Execute the convert-repos command
    pub fn execute(&self) -> anyhow::Result<()> {
        let csv = std::fs::read_to_string(&self.input)
            .with_context(|| format!("Failed to read {}", self.input.display()))?;
        let list = convert_repository_csv(&csv);
        std::fs::write(&self.output, &list)
            .with_context(|| format!("Failed to write {}", self.output.display()))?;

        tracing::info!(lines = list.lines().count(), output = %self.output.display(), "Wrote repository list");
        Ok(())
    }
}
