//! Prune command - Delete records with no answer and no comments

use std::path::PathBuf;

use clap::Args;
use harvest_core::{prune, Config};

/// Arguments for the prune command
#[derive(Args, Debug)]
pub struct PruneArgs {
    /// Directory to walk (defaults to the raw root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Report what would be deleted without deleting
    #[arg(long)]
    pub dry_run: bool,
}

impl PruneArgs {
    /// Execute the prune command
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let root = self.root.as_ref().unwrap_or(&config.storage.raw_root);
        let report = prune::prune(root, self.dry_run)?;

        let verb = if self.dry_run { "Would remove" } else { "Removed" };
        for path in &report.removed {
            println!("{}: {}", verb, path.display());
        }
        println!(
            "{} of {} files ({} skipped)",
            report.removed.len(),
            report.scanned,
            report.skipped
        );
        Ok(())
    }
}
