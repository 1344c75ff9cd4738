//! Export command - Flatten raw records into delimited text files

use std::path::PathBuf;

use anyhow::bail;
use clap::Args;
use harvest_core::{export, Config};

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Export only this repository folder (repository name)
    #[arg(short, long)]
    pub repo: Option<String>,

    /// Output directory (defaults to the transformed root)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

impl ExportArgs {
    /// Execute the export command
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let raw_root = &config.storage.raw_root;
        let out_dir = self.out.as_ref().unwrap_or(&config.storage.transformed_root);

        if let Some(name) = &self.repo {
            std::fs::create_dir_all(out_dir)?;
            let out_file = out_dir.join(format!("{}.txt", name));
            let rows = export::export_repository(&raw_root.join(name), &out_file)?;
            println!("{}: {} rows -> {}", name, rows, out_file.display());
            return Ok(());
        }

        let summary = export::export_all(raw_root, out_dir)?;
        println!(
            "Exported {} repositories ({} rows) to {}",
            summary.repositories,
            summary.rows,
            out_dir.display()
        );
        if !summary.failed.is_empty() {
            bail!("export failed for: {}", summary.failed.join(", "));
        }
        Ok(())
    }
}
