//! Fetch command - Harvest discussions into raw JSON records

use anyhow::bail;
use clap::Args;
use harvest_core::repository::load_repository_list;
use harvest_core::{Config, RawStore, RepoRef, Secrets};
use harvest_github::{GitHubClient, Harvester, LoggingObserver};
use tracing::{error, info};

/// Arguments for the fetch command
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Repository to harvest (owner/name); repeatable. Defaults to the repository list
    #[arg(short, long = "repo")]
    pub repos: Vec<String>,

    /// Flush records to disk every N pages (overrides config)
    #[arg(long)]
    pub flush_every: Option<u32>,
}

impl FetchArgs {
    /// Repositories named on the command line, or the configured list
    fn repositories(&self, config: &Config) -> anyhow::Result<Vec<RepoRef>> {
        if self.repos.is_empty() {
            return Ok(load_repository_list(&config.harvest.repositories_file)?);
        }
        self.repos
            .iter()
            .map(|r| r.parse::<RepoRef>().map_err(anyhow::Error::from))
            .collect()
    }

    /// Execute the fetch command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let token = Secrets::load()?.require_github_token()?;
        let repositories = self.repositories(config)?;

        let client = GitHubClient::from_config(&config.github, token)?;
        let store = RawStore::new(&config.storage.raw_root);
        let observer = LoggingObserver;
        let harvester = Harvester::new(&client, &store)
            .with_observer(&observer)
            .with_flush_every(self.flush_every.unwrap_or(config.harvest.flush_every_pages));

        info!(
            count = repositories.len(),
            raw_root = %config.storage.raw_root.display(),
            "Starting harvest"
        );

        let mut failed = Vec::new();
        for repo in &repositories {
            match harvester.harvest(repo).await {
                Ok(summary) => {
                    println!(
                        "{}: {} discussions from {} pages",
                        repo, summary.discussions, summary.pages
                    );
                }
                Err(e) => {
                    error!(repo = %repo, error = %e, "Harvest failed");
                    failed.push(repo.to_string());
                }
            }
        }

        if !failed.is_empty() {
            bail!(
                "{} of {} repositories failed: {}",
                failed.len(),
                repositories.len(),
                failed.join(", ")
            );
        }
        Ok(())
    }
}
