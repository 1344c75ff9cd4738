//! Harvest GitHub - GitHub Discussions extraction
//!
//! This crate talks to the GitHub GraphQL API: it pages through the
//! discussions of a repository and their comments and hands finished
//! records to the raw store from `harvest-core`.

mod client;
mod error;
mod graphql;
mod harvester;
mod observer;
pub mod queries;

pub use client::{query, GitHubClient, GraphQlTransport, RetryPolicy};
pub use error::{Error, Result};
pub use graphql::{HarvestedDiscussion, PageInfo, RawComment, RawDiscussion};
pub use harvester::{HarvestSummary, Harvester, DEFAULT_FLUSH_EVERY_PAGES};
pub use observer::{HarvestObserver, LoggingObserver, NoopObserver};
