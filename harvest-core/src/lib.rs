//! Harvest Core - data model and local processing for GitHub Discussions
//!
//! This crate owns everything that happens on disk: the persisted record
//! shapes, the repository list, configuration and secrets, raw storage,
//! pruning of empty records and the delimited text export.

pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod prune;
pub mod repository;
pub mod secrets;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use model::{Answer, Category, Comment, Discussion, Reaction};
pub use repository::RepoRef;
pub use secrets::Secrets;
pub use storage::RawStore;
