//! CLI command implementations

pub mod convert;
pub mod export;
pub mod fetch;
pub mod prune;

pub use convert::ConvertArgs;
pub use export::ExportArgs;
pub use fetch::FetchArgs;
pub use prune::PruneArgs;
