//! GraphQL documents sent to the discussions API
//!
//! Bump [`QUERY_VERSION`] whenever a document's projection changes, so stored
//! data can be traced back to the shape that produced it.

use harvest_core::RepoRef;
use serde_json::{json, Value};

/// Version of the query set below
pub const QUERY_VERSION: u32 = 1;

/// Items per page; the API's maximum for `first`
pub const PAGE_SIZE: u32 = 100;

/// Discussions of a repository, newest first
pub const DISCUSSIONS: &str = include_str!("queries/discussions.graphql");

/// Comments of one discussion, addressed by node id
pub const DISCUSSION_COMMENTS: &str = include_str!("queries/discussion_comments.graphql");

/// Variables for [`DISCUSSIONS`]
pub fn discussions_variables(repo: &RepoRef, after: Option<&str>) -> Value {
    json!({
        "owner": repo.owner,
        "name": repo.name,
        "first": PAGE_SIZE,
        "after": after,
    })
}

/// Variables for [`DISCUSSION_COMMENTS`]
pub fn comments_variables(discussion_id: &str, after: Option<&str>) -> Value {
    json!({
        "id": discussion_id,
        "first": PAGE_SIZE,
        "after": after,
    })
}
