//! Persisted discussion records
//!
//! These are the shapes written to `<raw_root>/<repo>/<number>`. Field order
//! matches the on-disk JSON.

use serde::{Deserialize, Serialize};

/// Aggregate count of one reaction type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    /// Reaction content, e.g. `THUMBS_UP`
    pub reaction: String,
    pub total_count: u64,
}

/// Discussion category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
}

/// The comment chosen as a discussion's answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: String,
    pub url: String,
    #[serde(rename = "bodyHTML")]
    pub body_html: String,
    pub published_at: String,
    pub upvote_count: i64,
}

/// A reply attached to a discussion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub database_id: Option<i64>,
    pub url: String,
    #[serde(rename = "bodyHTML")]
    pub body_html: String,
    /// Publication timestamp, verbatim from the API
    pub date: String,
    pub is_answer: bool,
    pub upvote_count: i64,
    pub reactions: Vec<Reaction>,
}

/// One stored discussion with all of its comments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discussion {
    /// GraphQL node id
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(rename = "bodyHTML")]
    pub body_html: String,
    /// Publication timestamp, verbatim from the API
    pub date: String,
    pub upvote_count: i64,
    pub category: Category,
    pub reactions: Vec<Reaction>,
    /// Serialized as `null` when the discussion has no accepted answer
    pub answer: Option<Answer>,
    pub comments: Vec<Comment>,
}
