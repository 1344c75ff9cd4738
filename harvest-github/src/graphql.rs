//! API-shaped discussion data and its normalization into stored records

use harvest_core::{Answer, Category, Comment, Discussion, Reaction};
use serde::Deserialize;

/// Cursor state of one paginated collection
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DiscussionsData {
    pub repository: Option<RepositoryData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryData {
    pub discussions: DiscussionConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DiscussionConnection {
    pub total_count: u64,
    pub page_info: PageInfo,
    pub edges: Vec<DiscussionEdge>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DiscussionEdge {
    pub node: RawDiscussion,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Reactors {
    total_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct ReactionGroup {
    content: String,
    reactors: Reactors,
}

impl From<ReactionGroup> for Reaction {
    fn from(group: ReactionGroup) -> Self {
        Reaction {
            reaction: group.content,
            total_count: group.reactors.total_count,
        }
    }
}

fn reactions(groups: Option<Vec<ReactionGroup>>) -> Vec<Reaction> {
    groups
        .unwrap_or_default()
        .into_iter()
        .map(Reaction::from)
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommentCount {
    pub total_count: u64,
}

/// Discussion node as returned by the discussions query
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDiscussion {
    pub id: String,
    pub number: u64,
    url: String,
    title: String,
    #[serde(rename = "bodyHTML")]
    body_html: String,
    published_at: String,
    upvote_count: i64,
    category: Category,
    reaction_groups: Option<Vec<ReactionGroup>>,
    answer: Option<Answer>,
    pub(crate) comments: CommentCount,
}

impl RawDiscussion {
    /// Comment count reported by the API
    pub fn comment_count(&self) -> u64 {
        self.comments.total_count
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentsData {
    pub node: Option<CommentsNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentsNode {
    pub comments: CommentConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommentConnection {
    pub page_info: PageInfo,
    pub edges: Vec<CommentEdge>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentEdge {
    pub node: RawComment,
}

/// Comment node as returned by the comments query
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawComment {
    pub id: String,
    database_id: Option<i64>,
    url: String,
    #[serde(rename = "bodyHTML")]
    body_html: String,
    published_at: String,
    is_answer: bool,
    upvote_count: i64,
    reaction_groups: Option<Vec<ReactionGroup>>,
}

impl From<RawComment> for Comment {
    fn from(raw: RawComment) -> Self {
        Comment {
            id: raw.id,
            database_id: raw.database_id,
            url: raw.url,
            body_html: raw.body_html,
            date: raw.published_at,
            is_answer: raw.is_answer,
            upvote_count: raw.upvote_count,
            reactions: reactions(raw.reaction_groups),
        }
    }
}

/// A discussion whose comments have all been fetched
#[derive(Debug, Clone)]
pub struct HarvestedDiscussion {
    pub discussion: RawDiscussion,
    pub comments: Vec<RawComment>,
}

impl HarvestedDiscussion {
    /// Storage key and stored record
    pub fn into_record(self) -> (u64, Discussion) {
        let raw = self.discussion;
        let record = Discussion {
            id: raw.id,
            url: raw.url,
            title: raw.title,
            body_html: raw.body_html,
            date: raw.published_at,
            upvote_count: raw.upvote_count,
            category: raw.category,
            reactions: reactions(raw.reaction_groups),
            answer: raw.answer,
            comments: self.comments.into_iter().map(Comment::from).collect(),
        };
        (raw.number, record)
    }
}
