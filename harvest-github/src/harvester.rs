//! Discussion harvesting
//!
//! Pages through every discussion of a repository, resolves each
//! discussion's comments with a nested page loop, and flushes completed
//! discussions to a [`RawStore`] every `flush_every_pages` pages. A crash
//! therefore loses at most the unflushed pages.

use harvest_core::{RawStore, RepoRef};
use tracing::{debug, info};

use crate::client::{query, GraphQlTransport};
use crate::graphql::{
    CommentsData, DiscussionsData, HarvestedDiscussion, PageInfo, RawComment,
};
use crate::observer::{HarvestObserver, NoopObserver};
use crate::queries::{self, PAGE_SIZE};
use crate::{Error, Result};

/// Default flush cadence, in discussion pages
pub const DEFAULT_FLUSH_EVERY_PAGES: u32 = 10;

/// Totals of one repository harvest
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Discussion pages fetched
    pub pages: u32,
    /// Comment pages fetched across all discussions
    pub comment_pages: u32,
    /// Records written
    pub discussions: usize,
    /// Flushes performed, including the final one
    pub flushes: u32,
}

/// Harvests discussions of one repository at a time
pub struct Harvester<'a> {
    transport: &'a dyn GraphQlTransport,
    store: &'a RawStore,
    observer: &'a dyn HarvestObserver,
    flush_every_pages: u32,
}

impl<'a> Harvester<'a> {
    pub fn new(transport: &'a dyn GraphQlTransport, store: &'a RawStore) -> Self {
        Self {
            transport,
            store,
            observer: &NoopObserver,
            flush_every_pages: DEFAULT_FLUSH_EVERY_PAGES,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn HarvestObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Flush every `pages` pages; zero is treated as one
    pub fn with_flush_every(mut self, pages: u32) -> Self {
        self.flush_every_pages = pages.max(1);
        self
    }

    /// Fetch every discussion of `repo` and write it to the store
    pub async fn harvest(&self, repo: &RepoRef) -> Result<HarvestSummary> {
        info!(repo = %repo, query_version = queries::QUERY_VERSION, "Harvesting discussions");

        let mut summary = HarvestSummary::default();
        let mut batch: Vec<HarvestedDiscussion> = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let variables = queries::discussions_variables(repo, after.as_deref());
            let data: DiscussionsData =
                query(self.transport, queries::DISCUSSIONS, &variables).await?;
            let connection = data
                .repository
                .ok_or_else(|| Error::RepositoryNotFound(repo.to_string()))?
                .discussions;
            summary.pages += 1;

            for edge in connection.edges {
                let discussion = edge.node;
                let comments = if discussion.comment_count() > 0 {
                    self.fetch_comments(&discussion.id, &mut summary).await?
                } else {
                    Vec::new()
                };
                batch.push(HarvestedDiscussion {
                    discussion,
                    comments,
                });
            }

            let total_pages = total_pages(connection.total_count);
            self.observer
                .page_completed(repo, summary.pages, total_pages);

            if summary.pages % self.flush_every_pages == 0 {
                self.flush(repo, &mut batch, &mut summary, false)?;
            }

            match next_cursor(connection.page_info)? {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }

        if !batch.is_empty() {
            self.flush(repo, &mut batch, &mut summary, true)?;
        }

        info!(
            repo = %repo,
            pages = summary.pages,
            discussions = summary.discussions,
            "Harvest complete"
        );
        Ok(summary)
    }

    /// Every comment of one discussion, in API order
    async fn fetch_comments(
        &self,
        discussion_id: &str,
        summary: &mut HarvestSummary,
    ) -> Result<Vec<RawComment>> {
        let mut comments = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let variables = queries::comments_variables(discussion_id, after.as_deref());
            let data: CommentsData =
                query(self.transport, queries::DISCUSSION_COMMENTS, &variables).await?;
            let connection = data
                .node
                .ok_or_else(|| Error::DiscussionNotFound(discussion_id.to_string()))?
                .comments;
            summary.comment_pages += 1;

            comments.extend(connection.edges.into_iter().map(|edge| edge.node));

            match next_cursor(connection.page_info)? {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }

        debug!(discussion_id, count = comments.len(), "Fetched comments");
        Ok(comments)
    }

    fn flush(
        &self,
        repo: &RepoRef,
        batch: &mut Vec<HarvestedDiscussion>,
        summary: &mut HarvestSummary,
        final_flush: bool,
    ) -> Result<()> {
        let written = batch.len();
        for harvested in batch.drain(..) {
            let (number, record) = harvested.into_record();
            self.store.write(repo, number, &record)?;
        }

        summary.discussions += written;
        summary.flushes += 1;
        self.observer
            .batch_flushed(repo, summary.pages, written, final_flush);
        Ok(())
    }
}

/// Pages needed for `total_count` items, at least one
fn total_pages(total_count: u64) -> u32 {
    let pages = total_count.div_ceil(u64::from(PAGE_SIZE)).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Cursor of the next page, or `None` on the last page
fn next_cursor(page_info: PageInfo) -> Result<Option<String>> {
    if !page_info.has_next_page {
        return Ok(None);
    }
    page_info
        .end_cursor
        .map(Some)
        .ok_or_else(|| Error::Parse("pageInfo.hasNextPage is true but endCursor is null".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Serves queued responses and records every request
    #[derive(Default)]
    struct MockTransport {
        discussion_pages: Mutex<VecDeque<Value>>,
        comment_pages: Mutex<HashMap<String, VecDeque<Value>>>,
        calls: Mutex<Vec<(&'static str, Value)>>,
    }

    impl MockTransport {
        fn with_discussion_pages(pages: Vec<Value>) -> Self {
            Self {
                discussion_pages: Mutex::new(pages.into()),
                ..Default::default()
            }
        }

        fn add_comment_pages(&self, discussion_id: &str, pages: Vec<Value>) {
            self.comment_pages
                .lock()
                .unwrap()
                .insert(discussion_id.to_string(), pages.into());
        }

        fn calls(&self, kind: &str) -> Vec<Value> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, v)| v.clone())
                .collect()
        }
    }

    #[async_trait]
    impl GraphQlTransport for MockTransport {
        async fn execute(&self, query: &str, variables: &Value) -> Result<Value> {
            if query == queries::DISCUSSIONS {
                self.calls.lock().unwrap().push(("discussions", variables.clone()));
                Ok(self
                    .discussion_pages
                    .lock()
                    .unwrap()
                    .pop_front()
                    .expect("unexpected discussions request"))
            } else {
                self.calls.lock().unwrap().push(("comments", variables.clone()));
                let id = variables["id"].as_str().unwrap().to_string();
                Ok(self
                    .comment_pages
                    .lock()
                    .unwrap()
                    .get_mut(&id)
                    .and_then(|pages| pages.pop_front())
                    .expect("unexpected comments request"))
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Page(u32, u32),
        Flush { page: u32, written: usize, final_flush: bool },
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingObserver {
        fn flushes(&self) -> Vec<Event> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter(|e| matches!(e, Event::Flush { .. }))
                .cloned()
                .collect()
        }
    }

    impl HarvestObserver for RecordingObserver {
        fn page_completed(&self, _repo: &RepoRef, page: u32, total_pages: u32) {
            self.events.lock().unwrap().push(Event::Page(page, total_pages));
        }

        fn batch_flushed(&self, _repo: &RepoRef, page: u32, written: usize, final_flush: bool) {
            self.events.lock().unwrap().push(Event::Flush {
                page,
                written,
                final_flush,
            });
        }
    }

    fn discussion(number: u64, comment_count: u64) -> Value {
        json!({
            "cursor": format!("c{number}"),
            "node": {
                "id": format!("D_{number}"),
                "number": number,
                "url": format!("https://github.com/o/r/discussions/{number}"),
                "title": format!("Discussion {number}"),
                "bodyHTML": "<p>body</p>",
                "publishedAt": "2021-01-01T00:00:00Z",
                "upvoteCount": 0,
                "category": {"name": "Q&A"},
                "reactionGroups": [{"content": "THUMBS_UP", "reactors": {"totalCount": 1}}],
                "answer": null,
                "comments": {"totalCount": comment_count}
            }
        })
    }

    fn discussions_page(total_count: u64, edges: Vec<Value>, next: Option<&str>) -> Value {
        json!({
            "data": {
                "repository": {
                    "discussions": {
                        "totalCount": total_count,
                        "pageInfo": {"endCursor": next, "hasNextPage": next.is_some()},
                        "edges": edges
                    }
                }
            }
        })
    }

    fn comment(id: &str) -> Value {
        json!({
            "cursor": format!("cur-{id}"),
            "node": {
                "id": id,
                "databaseId": 1,
                "url": format!("https://github.com/o/r/discussions/1#{id}"),
                "bodyHTML": "<p>reply</p>",
                "publishedAt": "2021-01-02T00:00:00Z",
                "isAnswer": false,
                "upvoteCount": 0,
                "reactionGroups": []
            }
        })
    }

    fn comments_page(ids: &[&str], next: Option<&str>) -> Value {
        json!({
            "data": {
                "node": {
                    "comments": {
                        "totalCount": ids.len(),
                        "pageInfo": {"endCursor": next, "hasNextPage": next.is_some()},
                        "edges": ids.iter().map(|id| comment(id)).collect::<Vec<_>>()
                    }
                }
            }
        })
    }

    fn repo() -> RepoRef {
        RepoRef::new("o", "r")
    }

    #[tokio::test]
    async fn test_single_page_fetched_once() {
        let dir = tempdir().unwrap();
        let store = RawStore::new(dir.path());
        let transport = MockTransport::with_discussion_pages(vec![discussions_page(
            3,
            vec![discussion(1, 0), discussion(2, 0), discussion(3, 0)],
            None,
        )]);

        let summary = Harvester::new(&transport, &store)
            .harvest(&repo())
            .await
            .unwrap();

        assert_eq!(summary.pages, 1);
        assert_eq!(summary.discussions, 3);
        assert_eq!(transport.calls("discussions").len(), 1);
        for number in 1..=3 {
            let record = store.read(&repo(), number).unwrap();
            assert_eq!(record.title, format!("Discussion {number}"));
            assert!(record.comments.is_empty());
        }
    }

    #[tokio::test]
    async fn test_follows_cursor_until_last_page() {
        let dir = tempdir().unwrap();
        let store = RawStore::new(dir.path());
        let transport = MockTransport::with_discussion_pages(vec![
            discussions_page(5, vec![discussion(1, 0), discussion(2, 0)], Some("p1")),
            discussions_page(5, vec![discussion(3, 0)], Some("p2")),
            discussions_page(5, vec![discussion(4, 0), discussion(5, 0)], None),
        ]);

        let summary = Harvester::new(&transport, &store)
            .harvest(&repo())
            .await
            .unwrap();

        assert_eq!(summary.pages, 3);
        assert_eq!(summary.discussions, 5);
        let afters: Vec<Value> = transport
            .calls("discussions")
            .into_iter()
            .map(|v| v["after"].clone())
            .collect();
        assert_eq!(afters, vec![Value::Null, json!("p1"), json!("p2")]);
        assert!(transport
            .calls("discussions")
            .iter()
            .all(|v| v["first"] == 100 && v["owner"] == "o" && v["name"] == "r"));
    }

    #[tokio::test]
    async fn test_flush_every_ten_pages() {
        let dir = tempdir().unwrap();
        let store = RawStore::new(dir.path());
        let pages: Vec<Value> = (1..=25u64)
            .map(|n| {
                let next = format!("p{n}");
                discussions_page(
                    2500,
                    vec![discussion(n, 0)],
                    (n < 25).then_some(next.as_str()),
                )
            })
            .collect();
        let transport = MockTransport::with_discussion_pages(pages);
        let observer = RecordingObserver::default();

        let summary = Harvester::new(&transport, &store)
            .with_observer(&observer)
            .harvest(&repo())
            .await
            .unwrap();

        assert_eq!(summary.pages, 25);
        assert_eq!(summary.flushes, 3);
        assert_eq!(
            observer.flushes(),
            vec![
                Event::Flush { page: 10, written: 10, final_flush: false },
                Event::Flush { page: 20, written: 10, final_flush: false },
                Event::Flush { page: 25, written: 5, final_flush: true },
            ]
        );
        assert!(observer
            .events
            .lock()
            .unwrap()
            .contains(&Event::Page(25, 25)));
    }

    #[tokio::test]
    async fn test_records_written_before_later_page_fails() {
        let dir = tempdir().unwrap();
        let store = RawStore::new(dir.path());
        let transport = MockTransport::with_discussion_pages(vec![
            discussions_page(3, vec![discussion(1, 0), discussion(2, 0)], Some("p1")),
            json!({"errors": [{"message": "boom"}]}),
        ]);

        let err = Harvester::new(&transport, &store)
            .with_flush_every(1)
            .harvest(&repo())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::GraphQl(_)));
        assert!(store.record_path(&repo(), 1).exists());
        assert!(store.record_path(&repo(), 2).exists());
    }

    #[tokio::test]
    async fn test_comments_fetched_only_when_present() {
        let dir = tempdir().unwrap();
        let store = RawStore::new(dir.path());
        let transport = MockTransport::with_discussion_pages(vec![discussions_page(
            2,
            vec![discussion(1, 0), discussion(2, 3)],
            None,
        )]);
        transport.add_comment_pages(
            "D_2",
            vec![
                comments_page(&["DC_a", "DC_b"], Some("cp1")),
                comments_page(&["DC_c"], None),
            ],
        );

        let summary = Harvester::new(&transport, &store)
            .harvest(&repo())
            .await
            .unwrap();

        let comment_calls = transport.calls("comments");
        assert_eq!(comment_calls.len(), 2);
        assert!(comment_calls.iter().all(|v| v["id"] == "D_2"));
        assert_eq!(comment_calls[0]["after"], Value::Null);
        assert_eq!(comment_calls[1]["after"], "cp1");
        assert_eq!(summary.comment_pages, 2);

        assert!(store.read(&repo(), 1).unwrap().comments.is_empty());
        let ids: Vec<String> = store
            .read(&repo(), 2)
            .unwrap()
            .comments
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["DC_a", "DC_b", "DC_c"]);
    }

    #[tokio::test]
    async fn test_graphql_error_on_first_page_writes_nothing() {
        let dir = tempdir().unwrap();
        let store = RawStore::new(dir.path().join("raw"));
        let transport = MockTransport::with_discussion_pages(vec![json!({
            "data": null,
            "errors": [{"message": "Could not resolve to a Repository"}]
        })]);

        let err = Harvester::new(&transport, &store)
            .harvest(&repo())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Could not resolve to a Repository"));
        assert!(!store.repo_dir(&repo()).exists());
    }

    #[tokio::test]
    async fn test_graphql_error_in_comments_aborts() {
        let dir = tempdir().unwrap();
        let store = RawStore::new(dir.path());
        let transport = MockTransport::with_discussion_pages(vec![discussions_page(
            1,
            vec![discussion(1, 2)],
            None,
        )]);
        transport.add_comment_pages("D_1", vec![json!({"errors": [{"message": "timeout"}]})]);

        let err = Harvester::new(&transport, &store)
            .harvest(&repo())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::GraphQl(ref e) if e == &vec![json!({"message": "timeout"})]));
        assert!(!store.record_path(&repo(), 1).exists());
    }

    #[tokio::test]
    async fn test_missing_repository() {
        let dir = tempdir().unwrap();
        let store = RawStore::new(dir.path());
        let transport =
            MockTransport::with_discussion_pages(vec![json!({"data": {"repository": null}})]);

        let err = Harvester::new(&transport, &store)
            .harvest(&repo())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RepositoryNotFound(ref r) if r == "o/r"));
    }

    #[tokio::test]
    async fn test_rerun_produces_identical_files() {
        let dir = tempdir().unwrap();
        let store = RawStore::new(dir.path());
        let page = || discussions_page(1, vec![discussion(7, 1)], None);

        let mut outputs = Vec::new();
        for _ in 0..2 {
            let transport = MockTransport::with_discussion_pages(vec![page()]);
            transport.add_comment_pages("D_7", vec![comments_page(&["DC_x"], None)]);
            Harvester::new(&transport, &store)
                .harvest(&repo())
                .await
                .unwrap();
            outputs.push(std::fs::read(store.record_path(&repo(), 7)).unwrap());
        }

        assert_eq!(outputs[0], outputs[1]);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0), 1);
        assert_eq!(total_pages(100), 1);
        assert_eq!(total_pages(101), 2);
        assert_eq!(total_pages(2500), 25);
    }

    #[test]
    fn test_next_page_without_cursor_is_error() {
        let info = PageInfo {
            has_next_page: true,
            end_cursor: None,
        };
        assert!(matches!(next_cursor(info), Err(Error::Parse(_))));
    }
}
