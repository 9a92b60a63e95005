use crate::prelude::{eprintln, *};
use serde_json::json;

use communitytools_core::format::{
    format_search_results, format_tags_results, SearchEnvelope, TagsEnvelope,
};
use communitytools_core::query::{
    answers_query, popular_tags_query, recent_query, search_query, tag_search_query,
    top_views_fetch_limit, top_views_query, user_content_query, ConversationStyle, SortOrder,
};

/// Boundary to the remote search endpoint: take a finished query string and
/// an operation label, return raw JSON or fail.
#[allow(async_fn_in_trait)]
pub trait Executor {
    async fn execute(&self, query: &str, label: &str) -> Result<serde_json::Value>;
}

/// Hooks for observing query service calls. All methods default to no-ops.
pub trait RequestObserver: Send + Sync {
    fn started(&self, _operation: &str, _params: &serde_json::Value) {}
    fn completed(&self, _operation: &str) {}
    fn failed(&self, _operation: &str, _error: &str) {}
}

pub struct NoopObserver;

impl RequestObserver for NoopObserver {}

/// Observer that writes request traces to stderr, used with `--verbose`.
pub struct ConsoleObserver;

impl RequestObserver for ConsoleObserver {
    fn started(&self, operation: &str, params: &serde_json::Value) {
        eprintln!("==== REQUEST ==== {operation} {params}");
    }

    fn completed(&self, operation: &str) {
        eprintln!("==== RESPONSE ==== {operation} ok");
    }

    fn failed(&self, operation: &str, error: &str) {
        eprintln!("==== ERROR ==== {operation}: {error}");
    }
}

/// One retrieval operation per method. Each call builds a query, executes
/// it, and normalizes the response; transport failures propagate to the
/// caller after the failure hook fires. Stateless between calls.
pub struct CommunityService<E> {
    executor: E,
    observer: Box<dyn RequestObserver>,
}

impl<E: Executor> CommunityService<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            observer: Box::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn RequestObserver>) -> Self {
        self.observer = observer;
        self
    }

    // The completion hook fires only once the response has been normalized,
    // so observers see the full build -> execute -> format pipeline.
    async fn run_query<T>(
        &self,
        operation: &str,
        params: serde_json::Value,
        query: String,
        normalize: impl FnOnce(&serde_json::Value) -> T,
    ) -> Result<T> {
        self.observer.started(operation, &params);
        match self.executor.execute(&query, operation).await {
            Ok(raw) => {
                let normalized = normalize(&raw);
                self.observer.completed(operation);
                Ok(normalized)
            }
            Err(err) => {
                self.observer.failed(operation, &err.to_string());
                Err(err)
            }
        }
    }

    /// Free-text search over all content, optionally restricted to one
    /// conversation style (Q&A threads or blog articles).
    pub async fn search_posts(
        &self,
        terms: &str,
        style: Option<ConversationStyle>,
        limit: usize,
        offset: usize,
        order: SortOrder,
    ) -> Result<SearchEnvelope> {
        let query = search_query(terms, style, limit, offset, order);
        self.run_query(
            "searchByQuery",
            json!({
                "searchTerms": terms,
                "style": style,
                "limit": limit,
                "offset": offset,
                "sortOrder": order,
            }),
            query,
            format_search_results,
        )
        .await
    }

    /// Free-text search restricted to posts carrying any of the given tags.
    pub async fn search_by_tags(
        &self,
        terms: &str,
        tags: &[String],
        limit: usize,
        offset: usize,
        order: SortOrder,
    ) -> Result<SearchEnvelope> {
        let query = tag_search_query(terms, tags, limit, offset, order);
        self.run_query(
            "searchByQueryAndTag",
            json!({
                "searchTerms": terms,
                "tags": tags,
                "limit": limit,
                "offset": offset,
                "sortOrder": order,
            }),
            query,
            format_search_results,
        )
        .await
    }

    /// Most recent posts, newest first, optionally restricted by style
    /// and/or a single tag.
    pub async fn recent_posts(
        &self,
        style: Option<ConversationStyle>,
        tag: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<SearchEnvelope> {
        let query = recent_query(style, tag, limit, offset);
        self.run_query(
            "getMostRecentPosts",
            json!({
                "style": style,
                "tag": tag,
                "limit": limit,
                "offset": offset,
            }),
            query,
            format_search_results,
        )
        .await
    }

    /// Top posts by view count for a tag.
    ///
    /// The API cannot be trusted to order by view count, so this fetches a
    /// recent-in-time candidate pool of `min(limit * 3, 100)` rows, re-sorts
    /// it by descending view count, and truncates to the requested limit.
    pub async fn top_posts_by_views(
        &self,
        tag: &str,
        limit: usize,
        offset: usize,
    ) -> Result<SearchEnvelope> {
        let query = top_views_query(tag, top_views_fetch_limit(limit), offset);
        self.run_query(
            "getTopPostsByViewsForTag",
            json!({ "tag": tag, "limit": limit, "offset": offset }),
            query,
            |raw| {
                let mut envelope = format_search_results(raw);
                envelope.items.sort_by(|a, b| b.view_count.cmp(&a.view_count));
                envelope.items.truncate(limit);
                envelope.pagination.showing = envelope.items.len();
                envelope
            },
        )
        .await
    }

    /// Content authored by one user: top-level posts only, or posts and
    /// answers together when `include_answers` is set.
    pub async fn content_by_user(
        &self,
        username: &str,
        include_answers: bool,
        limit: usize,
        offset: usize,
    ) -> Result<SearchEnvelope> {
        let query = user_content_query(username, include_answers, limit, offset);
        self.run_query(
            "getContentByUser",
            json!({
                "username": username,
                "includeAnswers": include_answers,
                "limit": limit,
                "offset": offset,
            }),
            query,
            format_search_results,
        )
        .await
    }

    /// Answers nested under one post, in chronological order.
    pub async fn answers_for_post(
        &self,
        post_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<SearchEnvelope> {
        let query = answers_query(post_id, limit, offset);
        self.run_query(
            "getAnswersForPost",
            json!({ "postId": post_id, "limit": limit, "offset": offset }),
            query,
            format_search_results,
        )
        .await
    }

    /// Most popular tags by post count.
    pub async fn popular_tags(&self, limit: usize) -> Result<TagsEnvelope> {
        let query = popular_tags_query(limit);
        self.run_query(
            "getPopularTags",
            json!({ "limit": limit }),
            query,
            format_tags_results,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    struct MockExecutor {
        calls: Arc<Mutex<Vec<(String, String)>>>,
        response: serde_json::Value,
    }

    impl MockExecutor {
        fn new(response: serde_json::Value) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                response,
            }
        }

        fn with_calls(
            response: serde_json::Value,
            calls: Arc<Mutex<Vec<(String, String)>>>,
        ) -> Self {
            Self { calls, response }
        }
    }

    impl Executor for MockExecutor {
        async fn execute(&self, query: &str, label: &str) -> Result<serde_json::Value> {
            self.calls
                .lock()
                .unwrap()
                .push((query.to_string(), label.to_string()));
            Ok(self.response.clone())
        }
    }

    struct FailingExecutor;

    impl Executor for FailingExecutor {
        async fn execute(&self, _query: &str, _label: &str) -> Result<serde_json::Value> {
            Err(eyre!("API responded with status: 500"))
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl RequestObserver for RecordingObserver {
        fn started(&self, operation: &str, _params: &serde_json::Value) {
            self.events.lock().unwrap().push(f!("started:{operation}"));
        }

        fn completed(&self, operation: &str) {
            self.events.lock().unwrap().push(f!("completed:{operation}"));
        }

        fn failed(&self, operation: &str, _error: &str) {
            self.events.lock().unwrap().push(f!("failed:{operation}"));
        }
    }

    fn sample_response() -> serde_json::Value {
        json!({
            "data": {
                "items": [
                    {
                        "id": "post-123",
                        "subject": "Test Post",
                        "author": { "login": "test-user" },
                        "postTime": "2025-04-01T12:00:00Z",
                        "tags": [{ "text": "test-tag" }, { "text": "jira" }],
                        "viewCount": 100,
                        "replyCount": 5,
                        "acceptedSolutionId": "answer-456",
                        "body": "<p>This is a test post body</p>",
                        "board": { "id": "jira-software" }
                    }
                ],
                "size": 25,
                "startIndex": 0,
                "totalSize": 1
            }
        })
    }

    fn recorded(calls: &Arc<Mutex<Vec<(String, String)>>>) -> (String, String) {
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        calls[0].clone()
    }

    #[tokio::test]
    async fn test_search_posts_builds_expected_query() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let service = CommunityService::new(MockExecutor::with_calls(
            sample_response(),
            calls.clone(),
        ));

        service
            .search_posts("test query", None, 10, 5, SortOrder::Asc)
            .await
            .unwrap();

        let (query, label) = recorded(&calls);
        assert_eq!(
            query,
            "SELECT * FROM messages WHERE depth = 0 AND (subject MATCHES 'test query' OR body MATCHES 'test query') ORDER BY post_time asc LIMIT 10 OFFSET 5"
        );
        assert_eq!(label, "searchByQuery");
    }

    #[tokio::test]
    async fn test_search_posts_escapes_quotes() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let service = CommunityService::new(MockExecutor::with_calls(
            sample_response(),
            calls.clone(),
        ));

        service
            .search_posts("bob's bug", None, 10, 0, SortOrder::Desc)
            .await
            .unwrap();

        let (query, _) = recorded(&calls);
        assert_eq!(
            query,
            "SELECT * FROM messages WHERE depth = 0 AND (subject MATCHES 'bob''s bug' OR body MATCHES 'bob''s bug') ORDER BY post_time desc LIMIT 10 OFFSET 0"
        );
    }

    #[tokio::test]
    async fn test_search_posts_qanda_variant() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let service = CommunityService::new(MockExecutor::with_calls(
            sample_response(),
            calls.clone(),
        ));

        service
            .search_posts(
                "jira workflow",
                Some(ConversationStyle::QandA),
                10,
                5,
                SortOrder::Desc,
            )
            .await
            .unwrap();

        let (query, _) = recorded(&calls);
        assert_eq!(
            query,
            "SELECT * FROM messages WHERE depth = 0 AND conversation.style = 'qanda' AND (subject MATCHES 'jira workflow' OR body MATCHES 'jira workflow') ORDER BY post_time desc LIMIT 10 OFFSET 5"
        );
    }

    #[tokio::test]
    async fn test_search_by_tags_builds_expected_query() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let service = CommunityService::new(MockExecutor::with_calls(
            sample_response(),
            calls.clone(),
        ));

        let tags = vec!["jira".to_string(), "confluence".to_string()];
        service
            .search_by_tags("test query", &tags, 10, 5, SortOrder::Desc)
            .await
            .unwrap();

        let (query, label) = recorded(&calls);
        assert_eq!(
            query,
            "SELECT * FROM messages WHERE depth = 0 AND (subject MATCHES 'test query' OR body MATCHES 'test query') AND tags.text IN ('jira', 'confluence') ORDER BY post_time desc LIMIT 10 OFFSET 5"
        );
        assert_eq!(label, "searchByQueryAndTag");
    }

    #[tokio::test]
    async fn test_recent_posts_builds_expected_query() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let service = CommunityService::new(MockExecutor::with_calls(
            sample_response(),
            calls.clone(),
        ));

        service.recent_posts(None, None, 20, 0).await.unwrap();

        let (query, label) = recorded(&calls);
        assert_eq!(
            query,
            "SELECT * FROM messages WHERE depth = 0 ORDER BY post_time DESC LIMIT 20 OFFSET 0"
        );
        assert_eq!(label, "getMostRecentPosts");
    }

    #[tokio::test]
    async fn test_recent_posts_by_tag_and_style() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let service = CommunityService::new(MockExecutor::with_calls(
            sample_response(),
            calls.clone(),
        ));

        service
            .recent_posts(Some(ConversationStyle::Blog), Some("confluence"), 10, 0)
            .await
            .unwrap();

        let (query, _) = recorded(&calls);
        assert_eq!(
            query,
            "SELECT * FROM messages WHERE depth = 0 AND conversation.style = 'blog' AND tags.text = 'confluence' ORDER BY post_time DESC LIMIT 10 OFFSET 0"
        );
    }

    #[tokio::test]
    async fn test_top_posts_by_views_over_fetches_and_resorts() {
        let response = json!({
            "data": {
                "items": [
                    { "id": "a", "viewCount": 50, "postTime": "2025-04-01T12:00:00Z" },
                    { "id": "b", "viewCount": 200, "postTime": "2025-04-02T12:00:00Z" },
                    { "id": "c", "viewCount": 100, "postTime": "2025-04-03T12:00:00Z" }
                ],
                "size": 25,
                "startIndex": 0,
                "totalSize": 3
            }
        });
        let calls = Arc::new(Mutex::new(Vec::new()));
        let service =
            CommunityService::new(MockExecutor::with_calls(response, calls.clone()));

        let envelope = service.top_posts_by_views("jira", 15, 10).await.unwrap();

        let (query, label) = recorded(&calls);
        assert_eq!(
            query,
            "SELECT * FROM messages WHERE depth = 0 AND tags.text = 'jira' ORDER BY post_time DESC LIMIT 45 OFFSET 10"
        );
        assert_eq!(label, "getTopPostsByViewsForTag");

        let views: Vec<u64> = envelope.items.iter().map(|i| i.view_count).collect();
        assert_eq!(views, vec![200, 100, 50]);
        assert_eq!(envelope.pagination.showing, envelope.items.len());
    }

    #[tokio::test]
    async fn test_top_posts_by_views_truncates_to_limit() {
        let response = json!({
            "data": {
                "items": [
                    { "id": "a", "viewCount": 50 },
                    { "id": "b", "viewCount": 200 },
                    { "id": "c", "viewCount": 100 }
                ],
                "size": 25,
                "startIndex": 0,
                "totalSize": 3
            }
        });
        let service = CommunityService::new(MockExecutor::new(response));

        let envelope = service.top_posts_by_views("jira", 2, 0).await.unwrap();

        assert_eq!(envelope.items.len(), 2);
        assert_eq!(envelope.pagination.showing, 2);
        assert_eq!(envelope.items[0].view_count, 200);
        assert_eq!(envelope.items[1].view_count, 100);
    }

    #[tokio::test]
    async fn test_content_by_user_posts_only() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let service = CommunityService::new(MockExecutor::with_calls(
            sample_response(),
            calls.clone(),
        ));

        service
            .content_by_user("test-user", false, 30, 0)
            .await
            .unwrap();

        let (query, label) = recorded(&calls);
        assert_eq!(
            query,
            "SELECT * FROM messages WHERE depth = 0 AND author.login = 'test-user' ORDER BY post_time DESC LIMIT 30 OFFSET 0"
        );
        assert_eq!(label, "getContentByUser");
    }

    #[tokio::test]
    async fn test_content_by_user_with_answers_omits_depth() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let service = CommunityService::new(MockExecutor::with_calls(
            sample_response(),
            calls.clone(),
        ));

        service
            .content_by_user("test-user", true, 30, 0)
            .await
            .unwrap();

        let (query, _) = recorded(&calls);
        assert_eq!(
            query,
            "SELECT * FROM messages WHERE author.login = 'test-user' ORDER BY post_time DESC LIMIT 30 OFFSET 0"
        );
    }

    #[tokio::test]
    async fn test_answers_for_post_builds_expected_query() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let service = CommunityService::new(MockExecutor::with_calls(
            sample_response(),
            calls.clone(),
        ));

        service.answers_for_post("post-123", 50, 0).await.unwrap();

        let (query, label) = recorded(&calls);
        assert_eq!(
            query,
            "SELECT * FROM messages WHERE depth > 0 AND parent.id = 'post-123' ORDER BY post_time ASC LIMIT 50 OFFSET 0"
        );
        assert_eq!(label, "getAnswersForPost");
    }

    #[tokio::test]
    async fn test_popular_tags_builds_expected_query() {
        let response = json!({
            "data": {
                "items": [{ "tags.text": "jira", "tag_count": 42 }],
                "totalSize": 1
            }
        });
        let calls = Arc::new(Mutex::new(Vec::new()));
        let service =
            CommunityService::new(MockExecutor::with_calls(response, calls.clone()));

        let envelope = service.popular_tags(30).await.unwrap();

        let (query, label) = recorded(&calls);
        assert_eq!(
            query,
            "SELECT tags.text, COUNT(*) AS tag_count FROM messages WHERE depth = 0 AND tags.text IS NOT NULL GROUP BY tags.text ORDER BY tag_count DESC LIMIT 30"
        );
        assert_eq!(label, "getPopularTags");
        assert!(envelope.success);
        assert_eq!(envelope.tags[0].name, "jira");
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let service = CommunityService::new(FailingExecutor);

        let result = service
            .search_posts("test", None, 25, 0, SortOrder::Desc)
            .await;

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("API responded with status: 500"));
    }

    #[tokio::test]
    async fn test_observer_sees_start_and_completion() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let service = CommunityService::new(MockExecutor::new(sample_response()))
            .with_observer(Box::new(RecordingObserver {
                events: events.clone(),
            }));

        service
            .search_posts("test", None, 25, 0, SortOrder::Desc)
            .await
            .unwrap();

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "started:searchByQuery".to_string(),
                "completed:searchByQuery".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_observer_sees_failure() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let service =
            CommunityService::new(FailingExecutor).with_observer(Box::new(RecordingObserver {
                events: events.clone(),
            }));

        let result = service.answers_for_post("post-1", 25, 0).await;

        assert!(result.is_err());
        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "started:getAnswersForPost".to_string(),
                "failed:getAnswersForPost".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_completion_fires_after_normalization() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let service = CommunityService::new(MockExecutor::new(json!({})))
            .with_observer(Box::new(RecordingObserver {
                events: events.clone(),
            }));

        // Even a malformed response normalizes into an envelope before the
        // completion hook fires.
        let envelope = service.recent_posts(None, None, 25, 0).await.unwrap();

        assert!(!envelope.success);
        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "started:getMostRecentPosts".to_string(),
                "completed:getMostRecentPosts".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_response_is_unsuccessful_not_an_error() {
        let service = CommunityService::new(MockExecutor::new(json!({})));

        let envelope = service
            .search_posts("test", None, 25, 0, SortOrder::Desc)
            .await
            .unwrap();

        assert!(!envelope.success);
        assert!(envelope.items.is_empty());
    }
}
