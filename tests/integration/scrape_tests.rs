//! Integration tests for the scraper
//!
//! These tests use wiremock to serve a fake author archive and exercise
//! index resolution, fetching, extraction and the output stage end-to-end.

use byline::config::{Config, OutputFormat, TagMatch};
use byline::crawler::{AuthorIndexResolver, Coordinator, Fetcher};
use byline::output::{export_articles, filter_by_tags, ScrapeStats};
use byline::state::RunState;
use byline::storage::{ResultStore, RunStatus, SqliteStore};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Creates a test configuration with short delays
fn create_test_config(server: &MockServer) -> Config {
    let mut config = Config::for_author(format!("{}/@writer", server.uri()));
    config.scraper.min_request_interval = 1;
    config.scraper.max_attempts = 3;
    config.scraper.backoff_base = 5;
    config.scraper.backoff_max = 20;
    config.scraper.request_timeout = 5;
    config.scraper.max_concurrent_articles = 3;
    config
}

/// Path of the n-th article of the fake author
fn article_path(n: usize) -> String {
    format!("/@writer/post-{}-{:012x}", n, 0xabc000 + n)
}

/// A listing page linking articles `range`, optionally to a next page
fn listing_html(range: std::ops::Range<usize>, next: Option<&str>) -> String {
    let links: String = range
        .map(|n| format!(r#"<a href="{}?source=profile">Post {}</a>"#, article_path(n), n))
        .collect();
    let next = next
        .map(|href| format!(r#"<link rel="next" href="{}">"#, href))
        .unwrap_or_default();
    format!(
        "<html><head>{}</head><body>{}<a href=\"/@writer/about\">About</a></body></html>",
        next, links
    )
}

fn article_html(title: &str, tags: &[&str]) -> String {
    let metas: String = tags
        .iter()
        .map(|tag| format!(r#"<meta property="article:tag" content="{}">"#, tag))
        .collect();
    format!(
        "<html><head><title>{} | Medium</title>{}</head>\
         <body><article><h1>{}</h1><p>Some body text.</p></article></body></html>",
        title, metas, title
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

fn json(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.to_string())
        .insert_header("content-type", "application/json")
}

async fn mount_articles(server: &MockServer, range: std::ops::Range<usize>) {
    for n in range {
        Mock::given(method("GET"))
            .and(path(article_path(n)))
            .respond_with(html(article_html(&format!("Post {}", n), &[])))
            .mount(server)
            .await;
    }
}

fn author_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}/@writer", server.uri())).unwrap()
}

#[tokio::test]
async fn test_index_deduplicates_across_pages() {
    let server = MockServer::start().await;

    // Page 2 repeats two articles from page 1
    Mock::given(method("GET"))
        .and(path("/@writer"))
        .respond_with(html(listing_html(0..4, Some("/@writer/page/2"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/@writer/page/2"))
        .respond_with(html(listing_html(2..7, Some("/@writer/page/3"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/@writer/page/3"))
        .respond_with(html(listing_html(7..9, None)))
        .mount(&server)
        .await;

    let config = create_test_config(&server);
    let fetcher = Arc::new(Fetcher::from_config(&config).unwrap());
    let resolver = AuthorIndexResolver::new(fetcher, 10);

    let resolution = resolver
        .resolve_article_urls(&author_url(&server), None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(resolution.urls.len(), 9, "Should find 9 distinct articles");
    assert!(!resolution.partial);
    let expected: Vec<String> = (0..9)
        .map(|n| format!("{}{}", server.uri(), article_path(n)))
        .collect();
    let found: Vec<String> = resolution.urls.iter().map(|u| u.to_string()).collect();
    assert_eq!(found, expected, "Discovery order and canonical form");
}

#[tokio::test]
async fn test_index_respects_max_articles() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/@writer"))
        .respond_with(html(listing_html(0..5, Some("/@writer/page/2"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/@writer/page/2"))
        .respond_with(html(listing_html(5..10, None)))
        .mount(&server)
        .await;

    let config = create_test_config(&server);
    let fetcher = Arc::new(Fetcher::from_config(&config).unwrap());
    let resolver = AuthorIndexResolver::new(fetcher, 10);

    let resolution = resolver
        .resolve_article_urls(&author_url(&server), Some(7), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(resolution.urls.len(), 7);
    assert!(resolution.urls[6].as_str().ends_with(&article_path(6)));
}

#[tokio::test]
async fn test_index_follows_from_token() {
    let server = MockServer::start().await;
    let posts = |range: std::ops::Range<usize>| -> Vec<serde_json::Value> {
        range
            .map(|n| serde_json::json!({"mediumUrl": format!("{}{}", server.uri(), article_path(n))}))
            .collect()
    };

    Mock::given(method("GET"))
        .and(path("/@writer"))
        .and(query_param("from", "20"))
        .respond_with(json(serde_json::json!({
            "payload": {"posts": posts(3..5)},
            "paging": {},
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/@writer"))
        .respond_with(json(serde_json::json!({
            "payload": {"posts": posts(0..3)},
            "paging": {"next": {"from": "20"}},
        })))
        .mount(&server)
        .await;

    let config = create_test_config(&server);
    let fetcher = Arc::new(Fetcher::from_config(&config).unwrap());
    let resolver = AuthorIndexResolver::new(fetcher, 10);

    let resolution = resolver
        .resolve_article_urls(&author_url(&server), None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(resolution.urls.len(), 5, "Second page requested with ?from=");
    assert!(!resolution.partial);
}

#[tokio::test]
async fn test_index_empty_author_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/@writer"))
        .respond_with(html("<html><body>No stories yet</body></html>".to_string()))
        .mount(&server)
        .await;

    let config = create_test_config(&server);
    let mut coordinator = Coordinator::new(&config).unwrap();

    let result = coordinator.run(&author_url(&server)).await;

    assert!(result.is_err());
    assert_eq!(coordinator.state(), RunState::Failed);
}

/// Answers with `statuses` in turn (200 once they run out) and records when
/// each request arrived
struct TimedResponder {
    statuses: Vec<u16>,
    arrivals: Arc<Mutex<Vec<Instant>>>,
}

impl Respond for TimedResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let mut arrivals = self.arrivals.lock().unwrap();
        arrivals.push(Instant::now());
        match self.statuses.get(arrivals.len() - 1) {
            Some(status) => ResponseTemplate::new(*status),
            None => html("<html><body>ok</body></html>".to_string()),
        }
    }
}

#[tokio::test]
async fn test_rate_limited_fetch_eventually_succeeds() {
    let server = MockServer::start().await;
    let arrivals = Arc::new(Mutex::new(Vec::new()));

    Mock::given(method("GET"))
        .and(path("/@writer/slow"))
        .respond_with(TimedResponder {
            statuses: vec![429, 429],
            arrivals: Arc::clone(&arrivals),
        })
        .mount(&server)
        .await;

    // Retry 1 waits 40..=60ms, retry 2 waits 80..=120ms
    let mut config = create_test_config(&server);
    config.scraper.backoff_base = 40;
    config.scraper.backoff_max = 200;
    let fetcher = Fetcher::from_config(&config).unwrap();
    let url = Url::parse(&format!("{}/@writer/slow", server.uri())).unwrap();

    let body = fetcher.fetch(&url).await.unwrap();

    assert!(body.contains("ok"));
    let host = format!("127.0.0.1:{}", server.address().port());
    assert_eq!(fetcher.limiter().requests_made(&host), 3);

    let arrivals = arrivals.lock().unwrap().clone();
    assert_eq!(arrivals.len(), 3);
    let gaps: Vec<Duration> = arrivals.windows(2).map(|w| w[1] - w[0]).collect();
    assert!(
        gaps[0] >= Duration::from_millis(40),
        "First retry waited only {:?}",
        gaps[0]
    );
    assert!(
        gaps[1] >= Duration::from_millis(80),
        "Second retry waited only {:?}",
        gaps[1]
    );
    assert!(
        gaps[1] + Duration::from_millis(5) >= gaps[0],
        "Retry delays never decrease: {:?}",
        gaps
    );
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/@writer/gone-1a2b3c4d5e6f"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = create_test_config(&server);
    let fetcher = Fetcher::from_config(&config).unwrap();
    let url = Url::parse(&format!("{}/@writer/gone-1a2b3c4d5e6f", server.uri())).unwrap();

    let error = fetcher.fetch(&url).await.unwrap_err();

    assert_eq!(error.status(), Some(404));
    assert_eq!(error.attempts, 1);
}

#[tokio::test]
async fn test_failing_second_page_gives_partial_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/@writer"))
        .respond_with(html(listing_html(0..10, Some("/@writer/page/2"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/@writer/page/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_articles(&server, 0..10).await;

    let config = create_test_config(&server);
    let mut coordinator = Coordinator::new(&config).unwrap();

    let result = coordinator.run(&author_url(&server)).await.unwrap();

    assert!(result.partial);
    assert!(!result.cancelled);
    assert_eq!(result.resolved_count, 10);
    assert_eq!(result.articles.len(), 10);
    assert_eq!(result.failed_count, 0);
    assert_eq!(result.articles[0].title, "Post 0");
    assert_eq!(result.articles[9].title, "Post 9");
    assert_eq!(coordinator.state(), RunState::Done);
}

#[tokio::test]
async fn test_end_to_end_tag_filter_and_stats() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/@writer"))
        .respond_with(html(listing_html(0..3, None)))
        .mount(&server)
        .await;

    let tags: [&[&str]; 3] = [&["Rust", "Async"], &["Python"], &["rust"]];
    let comment_counts = [2usize, 1, 3];
    for n in 0..3 {
        Mock::given(method("GET"))
            .and(path(article_path(n)))
            .respond_with(html(article_html(&format!("Post {}", n), tags[n])))
            .mount(&server)
            .await;

        let comments: Vec<serde_json::Value> = (0..comment_counts[n])
            .map(|i| {
                serde_json::json!({
                    "id": format!("c{}-{}", n, i),
                    "author": "reader",
                    "text": format!("Comment {}", i),
                    "createdAt": "2024-03-01T12:00:00Z",
                })
            })
            .collect();
        Mock::given(method("GET"))
            .and(path(format!("/p/{:012x}/responses", 0xabc000 + n)))
            .respond_with(json(serde_json::json!({
                "comments": comments,
                "paging": {},
            })))
            .mount(&server)
            .await;
    }

    let mut config = create_test_config(&server);
    config.input.include_comments = true;
    config.input.tags = vec!["RUST".to_string()];

    let mut coordinator = Coordinator::new(&config).unwrap();
    let result = coordinator.run(&author_url(&server)).await.unwrap();

    assert!(!result.partial);
    assert_eq!(result.articles.len(), 3);
    assert_eq!(result.total_comments(), 6);
    assert!(result.articles[0].has_tag("rust"));
    assert!(result.articles[0].has_tag("async"));

    let filtered = filter_by_tags(
        result.articles.clone(),
        &config.input.tags,
        config.input.tag_match,
    );
    assert_eq!(filtered.len(), 2);
    assert_eq!(filtered[0].title, "Post 0");
    assert_eq!(filtered[1].title, "Post 2");

    let stats = ScrapeStats::compute(&filtered, &result, Duration::from_millis(1500));
    assert_eq!(stats.total_articles_scraped, 2);
    assert_eq!(stats.total_comments_scraped, 5);
    assert_eq!(stats.time_taken, "1.5 seconds");

    let all = filter_by_tags(
        result.articles.clone(),
        &["rust".to_string(), "async".to_string()],
        TagMatch::All,
    );
    assert_eq!(all.len(), 1);

    let temp = TempDir::new().unwrap();
    let path = export_articles(&filtered, OutputFormat::Json, temp.path()).unwrap();
    let exported: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(exported.as_array().unwrap().len(), 2);
    assert_eq!(exported[0]["comments"].as_array().unwrap().len(), 2);

    let mut store = SqliteStore::new(&temp.path().join("dataset.db")).unwrap();
    let run_id = store.create_run(&config.input.author_url, "hash").unwrap();
    store
        .push_item(run_id, &serde_json::json!({ "articles": exported, "stats": stats }))
        .unwrap();
    store
        .finish_run(run_id, RunStatus::for_result(result.partial))
        .unwrap();
    assert_eq!(store.items(run_id).unwrap().len(), 1);
    assert_eq!(store.get_run(run_id).unwrap().status, RunStatus::Completed);
}

#[tokio::test]
async fn test_tags_are_normalized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/@writer"))
        .respond_with(html(listing_html(0..2, None)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(article_path(0)))
        .respond_with(html(article_html("Tagged", &["Tech", "tech", "AI"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(article_path(1)))
        .respond_with(html(article_html("Untagged", &[])))
        .mount(&server)
        .await;

    let config = create_test_config(&server);
    let mut coordinator = Coordinator::new(&config).unwrap();
    let result = coordinator.run(&author_url(&server)).await.unwrap();

    let tags: Vec<&str> = result.articles[0].tags.iter().map(String::as_str).collect();
    assert_eq!(tags, vec!["ai", "tech"]);
    assert!(result.articles[1].tags.is_empty());
}

#[tokio::test]
async fn test_dangling_comment_parent_is_cleared() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/@writer"))
        .respond_with(html(listing_html(0..1, None)))
        .mount(&server)
        .await;
    mount_articles(&server, 0..1).await;
    Mock::given(method("GET"))
        .and(path(format!("/p/{:012x}/responses", 0xabc000)))
        .respond_with(json(serde_json::json!({
            "comments": [
                { "id": "c1", "author": "reader", "text": "Top level" },
                { "id": "c2", "author": "writer", "text": "Reply", "parentId": "c1" },
                { "id": "c3", "author": "other", "text": "Orphan", "parentId": "missing" },
            ],
            "paging": {},
        })))
        .mount(&server)
        .await;

    let mut config = create_test_config(&server);
    config.input.include_comments = true;
    let mut coordinator = Coordinator::new(&config).unwrap();
    let result = coordinator.run(&author_url(&server)).await.unwrap();

    let comments = &result.articles[0].comments;
    assert_eq!(comments.len(), 3);
    assert_eq!(comments[1].parent_id.as_deref(), Some("c1"));
    assert_eq!(comments[2].parent_id, None);

    let json = serde_json::to_value(&comments[2]).unwrap();
    assert!(json["parentId"].is_null());
}

#[tokio::test]
async fn test_cancelled_before_start_makes_no_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/@writer"))
        .respond_with(html(listing_html(0..3, None)))
        .mount(&server)
        .await;
    mount_articles(&server, 0..3).await;

    let config = create_test_config(&server);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut coordinator = Coordinator::new(&config)
        .unwrap()
        .with_cancellation(cancel);

    let result = coordinator.run(&author_url(&server)).await.unwrap();

    assert!(result.articles.is_empty());
    assert!(result.partial);
    assert!(result.cancelled);
    assert!(server.received_requests().await.unwrap().is_empty());
}
