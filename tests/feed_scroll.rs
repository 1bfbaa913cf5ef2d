//! End-to-end feed scenarios against a mock API server.
//!
//! These tests drive the public fetch client, filter holder and list
//! reconciler the same way the event loop does, without a terminal.

use std::time::Duration;

use serde_json::json;
use tnews::api::NewsClient;
use tnews::feed::{Applied, FeedReconciler, FetchTicket, FilterSelection, FilterState, LoadState};
use tokio::time::Instant;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn article_json(n: u32) -> serde_json::Value {
    json!({
        "id": format!("a{n}"),
        "title": format!("Article {n}"),
        "summary": "Summary",
        "source": "TechCrunch",
        "source_url": null,
        "url": format!("https://techcrunch.com/a{n}"),
        "published_at": "2024-05-01T10:00:00Z",
        "image_url": null,
        "created_at": "2024-05-01T10:05:00Z"
    })
}

fn page_json(range: std::ops::Range<u32>, page: u32, has_next: bool) -> serde_json::Value {
    json!({
        "articles": range.map(article_json).collect::<Vec<_>>(),
        "total": 40,
        "page": page,
        "limit": 20,
        "has_next": has_next
    })
}

fn client(server: &MockServer) -> NewsClient {
    NewsClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

/// Runs the fetch for `ticket` and applies the outcome.
async fn run(client: &NewsClient, feed: &mut FeedReconciler, ticket: FetchTicket) -> Applied {
    let result = client.fetch_page(ticket.page, 20, &ticket.filters).await;
    feed.apply(ticket.generation, result)
}

#[tokio::test]
async fn test_scrolls_through_two_pages_then_stops() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/news"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(0..20, 1, true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/news"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(20..40, 2, false)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut feed = FeedReconciler::new();

    let first = feed.begin_initial(FilterSelection::default());
    assert_eq!(run(&client, &mut feed, first).await, Applied::Replaced(20));
    assert!(feed.has_more());

    // Scrolled to the last row: the sentinel asks for page 2
    assert!(feed.wants_more(19));
    let more = feed.begin_load_more().expect("page 2 should start");
    assert_eq!(more.page, 2);
    assert_eq!(run(&client, &mut feed, more).await, Applied::Appended(20));

    assert_eq!(feed.articles().len(), 40);
    assert!(!feed.has_more());
    assert!(feed.is_exhausted());
    assert!(!feed.wants_more(39));
    assert!(feed.begin_load_more().is_none());
}

#[tokio::test]
async fn test_failed_second_page_keeps_first_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/news"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(0..20, 1, true)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/news"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client(&server);
    let mut feed = FeedReconciler::new();

    let first = feed.begin_initial(FilterSelection::default());
    run(&client, &mut feed, first).await;
    let more = feed.begin_load_more().unwrap();
    assert!(matches!(run(&client, &mut feed, more).await, Applied::Failed(_)));

    assert_eq!(feed.articles().len(), 20);
    assert!(feed.has_more());
    assert_eq!(feed.state(), LoadState::Settled);
    assert!(feed.notice().is_some());
    // The next scroll retries page 2
    assert_eq!(feed.begin_load_more().map(|t| t.page), Some(2));
}

#[tokio::test]
async fn test_typing_sends_one_search_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/news"))
        .and(query_param("q", "gpt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(0..3, 1, false)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut feed = FeedReconciler::new();
    let mut filters = FilterState::new(Duration::from_millis(300));
    let start = Instant::now();

    let mut announced = Vec::new();
    for (i, text) in ["g", "gp", "gpt"].into_iter().enumerate() {
        let at = start + Duration::from_millis(100 * i as u64);
        filters.set_search(text.to_string(), at);
        announced.extend(filters.poll(at));
    }
    assert!(announced.is_empty());

    // 300ms after the last keystroke
    announced.extend(filters.poll(start + Duration::from_millis(500)));
    assert_eq!(announced.len(), 1);

    let ticket = feed.begin_initial(announced.remove(0));
    assert_eq!(run(&client, &mut feed, ticket).await, Applied::Replaced(3));
    assert_eq!(feed.filters().search_term(), "gpt");
}

#[tokio::test]
async fn test_superseded_response_is_discarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/news"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(0..5, 1, false)))
        .mount(&server)
        .await;

    let client = client(&server);
    let mut feed = FeedReconciler::new();

    let old = feed.begin_initial(FilterSelection::default());
    let current = feed.begin_initial(FilterSelection {
        source: "Hacker News".into(),
        ..FilterSelection::default()
    });

    assert_eq!(run(&client, &mut feed, old).await, Applied::Stale);
    assert!(feed.articles().is_empty());
    assert_eq!(run(&client, &mut feed, current).await, Applied::Replaced(5));
}
