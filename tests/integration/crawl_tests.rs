//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full mirror cycle end-to-end against a temporary output directory.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use sumi_mirror::config::{Config, Layout};
use sumi_mirror::crawler::{crawl, Crawler, DepthBudget, Link, LinkExtractor};
use sumi_mirror::output::FailureKind;
use sumi_mirror::{ExtractError, FetchError, MirrorError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into `dir`
fn create_test_config(dir: &Path, max_depth: Option<u32>) -> Config {
    let mut config = Config::default();
    config.crawler.max_depth = max_depth;
    config.crawler.request_timeout_secs = 5;
    config.output.directory = dir.to_path_buf();
    config
}

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/html")
}

async fn mount_page(server: &MockServer, at: &str, response: ResponseTemplate, expected: u64) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(response)
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_single_pass_queues_only_in_scope_links() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/",
        html(r#"<a href="/a">A</a><a href="/b">B</a><a href="https://other.example/x">X</a>"#),
        1,
    )
    .await;
    mount_page(&server, "/a", html("a"), 0).await;
    mount_page(&server, "/b", html("b"), 0).await;

    let crawler = Crawler::new(&create_test_config(dir.path(), None))
        .unwrap()
        .with_budget(DepthBudget::Passes(1));
    let report = crawler.run(&format!("{}/", base)).await.unwrap();

    assert_eq!(report.passes, 1);
    assert_eq!(
        report.remaining,
        vec![format!("{}/a", base), format!("{}/b", base)]
    );
    assert!(report.visited.iter().all(|u| !u.contains("other.example")));
    assert!(report.remaining.iter().all(|u| !u.contains("other.example")));
    assert!(dir.path().join("index.html").is_file());
}

#[tokio::test]
async fn test_depth_one_fetches_children() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/",
        html(r#"<a href="/a">A</a><a href="/b">B</a><a href="https://other.example/x">X</a>"#),
        1,
    )
    .await;
    mount_page(&server, "/a", html(r#"<a href="/deeper">D</a>"#), 1).await;
    mount_page(&server, "/b", html("b"), 1).await;
    mount_page(&server, "/deeper", html("too deep"), 0).await;

    let config = create_test_config(dir.path(), Some(1));
    let report = crawl(&config, &format!("{}/", base)).await.unwrap();

    assert_eq!(report.passes, 2);
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(report.remaining, vec![format!("{}/deeper", base)]);
    assert!(dir.path().join("a.html").is_file());
    assert!(dir.path().join("b.html").is_file());
    assert!(!dir.path().join("deeper.html").exists());
}

#[tokio::test]
async fn test_depth_zero_fetches_only_root() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(&server, "/", html(r#"<a href="/a">A</a>"#), 1).await;
    mount_page(&server, "/a", html("a"), 0).await;

    let config = create_test_config(dir.path(), Some(0));
    let report = crawl(&config, &format!("{}/", base)).await.unwrap();

    assert_eq!(report.passes, 1);
    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.files, vec![dir.path().join("index.html")]);
}

#[tokio::test]
async fn test_cycle_terminates() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(&server, "/", html(r#"<a href="/a">A</a>"#), 1).await;
    mount_page(
        &server,
        "/a",
        html(format!(r#"<a href="/">Home</a><a href="{}/">Home again</a>"#, base)),
        1,
    )
    .await;

    // Unlimited depth: only the visited set stops the crawl
    let config = create_test_config(dir.path(), None);
    let report = crawl(&config, &format!("{}/", base)).await.unwrap();

    assert_eq!(report.passes, 2);
    assert_eq!(
        report.visited,
        vec![format!("{}/", base), format!("{}/a", base)]
    );
    assert!(report.remaining.is_empty());
    assert!(!report.cancelled);
}

#[tokio::test]
async fn test_failed_sibling_does_not_stop_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/",
        html(r#"<a href="/a">A</a><a href="/b">B</a>"#),
        1,
    )
    .await;
    mount_page(&server, "/a", ResponseTemplate::new(500), 1).await;
    mount_page(&server, "/b", html("b"), 1).await;

    let config = create_test_config(dir.path(), Some(1));
    let report = crawl(&config, &format!("{}/", base)).await.unwrap();

    assert!(!dir.path().join("a.html").exists());
    assert!(dir.path().join("b.html").is_file());

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].url, format!("{}/a", base));
    assert_eq!(report.failures[0].kind, FailureKind::Fetch);
    assert!(report.failures[0].message.contains("500"));
    // A failed node is still visited and never retried
    assert!(report.visited.contains(&format!("{}/a", base)));
}

#[tokio::test]
async fn test_extension_from_content_type() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(&server, "/", html(r#"<a href="/data">Data</a>"#), 1).await;
    mount_page(
        &server,
        "/data",
        ResponseTemplate::new(200).set_body_raw("plain text", "text/plain"),
        1,
    )
    .await;

    let config = create_test_config(dir.path(), Some(1));
    let report = crawl(&config, &format!("{}/", base)).await.unwrap();

    let stored = dir.path().join("data.txt");
    assert_eq!(std::fs::read_to_string(&stored).unwrap(), "plain text");
    assert!(report.files.contains(&stored));
    assert_eq!(
        report.bytes_written,
        std::fs::metadata(dir.path().join("index.html")).unwrap().len() + 10
    );
}

#[tokio::test]
async fn test_root_failure_is_fatal() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_page(&server, "/", ResponseTemplate::new(404), 1).await;

    let config = create_test_config(dir.path(), Some(2));
    let err = crawl(&config, &format!("{}/", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MirrorError::RootFetch {
            source: FetchError::Status { status: 404, .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_equivalent_links_fetched_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/",
        html(format!(
            r##"<a href="/a">1</a><a href="/a/">2</a><a href="/a#part">3</a>
                <a href="{}/a">4</a><a href="#top">5</a><a href="mailto:x@y.z">6</a>"##,
            base
        )),
        1,
    )
    .await;
    mount_page(&server, "/a", html("a"), 1).await;

    let config = create_test_config(dir.path(), Some(3));
    let report = crawl(&config, &format!("{}/", base)).await.unwrap();

    assert_eq!(report.links_discovered, 4);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.visited.len(), 2);
}

#[tokio::test]
async fn test_query_strings_are_distinct() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/",
        html(r#"<a href="/list?page=1">1</a><a href="/list?page=2">2</a>"#),
        1,
    )
    .await;
    mount_page(&server, "/list", html("list"), 2).await;

    let config = create_test_config(dir.path(), Some(1));
    let report = crawl(&config, &format!("{}/", base)).await.unwrap();

    assert_eq!(report.pages_fetched, 3);
    assert!(report.visited.contains(&format!("{}/list?page=1", base)));
    assert!(report.visited.contains(&format!("{}/list?page=2", base)));
}

#[tokio::test]
async fn test_redirect_keeps_percent_escapes() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(&server, "/", html(r#"<a href="/old">Old</a>"#), 1).await;
    mount_page(
        &server,
        "/old",
        ResponseTemplate::new(302).insert_header("location", "/files/my%20doc.txt"),
        1,
    )
    .await;
    mount_page(
        &server,
        "/files/my%20doc.txt",
        ResponseTemplate::new(200).set_body_raw("moved", "text/plain"),
        1,
    )
    .await;

    let config = create_test_config(dir.path(), Some(1));
    let report = crawl(&config, &format!("{}/", base)).await.unwrap();

    assert!(report.failures.is_empty(), "{:?}", report.failures);
    // Named after the URL that was requested, not the redirect target
    assert_eq!(
        std::fs::read_to_string(dir.path().join("old.txt")).unwrap(),
        "moved"
    );
}

#[tokio::test]
async fn test_relative_links_resolve_against_page() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(&server, "/", html(r#"<a href="/docs/intro">Intro</a>"#), 1).await;
    mount_page(&server, "/docs/intro", html(r#"<a href="setup">Setup</a>"#), 1).await;
    mount_page(&server, "/docs/setup", html("setup"), 1).await;

    let config = create_test_config(dir.path(), Some(2));
    let report = crawl(&config, &format!("{}/", base)).await.unwrap();

    assert_eq!(report.pages_fetched, 3);
    assert!(dir.path().join("setup.html").is_file());
}

#[tokio::test]
async fn test_non_html_resources_are_not_parsed() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(&server, "/", html(r#"<a href="/notes">Notes</a>"#), 1).await;
    // Looks like HTML but is served as plain text
    mount_page(
        &server,
        "/notes",
        ResponseTemplate::new(200).set_body_raw(r#"<a href="/hidden">h</a>"#, "text/plain"),
        1,
    )
    .await;
    mount_page(&server, "/hidden", html("hidden"), 0).await;

    let config = create_test_config(dir.path(), Some(3));
    let report = crawl(&config, &format!("{}/", base)).await.unwrap();

    assert_eq!(report.pages_fetched, 2);
    assert!(dir.path().join("notes.txt").is_file());
}

struct FailingExtractor;

impl LinkExtractor for FailingExtractor {
    fn extract(&self, _body: &[u8]) -> Result<Vec<Link>, ExtractError> {
        Err(ExtractError::Selector("broken extractor".to_string()))
    }
}

#[tokio::test]
async fn test_extraction_failure_keeps_node_visited() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(&server, "/", html(r#"<a href="/a">A</a>"#), 1).await;
    mount_page(&server, "/a", html("a"), 0).await;

    let crawler = Crawler::new(&create_test_config(dir.path(), Some(2)))
        .unwrap()
        .with_extractor(Arc::new(FailingExtractor));
    let report = crawler.run(&format!("{}/", base)).await.unwrap();

    assert_eq!(report.passes, 1);
    assert!(dir.path().join("index.html").is_file());
    assert_eq!(report.visited, vec![format!("{}/", base)]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, FailureKind::Extraction);
}

#[tokio::test]
async fn test_write_failure_still_follows_links() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    // A directory where the root page's file should go
    std::fs::create_dir(dir.path().join("index.html")).unwrap();

    mount_page(&server, "/", html(r#"<a href="/a">A</a>"#), 1).await;
    mount_page(&server, "/a", html("a"), 1).await;

    let config = create_test_config(dir.path(), Some(1));
    let report = crawl(&config, &format!("{}/", base)).await.unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, FailureKind::Write);
    assert!(dir.path().join("a.html").is_file());
}

#[tokio::test]
async fn test_mirror_layout_avoids_basename_collisions() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/",
        html(r#"<a href="/x/img.png">x</a><a href="/y/img.png">y</a>"#),
        1,
    )
    .await;
    mount_page(
        &server,
        "/x/img.png",
        ResponseTemplate::new(200).set_body_raw("x", "image/png"),
        1,
    )
    .await;
    mount_page(
        &server,
        "/y/img.png",
        ResponseTemplate::new(200).set_body_raw("y", "image/png"),
        1,
    )
    .await;

    let mut config = create_test_config(dir.path(), Some(1));
    config.crawler.layout = Layout::Mirror;
    crawl(&config, &format!("{}/", base)).await.unwrap();

    assert_eq!(
        std::fs::read_to_string(dir.path().join("x").join("img.png")).unwrap(),
        "x"
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("y").join("img.png")).unwrap(),
        "y"
    );
}

#[tokio::test]
async fn test_pass_order_is_deterministic() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/",
        html(r#"<a href="/slow">S</a><a href="/fast">F</a>"#),
        1,
    )
    .await;
    mount_page(
        &server,
        "/slow",
        html(r#"<a href="/from-slow">1</a>"#).set_delay(Duration::from_millis(300)),
        1,
    )
    .await;
    mount_page(&server, "/fast", html(r#"<a href="/from-fast">2</a>"#), 1).await;
    mount_page(&server, "/from-slow", html("1"), 0).await;
    mount_page(&server, "/from-fast", html("2"), 0).await;

    let config = create_test_config(dir.path(), Some(1));
    let report = crawl(&config, &format!("{}/", base)).await.unwrap();

    assert_eq!(
        report.files,
        vec![
            dir.path().join("index.html"),
            dir.path().join("slow.html"),
            dir.path().join("fast.html"),
        ]
    );
    assert_eq!(
        report.remaining,
        vec![format!("{}/from-slow", base), format!("{}/from-fast", base)]
    );
}

#[tokio::test]
async fn test_crawl_timeout_returns_partial_report() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(&server, "/", html(r#"<a href="/slow">S</a>"#), 1).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("late").set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let mut config = create_test_config(dir.path(), None);
    config.crawler.request_timeout_secs = 30;
    config.crawler.crawl_timeout_secs = Some(1);

    let started = std::time::Instant::now();
    let report = crawl(&config, &format!("{}/", base)).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(report.cancelled);
    assert!(dir.path().join("index.html").is_file());
    assert!(!dir.path().join("slow.html").exists());
    assert_eq!(report.remaining, vec![format!("{}/slow", base)]);
}

#[tokio::test]
async fn test_output_directory_is_created() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("mirror").join("site");

    mount_page(&server, "/", html("home"), 1).await;

    let config = create_test_config(&nested, Some(0));
    crawl(&config, &format!("{}/", server.uri())).await.unwrap();

    assert!(nested.join("index.html").is_file());
}

#[tokio::test]
async fn test_directory_page_fetched_as_linked() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(&server, "/", html(r#"<a href="/docs/">Docs</a>"#), 1).await;
    mount_page(&server, "/docs/", html(r#"<a href="install">Install</a>"#), 1).await;
    mount_page(&server, "/docs", ResponseTemplate::new(404), 0).await;
    mount_page(&server, "/docs/install", html("install"), 1).await;
    mount_page(&server, "/install", html("wrong base"), 0).await;

    let mut config = create_test_config(dir.path(), Some(2));
    config.crawler.layout = Layout::Mirror;
    let report = crawl(&config, &format!("{}/", base)).await.unwrap();

    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.pages_fetched, 3);
    assert!(dir.path().join("docs").join("index.html").is_file());
    assert!(dir.path().join("docs").join("install.html").is_file());
    // Keys drop the trailing slash
    assert!(report.visited.contains(&format!("{}/docs", base)));
    assert!(report.visited.contains(&format!("{}/docs/install", base)));
}

#[tokio::test]
async fn test_slash_variants_fetch_first_linked_form() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/",
        html(r#"<a href="/guide/">1</a><a href="/guide">2</a>"#),
        1,
    )
    .await;
    mount_page(&server, "/guide/", html("guide"), 1).await;
    mount_page(&server, "/guide", html("guide"), 0).await;

    let config = create_test_config(dir.path(), Some(1));
    let report = crawl(&config, &format!("{}/", base)).await.unwrap();

    assert_eq!(report.pages_fetched, 2);
}

async fn mount_slow_siblings(server: &MockServer, delay: Duration) {
    mount_page(
        server,
        "/",
        html(r#"<a href="/s1">1</a><a href="/s2">2</a><a href="/s3">3</a><a href="/s4">4</a>"#),
        1,
    )
    .await;
    for sibling in ["/s1", "/s2", "/s3", "/s4"] {
        mount_page(server, sibling, html("slow").set_delay(delay), 1).await;
    }
}

#[tokio::test]
async fn test_single_worker_fetches_one_at_a_time() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_slow_siblings(&server, Duration::from_millis(300)).await;

    let mut config = create_test_config(dir.path(), Some(1));
    config.crawler.concurrency = 1;

    let started = std::time::Instant::now();
    let report = crawl(&config, &format!("{}/", server.uri())).await.unwrap();

    assert_eq!(report.pages_fetched, 5);
    assert!(started.elapsed() >= Duration::from_millis(1200));
}

#[tokio::test]
async fn test_workers_overlap_within_a_pass() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_slow_siblings(&server, Duration::from_millis(300)).await;

    let mut config = create_test_config(dir.path(), Some(1));
    config.crawler.concurrency = 4;

    let started = std::time::Instant::now();
    let report = crawl(&config, &format!("{}/", server.uri())).await.unwrap();

    assert_eq!(report.pages_fetched, 5);
    assert!(started.elapsed() < Duration::from_millis(1000));
}

#[tokio::test]
async fn test_redirect_loop_is_a_node_failure() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(&server, "/", html(r#"<a href="/ping">Ping</a>"#), 1).await;
    mount_page(
        &server,
        "/ping",
        ResponseTemplate::new(302).insert_header("location", "/pong"),
        1,
    )
    .await;
    mount_page(
        &server,
        "/pong",
        ResponseTemplate::new(302).insert_header("location", "/ping"),
        1,
    )
    .await;

    let config = create_test_config(dir.path(), Some(1));
    let report = crawl(&config, &format!("{}/", base)).await.unwrap();

    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].url, format!("{}/ping", base));
    assert_eq!(report.failures[0].kind, FailureKind::Fetch);
}

#[tokio::test]
async fn test_flat_collision_keeps_later_body_whole() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();
    let long_body = "x".repeat(64 * 1024);

    mount_page(
        &server,
        "/",
        html(r#"<a href="/a/notes.txt">a</a><a href="/b/notes.txt">b</a>"#),
        1,
    )
    .await;
    mount_page(
        &server,
        "/a/notes.txt",
        ResponseTemplate::new(200)
            .set_body_raw(long_body, "text/plain")
            .set_delay(Duration::from_millis(100)),
        1,
    )
    .await;
    mount_page(
        &server,
        "/b/notes.txt",
        ResponseTemplate::new(200).set_body_raw("short", "text/plain"),
        1,
    )
    .await;

    let config = create_test_config(dir.path(), Some(1));
    let report = crawl(&config, &format!("{}/", base)).await.unwrap();

    let stored = dir.path().join("notes.txt");
    assert_eq!(std::fs::read_to_string(&stored).unwrap(), "short");
    assert_eq!(report.files.iter().filter(|p| **p == stored).count(), 2);
}
