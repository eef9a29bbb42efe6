//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use sitemapper::config::Config;
use sitemapper::crawler::ROBOTS_DISALLOWED;
use sitemapper::output::ExportFormat;
use sitemapper::state::PageStatus;
use sitemapper::{CrawlProgress, Crawler, SitemapData, SitemapError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with no delay and robots.txt ignored
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawler.delay = 0;
    config.crawler.respect_robots_txt = false;
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}

/// Builds a minimal HTML page with the given title and links
fn html_page(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body><p>Some words here</p>{}</body></html>",
        title, anchors
    )
}

/// Serves `body` as HTML at `route`, expecting exactly `hits` requests
async fn mount_page(server: &MockServer, route: &str, body: String, hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .expect(hits)
        .mount(server)
        .await;
}

async fn crawl(config: Config, seed: &str) -> SitemapData {
    let crawler = Crawler::new(config).expect("Failed to create crawler");
    crawler.crawl(seed, None).await.expect("Crawl failed")
}

#[tokio::test]
async fn test_linear_site_with_back_link() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", html_page("Home", &["/a"]), 1).await;
    mount_page(&server, "/a", html_page("A", &["/b", "/"]), 1).await;
    mount_page(&server, "/b", html_page("B", &["/a"]), 1).await;

    let data = crawl(create_test_config(), &format!("{}/", base)).await;

    assert_eq!(data.total_pages, 3);
    assert_eq!(data.tree.len(), 3);
    assert!(!data.stopped_early);

    let urls: Vec<(String, u32)> = data
        .tree
        .iter()
        .map(|n| (n.url.clone(), n.depth))
        .collect();
    assert_eq!(
        urls,
        vec![
            (format!("{}/", base), 0),
            (format!("{}/a", base), 1),
            (format!("{}/b", base), 2),
        ]
    );
    assert!(data.tree.iter().all(|n| n.status() == PageStatus::Completed));

    let root = data.tree.root();
    assert_eq!(root.title, "Home");
    assert_eq!(data.tree.children(root.id()).count(), 1);
}

#[tokio::test]
async fn test_page_budget_stops_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html_page("Home", &["/p1", "/p2", "/p3", "/p4", "/p5"]),
        1,
    )
    .await;
    mount_page(&server, "/p1", html_page("P1", &[]), 1).await;
    mount_page(&server, "/p2", html_page("P2", &[]), 1).await;
    for route in ["/p3", "/p4", "/p5"] {
        mount_page(&server, route, html_page("never", &[]), 0).await;
    }

    let mut config = create_test_config();
    config.crawler.max_pages = 3;
    let data = crawl(config, &format!("{}/", base)).await;

    assert_eq!(data.total_pages, 3);
    assert_eq!(data.tree.len(), 3);
    assert!(!data.stopped_early);
}

#[tokio::test]
async fn test_depth_limit() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", html_page("Home", &["/a"]), 1).await;
    mount_page(&server, "/a", html_page("A", &["/b"]), 1).await;
    mount_page(&server, "/b", html_page("B", &[]), 0).await;

    let mut config = create_test_config();
    config.crawler.max_depth = 1;
    let data = crawl(config, &format!("{}/", base)).await;

    assert_eq!(data.total_pages, 2);
    assert!(data.tree.iter().all(|n| n.depth <= 1));
}

#[tokio::test]
async fn test_http_error_is_isolated() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", html_page("Home", &["/broken", "/ok"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/ok", html_page("Ok", &[]), 1).await;

    let data = crawl(create_test_config(), &format!("{}/", base)).await;

    assert_eq!(data.total_pages, 3);
    let root = data.tree.root();
    assert_eq!(root.status(), PageStatus::Completed);

    let children: Vec<_> = data.tree.children(root.id()).collect();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].status(), PageStatus::Error);
    assert_eq!(
        children[0].error.as_deref(),
        Some("Request failed with status code 500")
    );
    assert_eq!(children[0].title, "Broken");
    assert_eq!(children[1].status(), PageStatus::Completed);
    assert_eq!(children[1].title, "Ok");
}

#[tokio::test]
async fn test_robots_txt_respect() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /admin\n"),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/", html_page("Home", &["/admin", "/public"]), 1).await;
    mount_page(&server, "/admin", html_page("Admin", &[]), 0).await;
    mount_page(&server, "/public", html_page("Public", &[]), 1).await;

    let mut config = create_test_config();
    config.crawler.respect_robots_txt = true;
    let data = crawl(config, &format!("{}/", base)).await;

    let admin = data
        .tree
        .iter()
        .find(|n| n.url.ends_with("/admin"))
        .expect("admin node missing");
    assert_eq!(admin.status(), PageStatus::Error);
    assert_eq!(admin.error.as_deref(), Some(ROBOTS_DISALLOWED));

    let public = data
        .tree
        .iter()
        .find(|n| n.url.ends_with("/public"))
        .expect("public node missing");
    assert_eq!(public.status(), PageStatus::Completed);
}

#[tokio::test]
async fn test_missing_robots_txt_allows_all() {
    let server = MockServer::start().await;
    let base = server.uri();

    // robots.txt is unmatched and answered with 404
    mount_page(&server, "/", html_page("Home", &["/a"]), 1).await;
    mount_page(&server, "/a", html_page("A", &[]), 1).await;

    let mut config = create_test_config();
    config.crawler.respect_robots_txt = true;
    let data = crawl(config, &format!("{}/", base)).await;

    assert_eq!(data.tree.completed().count(), 2);
}

#[tokio::test]
async fn test_unavailable_robots_txt_disallows_all() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_page(&server, "/", html_page("Home", &["/a"]), 0).await;

    let mut config = create_test_config();
    config.crawler.respect_robots_txt = true;
    let data = crawl(config, &format!("{}/", base)).await;

    assert_eq!(data.total_pages, 1);
    let root = data.tree.root();
    assert_eq!(root.status(), PageStatus::Error);
    let error = root.error.as_deref().expect("root error missing");
    assert!(error.starts_with(ROBOTS_DISALLOWED), "unexpected error: {}", error);
}

#[tokio::test]
async fn test_robots_crawl_delay_spaces_requests() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nCrawl-delay: 0.3\n"),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/", html_page("Home", &["/a"]), 1).await;
    mount_page(&server, "/a", html_page("A", &[]), 1).await;

    let mut config = create_test_config();
    config.crawler.respect_robots_txt = true;
    let started = Instant::now();
    let data = crawl(config, &format!("{}/", base)).await;

    assert_eq!(data.tree.completed().count(), 2);
    assert!(
        started.elapsed() >= Duration::from_millis(300),
        "crawl took {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn test_stop_mid_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", html_page("Home", &["/slow", "/never"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html_page("Slow", &[]), "text/html")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/never", html_page("Never", &[]), 0).await;

    let crawler = Arc::new(Crawler::new(create_test_config()).unwrap());
    let (tx, mut rx) = mpsc::unbounded_channel::<CrawlProgress>();

    let stopper = Arc::clone(&crawler);
    let consumer = tokio::spawn(async move {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            if event.pages_crawled == 2 && !event.is_complete {
                stopper.stop();
            }
            events.push(event);
        }
        events
    });

    let started = Instant::now();
    let data = crawler
        .crawl(&format!("{}/", base), Some(tx))
        .await
        .unwrap();
    let events = consumer.await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(data.stopped_early);
    assert_eq!(data.total_pages, 2);
    assert!(events.iter().all(|e| !e.is_complete));

    let slow = data
        .tree
        .iter()
        .find(|n| n.url.ends_with("/slow"))
        .expect("slow node missing");
    assert_eq!(slow.status(), PageStatus::Error);
    assert!(!crawler.is_crawling());
}

#[tokio::test]
async fn test_title_fallback_from_url() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", html_page("Home", &["/about-us"]), 1).await;
    mount_page(
        &server,
        "/about-us",
        "<html><body><p>No title here</p></body></html>".to_string(),
        1,
    )
    .await;

    let data = crawl(create_test_config(), &format!("{}/", base)).await;

    let about = data
        .tree
        .iter()
        .find(|n| n.url.ends_with("/about-us"))
        .expect("about node missing");
    assert_eq!(about.title, "About us");
}

#[tokio::test]
async fn test_non_html_recorded_without_extraction() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", html_page("Home", &["/report.pdf"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"))
        .expect(1)
        .mount(&server)
        .await;

    let data = crawl(create_test_config(), &format!("{}/", base)).await;

    let pdf = data
        .tree
        .iter()
        .find(|n| n.url.ends_with("/report.pdf"))
        .expect("pdf node missing");
    assert_eq!(pdf.status(), PageStatus::Completed);
    assert_eq!(pdf.title, "Report");
    assert_eq!(pdf.content_type.as_deref(), Some("application/pdf"));
    assert!(pdf.meta_tags.is_none());
    assert_eq!(
        data.structure_analysis
            .content_type_distribution
            .get("application/pdf"),
        Some(&1)
    );
}

#[tokio::test]
async fn test_concurrent_crawl_rejected() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html_page("Home", &[]), "text/html")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let crawler = Arc::new(Crawler::new(create_test_config()).unwrap());
    let seed = format!("{}/", base);

    let first = {
        let crawler = Arc::clone(&crawler);
        let seed = seed.clone();
        tokio::spawn(async move { crawler.crawl(&seed, None).await })
    };

    while !crawler.is_crawling() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let second = crawler.crawl(&seed, None).await;
    assert!(matches!(second, Err(SitemapError::AlreadyCrawling)));

    let data = first.await.unwrap().unwrap();
    assert_eq!(data.total_pages, 1);
    assert_eq!(data.tree.root().status(), PageStatus::Completed);
    assert!(!crawler.is_crawling());
}

#[tokio::test]
async fn test_progress_events() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", html_page("Home", &["/a"]), 1).await;
    mount_page(&server, "/a", html_page("A", &[]), 1).await;

    let crawler = Crawler::new(create_test_config()).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    crawler
        .crawl(&format!("{}/", base), Some(tx))
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.len(), 3);
    assert_eq!(events[0].current_url, format!("{}/", base));
    assert_eq!(events[0].pages_crawled, 1);
    assert_eq!(events[1].current_url, format!("{}/a", base));
    assert_eq!(events[1].current_depth, 1);
    assert_eq!(events[1].pages_crawled, 2);

    let last = &events[2];
    assert!(last.is_complete);
    assert_eq!(last.pages_crawled, 2);
    assert_eq!(last.total_pages, 100);
}

#[tokio::test]
async fn test_xml_output_escapes_titles() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        "<html><head><title>Fish &amp; Chips &lt;Best&gt;</title></head><body></body></html>"
            .to_string(),
        1,
    )
    .await;

    let data = crawl(create_test_config(), &format!("{}/", base)).await;
    assert_eq!(data.tree.root().title, "Fish & Chips <Best>");

    let xml = ExportFormat::Xml.render(&data).unwrap();
    assert!(xml.contains("<title>Fish &amp; Chips &lt;Best&gt;</title>"));
    assert!(xml.contains("<priority>1.0</priority>"));
}

#[tokio::test]
async fn test_meta_analysis_over_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title>
        <meta name="description" content="The home page">
        <meta name="keywords" content="rust, sitemap">
        <meta property="og:title" content="Home OG">
        </head><body><h1>Welcome</h1><a href="/a">A</a></body></html>"#
            .to_string(),
        1,
    )
    .await;
    mount_page(&server, "/a", html_page("A", &[]), 1).await;

    let data = crawl(create_test_config(), &format!("{}/", base)).await;
    let meta = &data.meta_analysis;

    assert_eq!(meta.total_pages, 2);
    assert_eq!(meta.pages_with_title, 2);
    assert_eq!(meta.pages_with_description, 1);
    assert_eq!(meta.pages_with_open_graph, 1);
    assert!(meta.missing_meta_tags.contains(&"canonical".to_string()));
    assert_eq!(data.structure_analysis.h1_tag_count, 1);
    assert_eq!(data.structure_analysis.max_depth, 1);
}
