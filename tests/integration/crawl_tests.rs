//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock archive sites and test
//! the full crawl cycle end-to-end: partition, fetch, paginate, parse,
//! sink and merge.

use archive_crawler::calendar::CalendarDate;
use archive_crawler::config::{Config, PageScheme};
use archive_crawler::crawler::{crawl, CrawlTarget, Scheduler};
use archive_crawler::output::{write_tsv_file, Record};
use archive_crawler::CrawlError;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.crawler.max_concurrent_workers = 4;
    config.fetch.timeout_secs = 2;
    config.fetch.max_attempts = 2;
    config.fetch.base_delay_ms = 1;
    config.fetch.max_delay_ms = 5;
    config.site.listing_template = format!("{}/archive/{{date}}", base_url);
    config.site.page_size = 2;
    config
}

fn article_html(title: &str) -> String {
    format!(
        r#"<html><body>
             <div class="head-post"><h2>{title}</h2><div>Lead of {title}</div></div>
             <span class="time" title="{title} 08:00">08:00</span>
             <div class="entry-post"><p>Text of {title}</p></div>
           </body></html>"#,
        title = title
    )
}

fn listing_html(slugs: &[&str], paginator: bool) -> String {
    let mut html = String::from("<html><body>");
    for slug in slugs {
        html.push_str(&format!("<h3><a href=\"/news/{}\">{}</a></h3>", slug, slug));
    }
    if paginator {
        html.push_str("<ul class=\"paginator\"><li><a href=\"?page=2\">2</a></li></ul>");
    }
    html.push_str("</body></html>");
    html
}

/// Mounts a one-page listing for `day` and an article for every slug
async fn mount_day(server: &MockServer, day: &str, slugs: &[&str], delay: Duration) {
    Mock::given(method("GET"))
        .and(path(format!("/archive/{}", day)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_html(slugs, false))
                .set_delay(delay),
        )
        .mount(server)
        .await;
    for slug in slugs {
        mount_article(server, slug).await;
    }
}

async fn mount_article(server: &MockServer, slug: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/news/{}", slug)))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_html(slug)))
        .mount(server)
        .await;
}

fn titles(records: &[Record]) -> Vec<&str> {
    records.iter().map(|r| r.title.as_str()).collect()
}

fn range(start: &str, end: &str) -> CrawlTarget {
    CrawlTarget::Range {
        start: CalendarDate::parse(start).unwrap(),
        end: CalendarDate::parse(end).unwrap(),
    }
}

#[tokio::test]
async fn test_full_crawl_date_range() {
    let server = MockServer::start().await;
    mount_day(&server, "2024-01-01", &["d1a"], Duration::ZERO).await;
    mount_day(&server, "2024-01-02", &["d2a", "d2b"], Duration::ZERO).await;
    mount_day(&server, "2024-01-03", &[], Duration::ZERO).await;
    mount_day(&server, "2024-01-04", &["d4a"], Duration::ZERO).await;
    mount_day(&server, "2024-01-05", &["d5a"], Duration::ZERO).await;

    let config = create_test_config(&server.uri());
    let output = crawl(
        &config,
        range("2024-01-01", "2024-01-05"),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(output.ranges_total, 5);
    assert!(output.is_complete());
    assert_eq!(titles(&output.records), vec!["d1a", "d2a", "d2b", "d4a", "d5a"]);

    let first = &output.records[0];
    assert_eq!(first.timestamp, "d1a 08:00");
    assert_eq!(first.body, "Lead of d1a. Text of d1a.");
    assert_eq!(first.url, format!("{}/news/d1a", server.uri()));
}

#[tokio::test]
async fn test_merge_order_ignores_completion_order() {
    let server = MockServer::start().await;
    // Earlier days answer slower, so workers finish in reverse order
    mount_day(&server, "2024-03-01", &["m1"], Duration::from_millis(300)).await;
    mount_day(&server, "2024-03-02", &["m2"], Duration::from_millis(200)).await;
    mount_day(&server, "2024-03-03", &["m3"], Duration::from_millis(100)).await;
    mount_day(&server, "2024-03-04", &["m4"], Duration::ZERO).await;

    let config = create_test_config(&server.uri());
    let output = crawl(
        &config,
        range("2024-03-01", "2024-03-04"),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(titles(&output.records), vec!["m1", "m2", "m3", "m4"]);
}

#[tokio::test]
async fn test_partial_failure_keeps_other_ranges() {
    let server = MockServer::start().await;
    mount_day(&server, "2024-01-01", &["ok1"], Duration::ZERO).await;
    Mock::given(method("GET"))
        .and(path("/archive/2024-01-02"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;
    mount_day(&server, "2024-01-03", &["ok3"], Duration::ZERO).await;

    let config = create_test_config(&server.uri());
    let output = crawl(
        &config,
        range("2024-01-01", "2024-01-03"),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(titles(&output.records), vec!["ok1", "ok3"]);
    assert_eq!(output.failed.len(), 1);
    assert_eq!(output.failed[0].index, 1);
    assert_eq!(output.failed[0].label, "2024-01-02");

    match output.aggregate_error() {
        Some(CrawlError::Aggregate { failed, total }) => {
            assert_eq!(total, 3);
            assert_eq!(failed[0].index, 1);
        }
        other => panic!("expected aggregate error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_pagination_collects_every_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/archive/2024-02-01"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&["p3"], true)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/archive/2024-02-01"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_html(&["p1", "p2"], true)),
        )
        .mount(&server)
        .await;
    mount_day(&server, "2024-02-02", &["q1"], Duration::ZERO).await;
    for slug in ["p1", "p2", "p3"] {
        mount_article(&server, slug).await;
    }

    let config = create_test_config(&server.uri());
    let output = crawl(
        &config,
        range("2024-02-01", "2024-02-02"),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(titles(&output.records), vec!["p1", "p2", "p3", "q1"]);
}

#[tokio::test]
async fn test_path_pagination_scheme() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/archive/2024-02-01/page/2/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&["s3"], false)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/archive/2024-02-01"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_html(&["s1", "s2"], true)),
        )
        .mount(&server)
        .await;
    mount_day(&server, "2024-02-02", &[], Duration::ZERO).await;
    for slug in ["s1", "s2", "s3"] {
        mount_article(&server, slug).await;
    }

    let mut config = create_test_config(&server.uri());
    config.site.page_scheme = PageScheme::Path;
    let output = crawl(
        &config,
        range("2024-02-01", "2024-02-02"),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(titles(&output.records), vec!["s1", "s2", "s3"]);
}

#[tokio::test]
async fn test_link_list_mode() {
    let server = MockServer::start().await;
    mount_day(&server, "first", &["l1"], Duration::from_millis(100)).await;
    mount_day(&server, "second", &["l2", "l3"], Duration::ZERO).await;

    let config = create_test_config(&server.uri());
    let links = vec![
        format!("{}/archive/first", server.uri()),
        format!("{}/archive/second", server.uri()),
    ];
    let output = crawl(&config, CrawlTarget::Links(links), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(output.ranges_total, 2);
    assert_eq!(titles(&output.records), vec!["l1", "l2", "l3"]);
}

#[tokio::test]
async fn test_file_sinks_are_removed_after_merge() {
    let server = MockServer::start().await;
    mount_day(&server, "2024-01-01", &["f1"], Duration::ZERO).await;
    mount_day(&server, "2024-01-02", &["f2"], Duration::ZERO).await;
    Mock::given(method("GET"))
        .and(path("/archive/2024-01-03"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let sink_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri());
    config.output.sink_dir = Some(sink_dir.path().to_path_buf());

    let output = crawl(
        &config,
        range("2024-01-01", "2024-01-03"),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(titles(&output.records), vec!["f1", "f2"]);
    assert_eq!(output.failed.len(), 1);
    assert_eq!(std::fs::read_dir(sink_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_result_file_is_chronological_tsv() {
    let server = MockServer::start().await;
    mount_day(&server, "2024-01-01", &["r1"], Duration::from_millis(100)).await;
    mount_day(&server, "2024-01-02", &["r2"], Duration::ZERO).await;

    let config = create_test_config(&server.uri());
    let output = crawl(
        &config,
        range("2024-01-01", "2024-01-02"),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let dir = TempDir::new().unwrap();
    let result_path = dir.path().join("result.tsv");
    assert_eq!(write_tsv_file(&result_path, &output.records).unwrap(), 2);

    let content = std::fs::read_to_string(&result_path).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("r1\tr1 08:00\t"));
    assert!(lines[1].starts_with("r2\t"));
    assert_eq!(lines[0].split('\t').count(), 4);
}

#[tokio::test]
async fn test_invalid_range_rejected_before_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri());

    let reversed = crawl(
        &config,
        range("2024-01-05", "2024-01-01"),
        CancellationToken::new(),
    )
    .await;
    assert!(matches!(reversed, Err(CrawlError::Validation(_))));

    let too_early = crawl(
        &config,
        range("1996-12-30", "1997-01-02"),
        CancellationToken::new(),
    )
    .await;
    assert!(matches!(too_early, Err(CrawlError::Validation(_))));
}

#[tokio::test]
async fn test_cancelled_run_fails_every_range() {
    let server = MockServer::start().await;
    mount_day(&server, "2024-01-01", &["c1"], Duration::ZERO).await;
    mount_day(&server, "2024-01-02", &["c2"], Duration::ZERO).await;

    let config = create_test_config(&server.uri());
    let cancel = CancellationToken::new();
    let scheduler = Scheduler::from_config(&config, cancel.clone()).unwrap();
    cancel.cancel();

    let output = scheduler
        .run(
            CalendarDate::parse("2024-01-01").unwrap(),
            CalendarDate::parse("2024-01-02").unwrap(),
        )
        .await
        .unwrap();

    assert!(output.records.is_empty());
    assert_eq!(output.failed.len(), 2);
}
