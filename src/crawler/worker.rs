//! Crawl worker
//!
//! A worker owns one [`WorkAssignment`] and one private [`Sink`]. It walks
//! every listing of its assignment in order, fetches each article the
//! listing references, parses it and appends the record to its sink.
//!
//! Failures are split in two classes:
//! - An article that cannot be fetched or parsed is logged and skipped
//! - A listing page that cannot be fetched or parsed, a sink write error, or
//!   cancellation fails the whole worker

use crate::crawler::paginator::Paginator;
use crate::crawler::parser::ItemRef;
use crate::partition::WorkAssignment;
use crate::sink::Sink;
use crate::state::WorkerState;
use crate::{CrawlError, FetchError};
use std::sync::Arc;

/// Outcome of a single worker, handed to the merger
#[derive(Debug)]
pub struct WorkerReport {
    /// Partition index of the assignment
    pub index: usize,

    /// Human readable label of the assignment
    pub label: String,

    /// Terminal state of the worker
    pub state: WorkerState,

    /// Records appended to the sink
    pub records: usize,

    /// Articles skipped because they could not be fetched or parsed
    pub items_skipped: usize,

    /// The worker's sink; `None` if it was never created
    pub sink: Option<Box<dyn Sink>>,

    /// Reason for failure
    pub error: Option<String>,
}

impl WorkerReport {
    /// Report for an assignment whose worker could not be constructed
    ///
    /// This is the `Created -> Failed` transition.
    pub fn not_started(assignment: &WorkAssignment, reason: impl Into<String>) -> Self {
        Self {
            index: assignment.index(),
            label: assignment.label(),
            state: WorkerState::Failed,
            records: 0,
            items_skipped: 0,
            sink: None,
            error: Some(reason.into()),
        }
    }
}

/// A worker walking one assignment
pub struct Worker {
    assignment: WorkAssignment,
    state: WorkerState,
    sink: Box<dyn Sink>,
    paginator: Paginator,
    listing_template: Arc<str>,
    items_skipped: usize,
}

impl Worker {
    /// Creates a worker in the `Created` state
    ///
    /// # Arguments
    ///
    /// * `assignment` - The range of work this worker owns
    /// * `sink` - Private output buffer, created for this assignment
    /// * `paginator` - Shared listing walker
    /// * `listing_template` - Listing URL template for day assignments
    pub fn new(
        assignment: WorkAssignment,
        sink: Box<dyn Sink>,
        paginator: Paginator,
        listing_template: Arc<str>,
    ) -> Self {
        Self {
            assignment,
            state: WorkerState::Created,
            sink,
            paginator,
            listing_template,
            items_skipped: 0,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Runs the worker to completion
    ///
    /// Never returns an error: failures are recorded in the report so the
    /// merger can tell which range is missing.
    pub async fn run(mut self) -> WorkerReport {
        let result = match self.transition(WorkerState::Running) {
            Ok(()) => {
                tracing::info!(
                    "Worker {} started on {}",
                    self.assignment.index(),
                    self.assignment.label()
                );
                self.crawl().await
            }
            Err(e) => Err(e),
        };
        self.finish(result)
    }

    fn transition(&mut self, next: WorkerState) -> Result<(), CrawlError> {
        if !self.state.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!(
            "Worker {}: {} -> {}",
            self.assignment.index(),
            self.state,
            next
        );
        self.state = next;
        Ok(())
    }

    async fn crawl(&mut self) -> Result<(), CrawlError> {
        let listings = self.assignment.listing_urls(&self.listing_template);

        for listing in listings {
            let mut walk = self.paginator.walk(&listing);
            while let Some(page) = walk.next_page().await {
                for item in page? {
                    self.collect(&item).await?;
                }
            }
        }

        Ok(())
    }

    /// Fetches, parses and stores one article
    async fn collect(&mut self, item: &ItemRef) -> Result<(), CrawlError> {
        let html = match self.paginator.fetcher().fetch(&item.url).await {
            Ok(html) => html,
            Err(e @ FetchError::Cancelled { .. }) => return Err(e.into()),
            Err(e) => {
                tracing::warn!("Skipping article {}: {}", item.url, e);
                self.items_skipped += 1;
                return Ok(());
            }
        };

        match self.paginator.parser().parse_article(&html, &item.url) {
            Ok(record) => self.sink.append(&record)?,
            Err(e) => {
                tracing::warn!("Skipping article {}: {}", item.url, e);
                self.items_skipped += 1;
            }
        }

        Ok(())
    }

    fn finish(mut self, result: Result<(), CrawlError>) -> WorkerReport {
        let result = result.and_then(|()| self.transition(WorkerState::Done));

        let error = match result {
            Ok(()) => {
                tracing::info!(
                    "Worker {} finished {}: {} records, {} skipped",
                    self.assignment.index(),
                    self.assignment.label(),
                    self.sink.len(),
                    self.items_skipped
                );
                None
            }
            Err(e) => {
                if !self.state.is_terminal() {
                    self.state = WorkerState::Failed;
                }
                tracing::error!(
                    "Worker {} failed on {}: {}",
                    self.assignment.index(),
                    self.assignment.label(),
                    e
                );
                Some(e.to_string())
            }
        };

        WorkerReport {
            index: self.assignment.index(),
            label: self.assignment.label(),
            state: self.state,
            records: self.sink.len(),
            items_skipped: self.items_skipped,
            sink: Some(self.sink),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarDate;
    use crate::config::{PageScheme, SiteConfig, UserAgentConfig};
    use crate::crawler::fetcher::{build_http_client, Fetcher, RetryPolicy};
    use crate::crawler::parser::SelectorParser;
    use crate::partition::WorkRange;
    use crate::sink::MemorySink;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn paginator(cancel: CancellationToken) -> Paginator {
        let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(2)).unwrap();
        let policy = RetryPolicy {
            max_attempts: Some(2),
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        };
        let fetcher = Arc::new(Fetcher::new(client, policy, cancel));
        let parser = Arc::new(SelectorParser::from_config(&SiteConfig::default()).unwrap());
        Paginator::new(fetcher, parser, PageScheme::Query, 10)
    }

    fn article(title: &str) -> String {
        format!(
            r#"<div class="head-post"><h2>{}</h2></div><span class="time" title="{} 12:00">12:00</span><div class="entry-post"><p>Body of {}</p></div>"#,
            title, title, title
        )
    }

    async fn mount_day(server: &MockServer, day: &str, articles: &[&str]) {
        let listing: String = articles
            .iter()
            .map(|a| format!("<h3><a href=\"/news/{}\">{}</a></h3>", a, a))
            .collect();
        Mock::given(method("GET"))
            .and(path(format!("/archive/{}", day)))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing))
            .mount(server)
            .await;
        for a in articles {
            Mock::given(method("GET"))
                .and(path(format!("/news/{}", a)))
                .respond_with(ResponseTemplate::new(200).set_body_string(article(a)))
                .mount(server)
                .await;
        }
    }

    fn two_days() -> WorkAssignment {
        WorkAssignment::Days(WorkRange {
            index: 0,
            start: CalendarDate::new(2024, 1, 1),
            length: 2,
        })
    }

    fn worker(server: &MockServer, assignment: WorkAssignment, cancel: CancellationToken) -> Worker {
        let template: Arc<str> = format!("{}/archive/{{date}}", server.uri()).into();
        Worker::new(
            assignment,
            Box::new(MemorySink::new("test")),
            paginator(cancel),
            template,
        )
    }

    #[tokio::test]
    async fn test_worker_collects_days_in_order() {
        let server = MockServer::start().await;
        mount_day(&server, "2024-01-01", &["a", "b"]).await;
        mount_day(&server, "2024-01-02", &["c"]).await;

        let worker = worker(&server, two_days(), CancellationToken::new());
        assert_eq!(worker.state(), WorkerState::Created);

        let report = worker.run().await;
        assert_eq!(report.state, WorkerState::Done);
        assert_eq!(report.records, 3);
        assert!(report.error.is_none());

        let records = report.sink.unwrap().drain().unwrap();
        let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
        assert_eq!(records[0].timestamp, "a 12:00");
        assert_eq!(records[0].body, "Body of a.");
    }

    #[tokio::test]
    async fn test_broken_article_is_skipped() {
        let server = MockServer::start().await;
        mount_day(&server, "2024-01-01", &["good"]).await;
        Mock::given(method("GET"))
            .and(path("/archive/2024-01-02"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<h3><a href=\"/news/gone\">x</a></h3><h3><a href=\"/news/junk\">y</a></h3>"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/news/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/news/junk"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>no title</p>"))
            .mount(&server)
            .await;

        let report = worker(&server, two_days(), CancellationToken::new()).run().await;
        assert_eq!(report.state, WorkerState::Done);
        assert_eq!(report.records, 1);
        assert_eq!(report.items_skipped, 2);
    }

    #[tokio::test]
    async fn test_listing_failure_fails_worker() {
        let server = MockServer::start().await;
        mount_day(&server, "2024-01-01", &["a"]).await;
        Mock::given(method("GET"))
            .and(path("/archive/2024-01-02"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let report = worker(&server, two_days(), CancellationToken::new()).run().await;
        assert_eq!(report.state, WorkerState::Failed);
        assert!(report.state.is_terminal());
        assert!(report.error.unwrap().contains("2024-01-02"));
        assert!(report.sink.is_some());
    }

    #[tokio::test]
    async fn test_cancelled_worker_fails() {
        let server = MockServer::start().await;
        mount_day(&server, "2024-01-01", &["a"]).await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = worker(&server, two_days(), cancel).run().await;
        assert_eq!(report.state, WorkerState::Failed);
        assert_eq!(report.records, 0);
    }

    #[tokio::test]
    async fn test_invalid_transition_rejected() {
        let server = MockServer::start().await;
        let mut worker = worker(&server, two_days(), CancellationToken::new());

        assert!(worker.transition(WorkerState::Running).is_ok());
        assert!(worker.transition(WorkerState::Done).is_ok());
        assert!(matches!(
            worker.transition(WorkerState::Running),
            Err(CrawlError::InvalidTransition {
                from: WorkerState::Done,
                to: WorkerState::Running
            })
        ));
    }

    #[test]
    fn test_not_started_report() {
        let report = WorkerReport::not_started(&two_days(), "disk full");
        assert_eq!(report.state, WorkerState::Failed);
        assert_eq!(report.label, "2024-01-01..2024-01-02");
        assert!(report.sink.is_none());
    }

    /// Sink that refuses every record
    #[derive(Debug)]
    struct ReadOnlySink;

    impl Sink for ReadOnlySink {
        fn key(&self) -> &str {
            "read-only"
        }

        fn append(&mut self, _record: &crate::output::Record) -> crate::sink::SinkResult<()> {
            Err(crate::sink::SinkError::Rejected {
                key: "read-only".to_string(),
                reason: "disk full".to_string(),
            })
        }

        fn len(&self) -> usize {
            0
        }

        fn drain(self: Box<Self>) -> crate::sink::SinkResult<Vec<crate::output::Record>> {
            Ok(Vec::new())
        }

        fn discard(self: Box<Self>) -> crate::sink::SinkResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_sink_write_failure_fails_worker() {
        let server = MockServer::start().await;
        mount_day(&server, "2024-01-01", &["a"]).await;
        mount_day(&server, "2024-01-02", &["b"]).await;

        let template: Arc<str> = format!("{}/archive/{{date}}", server.uri()).into();
        let worker = Worker::new(
            two_days(),
            Box::new(ReadOnlySink),
            paginator(CancellationToken::new()),
            template,
        );

        let report = worker.run().await;
        assert_eq!(report.state, WorkerState::Failed);
        assert_eq!(report.records, 0);
        assert_eq!(report.items_skipped, 0);

        let error = report.error.unwrap();
        assert!(error.starts_with("Sink error"));
        assert!(error.contains("read-only"));
        assert!(error.contains("disk full"));
    }
}
