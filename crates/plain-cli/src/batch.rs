//! Sitemap-driven batch indexing.
//!
//! # Design
//! - Submissions are strictly sequential, one awaited request at a time, in
//!   the order the sitemap lists them.
//! - Failures are values; [`BatchPolicy`] decides whether a failed URL or a
//!   failed sitemap fetch stops the run. Exit codes stay with the dispatcher.
//! - No deduplication: repeated entries are submitted again.

use tracing::{debug, info, warn};
use url::Url;

use crate::client::DocumentIndexer;
use crate::model::{IndexOutcome, IndexRequest, SitemapBatchResult};
use crate::sitemap::{SitemapError, SitemapSource};

/// What to do when a single URL fails to index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum FailurePolicy {
    /// Keep submitting and report a tally at the end.
    #[default]
    Continue,
    /// Stop at the first failure; remaining URLs are reported as unprocessed.
    FailFast,
}

/// What to do when the sitemap itself cannot be fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum SitemapFetchPolicy {
    /// Report the error and continue with an empty URL list.
    #[default]
    Continue,
    /// Fail the command.
    Abort,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct BatchPolicy {
    pub(crate) on_failure: FailurePolicy,
    pub(crate) on_fetch_error: SitemapFetchPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchState {
    Idle,
    FetchingSitemap,
    SitemapFetchFailed,
    SitemapFetchSucceeded,
    SubmittingUrls,
    Completed,
    Aborted,
}

impl BatchState {
    const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FetchingSitemap => "fetching_sitemap",
            Self::SitemapFetchFailed => "sitemap_fetch_failed",
            Self::SitemapFetchSucceeded => "sitemap_fetch_succeeded",
            Self::SubmittingUrls => "submitting_urls",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }
}

/// Expands a sitemap and drives sequential submission through a [`DocumentIndexer`].
pub(crate) struct SitemapBatchIndexer<'a> {
    sitemaps: &'a dyn SitemapSource,
    indexer: &'a dyn DocumentIndexer,
    policy: BatchPolicy,
    state: BatchState,
}

impl<'a> SitemapBatchIndexer<'a> {
    pub(crate) const fn new(
        sitemaps: &'a dyn SitemapSource,
        indexer: &'a dyn DocumentIndexer,
        policy: BatchPolicy,
    ) -> Self {
        Self {
            sitemaps,
            indexer,
            policy,
            state: BatchState::Idle,
        }
    }

    fn transition(&mut self, next: BatchState) {
        debug!(from = self.state.label(), to = next.label(), "batch state change");
        self.state = next;
    }

    /// Run the batch, calling `on_outcome` as each submission settles.
    ///
    /// Returns an error only when the sitemap fetch fails under
    /// [`SitemapFetchPolicy::Abort`].
    pub(crate) async fn run<F>(
        mut self,
        sitemap_url: &Url,
        label_type_ids: &[String],
        mut on_outcome: F,
    ) -> Result<SitemapBatchResult, SitemapError>
    where
        F: FnMut(&IndexOutcome),
    {
        let mut result = SitemapBatchResult::default();

        self.transition(BatchState::FetchingSitemap);
        let urls = match self.sitemaps.fetch(sitemap_url).await {
            Ok(urls) => {
                self.transition(BatchState::SitemapFetchSucceeded);
                urls
            }
            Err(err) => {
                self.transition(BatchState::SitemapFetchFailed);
                warn!(sitemap = %sitemap_url, error = %err, "sitemap fetch failed");
                if self.policy.on_fetch_error == SitemapFetchPolicy::Abort {
                    return Err(err);
                }
                result.fetch_error = Some(err.to_string());
                Vec::new()
            }
        };

        result.total_urls = urls.len();
        info!(sitemap = %sitemap_url, total = result.total_urls, "submitting sitemap URLs");
        self.transition(BatchState::SubmittingUrls);

        for (position, url) in urls.into_iter().enumerate() {
            debug!(position = position + 1, total = result.total_urls, url = %url, "submitting");
            let request = IndexRequest::new(url, label_type_ids);
            let outcome = self.indexer.submit(&request).await;
            on_outcome(&outcome);
            let failed = !outcome.is_success();
            result.outcomes.push(outcome);

            if failed && self.policy.on_failure == FailurePolicy::FailFast {
                result.aborted = true;
                break;
            }
        }

        if result.aborted {
            self.transition(BatchState::Aborted);
        } else {
            self.transition(BatchState::Completed);
        }
        info!(
            processed = result.outcomes.len(),
            succeeded = result.succeeded(),
            failed = result.failed(),
            unprocessed = result.unprocessed(),
            "sitemap batch finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct StaticSitemap(Result<Vec<&'static str>, ()>);

    #[async_trait]
    impl SitemapSource for StaticSitemap {
        async fn fetch(&self, _sitemap_url: &Url) -> Result<Vec<Url>, SitemapError> {
            match &self.0 {
                Ok(urls) => Ok(urls
                    .iter()
                    .map(|raw| raw.parse().expect("valid URL"))
                    .collect()),
                Err(()) => Err(SitemapError::EmptyDocument),
            }
        }
    }

    #[derive(Default)]
    struct RecordingIndexer {
        failing: HashSet<&'static str>,
        submitted: Mutex<Vec<IndexRequest>>,
        in_flight: AtomicBool,
    }

    impl RecordingIndexer {
        fn failing(urls: &[&'static str]) -> Self {
            Self {
                failing: urls.iter().copied().collect(),
                ..Self::default()
            }
        }

        fn submitted_urls(&self) -> Vec<String> {
            self.submitted
                .lock()
                .expect("lock")
                .iter()
                .map(|request| request.url.to_string())
                .collect()
        }
    }

    #[async_trait]
    impl DocumentIndexer for RecordingIndexer {
        async fn submit(&self, request: &IndexRequest) -> IndexOutcome {
            assert!(
                !self.in_flight.swap(true, Ordering::SeqCst),
                "submissions must not overlap"
            );
            tokio::task::yield_now().await;
            self.submitted.lock().expect("lock").push(request.clone());
            self.in_flight.store(false, Ordering::SeqCst);

            if self.failing.contains(request.url.as_str()) {
                IndexOutcome::failure(request.url.clone(), "rejected", Some("req_1".into()))
            } else {
                IndexOutcome::Success {
                    url: request.url.clone(),
                }
            }
        }
    }

    fn sitemap_url() -> Url {
        "https://example.com/sitemap.xml"
            .parse()
            .expect("valid URL")
    }

    #[tokio::test]
    async fn two_url_sitemap_reports_two_successes() {
        let sitemap = StaticSitemap(Ok(vec!["https://example.com/a", "https://example.com/b"]));
        let indexer = RecordingIndexer::default();
        let mut seen = Vec::new();

        let result = SitemapBatchIndexer::new(&sitemap, &indexer, BatchPolicy::default())
            .run(&sitemap_url(), &[], |outcome| seen.push(outcome.clone()))
            .await
            .expect("batch should run");

        assert_eq!(result.total_urls, 2);
        assert_eq!(result.outcomes.len(), 2);
        assert_eq!(result.succeeded(), 2);
        assert!(result.is_success());
        assert_eq!(seen, result.outcomes);
    }

    #[tokio::test]
    async fn submits_every_url_in_order_without_dedup() {
        let urls = vec![
            "https://example.com/c",
            "https://example.com/a",
            "https://example.com/c",
            "https://example.com/b",
        ];
        let sitemap = StaticSitemap(Ok(urls.clone()));
        let indexer = RecordingIndexer::default();
        let labels = vec!["lt_1".to_string()];

        let result = SitemapBatchIndexer::new(&sitemap, &indexer, BatchPolicy::default())
            .run(&sitemap_url(), &labels, |_| {})
            .await
            .expect("batch should run");

        assert_eq!(indexer.submitted_urls(), urls);
        assert_eq!(result.outcomes.len(), result.total_urls);
        assert!(
            indexer
                .submitted
                .lock()
                .expect("lock")
                .iter()
                .all(|request| request.label_type_ids == labels)
        );
    }

    #[tokio::test]
    async fn continue_policy_tallies_failures() {
        let sitemap = StaticSitemap(Ok(vec![
            "https://example.com/a",
            "https://example.com/b",
            "https://example.com/c",
        ]));
        let indexer = RecordingIndexer::failing(&["https://example.com/b"]);

        let result = SitemapBatchIndexer::new(&sitemap, &indexer, BatchPolicy::default())
            .run(&sitemap_url(), &[], |_| {})
            .await
            .expect("batch should run");

        assert_eq!(result.outcomes.len(), 3);
        assert_eq!(result.succeeded(), 2);
        assert_eq!(result.failed(), 1);
        assert!(!result.aborted);
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn fail_fast_stops_at_first_failure() {
        let sitemap = StaticSitemap(Ok(vec![
            "https://example.com/a",
            "https://example.com/b",
            "https://example.com/c",
        ]));
        let indexer = RecordingIndexer::failing(&["https://example.com/b"]);
        let policy = BatchPolicy {
            on_failure: FailurePolicy::FailFast,
            ..BatchPolicy::default()
        };

        let result = SitemapBatchIndexer::new(&sitemap, &indexer, policy)
            .run(&sitemap_url(), &[], |_| {})
            .await
            .expect("batch should run");

        assert!(result.aborted);
        assert_eq!(result.outcomes.len(), 2);
        assert_eq!(result.unprocessed(), 1);
        assert_eq!(
            indexer.submitted_urls(),
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }

    #[tokio::test]
    async fn fetch_failure_continues_with_no_urls_by_default() {
        let sitemap = StaticSitemap(Err(()));
        let indexer = RecordingIndexer::default();

        let result = SitemapBatchIndexer::new(&sitemap, &indexer, BatchPolicy::default())
            .run(&sitemap_url(), &[], |_| {})
            .await
            .expect("continue policy keeps going");

        assert_eq!(result.total_urls, 0);
        assert!(result.outcomes.is_empty());
        assert!(result.fetch_error.is_some());
        assert!(result.is_success());
        assert!(indexer.submitted_urls().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_aborts_under_abort_policy() {
        let sitemap = StaticSitemap(Err(()));
        let indexer = RecordingIndexer::default();
        let policy = BatchPolicy {
            on_fetch_error: SitemapFetchPolicy::Abort,
            ..BatchPolicy::default()
        };

        let err = SitemapBatchIndexer::new(&sitemap, &indexer, policy)
            .run(&sitemap_url(), &[], |_| {})
            .await
            .expect_err("abort policy fails the batch");

        assert!(matches!(err, SitemapError::EmptyDocument));
        assert!(indexer.submitted_urls().is_empty());
    }
}
