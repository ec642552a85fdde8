//! Request and outcome types shared by the indexing commands.

use url::Url;

/// Placeholder shown when the service did not return a request identifier.
pub(crate) const MISSING_REQUEST_ID: &str = "–";

/// A single URL submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IndexRequest {
    pub(crate) url: Url,
    pub(crate) label_type_ids: Vec<String>,
}

impl IndexRequest {
    pub(crate) fn new(url: Url, label_type_ids: &[String]) -> Self {
        Self {
            url,
            label_type_ids: label_type_ids.to_vec(),
        }
    }
}

/// Result of submitting one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum IndexOutcome {
    Success {
        url: Url,
    },
    Failure {
        url: Url,
        message: String,
        request_id: Option<String>,
    },
}

impl IndexOutcome {
    pub(crate) fn failure(url: Url, message: impl Into<String>, request_id: Option<String>) -> Self {
        Self::Failure {
            url,
            message: message.into(),
            request_id,
        }
    }

    #[must_use]
    pub(crate) const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Aggregate of a sitemap batch run, outcomes in discovery order.
#[derive(Debug, Clone, Default)]
pub(crate) struct SitemapBatchResult {
    pub(crate) total_urls: usize,
    pub(crate) outcomes: Vec<IndexOutcome>,
    /// Set when the sitemap could not be fetched and the batch continued empty.
    pub(crate) fetch_error: Option<String>,
    /// Set when a failure stopped the batch before every URL was attempted.
    pub(crate) aborted: bool,
}

impl SitemapBatchResult {
    #[must_use]
    pub(crate) fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_success())
            .count()
    }

    #[must_use]
    pub(crate) fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    #[must_use]
    pub(crate) const fn unprocessed(&self) -> usize {
        self.total_urls.saturating_sub(self.outcomes.len())
    }

    #[must_use]
    pub(crate) fn is_success(&self) -> bool {
        !self.aborted && self.failed() == 0
    }
}
