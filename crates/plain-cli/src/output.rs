//! Console renderers for command results.

use url::Url;

use crate::client::failure_line;
use crate::model::{IndexOutcome, SitemapBatchResult};

const KNOWLEDGE_SOURCE_DOCS: &str =
    "https://plain.support.site/article/plain-ai-knowledge-sources";

pub(crate) fn success_line(url: &Url) -> String {
    format!("✅ Successfully indexed {url}")
}

/// Print one outcome: successes to stdout, failures to stderr.
pub(crate) fn render_outcome(outcome: &IndexOutcome) {
    match outcome {
        IndexOutcome::Success { url } => println!("{}", success_line(url)),
        IndexOutcome::Failure {
            message,
            request_id,
            ..
        } => eprintln!("{}", failure_line(message, request_id.as_deref())),
    }
}

pub(crate) fn summary_line(result: &SitemapBatchResult) -> String {
    let processed = result.outcomes.len();
    let noun = if processed == 1 { "URL" } else { "URLs" };
    let mut line = format!(
        "Processed {processed} {noun} ({} succeeded, {} failed)",
        result.succeeded(),
        result.failed()
    );
    if result.aborted {
        line.push_str(&format!(
            "; stopped early, {} not attempted",
            result.unprocessed()
        ));
    }
    line
}

pub(crate) fn render_batch_summary(sitemap_url: &Url, result: &SitemapBatchResult) {
    if let Some(error) = &result.fetch_error {
        eprintln!("Failed to fetch sitemap {sitemap_url}: {error}; continuing with 0 URLs");
    }
    println!("{}", summary_line(result));
}

pub(crate) fn render_knowledge_source(sitemap_url: &Url) {
    println!(
        "✅ Successfully indexed sitemap {sitemap_url} - The sitemap will be indexed and knowledge sources will be available in Plain. See {KNOWLEDGE_SOURCE_DOCS} for more information."
    );
}
