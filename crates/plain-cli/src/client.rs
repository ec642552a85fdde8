//! Shared HTTP client, error types, and the Plain GraphQL adapter.

use std::fmt::{self, Display, Formatter};

use anyhow::anyhow;
use async_trait::async_trait;
use plain_config::{ApiKey, ConfigError, PlainConfig};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::model::{IndexOutcome, IndexRequest, MISSING_REQUEST_ID, SitemapBatchResult};
use crate::sitemap::SitemapError;

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";
pub(crate) const HEADER_PLAIN_REQUEST_ID: &str = "plain-request-id";

/// Process exit status for every command failure.
pub(crate) const EXIT_FAILURE: i32 = 1;

/// Longest non-JSON error body reported verbatim.
const MAX_ERROR_BODY_CHARS: usize = 200;

pub(crate) const INDEX_DOCUMENT_MUTATION: &str = "mutation indexDocument($input: IndexDocumentInput!) { indexDocument(input: $input) { indexedDocument { id url } error { message type code } } }";
pub(crate) const CREATE_KNOWLEDGE_SOURCE_MUTATION: &str = "mutation createKnowledgeSource($input: CreateKnowledgeSourceInput!) { createKnowledgeSource(input: $input) { knowledgeSource { id url type } error { message type code } } }";

/// CLI-level error type; the dispatcher turns every variant into a non-zero exit.
#[derive(Debug)]
pub(crate) enum CliError {
    Config(ConfigError),
    Index {
        message: String,
        request_id: Option<String>,
    },
    SitemapFetch(SitemapError),
    Batch {
        failed: usize,
        total: usize,
        unprocessed: usize,
    },
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    /// Exit status the process should terminate with.
    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_)
            | Self::Index { .. }
            | Self::SitemapFetch(_)
            | Self::Batch { .. }
            | Self::Failure(_) => EXIT_FAILURE,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Config(err) => format!("Error: {err}"),
            Self::Index {
                message,
                request_id,
            } => failure_line(message, request_id.as_deref()),
            Self::SitemapFetch(err) => format!("Failed to fetch sitemap: {err}"),
            Self::Batch {
                failed,
                total,
                unprocessed,
            } => {
                if *unprocessed > 0 {
                    let noun = if *unprocessed == 1 { "URL was" } else { "URLs were" };
                    format!(
                        "Failed to index {failed} of {total} URLs; {unprocessed} {noun} not attempted"
                    )
                } else {
                    format!("Failed to index {failed} of {total} URLs")
                }
            }
            Self::Failure(error) => format!("error: {error:#}"),
        }
    }

    pub(crate) fn from_batch(result: &SitemapBatchResult) -> Self {
        Self::Batch {
            failed: result.failed(),
            total: result.total_urls,
            unprocessed: result.unprocessed(),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Line printed to stderr for a rejected submission.
pub(crate) fn failure_line(message: &str, request_id: Option<&str>) -> String {
    format!(
        "Failed to index document: {message} ({})",
        request_id.unwrap_or(MISSING_REQUEST_ID)
    )
}

/// Submits a single URL for indexing; implemented by [`PlainClient`].
#[async_trait]
pub(crate) trait DocumentIndexer: Send + Sync {
    /// Issue exactly one indexing request and report its outcome.
    async fn submit(&self, request: &IndexRequest) -> IndexOutcome;
}

/// Application context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) http: Client,
    pub(crate) plain: PlainClient,
}

impl AppContext {
    /// Build the shared HTTP client and the Plain adapter from resolved configuration.
    pub(crate) fn new(config: &PlainConfig, trace_id: &str) -> CliResult<Self> {
        let mut default_headers = HeaderMap::new();
        let request_id = HeaderValue::from_str(trace_id).map_err(|_| {
            CliError::failure(anyhow!("trace identifier contains invalid characters"))
        })?;
        default_headers.insert(HEADER_REQUEST_ID, request_id);

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("plain-cli/", env!("CARGO_PKG_VERSION")))
            .default_headers(default_headers)
            .build()
            .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            plain: PlainClient::new(http.clone(), config, trace_id),
            http,
        })
    }
}

/// Thin GraphQL adapter over the Plain indexing API.
#[derive(Clone)]
pub(crate) struct PlainClient {
    http: Client,
    endpoint: Url,
    api_key: ApiKey,
    trace_id: String,
}

/// Failure reported by the remote service for one mutation.
#[derive(Debug)]
struct RemoteFailure {
    message: String,
    request_id: Option<String>,
}

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Deserialize)]
struct MutationError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

impl PlainClient {
    pub(crate) fn new(http: Client, config: &PlainConfig, trace_id: &str) -> Self {
        Self {
            http,
            endpoint: config.api_url.clone(),
            api_key: config.api_key.clone(),
            trace_id: trace_id.to_string(),
        }
    }

    /// Register a sitemap as a knowledge source that the service crawls itself.
    pub(crate) async fn create_knowledge_source(&self, request: &IndexRequest) -> IndexOutcome {
        let variables = json!({
            "input": {
                "url": request.url.as_str(),
                "type": "SITEMAP",
                "labelTypeIds": request.label_type_ids,
            }
        });
        self.outcome_for(
            request,
            self.mutate(
                "createKnowledgeSource",
                CREATE_KNOWLEDGE_SOURCE_MUTATION,
                variables,
            )
            .await,
        )
    }

    fn outcome_for(
        &self,
        request: &IndexRequest,
        result: Result<(), RemoteFailure>,
    ) -> IndexOutcome {
        match result {
            Ok(()) => IndexOutcome::Success {
                url: request.url.clone(),
            },
            Err(failure) => {
                warn!(
                    url = %request.url,
                    endpoint = %self.endpoint,
                    request_id = failure.request_id.as_deref().unwrap_or(MISSING_REQUEST_ID),
                    "indexing request rejected"
                );
                IndexOutcome::failure(request.url.clone(), failure.message, failure.request_id)
            }
        }
    }

    async fn mutate(
        &self,
        operation: &'static str,
        query: &'static str,
        variables: Value,
    ) -> Result<(), RemoteFailure> {
        debug!(operation, endpoint = %self.endpoint, "sending mutation");
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key.expose()))
            .json(&GraphqlRequest { query, variables })
            .send()
            .await
            .map_err(|err| RemoteFailure {
                message: format!("request to {} failed: {err}", self.endpoint),
                request_id: None,
            })?;

        let request_id = request_id_from(&response, &self.trace_id);
        let status = response.status();
        let bytes = response.bytes().await.map_err(|err| RemoteFailure {
            message: format!("failed to read response body: {err}"),
            request_id: request_id.clone(),
        })?;
        let parsed = serde_json::from_slice::<GraphqlResponse>(&bytes).ok();

        if !status.is_success() {
            let message = parsed
                .and_then(|body| body.errors.into_iter().next())
                .map(|err| err.message)
                .or_else(|| body_excerpt(&bytes))
                .unwrap_or_else(|| format!("request failed with status {status}"));
            return Err(RemoteFailure {
                message,
                request_id,
            });
        }

        let body = parsed.ok_or_else(|| RemoteFailure {
            message: "response was not valid GraphQL JSON".to_string(),
            request_id: request_id.clone(),
        })?;

        if let Some(first) = body.errors.into_iter().next() {
            return Err(RemoteFailure {
                message: first.message,
                request_id,
            });
        }

        let payload = body
            .data
            .as_ref()
            .and_then(|data| data.get(operation))
            .filter(|payload| !payload.is_null())
            .ok_or_else(|| RemoteFailure {
                message: format!("response did not include a {operation} payload"),
                request_id: request_id.clone(),
            })?;

        match payload.get("error").filter(|error| !error.is_null()) {
            None => Ok(()),
            Some(error) => {
                let error = MutationError::deserialize(error).map_err(|err| RemoteFailure {
                    message: format!("malformed {operation} error payload: {err}"),
                    request_id: request_id.clone(),
                })?;
                debug!(operation, code = ?error.code, "mutation returned an error");
                Err(RemoteFailure {
                    message: error.message,
                    request_id,
                })
            }
        }
    }
}

#[async_trait]
impl DocumentIndexer for PlainClient {
    async fn submit(&self, request: &IndexRequest) -> IndexOutcome {
        let variables = json!({
            "input": {
                "url": request.url.as_str(),
                "labelTypeIds": request.label_type_ids,
            }
        });
        self.outcome_for(
            request,
            self.mutate("indexDocument", INDEX_DOCUMENT_MUTATION, variables)
                .await,
        )
    }
}

/// Service-assigned request id. An `x-request-id` that merely echoes our own
/// trace id is not one.
fn request_id_from(response: &Response, trace_id: &str) -> Option<String> {
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    header(HEADER_PLAIN_REQUEST_ID)
        .or_else(|| header(HEADER_REQUEST_ID).filter(|value| value != trace_id))
}

/// Short plain-text bodies are kept as the failure message; markup and long
/// bodies fall back to the status line.
fn body_excerpt(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.is_empty() || text.starts_with('<') || text.chars().count() > MAX_ERROR_BODY_CHARS {
        return None;
    }
    Some(text.to_string())
}

/// Parse a URL argument provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}
