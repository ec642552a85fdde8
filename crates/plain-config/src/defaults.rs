//! Default endpoints and environment variable names.

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "PLAIN_API_KEY";
/// Environment variable overriding the GraphQL endpoint.
pub const ENV_API_URL: &str = "PLAIN_API_URL";
/// Environment variable overriding the HTTP timeout in seconds.
pub const ENV_HTTP_TIMEOUT_SECS: &str = "PLAIN_HTTP_TIMEOUT_SECS";
/// Production GraphQL endpoint.
pub const DEFAULT_API_URL: &str = "https://core-api.uk.plain.com/graphql/v1";
/// Default per-request HTTP timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
