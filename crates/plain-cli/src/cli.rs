//! Command-line surface and dispatch for the Plain CLI.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use plain_config::PlainConfig;
use plain_telemetry::{LogFormat, LoggingConfig, build_version, init_logging};
use reqwest::Url;
use tracing::Instrument;
use uuid::Uuid;

use crate::batch::{BatchPolicy, FailurePolicy, SitemapFetchPolicy};
use crate::client::{AppContext, CliError, CliResult, parse_url};
use crate::commands::index::handle_index_url;
use crate::commands::sitemap::{handle_create_knowledge_source, handle_index_sitemap};

const API_KEY_PERMISSIONS: &str = "To use this you need to set an environment variable called PLAIN_API_KEY with the following permissions: \n- indexedDocument:create";

/// Parses CLI arguments, executes the requested command, and reports the
/// outcome. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();

    let logging = LoggingConfig::default()
        .with_verbosity(cli.verbose)
        .with_format(cli.log_format.into())
        .with_version(env!("CARGO_PKG_VERSION"));
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err}");
    }

    let trace_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!(
        "plain",
        command = command_label(&cli.command),
        trace_id = %trace_id,
        version = build_version()
    );

    let result = dispatch(cli.command, |name| std::env::var(name).ok(), &trace_id)
        .instrument(span)
        .await;

    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{}", err.display_message());
            err.exit_code()
        }
    }
}

/// Resolve configuration, build dependencies, and run one command.
///
/// Configuration is resolved before any client exists, so a missing
/// credential never reaches the network.
async fn dispatch<F>(command: Command, lookup: F, trace_id: &str) -> CliResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let config = PlainConfig::from_lookup(lookup).map_err(CliError::Config)?;
    if let Some(notice) = api_url_notice(&config) {
        println!("{notice}");
    }

    let ctx = AppContext::new(&config, trace_id)?;
    execute(&ctx, command).await
}

fn api_url_notice(config: &PlainConfig) -> Option<String> {
    config.api_url_overridden.then(|| {
        format!(
            "Using PLAIN_API_URL provided from environment: {}",
            config.api_url
        )
    })
}

async fn execute(ctx: &AppContext, command: Command) -> CliResult<()> {
    match command {
        Command::IndexUrl(args) => handle_index_url(ctx, args).await,
        Command::IndexSitemap(args) => handle_index_sitemap(ctx, args).await,
        Command::CreateKnowledgeSource(args) => handle_create_knowledge_source(ctx, args).await,
    }
}

#[derive(Parser)]
#[command(name = "plain", version, about = "Plain CLI")]
pub(crate) struct Cli {
    #[arg(
        short,
        long,
        global = true,
        action = ArgAction::Count,
        help = "Increase log verbosity (-v info, -vv debug)"
    )]
    verbose: u8,
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = LogFormatArg::Compact,
        help = "Format of diagnostic logs written to stderr"
    )]
    log_format: LogFormatArg,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    #[command(
        about = "Index a single URL",
        long_about = format!("This will index a specific url you provide.\n\n{API_KEY_PERMISSIONS}")
    )]
    IndexUrl(IndexUrlArgs),
    #[command(
        about = "Index every URL listed in a sitemap",
        long_about = format!("This will index all the urls in a given sitemap you provide.\n\n{API_KEY_PERMISSIONS}")
    )]
    IndexSitemap(IndexSitemapArgs),
    #[command(
        about = "Register a sitemap as a knowledge source crawled by Plain",
        long_about = format!("This will register a sitemap with Plain, which then crawls and indexes it on its side.\n\n{API_KEY_PERMISSIONS}")
    )]
    CreateKnowledgeSource(CreateKnowledgeSourceArgs),
}

#[derive(Args)]
pub(crate) struct IndexUrlArgs {
    #[arg(value_name = "url", value_parser = parse_url)]
    pub(crate) url: Url,
    #[arg(
        short = 'l',
        long = "labelTypeIds",
        alias = "label-type-ids",
        value_name = "labelTypeIds",
        num_args = 1..,
        help = "Array of label type IDs"
    )]
    pub(crate) label_type_ids: Vec<String>,
}

#[derive(Args)]
pub(crate) struct IndexSitemapArgs {
    #[arg(value_name = "sitemap url", value_parser = parse_url)]
    pub(crate) sitemap_url: Url,
    #[arg(
        short = 'l',
        long = "labelTypeIds",
        alias = "label-type-ids",
        value_name = "labelTypeIds",
        num_args = 1..,
        help = "Array of label type IDs"
    )]
    pub(crate) label_type_ids: Vec<String>,
    #[arg(long, help = "Stop at the first URL that fails to index")]
    pub(crate) fail_fast: bool,
    #[arg(long, help = "Fail instead of continuing when the sitemap cannot be fetched")]
    pub(crate) abort_on_fetch_error: bool,
}

impl IndexSitemapArgs {
    pub(crate) const fn policy(&self) -> BatchPolicy {
        BatchPolicy {
            on_failure: if self.fail_fast {
                FailurePolicy::FailFast
            } else {
                FailurePolicy::Continue
            },
            on_fetch_error: if self.abort_on_fetch_error {
                SitemapFetchPolicy::Abort
            } else {
                SitemapFetchPolicy::Continue
            },
        }
    }
}

#[derive(Args)]
pub(crate) struct CreateKnowledgeSourceArgs {
    #[arg(value_name = "sitemap url", value_parser = parse_url)]
    pub(crate) sitemap_url: Url,
    #[arg(
        short = 'l',
        long = "labelTypeIds",
        alias = "label-type-ids",
        value_name = "labelTypeIds",
        num_args = 1..,
        help = "Array of label type IDs"
    )]
    pub(crate) label_type_ids: Vec<String>,
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum LogFormatArg {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Compact => Self::Compact,
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::IndexUrl(_) => "index-url",
        Command::IndexSitemap(_) => "index-sitemap",
        Command::CreateKnowledgeSource(_) => "create-knowledge-source",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests_support::config_for;
    use crate::client::{INDEX_DOCUMENT_MUTATION, failure_line};
    use clap::CommandFactory;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use serde_json::json;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments should parse")
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn index_url_accepts_variadic_label_ids() {
        let cli = parse(&[
            "plain",
            "index-url",
            "https://example.com/docs",
            "-l",
            "lt_1",
            "lt_2",
        ]);
        let Command::IndexUrl(args) = cli.command else {
            panic!("expected index-url");
        };
        assert_eq!(args.url.as_str(), "https://example.com/docs");
        assert_eq!(args.label_type_ids, vec!["lt_1", "lt_2"]);
    }

    #[test]
    fn index_sitemap_defaults_to_continue_policies() {
        let cli = parse(&[
            "plain",
            "index-sitemap",
            "https://example.com/sitemap.xml",
            "--labelTypeIds",
            "lt_1",
        ]);
        let Command::IndexSitemap(args) = cli.command else {
            panic!("expected index-sitemap");
        };
        assert_eq!(args.policy(), BatchPolicy::default());
        assert_eq!(args.label_type_ids, vec!["lt_1"]);
    }

    #[test]
    fn index_sitemap_flags_select_strict_policies() {
        let cli = parse(&[
            "plain",
            "index-sitemap",
            "https://example.com/sitemap.xml",
            "--fail-fast",
            "--abort-on-fetch-error",
        ]);
        let Command::IndexSitemap(args) = cli.command else {
            panic!("expected index-sitemap");
        };
        assert_eq!(args.policy().on_failure, FailurePolicy::FailFast);
        assert_eq!(args.policy().on_fetch_error, SitemapFetchPolicy::Abort);
    }

    #[test]
    fn invalid_url_is_an_argument_error() {
        let err = Cli::try_parse_from(["plain", "index-url", "not a url"])
            .err()
            .expect("invalid URL should be rejected");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn command_labels_match_subcommand_names() {
        let cli = parse(&["plain", "create-knowledge-source", "https://example.com/s.xml"]);
        assert_eq!(command_label(&cli.command), "create-knowledge-source");
        assert_eq!(LogFormat::from(cli.log_format), LogFormat::Compact);
    }

    #[test]
    fn api_url_notice_only_for_overridden_endpoint() {
        let overridden = PlainConfig::from_lookup(|name| match name {
            "PLAIN_API_KEY" => Some("plainApiKey_test".to_string()),
            "PLAIN_API_URL" => Some("http://localhost:4000/graphql".to_string()),
            _ => None,
        })
        .expect("config should resolve");
        assert_eq!(
            api_url_notice(&overridden).as_deref(),
            Some("Using PLAIN_API_URL provided from environment: http://localhost:4000/graphql")
        );

        let defaulted = PlainConfig::from_lookup(|name| {
            (name == "PLAIN_API_KEY").then(|| "plainApiKey_test".to_string())
        })
        .expect("config should resolve");
        assert_eq!(api_url_notice(&defaulted), None);
    }

    #[tokio::test]
    async fn dispatch_without_api_key_never_contacts_the_service() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/graphql/v1");
            then.status(200);
        });
        let endpoint = server.url("/graphql/v1");
        let cli = parse(&["plain", "index-url", "https://example.com/docs"]);

        let err = dispatch(
            cli.command,
            move |name| (name == "PLAIN_API_URL").then(|| endpoint.clone()),
            "trace",
        )
        .await
        .expect_err("missing key should fail");

        assert!(err.display_message().contains("PLAIN_API_KEY"));
        mock.assert_calls(0);
    }

    #[tokio::test]
    async fn dispatch_index_url_reports_remote_failure() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/graphql/v1").json_body(json!({
                "query": INDEX_DOCUMENT_MUTATION,
                "variables": { "input": { "url": "https://example.com/docs", "labelTypeIds": [] } }
            }));
            then.status(200)
                .header("content-type", "application/json")
                .header("plain-request-id", "req_7")
                .json_body(json!({ "data": { "indexDocument": { "error": { "message": "Forbidden" } } } }));
        });
        let config = config_for(&server);
        let cli = parse(&["plain", "index-url", "https://example.com/docs"]);

        let err = dispatch(
            cli.command,
            move |name| match name {
                "PLAIN_API_KEY" => Some(config.api_key.expose().to_string()),
                "PLAIN_API_URL" => Some(config.api_url.to_string()),
                _ => None,
            },
            "trace",
        )
        .await
        .expect_err("remote error should fail");

        assert_eq!(err.display_message(), failure_line("Forbidden", Some("req_7")));
    }
}
