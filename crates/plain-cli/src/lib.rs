#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::redundant_pub_crate)]

//! Command-line client for submitting URLs and sitemaps to the Plain indexing API.
//!
//! Layout:
//! - `cli.rs`: argument parsing and command dispatch
//! - `commands/`: command handlers grouped by concern
//! - `client.rs`: shared HTTP client, errors, and the GraphQL adapter
//! - `sitemap.rs`: sitemap fetching and XML parsing
//! - `batch.rs`: sequential sitemap batch indexing
//! - `model.rs`: request and outcome types
//! - `output.rs`: console renderers
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod batch;
pub(crate) mod cli;
pub(crate) mod client;
pub(crate) mod commands;
pub(crate) mod model;
pub(crate) mod output;
pub(crate) mod sitemap;

pub use cli::run;
