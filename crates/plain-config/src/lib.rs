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

//! Environment-backed configuration for the Plain CLI.
//!
//! Layout: `defaults.rs` (variable names and fallbacks), `model.rs`
//! (`PlainConfig` resolution), `error.rs` (`ConfigError`).

pub mod defaults;
pub mod error;
pub mod model;

pub use defaults::{DEFAULT_API_URL, ENV_API_KEY, ENV_API_URL};
pub use error::{ConfigError, ConfigResult};
pub use model::{ApiKey, PlainConfig};
