#![forbid(unsafe_code)]

//! Thin entrypoint for the `plain` binary.

use std::process;

#[tokio::main]
async fn main() {
    let exit_code = plain_cli::run().await;
    if exit_code != 0 {
        process::exit(exit_code);
    }
}
