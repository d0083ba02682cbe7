#![forbid(unsafe_code)]
#![deny(unused_must_use, unreachable_pub, missing_docs)]

//! Binary entrypoint for the ferry agent.

use std::process;

use ferry_app::{BootstrapDependencies, Cli, run_app};

/// Parses arguments, runs the agent, and maps fatal errors onto exit codes.
#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    let result = match BootstrapDependencies::from_cli(cli) {
        Ok(dependencies) => run_app(dependencies).await,
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        let exit_code = err.exit_code();
        let report = anyhow::Error::new(err);
        eprintln!("error: {report:#}");
        process::exit(exit_code);
    }
}
