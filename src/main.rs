// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! quarry CLI - runs an ES module graph through the quarry host

use clap::Parser;
use owo_colors::OwoColorize;
use quarry_host::natives::internals_object;
use quarry_host::{
    Bootstrap, BridgeContext, ExceptionReporter, FsPolicy, RuntimeConfig, Streams, VERSION,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "quarry",
    about = "Module-loading core of an embeddable script runtime",
    version = VERSION,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Import specifier of the main module (e.g. ./main.js)
    script: Option<String>,

    /// Configuration file (defaults to ./quarry.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,

    /// Arguments passed to the script
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
    }
    // Script failures are reported on stderr, never through the exit code.
    ExitCode::SUCCESS
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = RuntimeConfig::load(cli.config.as_deref())?;
    init_logging(cli.verbose, config.log_filter.as_deref());
    tracing::debug!(?config, "configuration loaded");

    let argv: Vec<String> = std::iter::once("quarry".to_string())
        .chain(cli.script)
        .chain(cli.args)
        .collect();

    let internals = internals_object(&argv, Streams::stdio());
    let policy = FsPolicy::new(&config).into_loader_policy(internals.clone())?;
    let context = BridgeContext::new(argv, internals, policy);

    let state = Bootstrap::new(context, ExceptionReporter::stderr()).run();
    tracing::debug!(%state, "quarry exiting");
    Ok(())
}

/// `QUARRY_LOG` wins over `--verbose`, which wins over the config file.
fn init_logging(verbose: bool, configured: Option<&str>) {
    let directive = match (verbose, configured) {
        (true, _) => "quarry=debug",
        (false, Some(configured)) => configured,
        (false, None) => "quarry=warn",
    };
    let filter = EnvFilter::try_from_env("QUARRY_LOG")
        .or_else(|_| EnvFilter::try_new(directive))
        .unwrap_or_else(|_| EnvFilter::new("quarry=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_arguments_pass_through() {
        let cli = Cli::try_parse_from(["quarry", "./main.js", "x", "--flag"]).unwrap();
        assert_eq!(cli.script.as_deref(), Some("./main.js"));
        assert_eq!(cli.args, ["x", "--flag"]);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_options_before_script() {
        let argv = ["quarry", "--verbose", "-c", "q.toml", "./main.js"];
        let cli = Cli::try_parse_from(argv).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("q.toml")));
        assert!(cli.args.is_empty());
    }

    #[test]
    fn test_script_is_optional() {
        let cli = Cli::try_parse_from(["quarry"]).unwrap();
        assert!(cli.script.is_none());
    }
}
