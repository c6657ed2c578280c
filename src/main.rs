//! protobuf-bundler
//!
//! Fetches protocol buffer schemas from a git repository, compiles them with
//! a target specific protoc plugin and assembles the output into a
//! publishable package.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::Diagnostic;

mod cli;
mod common;
mod error;
mod fetch;
mod git;
mod hash;
mod logging;
mod package;
mod pipeline;
mod protoc;
mod request;
mod source;
mod target;
mod temp;

#[cfg(test)]
mod test_fixtures;

use cli::Cli;
use error::{BundlerError, Result};
use pipeline::Pipeline;
use protoc::{BinaryResolver, CompilerInvoker};

/// Directory searched for package-local plugin installs
fn project_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().map_err(|e| BundlerError::IoError {
            message: format!("Failed to determine current directory: {e}"),
        }),
    }
}

fn run(cli: Cli) -> Result<()> {
    let request = cli.request()?;
    let resolver = BinaryResolver::new(project_root(cli.project_root)?);
    Pipeline::new(CompilerInvoker::new(cli.protoc, resolver)).run(&request)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_config());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Fatal: {e}");
            if let Some(help) = e.help() {
                tracing::error!("help: {help}");
            }
            ExitCode::FAILURE
        }
    }
}
