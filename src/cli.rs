//! CLI definitions using clap derive API

use std::path::PathBuf;

use clap::Parser;
use clap::builder::{Styles, styling::AnsiColor};

use crate::error::Result;
use crate::logging::LogConfig;
use crate::request::{BundleRequest, parse_package_data};
use crate::source::RepoSpec;
use crate::target::Target;

/// protobuf-bundler - schema repository to publishable package
#[derive(Parser, Debug)]
#[command(
    name = "protobuf-bundler",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Generate publishable packages from protobuf schemas in a git repository",
    long_about = "Fetches the .proto files of a git repository, compiles them with protoc and the \
                  target's plugin, and assembles the generated code into a Rust crate (solana) or \
                  an npm package (solidity) together with a copy of the schemas.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  protobuf-bundler --repo wireio/schemas#v1.2.0 --target solidity \\\n     \
                  --output dist/opp-sol --package-name @wireio/opp-solidity --package-version 1.2.0\n   \
                  protobuf-bundler --repo github:wireio/schemas#main:proto/opp --target solana \\\n     \
                  --output dist/opp-rs --package-name opp-types --package-version 0.3.0 \\\n     \
                  --package-data '{\"license\": \"MIT\"}'\n\n\
                  "
)]
pub struct Cli {
    /// Schema repository: owner/repo[/subfolder][#ref[:subfolder]], github:owner/repo or a git URL
    #[arg(long, value_name = "SPEC")]
    pub repo: String,

    /// Code generation target
    #[arg(long, value_enum)]
    pub target: Target,

    /// Directory the package is written to (created if missing)
    #[arg(long, value_name = "DIR")]
    pub output: PathBuf,

    /// Name of the generated package
    #[arg(long, value_name = "NAME")]
    pub package_name: String,

    /// Version of the generated package
    #[arg(long, value_name = "VERSION")]
    pub package_version: String,

    /// Extra manifest data as a JSON object
    #[arg(long, value_name = "JSON", default_value = "{}")]
    pub package_data: String,

    /// Protocol buffer compiler to run
    #[arg(long, value_name = "PATH", env = "PROTOC", default_value = "protoc")]
    pub protoc: PathBuf,

    /// Directory searched for node_modules plugin installs (defaults to current directory)
    #[arg(long, value_name = "DIR", env = "PROTOBUF_BUNDLER_PROJECT_ROOT")]
    pub project_root: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Cli {
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            verbose: self.verbose,
        }
    }

    /// Validate the inputs into a pipeline request
    pub fn request(&self) -> Result<BundleRequest> {
        let package_data = parse_package_data(&self.package_data)?;
        Ok(BundleRequest {
            repo: RepoSpec::parse(&self.repo)?,
            target: self.target,
            output: self.output.clone(),
            package_name: self.package_name.clone(),
            package_version: self.package_version.clone(),
            package_data,
        })
    }
}
