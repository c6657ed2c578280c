//! Code generation targets
//!
//! Each target fixes which protoc plugin runs and which package layout the
//! generated files are assembled into.

use std::fmt;

use clap::ValueEnum;

/// Output ecosystem selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    /// Rust crate for Solana programs
    Solana,
    /// npm package with Solidity contracts
    Solidity,
}

/// How a target's plugin is found and invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginSpec {
    /// npm package that ships the plugin binary
    pub package: &'static str,
    /// Executable name, also the plugin's logical name for `--plugin`
    pub bin: &'static str,
    /// Compiler flag selecting the plugin's output directory
    pub out_flag: &'static str,
}

impl Target {
    pub fn plugin(self) -> PluginSpec {
        match self {
            Target::Solana => PluginSpec {
                package: "@wireio/protoc-gen-solana",
                bin: "protoc-gen-solana",
                out_flag: "--solana_out",
            },
            Target::Solidity => PluginSpec {
                package: "@wireio/protoc-gen-solidity",
                bin: "protoc-gen-solidity",
                out_flag: "--solidity_out",
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Target::Solana => "solana",
            Target::Solidity => "solidity",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
