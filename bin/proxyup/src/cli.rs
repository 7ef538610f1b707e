use std::path::PathBuf;

use alloy_core::primitives::Address;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

/// The default configuration file.
const DEFAULT_CONFIG_FILE: &str = "proxyup.toml";

#[derive(Parser)]
#[command(name = "proxyup")]
#[command(
    author,
    version,
    about = "Deploy, inspect and upgrade transparent, UUPS and beacon proxies"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, global = true, env = "PROXYUP_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to the configuration file. Missing files are ignored.
    #[arg(long, alias = "conf", global = true, env = "PROXYUP_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// The JSON-RPC endpoint. The endpoint must hold the sender keys.
    #[arg(long, alias = "rpc", global = true)]
    pub rpc_url: Option<String>,

    /// Directory holding compiled artifacts (Hardhat `artifacts/` or Foundry `out/`).
    #[arg(long, alias = "artifacts", global = true)]
    pub artifacts_dir: Option<PathBuf>,

    /// Sender of every transaction. Defaults to the endpoint's first account.
    #[arg(long, global = true)]
    pub from: Option<Address>,

    /// Where deployment outcomes are recorded.
    #[arg(long, global = true)]
    pub deployments_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Deploy a contract behind a new proxy.
    Deploy {
        /// Name of the implementation artifact.
        contract: String,

        /// The proxy pattern: transparent, uups or beacon.
        #[arg(short, long, default_value = "transparent")]
        pattern: String,

        /// Constructor or initializer arguments, as JSON values.
        ///
        /// Plain words are taken as strings: `--arg Token --arg 18`.
        #[arg(long = "arg", value_name = "JSON")]
        args: Vec<String>,
    },

    /// Upgrade a live proxy to a newly deployed implementation.
    Upgrade {
        /// Address of the proxy.
        proxy: Address,

        /// Name of the new implementation artifact.
        contract: String,

        /// Constructor arguments of the new implementation, as JSON values.
        #[arg(long = "arg", value_name = "JSON")]
        args: Vec<String>,

        /// Skip the storage layout check.
        #[arg(long)]
        unsafe_skip_storage_check: bool,
    },

    /// Classify the proxy at an address.
    Detect {
        /// Address to inspect.
        proxy: Address,
    },

    /// List the accounts the endpoint can send from.
    Accounts,

    /// Print the resolved configuration as TOML.
    Config,
}
