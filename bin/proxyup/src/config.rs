//! Layered configuration: defaults, then `proxyup.toml`, then `PROXYUP_*`
//! environment variables, then command line flags.

use std::{path::PathBuf, time::Duration};

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use proxyup_deploy::RpcConfig;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cli::Cli;

/// Prefix of the environment variables read by [`Config::load`].
const ENV_PREFIX: &str = "PROXYUP_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub rpc_url: String,
    pub artifacts_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub deployments_file: PathBuf,
    pub request_timeout_secs: u64,
    pub receipt_timeout_secs: u64,
    pub receipt_poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let rpc = RpcConfig::default();
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            artifacts_dir: PathBuf::from("out"),
            from: None,
            deployments_file: PathBuf::from("deployments.json"),
            request_timeout_secs: rpc.request_timeout.as_secs(),
            receipt_timeout_secs: rpc.receipt_timeout.as_secs(),
            receipt_poll_interval_ms: rpc.poll_interval.as_millis() as u64,
        }
    }
}

impl Config {
    /// Resolve the configuration for `cli`.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(&cli.config))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["verbosity", "config"]))
            .extract()
            .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

        if let Some(rpc_url) = &cli.rpc_url {
            config.rpc_url = rpc_url.clone();
        }
        if let Some(artifacts_dir) = &cli.artifacts_dir {
            config.artifacts_dir = artifacts_dir.clone();
        }
        if cli.from.is_some() {
            config.from = cli.from;
        }
        if let Some(deployments_file) = &cli.deployments_file {
            config.deployments_file = deployments_file.clone();
        }

        Ok(config)
    }

    pub fn rpc_url(&self) -> Result<Url> {
        Url::parse(&self.rpc_url).with_context(|| format!("Invalid RPC URL: {}", self.rpc_url))
    }

    pub fn rpc_config(&self) -> RpcConfig {
        RpcConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            receipt_timeout: Duration::from_secs(self.receipt_timeout_secs),
            poll_interval: Duration::from_millis(self.receipt_poll_interval_ms),
        }
    }
}
