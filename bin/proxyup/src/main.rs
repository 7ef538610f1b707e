//! proxyup is a CLI tool to deploy and upgrade proxied contracts.

mod cli;
mod config;
mod output;
mod state;

use anyhow::{Context, Result};
use clap::Parser;
use proxyup_deploy::{
    ChainConnector, DeployOptions, DirArtifactStore, PatternTag, ProxyManager, RpcConnector,
    UpgradeOptions, detect_pattern, read_beacon, read_implementation,
};
use serde_json::Value;

use cli::{Cli, Command};
use config::Config;
use state::DeploymentState;

/// Parse `--arg` values as JSON, falling back to a plain string.
fn parse_args(raw: &[String]) -> Vec<Value> {
    raw.iter()
        .map(|arg| serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.clone())))
        .collect()
}

/// Build a manager over the configured endpoint and artifacts.
fn connect(config: &Config) -> Result<ProxyManager<RpcConnector, DirArtifactStore>> {
    let rpc_url = config.rpc_url()?;
    tracing::debug!(
        rpc_url = %rpc_url,
        artifacts_dir = %config.artifacts_dir.display(),
        deployments_file = %config.deployments_file.display(),
        "Loaded configuration"
    );

    let connector = RpcConnector::connect(rpc_url.clone(), config.rpc_config())
        .with_context(|| format!("Failed to connect to {rpc_url}"))?;
    Ok(ProxyManager::new(
        connector,
        DirArtifactStore::new(&config.artifacts_dir),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let config = Config::load(&cli)?;

    match cli.command {
        Command::Deploy {
            contract,
            pattern,
            args,
        } => {
            let deployed = connect(&config)?
                .deploy_proxy_literal(
                    &contract,
                    &parse_args(&args),
                    &pattern,
                    DeployOptions { from: config.from },
                )
                .await
                .with_context(|| format!("Failed to deploy {contract} behind a {pattern} proxy"))?;

            let mut state = DeploymentState::load(&config.deployments_file)?;
            state.record_deploy(&deployed, chrono::Utc::now());
            state.save(&config.deployments_file)?;

            println!("{}", output::deployed(&deployed));
        }
        Command::Upgrade {
            proxy,
            contract,
            args,
            unsafe_skip_storage_check,
        } => {
            let result = connect(&config)?
                .upgrade_proxy(
                    proxy,
                    &contract,
                    &parse_args(&args),
                    UpgradeOptions {
                        validate_storage: !unsafe_skip_storage_check,
                        from: config.from,
                    },
                )
                .await
                .with_context(|| format!("Failed to upgrade {proxy} to {contract}"))?;

            let mut state = DeploymentState::load(&config.deployments_file)?;
            state.record_upgrade(&result, chrono::Utc::now());
            state.save(&config.deployments_file)?;

            println!("{}", output::upgraded(&result));
        }
        Command::Detect { proxy } => {
            let manager = connect(&config)?;
            let connector = manager.connector();
            let tag = detect_pattern(connector, proxy).await;
            let (implementation, beacon) = match tag {
                PatternTag::AddressExposing => (read_implementation(connector, proxy).await, None),
                PatternTag::Beacon => {
                    let beacon = read_beacon(connector, proxy).await;
                    let implementation = match beacon {
                        Some(beacon) => read_implementation(connector, beacon).await,
                        None => None,
                    };
                    (implementation, beacon)
                }
                PatternTag::Unknown => (None, None),
            };

            println!("{}", output::detected(proxy, tag, implementation, beacon));

            if !tag.is_known() {
                anyhow::bail!("{proxy} does not answer as a transparent, UUPS or beacon proxy");
            }
        }
        Command::Accounts => {
            let accounts = connect(&config)?
                .connector()
                .accounts()
                .await
                .context("Failed to list accounts")?;
            println!("{}", output::accounts(&accounts));
        }
        Command::Config => {
            print!(
                "{}",
                toml::to_string_pretty(&config).context("Failed to serialize configuration")?
            );
        }
    }

    Ok(())
}
