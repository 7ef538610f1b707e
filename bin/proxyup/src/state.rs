//! The deployments file: every proxy deployed or upgraded through the CLI.

use std::{collections::BTreeMap, path::Path};

use alloy_core::primitives::{Address, B256};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use proxyup_deploy::{DeployedProxy, ImplementationRecord, PatternTag, ProxyPattern, UpgradeResult};
use serde::{Deserialize, Serialize};

/// One implementation a proxy pointed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub name: String,
    pub address: Address,
    pub tx_hash: B256,
    pub at: DateTime<Utc>,
}

impl HistoryEntry {
    fn new(record: &ImplementationRecord, at: DateTime<Utc>) -> Self {
        Self {
            name: record.name.clone(),
            address: record.address,
            tx_hash: record.tx_hash,
            at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyEntry {
    /// Pattern requested at deployment. Unknown for proxies first seen on upgrade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_pattern: Option<ProxyPattern>,
    pub pattern: PatternTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beacon: Option<Address>,
    pub implementation: Address,
    /// Oldest first.
    pub history: Vec<HistoryEntry>,
}

/// Proxies keyed by address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentState {
    pub proxies: BTreeMap<String, ProxyEntry>,
}

impl DeploymentState {
    /// Load the state at `path`, or an empty state if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read deployments file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse deployments file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize deployments")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write deployments file: {}", path.display()))
    }

    pub fn get(&self, proxy: Address) -> Option<&ProxyEntry> {
        self.proxies.get(&proxy.to_string())
    }

    pub fn record_deploy(&mut self, deployed: &DeployedProxy, at: DateTime<Utc>) {
        self.proxies.insert(
            deployed.proxy.address.to_string(),
            ProxyEntry {
                requested_pattern: Some(deployed.pattern),
                pattern: deployed.proxy.pattern,
                beacon: deployed.beacon.map(|b| b.address),
                implementation: deployed.implementation.address,
                history: vec![HistoryEntry::new(&deployed.implementation, at)],
            },
        );
    }

    /// Record an upgrade. For a beacon upgrade, every known proxy of the same
    /// beacon moves to the new implementation.
    pub fn record_upgrade(&mut self, result: &UpgradeResult, at: DateTime<Utc>) {
        let entry = HistoryEntry::new(&result.new_implementation, at);
        let key = result.proxy.address.to_string();

        self.proxies
            .entry(key.clone())
            .or_insert_with(|| ProxyEntry {
                requested_pattern: None,
                pattern: result.proxy.pattern,
                beacon: result.beacon,
                implementation: result.proxy.implementation,
                history: Vec::new(),
            });

        for (address, proxy) in self.proxies.iter_mut() {
            let is_target = *address == key;
            let shares_beacon = result.beacon.is_some() && proxy.beacon == result.beacon;
            if is_target || shares_beacon {
                proxy.implementation = result.proxy.implementation;
                proxy.history.push(entry.clone());
            }
        }
    }
}
