//! Records produced by deployments and upgrades.

use alloy_core::primitives::{Address, B256};
use serde::{Deserialize, Serialize};

use crate::{PatternTag, ProxyPattern};

/// A deployed implementation contract. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationRecord {
    pub name: String,
    pub address: Address,
    pub tx_hash: B256,
}

/// A live proxy.
///
/// The address never changes. `implementation` only moves through
/// [`crate::ProxyManager::upgrade_proxy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRecord {
    pub address: Address,
    pub pattern: PatternTag,
    pub implementation: Address,
}

/// A beacon shared by one or more beacon proxies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconRecord {
    pub address: Address,
    pub implementation: Address,
    pub tx_hash: B256,
}

/// Result of [`crate::ProxyManager::deploy_proxy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedProxy {
    /// The pattern that was requested.
    pub pattern: ProxyPattern,
    pub implementation: ImplementationRecord,
    pub proxy: ProxyRecord,
    /// Hash of the proxy deployment transaction.
    pub proxy_tx_hash: B256,
    /// Present only for [`ProxyPattern::Beacon`].
    pub beacon: Option<BeaconRecord>,
    /// Gas used across every deployment of the call.
    pub gas_used: u64,
}

/// Result of [`crate::ProxyManager::upgrade_proxy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeResult {
    /// The proxy, with `implementation` set to what the target reported after
    /// the upgrade. Falls back to the new implementation when that read fails.
    pub proxy: ProxyRecord,
    /// The beacon that received the upgrade call, for beacon proxies.
    pub beacon: Option<Address>,
    /// Implementation read from the target just before the upgrade.
    pub old_implementation: Option<Address>,
    pub new_implementation: ImplementationRecord,
    pub upgrade_transaction_hash: B256,
    /// Implementation read back from the target after the upgrade.
    pub post_upgrade_implementation: Option<Address>,
}

impl UpgradeResult {
    /// The address the administrative call was sent to.
    pub fn admin_target(&self) -> Address {
        self.beacon.unwrap_or(self.proxy.address)
    }

    /// Whether the post-upgrade lookup observed the new implementation.
    pub fn implementation_matches(&self) -> bool {
        self.post_upgrade_implementation == Some(self.new_implementation.address)
    }
}
