//! Upgrading a live proxy to a new implementation.

use alloy_core::primitives::Address;
use serde_json::Value;

use crate::{
    ArtifactStore, ChainConnector, Error, ImplementationRecord, ImplementationRef, PatternTag,
    ProxyManager, ProxyRecord, StorageLayoutValidator, TransactionRequest, UpgradeResult,
    abi::{self, PROXY_DESCRIPTOR},
    detect::{detect_pattern, read_beacon, read_implementation},
};

/// Options for [`ProxyManager::upgrade_proxy`].
#[derive(Debug, Clone)]
pub struct UpgradeOptions {
    /// Run the storage layout validator before upgrading.
    pub validate_storage: bool,
    /// Sender of the deployment and the upgrade call.
    pub from: Option<Address>,
}

impl Default for UpgradeOptions {
    fn default() -> Self {
        Self {
            validate_storage: true,
            from: None,
        }
    }
}

impl<C, A, V> ProxyManager<C, A, V>
where
    C: ChainConnector,
    A: ArtifactStore,
    V: StorageLayoutValidator,
{
    /// Point the proxy at `proxy` to a freshly deployed `contract_name`.
    ///
    /// Beacon proxies are upgraded through their beacon, every other proxy
    /// directly. The pattern and current implementation are resolved before
    /// the new implementation is deployed; a failure after that deployment
    /// leaves it orphaned.
    pub async fn upgrade_proxy(
        &self,
        proxy: Address,
        contract_name: &str,
        constructor_args: &[Value],
        options: UpgradeOptions,
    ) -> Result<UpgradeResult, Error> {
        let from = self.sender(options.from).await?;

        tracing::info!(
            proxy = %proxy,
            contract = contract_name,
            validate_storage = options.validate_storage,
            "Upgrading proxy..."
        );

        let artifact = self.artifacts.load_artifact(contract_name)?;
        // No initializer runs on upgrade.
        let values = abi::exact_constructor_values(&artifact.abi, constructor_args)
            .map_err(|e| Error::deployment(contract_name, constructor_args, e))?;

        let pattern = detect_pattern(&self.connector, proxy).await;
        let (target, beacon) = match pattern {
            PatternTag::AddressExposing => (proxy, None),
            PatternTag::Beacon => {
                let beacon = read_beacon(&self.connector, proxy)
                    .await
                    .ok_or(Error::PatternDetection { proxy })?;
                (beacon, Some(beacon))
            }
            PatternTag::Unknown => return Err(Error::PatternDetection { proxy }),
        };

        let old_implementation = read_implementation(&self.connector, target).await;

        let receipt = self
            .deploy_artifact(contract_name, &artifact, &values, constructor_args, from)
            .await?;
        let new_implementation = ImplementationRecord {
            name: contract_name.to_string(),
            address: receipt.address,
            tx_hash: receipt.transaction_hash,
        };

        if options.validate_storage {
            self.validator
                .validate(
                    &ImplementationRef::Current {
                        proxy,
                        implementation: old_implementation,
                    },
                    &ImplementationRef::Deployed(&new_implementation),
                )
                .map_err(|reason| Error::StorageValidation {
                    proxy,
                    contract: contract_name.to_string(),
                    reason,
                })?;
        } else {
            tracing::warn!(proxy = %proxy, "Storage layout validation disabled");
        }

        if new_implementation.address.is_zero() {
            return Err(Error::UpgradeTransaction {
                target,
                reason: "refusing to upgrade to the zero address".to_string(),
            });
        }

        tracing::info!(
            proxy = %proxy,
            target = %target,
            pattern = %pattern,
            old_implementation = ?old_implementation,
            new_implementation = %new_implementation.address,
            "Sending upgrade transaction..."
        );

        let upgrade_receipt = self
            .connector
            .send_transaction(TransactionRequest {
                from,
                to: target,
                data: PROXY_DESCRIPTOR.upgrade_call(new_implementation.address),
            })
            .await
            .map_err(|e| Error::UpgradeTransaction {
                target,
                reason: e.to_string(),
            })?;

        let post_upgrade_implementation = read_implementation(&self.connector, target).await;

        let result = UpgradeResult {
            proxy: ProxyRecord {
                address: proxy,
                pattern,
                implementation: post_upgrade_implementation.unwrap_or(new_implementation.address),
            },
            beacon,
            old_implementation,
            new_implementation,
            upgrade_transaction_hash: upgrade_receipt.transaction_hash,
            post_upgrade_implementation,
        };

        if result.implementation_matches() {
            tracing::info!(
                proxy = %proxy,
                implementation = %result.new_implementation.address,
                tx_hash = %upgrade_receipt.transaction_hash,
                "Proxy upgraded"
            );
        } else {
            tracing::warn!(
                proxy = %proxy,
                target = %target,
                expected = %result.new_implementation.address,
                observed = ?post_upgrade_implementation,
                "Implementation lookup after upgrade does not match"
            );
        }

        self.verify(proxy, &artifact.abi).await;

        Ok(result)
    }
}
