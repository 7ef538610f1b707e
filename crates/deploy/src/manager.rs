//! Deployment of implementations and proxies.

use alloy_core::{dyn_abi::DynSolValue, primitives::Address};
use serde_json::Value;

use crate::{
    Artifact, ArtifactStore, BeaconRecord, ChainConnector, ConnectorError, DeployReceipt,
    DeployedProxy, Error, ImplementationRecord, PassThrough, PatternTag, ProxyPattern,
    ProxyRecord, StorageLayoutValidator, abi, pattern::BEACON_ARTIFACT,
};

/// Options for [`ProxyManager::deploy_proxy`].
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Sender of every deployment. Defaults to the connector's first account.
    pub from: Option<Address>,
}

/// Deploys and upgrades proxied contracts through an explicit connector.
///
/// Each operation is a linear sequence of awaited chain calls. Nothing is
/// retried, and contracts deployed before a failing step are left orphaned.
#[derive(Debug)]
pub struct ProxyManager<C, A, V = PassThrough> {
    pub(crate) connector: C,
    pub(crate) artifacts: A,
    pub(crate) validator: V,
}

impl<C, A> ProxyManager<C, A>
where
    C: ChainConnector,
    A: ArtifactStore,
{
    /// Create a manager with the pass-through storage validator.
    pub fn new(connector: C, artifacts: A) -> Self {
        Self {
            connector,
            artifacts,
            validator: PassThrough,
        }
    }
}

impl<C, A, V> ProxyManager<C, A, V>
where
    C: ChainConnector,
    A: ArtifactStore,
    V: StorageLayoutValidator,
{
    /// Replace the storage layout validator.
    pub fn with_validator<V2: StorageLayoutValidator>(self, validator: V2) -> ProxyManager<C, A, V2> {
        ProxyManager {
            connector: self.connector,
            artifacts: self.artifacts,
            validator,
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn artifacts(&self) -> &A {
        &self.artifacts
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    /// Resolve the sending account.
    pub(crate) async fn sender(&self, from: Option<Address>) -> Result<Address, Error> {
        if let Some(from) = from {
            return Ok(from);
        }

        let accounts = self.connector.accounts().await?;
        accounts
            .first()
            .copied()
            .ok_or(Error::Connector(ConnectorError::NoAccounts))
    }

    /// Deploy an artifact with already-typed constructor values.
    ///
    /// `shown_args` only annotates errors.
    pub(crate) async fn deploy_artifact(
        &self,
        contract_name: &str,
        artifact: &Artifact,
        values: &[DynSolValue],
        shown_args: &[Value],
        from: Address,
    ) -> Result<DeployReceipt, Error> {
        let receipt = self
            .connector
            .deploy(&artifact.abi, &artifact.bytecode, from, values)
            .await
            .map_err(|e| Error::deployment(contract_name, shown_args, e))?;

        if receipt.address.is_zero() {
            return Err(Error::deployment(
                contract_name,
                shown_args,
                "deployment reported the zero address",
            ));
        }

        tracing::info!(
            contract = contract_name,
            address = %receipt.address,
            tx_hash = %receipt.transaction_hash,
            gas_used = receipt.gas_used,
            "Contract deployed"
        );
        Ok(receipt)
    }

    /// Deploy a loaded artifact, coercing JSON `constructor_args` against its ABI.
    pub(crate) async fn deploy_loaded(
        &self,
        contract_name: &str,
        artifact: &Artifact,
        constructor_args: &[Value],
        from: Address,
    ) -> Result<DeployReceipt, Error> {
        let values = abi::constructor_values(&artifact.abi, constructor_args)
            .map_err(|e| Error::deployment(contract_name, constructor_args, e))?;

        self.deploy_artifact(contract_name, artifact, &values, constructor_args, from)
            .await
    }

    /// Deploy an implementation contract.
    pub async fn deploy_implementation(
        &self,
        contract_name: &str,
        constructor_args: &[Value],
        from: Option<Address>,
    ) -> Result<(ImplementationRecord, u64), Error> {
        let from = self.sender(from).await?;
        let artifact = self.artifacts.load_artifact(contract_name)?;
        let receipt = self
            .deploy_loaded(contract_name, &artifact, constructor_args, from)
            .await?;

        Ok((
            ImplementationRecord {
                name: contract_name.to_string(),
                address: receipt.address,
                tx_hash: receipt.transaction_hash,
            },
            receipt.gas_used,
        ))
    }

    /// Deploy `contract_name` behind a new proxy of the given pattern.
    ///
    /// Every artifact is loaded and the initializer encoded before the first
    /// write. Order: implementation, then (for beacon) the beacon, then the
    /// proxy, then a best-effort read through the proxy.
    pub async fn deploy_proxy(
        &self,
        contract_name: &str,
        constructor_args: &[Value],
        pattern: ProxyPattern,
        options: DeployOptions,
    ) -> Result<DeployedProxy, Error> {
        let spec = pattern.spec();
        let from = self.sender(options.from).await?;

        tracing::info!(
            contract = contract_name,
            pattern = %pattern,
            proxy_artifact = spec.proxy_artifact,
            from = %from,
            "Deploying upgradeable contract..."
        );

        let impl_artifact = self.artifacts.load_artifact(contract_name)?;
        let init_payload = abi::initializer_payload(&impl_artifact.abi, constructor_args)
            .map_err(|e| Error::deployment(contract_name, constructor_args, e))?
            .unwrap_or_else(|| {
                tracing::debug!(
                    contract = contract_name,
                    "No matching initializer, implementation is expected to self-initialize"
                );
                Default::default()
            });

        let proxy_artifact = self.artifacts.load_artifact(spec.proxy_artifact)?;
        let beacon_artifact = if spec.requires_beacon {
            Some(self.artifacts.load_artifact(BEACON_ARTIFACT)?)
        } else {
            None
        };

        let implementation = self
            .deploy_loaded(contract_name, &impl_artifact, constructor_args, from)
            .await?;
        let mut gas_used = implementation.gas_used;

        let (logic_or_beacon, beacon) = match &beacon_artifact {
            Some(artifact) => {
                let beacon = self
                    .deploy_beacon_artifact(artifact, implementation.address, from)
                    .await?;
                gas_used += beacon.gas_used;
                (beacon.record.address, Some(beacon.record))
            }
            None => (implementation.address, None),
        };

        let proxy_receipt = self
            .deploy_artifact(
                spec.proxy_artifact,
                &proxy_artifact,
                &abi::proxy_constructor_args(logic_or_beacon, &init_payload),
                &[
                    Value::String(logic_or_beacon.to_string()),
                    Value::String(init_payload.to_string()),
                ],
                from,
            )
            .await?;
        gas_used += proxy_receipt.gas_used;

        tracing::info!(
            proxy = %proxy_receipt.address,
            implementation = %implementation.address,
            beacon = ?beacon.map(|b| b.address),
            pattern = %pattern,
            "Proxy deployed"
        );

        self.verify(proxy_receipt.address, &impl_artifact.abi).await;

        Ok(DeployedProxy {
            pattern,
            implementation: ImplementationRecord {
                name: contract_name.to_string(),
                address: implementation.address,
                tx_hash: implementation.transaction_hash,
            },
            proxy: ProxyRecord {
                address: proxy_receipt.address,
                pattern: PatternTag::expected_for(pattern),
                implementation: implementation.address,
            },
            proxy_tx_hash: proxy_receipt.transaction_hash,
            beacon,
            gas_used,
        })
    }

    /// [`Self::deploy_proxy`] for a pattern given as a literal.
    ///
    /// The literal is resolved before any chain access.
    pub async fn deploy_proxy_literal(
        &self,
        contract_name: &str,
        constructor_args: &[Value],
        pattern: &str,
        options: DeployOptions,
    ) -> Result<DeployedProxy, Error> {
        let pattern = ProxyPattern::from_literal(pattern)?;
        self.deploy_proxy(contract_name, constructor_args, pattern, options)
            .await
    }

    /// Deploy a beacon pointing at `implementation`.
    pub async fn deploy_beacon(
        &self,
        implementation: Address,
        from: Option<Address>,
    ) -> Result<DeployedBeacon, Error> {
        let from = self.sender(from).await?;
        let artifact = self.artifacts.load_artifact(BEACON_ARTIFACT)?;
        self.deploy_beacon_artifact(&artifact, implementation, from)
            .await
    }

    async fn deploy_beacon_artifact(
        &self,
        artifact: &Artifact,
        implementation: Address,
        from: Address,
    ) -> Result<DeployedBeacon, Error> {
        let receipt = self
            .deploy_artifact(
                BEACON_ARTIFACT,
                artifact,
                &[DynSolValue::Address(implementation)],
                &[Value::String(implementation.to_string())],
                from,
            )
            .await?;

        Ok(DeployedBeacon {
            record: BeaconRecord {
                address: receipt.address,
                implementation,
                tx_hash: receipt.transaction_hash,
            },
            gas_used: receipt.gas_used,
        })
    }
}

/// A freshly deployed beacon and the gas its deployment used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployedBeacon {
    pub record: BeaconRecord,
    pub gas_used: u64,
}
