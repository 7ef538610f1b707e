//! Advisory smoke test run through a freshly deployed or upgraded proxy.

use alloy_core::{json_abi::JsonAbi, primitives::Address};

use crate::{ArtifactStore, ChainConnector, ProxyManager, StorageLayoutValidator, abi};

/// Outcome of the post-deployment read through a proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The read returned data.
    Passed,
    /// The implementation exposes no zero-argument view function.
    Skipped,
    /// The read failed. Never fatal.
    Failed(String),
}

impl Verification {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl<C, A, V> ProxyManager<C, A, V>
where
    C: ChainConnector,
    A: ArtifactStore,
    V: StorageLayoutValidator,
{
    /// Call a trivial read of `abi` through `proxy`.
    ///
    /// Failures are logged as warnings and reported, never returned as errors.
    pub async fn verify(&self, proxy: Address, abi: &JsonAbi) -> Verification {
        let Some(function) = abi::trivial_read(abi) else {
            tracing::debug!(proxy = %proxy, "No zero-argument view function, skipping verification");
            return Verification::Skipped;
        };

        let selector = function.selector();
        let outcome = match self
            .connector
            .call(proxy, selector.as_slice().to_vec().into())
            .await
        {
            Ok(response) if response.is_empty() && !function.outputs.is_empty() => {
                Verification::Failed(format!("{}() returned no data", function.name))
            }
            Ok(_) => Verification::Passed,
            Err(e) => Verification::Failed(format!("{}() failed: {e}", function.name)),
        };

        match &outcome {
            Verification::Failed(reason) => tracing::warn!(
                proxy = %proxy,
                function = %function.name,
                reason = %reason,
                "Proxy verification failed"
            ),
            _ => tracing::debug!(proxy = %proxy, function = %function.name, "Proxy verified"),
        }
        outcome
    }
}
