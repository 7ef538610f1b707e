//! Error taxonomy for proxy deployments and upgrades.

use alloy_core::primitives::{Address, B256};
use serde_json::Value;

/// Errors surfaced by the chain connector.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// The request never produced a JSON-RPC response.
    #[error("transport error calling {method}: {message}")]
    Transport { method: String, message: String },

    /// The node answered with a JSON-RPC error object.
    #[error("rpc error from {method} (code {code}): {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },

    /// The response could not be decoded.
    #[error("malformed {method} response: {message}")]
    Decode { method: String, message: String },

    /// The endpoint holds no account to send from.
    #[error("endpoint reported no accounts to send from")]
    NoAccounts,

    /// The transaction was mined but reverted.
    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: B256 },

    /// No receipt appeared within the connector's wait policy.
    #[error("no receipt for transaction {tx_hash} after {waited_secs}s")]
    ReceiptTimeout { tx_hash: B256, waited_secs: u64 },

    /// A deployment receipt without a contract address.
    #[error("receipt for transaction {tx_hash} has no contract address")]
    MissingContractAddress { tx_hash: B256 },

    /// Constructor arguments could not be ABI-encoded.
    #[error("constructor encoding failed: {0}")]
    Encoding(String),
}

/// Errors returned by [`crate::ProxyManager`] operations.
///
/// Every variant names the contract, pattern or address involved. Any error
/// means no state change is guaranteed past the last reported step: contracts
/// that already landed on-chain are left in place.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No compiled artifact exists for the contract.
    #[error("artifact not found for contract `{contract}`")]
    ArtifactNotFound { contract: String },

    /// The artifact exists but could not be read or parsed.
    #[error("failed to load artifact for contract `{contract}`: {reason}")]
    Artifact { contract: String, reason: String },

    /// The pattern literal is not one of `transparent`, `uups` or `beacon`.
    #[error("unsupported proxy pattern `{pattern}` (expected transparent, uups or beacon)")]
    UnsupportedPattern { pattern: String },

    /// A contract deployment was rejected, reverted or could not be encoded.
    #[error("failed to deploy `{contract}` with args {args:?}: {reason}")]
    Deployment {
        contract: String,
        args: Vec<Value>,
        reason: String,
    },

    /// Neither classification probe produced a usable answer.
    #[error("could not detect the proxy pattern of {proxy}")]
    PatternDetection { proxy: Address },

    /// The storage layout validator refused the implementation pair.
    #[error("storage layout validation rejected upgrade of {proxy} to `{contract}`: {reason}")]
    StorageValidation {
        proxy: Address,
        contract: String,
        reason: String,
    },

    /// The administrative upgrade call failed.
    #[error("upgrade transaction against {target} failed: {reason}")]
    UpgradeTransaction { target: Address, reason: String },

    /// A connector call outside a deploy or upgrade step failed.
    #[error("chain connector error: {0}")]
    Connector(#[from] ConnectorError),
}

impl Error {
    pub(crate) fn deployment(
        contract: impl Into<String>,
        args: &[Value],
        reason: impl ToString,
    ) -> Self {
        Self::Deployment {
            contract: contract.into(),
            args: args.to_vec(),
            reason: reason.to_string(),
        }
    }
}
