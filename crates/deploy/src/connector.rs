//! The chain connector seam.
//!
//! Every operation in this crate receives its connector explicitly; there is no
//! ambient "current network".

use std::future::Future;

use alloy_core::{
    dyn_abi::DynSolValue,
    json_abi::JsonAbi,
    primitives::{Address, B256, Bytes},
};
use serde::{Deserialize, Serialize};

use crate::ConnectorError;

/// Outcome of a contract deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployReceipt {
    pub address: Address,
    pub transaction_hash: B256,
    pub gas_used: u64,
}

/// A state-changing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
}

/// Outcome of a mined, successful transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub gas_used: u64,
}

/// Signs, broadcasts and reads against a network endpoint.
///
/// Implementations own their timeout and retry policy. Callers in this crate
/// never add their own.
pub trait ChainConnector: Send + Sync {
    /// Accounts the endpoint can send from.
    fn accounts(&self) -> impl Future<Output = Result<Vec<Address>, ConnectorError>> + Send;

    /// Deploy `bytecode` with `args` encoded against the constructor of `abi`.
    fn deploy(
        &self,
        abi: &JsonAbi,
        bytecode: &Bytes,
        from: Address,
        args: &[DynSolValue],
    ) -> impl Future<Output = Result<DeployReceipt, ConnectorError>> + Send;

    /// Read-only call returning the raw response bytes.
    fn call(
        &self,
        to: Address,
        data: Bytes,
    ) -> impl Future<Output = Result<Bytes, ConnectorError>> + Send;

    /// Send a transaction and wait for its receipt.
    fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> impl Future<Output = Result<TransactionReceipt, ConnectorError>> + Send;
}
