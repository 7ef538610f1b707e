//! Ethereum JSON-RPC chain connector.

use std::time::{Duration, Instant};

use alloy_core::{
    dyn_abi::DynSolValue,
    json_abi::JsonAbi,
    primitives::{Address, B256, Bytes, U64, U256},
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use url::Url;

use crate::{
    ChainConnector, ConnectorError, DeployReceipt, TransactionReceipt, TransactionRequest, abi,
};

/// Default timeout for RPC requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default time to wait for a transaction receipt.
const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default interval between receipt polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Request and receipt-wait policy of [`RpcConnector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpcConfig {
    /// Timeout of a single HTTP request.
    pub request_timeout: Duration,
    /// How long to wait for a transaction to be mined.
    pub receipt_timeout: Duration,
    /// Interval between `eth_getTransactionReceipt` polls.
    pub poll_interval: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_TIMEOUT,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client(timeout: Duration) -> Result<reqwest::Client, ConnectorError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ConnectorError::Transport {
            method: "connect".to_string(),
            message: e.to_string(),
        })
}

/// Make a JSON-RPC call and deserialize the result.
///
/// # Arguments
/// * `client` - The HTTP client to use
/// * `url` - The RPC endpoint URL
/// * `method` - The RPC method name
/// * `params` - The method parameters
pub async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &Url,
    method: &str,
    params: Vec<Value>,
) -> Result<T, ConnectorError> {
    let transport = |e: reqwest::Error| ConnectorError::Transport {
        method: method.to_string(),
        message: e.to_string(),
    };

    let response = client
        .post(url.clone())
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await
        .map_err(transport)?;

    let result: Value = response.json().await.map_err(transport)?;

    if let Some(error) = result.get("error") {
        return Err(ConnectorError::Rpc {
            method: method.to_string(),
            code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
        });
    }

    let result_value = result
        .get("result")
        .cloned()
        .ok_or_else(|| ConnectorError::Decode {
            method: method.to_string(),
            message: "no result in response".to_string(),
        })?;

    serde_json::from_value(result_value).map_err(|e| ConnectorError::Decode {
        method: method.to_string(),
        message: e.to_string(),
    })
}

/// The subset of a transaction receipt this crate reads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: B256,
    contract_address: Option<Address>,
    gas_used: U256,
    /// Absent on pre-Byzantium chains.
    status: Option<U64>,
}

/// Chain connector speaking Ethereum JSON-RPC over HTTP.
///
/// Transactions are sent with `eth_sendTransaction`, so the endpoint must hold
/// the sender keys (anvil, hardhat, or a node with unlocked accounts).
#[derive(Debug, Clone)]
pub struct RpcConnector {
    client: reqwest::Client,
    url: Url,
    config: RpcConfig,
}

impl RpcConnector {
    /// Connect to `url` with the given request policy.
    pub fn connect(url: Url, config: RpcConfig) -> Result<Self, ConnectorError> {
        let client = create_client(config.request_timeout)?;
        tracing::debug!(url = %url, ?config, "Created JSON-RPC connector");
        Ok(Self {
            client,
            url,
            config,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn call_rpc<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, ConnectorError> {
        json_rpc_call(&self.client, &self.url, method, params).await
    }

    /// Submit a transaction and poll until its receipt is available.
    async fn transact(&self, tx: Value) -> Result<RpcReceipt, ConnectorError> {
        let tx_hash: B256 = self.call_rpc("eth_sendTransaction", vec![tx]).await?;
        tracing::debug!(tx_hash = %tx_hash, "Transaction submitted");

        let start = Instant::now();
        let receipt = loop {
            let receipt: Option<RpcReceipt> = self
                .call_rpc(
                    "eth_getTransactionReceipt",
                    vec![serde_json::json!(tx_hash)],
                )
                .await?;

            if let Some(receipt) = receipt {
                break receipt;
            }

            if start.elapsed() > self.config.receipt_timeout {
                return Err(ConnectorError::ReceiptTimeout {
                    tx_hash,
                    waited_secs: self.config.receipt_timeout.as_secs(),
                });
            }

            tracing::trace!(tx_hash = %tx_hash, "Receipt not available yet, retrying...");
            tokio::time::sleep(self.config.poll_interval).await;
        };

        if receipt.status.is_some_and(|status| status.is_zero()) {
            return Err(ConnectorError::Reverted {
                tx_hash: receipt.transaction_hash,
            });
        }

        Ok(receipt)
    }
}

fn gas_to_u64(gas: U256) -> u64 {
    gas.saturating_to::<u64>()
}

impl ChainConnector for RpcConnector {
    async fn accounts(&self) -> Result<Vec<Address>, ConnectorError> {
        self.call_rpc("eth_accounts", vec![]).await
    }

    async fn deploy(
        &self,
        abi: &JsonAbi,
        bytecode: &Bytes,
        from: Address,
        args: &[DynSolValue],
    ) -> Result<DeployReceipt, ConnectorError> {
        let encoded_args = abi::encode_constructor(abi, args).map_err(ConnectorError::Encoding)?;
        let mut data = bytecode.to_vec();
        data.extend_from_slice(&encoded_args);

        let receipt = self
            .transact(serde_json::json!({
                "from": from,
                "data": Bytes::from(data),
            }))
            .await?;

        let address = receipt
            .contract_address
            .ok_or(ConnectorError::MissingContractAddress {
                tx_hash: receipt.transaction_hash,
            })?;

        Ok(DeployReceipt {
            address,
            transaction_hash: receipt.transaction_hash,
            gas_used: gas_to_u64(receipt.gas_used),
        })
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ConnectorError> {
        self.call_rpc(
            "eth_call",
            vec![
                serde_json::json!({ "to": to, "data": data }),
                serde_json::json!("latest"),
            ],
        )
        .await
    }

    async fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> Result<TransactionReceipt, ConnectorError> {
        let receipt = self
            .transact(serde_json::json!({
                "from": tx.from,
                "to": tx.to,
                "data": tx.data,
            }))
            .await?;

        Ok(TransactionReceipt {
            transaction_hash: receipt.transaction_hash,
            gas_used: gas_to_u64(receipt.gas_used),
        })
    }
}
