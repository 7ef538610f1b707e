//! In-memory chain used by the integration tests.
//!
//! Contracts are identified by the tag stored as their creation bytecode:
//! `impl` answers every call except proxy administration, `proxy` exposes
//! `implementation()` and `upgradeTo(address)` and forwards the rest,
//! `beacon` holds an implementation, `beacon-proxy` only exposes `getBeacon()`,
//! `silent` reverts every call and `revert` fails to deploy.

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use alloy_core::{
    dyn_abi::DynSolValue,
    json_abi::JsonAbi,
    primitives::{Address, B256, Bytes, Selector, U256},
};
use proxyup_deploy::{
    Artifact, ArtifactStore, ChainConnector, ConnectorError, DeployReceipt, MemoryArtifactStore, ProxyManager,
    TransactionReceipt, TransactionRequest, abi::PROXY_DESCRIPTOR,
};
use serde_json::json;

const DEPLOY_GAS: u64 = 500_000;
const UPGRADE_GAS: u64 = 35_000;

/// Initialize tracing for tests (idempotent).
pub fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Contract {
    Implementation,
    Silent,
    Proxy { implementation: Address },
    Beacon { implementation: Address },
    BeaconProxy { beacon: Address },
}

/// A deployment as seen by the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct DeployCall {
    pub tag: String,
    pub from: Address,
    pub args: Vec<DynSolValue>,
    pub address: Option<Address>,
}

#[derive(Debug, Default)]
struct State {
    contracts: HashMap<Address, Contract>,
    deploys: Vec<DeployCall>,
    sends: Vec<TransactionRequest>,
    calls: usize,
    failed_calls: usize,
    nonce: u64,
    /// Upgrade calls to these addresses revert.
    rejecting: HashSet<Address>,
    /// Upgrade calls to these addresses succeed without changing anything.
    frozen: HashSet<Address>,
}

impl State {
    fn next_nonce(&mut self) -> u64 {
        self.nonce += 1;
        self.nonce
    }
}

/// Mock [`ChainConnector`] recording every write it receives.
#[derive(Debug)]
pub struct MockChain {
    accounts: Vec<Address>,
    state: Mutex<State>,
}

pub fn deployer_account() -> Address {
    Address::repeat_byte(0xde)
}

fn word(address: Address) -> Bytes {
    Bytes::copy_from_slice(address.into_word().as_slice())
}

fn reverted(method: &str) -> ConnectorError {
    ConnectorError::Rpc {
        method: method.to_string(),
        code: 3,
        message: "execution reverted".to_string(),
    }
}

impl MockChain {
    pub fn new() -> Self {
        Self::with_accounts(vec![deployer_account(), Address::repeat_byte(0xad)])
    }

    pub fn with_accounts(accounts: Vec<Address>) -> Self {
        Self {
            accounts,
            state: Mutex::new(State::default()),
        }
    }

    /// Make every later upgrade call sent to `address` revert.
    pub fn reject_upgrades(&self, address: Address) {
        self.state.lock().unwrap().rejecting.insert(address);
    }

    /// Make every later upgrade call sent to `address` succeed as a no-op.
    pub fn freeze(&self, address: Address) {
        self.state.lock().unwrap().frozen.insert(address);
    }

    /// Every deployment, in order.
    pub fn deploys(&self) -> Vec<DeployCall> {
        self.state.lock().unwrap().deploys.clone()
    }

    /// Deployments whose bytecode carried `tag`.
    pub fn deploys_tagged(&self, tag: &str) -> Vec<DeployCall> {
        self.deploys().into_iter().filter(|d| d.tag == tag).collect()
    }

    /// Every non-deployment transaction, in order.
    pub fn sends(&self) -> Vec<TransactionRequest> {
        self.state.lock().unwrap().sends.clone()
    }

    /// Number of state-changing requests received, failed ones included.
    pub fn writes(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.deploys.len() + state.sends.len()
    }

    /// Number of read-only calls received.
    pub fn reads(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    /// Number of read-only calls that reverted.
    pub fn failed_reads(&self) -> usize {
        self.state.lock().unwrap().failed_calls
    }

    /// Implementation currently stored by a proxy or beacon.
    pub fn stored_implementation(&self, address: Address) -> Option<Address> {
        match self.state.lock().unwrap().contracts.get(&address)? {
            Contract::Proxy { implementation } | Contract::Beacon { implementation } => {
                Some(*implementation)
            }
            _ => None,
        }
    }

    /// Answer a read against `to`, following proxies to their implementation.
    fn answer(state: &State, to: Address, data: &[u8]) -> Result<Bytes, ConnectorError> {
        let Some(contract) = state.contracts.get(&to) else {
            // No code: the call succeeds with empty return data.
            return Ok(Bytes::new());
        };
        if data.len() < 4 {
            return Err(reverted("eth_call"));
        }
        let selector = Selector::from_slice(&data[..4]);

        match contract {
            Contract::Silent => Err(reverted("eth_call")),
            Contract::Implementation => {
                if selector == PROXY_DESCRIPTOR.implementation
                    || selector == PROXY_DESCRIPTOR.beacon
                    || selector == PROXY_DESCRIPTOR.upgrade_to
                {
                    Err(reverted("eth_call"))
                } else {
                    Ok(Bytes::copy_from_slice(
                        B256::from(U256::from(42)).as_slice(),
                    ))
                }
            }
            Contract::Proxy { implementation } => {
                if selector == PROXY_DESCRIPTOR.implementation {
                    Ok(word(*implementation))
                } else {
                    Self::answer(state, *implementation, data)
                }
            }
            Contract::Beacon { implementation } => {
                if selector == PROXY_DESCRIPTOR.implementation {
                    Ok(word(*implementation))
                } else {
                    Err(reverted("eth_call"))
                }
            }
            Contract::BeaconProxy { beacon } => {
                if selector == PROXY_DESCRIPTOR.beacon {
                    return Ok(word(*beacon));
                }
                if selector == PROXY_DESCRIPTOR.implementation {
                    return Err(reverted("eth_call"));
                }
                match state.contracts.get(beacon) {
                    Some(Contract::Beacon { implementation }) => {
                        Self::answer(state, *implementation, data)
                    }
                    _ => Err(reverted("eth_call")),
                }
            }
        }
    }
}

impl ChainConnector for MockChain {
    async fn accounts(&self) -> Result<Vec<Address>, ConnectorError> {
        Ok(self.accounts.clone())
    }

    async fn deploy(
        &self,
        _abi: &JsonAbi,
        bytecode: &Bytes,
        from: Address,
        args: &[DynSolValue],
    ) -> Result<DeployReceipt, ConnectorError> {
        let mut state = self.state.lock().unwrap();
        let nonce = state.next_nonce();
        let tx_hash = B256::from(U256::from(nonce));
        let tag = String::from_utf8_lossy(bytecode).into_owned();
        let first_address = args.first().and_then(DynSolValue::as_address);

        let contract = match (tag.as_str(), first_address) {
            ("impl", _) => Some(Contract::Implementation),
            ("silent", _) => Some(Contract::Silent),
            ("proxy", Some(implementation)) => Some(Contract::Proxy { implementation }),
            ("beacon", Some(implementation)) => Some(Contract::Beacon { implementation }),
            ("beacon-proxy", Some(beacon)) => Some(Contract::BeaconProxy { beacon }),
            _ => None,
        };

        let Some(contract) = contract else {
            state.deploys.push(DeployCall {
                tag,
                from,
                args: args.to_vec(),
                address: None,
            });
            return Err(ConnectorError::Reverted { tx_hash });
        };

        let address = Address::from_word(B256::from(U256::from(0x1000 + nonce)));
        state.contracts.insert(address, contract);
        state.deploys.push(DeployCall {
            tag,
            from,
            args: args.to_vec(),
            address: Some(address),
        });

        Ok(DeployReceipt {
            address,
            transaction_hash: tx_hash,
            gas_used: DEPLOY_GAS,
        })
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ConnectorError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        let answer = Self::answer(&state, to, &data);
        if answer.is_err() {
            state.failed_calls += 1;
        }
        answer
    }

    async fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> Result<TransactionReceipt, ConnectorError> {
        let mut state = self.state.lock().unwrap();
        let nonce = state.next_nonce();
        let tx_hash = B256::from(U256::from(nonce));
        state.sends.push(tx.clone());

        let is_upgrade =
            tx.data.len() == 36 && tx.data.starts_with(PROXY_DESCRIPTOR.upgrade_to.as_slice());
        if !is_upgrade {
            return Err(ConnectorError::Reverted { tx_hash });
        }
        let new_implementation = Address::from_word(B256::from_slice(&tx.data[4..]));
        if state.rejecting.contains(&tx.to) {
            return Err(ConnectorError::Reverted { tx_hash });
        }
        if state.frozen.contains(&tx.to) {
            return Ok(TransactionReceipt {
                transaction_hash: tx_hash,
                gas_used: UPGRADE_GAS,
            });
        }

        match state.contracts.get_mut(&tx.to) {
            Some(Contract::Proxy { implementation } | Contract::Beacon { implementation }) => {
                *implementation = new_implementation;
            }
            _ => return Err(ConnectorError::Reverted { tx_hash }),
        }

        Ok(TransactionReceipt {
            transaction_hash: tx_hash,
            gas_used: UPGRADE_GAS,
        })
    }
}

fn artifact(tag: &str, abi: serde_json::Value) -> Artifact {
    Artifact {
        abi: serde_json::from_value(abi).unwrap(),
        bytecode: Bytes::copy_from_slice(tag.as_bytes()),
    }
}

fn view(name: &str, output: &str) -> serde_json::Value {
    json!({
        "type": "function",
        "name": name,
        "stateMutability": "view",
        "inputs": [],
        "outputs": [{"name": "", "type": output}]
    })
}

fn token_initializer() -> serde_json::Value {
    json!({
        "type": "function",
        "name": "initialize",
        "stateMutability": "nonpayable",
        "inputs": [
            {"name": "name", "type": "string"},
            {"name": "symbol", "type": "string"},
            {"name": "decimals", "type": "uint8"},
            {"name": "supply", "type": "uint256"}
        ],
        "outputs": []
    })
}

fn proxy_abi(first: &str) -> serde_json::Value {
    json!([{
        "type": "constructor",
        "stateMutability": "payable",
        "inputs": [
            {"name": first, "type": "address"},
            {"name": "_data", "type": "bytes"}
        ]
    }])
}

/// Token initializer arguments used across the tests.
pub fn token_args() -> Vec<serde_json::Value> {
    vec![json!("Token"), json!("TKN"), json!(18), json!("1000000")]
}

/// Artifacts for the token contracts and the proxy suite.
pub fn artifacts() -> MemoryArtifactStore {
    MemoryArtifactStore::new()
        .with(
            "Token",
            artifact(
                "impl",
                json!([token_initializer(), view("name", "string"), view("totalSupply", "uint256")]),
            ),
        )
        .with(
            "TokenV2",
            artifact(
                "impl",
                json!([token_initializer(), view("name", "string"), view("version", "uint256")]),
            ),
        )
        .with(
            "Counter",
            artifact(
                "impl",
                json!([
                    {
                        "type": "constructor",
                        "stateMutability": "nonpayable",
                        "inputs": [{"name": "start", "type": "uint256"}]
                    },
                    view("count", "uint256")
                ]),
            ),
        )
        .with("Broken", artifact("revert", json!([])))
        .with(
            "Silent",
            artifact("silent", json!([token_initializer(), view("name", "string")])),
        )
        .with("TransparentUpgradeableProxy", artifact("proxy", proxy_abi("_logic")))
        .with("ERC1967Proxy", artifact("proxy", proxy_abi("implementation")))
        .with("BeaconProxy", artifact("beacon-proxy", proxy_abi("beacon")))
        .with(
            "UpgradeableBeacon",
            artifact(
                "beacon",
                json!([{
                    "type": "constructor",
                    "stateMutability": "nonpayable",
                    "inputs": [{"name": "implementation_", "type": "address"}]
                }]),
            ),
        )
}

/// [`artifacts`] without `contract_name`.
pub fn artifacts_without(contract_name: &str) -> MemoryArtifactStore {
    let all = artifacts();
    let mut store = MemoryArtifactStore::new();
    for name in [
        "Token",
        "TokenV2",
        "Counter",
        "Broken",
        "Silent",
        "TransparentUpgradeableProxy",
        "ERC1967Proxy",
        "BeaconProxy",
        "UpgradeableBeacon",
    ] {
        if name != contract_name {
            store.insert(name, all.load_artifact(name).unwrap());
        }
    }
    store
}

/// A manager over a fresh mock chain.
pub fn manager() -> ProxyManager<MockChain, MemoryArtifactStore> {
    init_test_tracing();
    ProxyManager::new(MockChain::new(), artifacts())
}
