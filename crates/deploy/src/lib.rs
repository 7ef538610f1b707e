//! proxyup-deploy - Upgradeable proxy deployment library.
//!
//! This crate deploys contracts behind transparent, UUPS, or beacon proxies,
//! classifies live proxies from their on-chain answers, and upgrades them to
//! new implementations.

pub mod abi;

mod artifacts;
pub use artifacts::{Artifact, ArtifactStore, DirArtifactStore, MemoryArtifactStore};

mod connector;
pub use connector::{ChainConnector, DeployReceipt, TransactionReceipt, TransactionRequest};

mod detect;
pub use detect::{detect_pattern, read_beacon, read_implementation};

mod error;
pub use error::{ConnectorError, Error};

mod manager;
pub use manager::{DeployOptions, DeployedBeacon, ProxyManager};

mod pattern;
pub use pattern::{BEACON_ARTIFACT, PatternSpec, PatternTag, ProxyPattern};

mod records;
pub use records::{BeaconRecord, DeployedProxy, ImplementationRecord, ProxyRecord, UpgradeResult};

pub mod rpc;
pub use rpc::{RpcConfig, RpcConnector};

mod upgrade;
pub use upgrade::UpgradeOptions;

mod validator;
pub use validator::{ImplementationRef, PassThrough, StorageLayoutValidator};

mod verify;
pub use verify::Verification;
