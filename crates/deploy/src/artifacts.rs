//! Compiled contract artifacts: ABI plus creation bytecode.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use alloy_core::{json_abi::JsonAbi, primitives::Bytes};
use serde::Deserialize;

use crate::Error;

/// A compiled contract as stored by the build tooling.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

/// Source of compiled artifacts, keyed by contract name.
pub trait ArtifactStore: Send + Sync {
    /// Load the artifact for `contract_name`.
    ///
    /// Returns [`Error::ArtifactNotFound`] when no artifact exists.
    fn load_artifact(&self, contract_name: &str) -> Result<Artifact, Error>;
}

/// Bytecode as emitted by Hardhat (a hex string) or Foundry (`{ "object": … }`).
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    Object { object: String },
}

#[derive(Deserialize)]
struct RawArtifact {
    abi: JsonAbi,
    bytecode: RawBytecode,
}

impl RawArtifact {
    fn into_artifact(self, contract: &str) -> Result<Artifact, Error> {
        let hex_str = match self.bytecode {
            RawBytecode::Hex(s) | RawBytecode::Object { object: s } => s,
        };
        let bytecode = hex::decode(hex_str.trim().trim_start_matches("0x")).map_err(|e| {
            Error::Artifact {
                contract: contract.to_string(),
                reason: format!("invalid bytecode hex: {e}"),
            }
        })?;

        if bytecode.is_empty() {
            return Err(Error::Artifact {
                contract: contract.to_string(),
                reason: "empty bytecode (abstract contract or interface?)".to_string(),
            });
        }

        Ok(Artifact {
            abi: self.abi,
            bytecode: bytecode.into(),
        })
    }
}

/// Artifact store backed by a build output directory.
///
/// Looks for `<root>/<Name>.json` first, then the Foundry layout
/// `<root>/<Name>.sol/<Name>.json`.
#[derive(Debug, Clone)]
pub struct DirArtifactStore {
    root: PathBuf,
}

impl DirArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn locate(&self, contract_name: &str) -> Option<PathBuf> {
        [
            self.root.join(format!("{contract_name}.json")),
            self.root
                .join(format!("{contract_name}.sol"))
                .join(format!("{contract_name}.json")),
        ]
        .into_iter()
        .find(|path| path.is_file())
    }
}

impl ArtifactStore for DirArtifactStore {
    fn load_artifact(&self, contract_name: &str) -> Result<Artifact, Error> {
        let path = self
            .locate(contract_name)
            .ok_or_else(|| Error::ArtifactNotFound {
                contract: contract_name.to_string(),
            })?;

        let content = std::fs::read_to_string(&path).map_err(|e| Error::Artifact {
            contract: contract_name.to_string(),
            reason: format!("failed to read {}: {e}", path.display()),
        })?;
        let raw: RawArtifact = serde_json::from_str(&content).map_err(|e| Error::Artifact {
            contract: contract_name.to_string(),
            reason: format!("failed to parse {}: {e}", path.display()),
        })?;

        tracing::debug!(contract = contract_name, path = %path.display(), "Loaded artifact");
        raw.into_artifact(contract_name)
    }
}

/// In-process artifact store.
#[derive(Debug, Clone, Default)]
pub struct MemoryArtifactStore {
    artifacts: HashMap<String, Artifact>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, contract_name: impl Into<String>, artifact: Artifact) {
        self.artifacts.insert(contract_name.into(), artifact);
    }

    pub fn with(mut self, contract_name: impl Into<String>, artifact: Artifact) -> Self {
        self.insert(contract_name, artifact);
        self
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn load_artifact(&self, contract_name: &str) -> Result<Artifact, Error> {
        self.artifacts
            .get(contract_name)
            .cloned()
            .ok_or_else(|| Error::ArtifactNotFound {
                contract: contract_name.to_string(),
            })
    }
}
