//! Registry of the supported proxy patterns.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Artifact name of the beacon contract deployed for [`ProxyPattern::Beacon`].
pub const BEACON_ARTIFACT: &str = "UpgradeableBeacon";

/// The proxy patterns this crate can deploy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProxyPattern {
    /// Transparent proxy: admin calls are answered by the proxy itself.
    Transparent,
    /// UUPS: upgrade logic lives in the implementation (ERC-1822 / ERC-1967).
    Uups,
    /// Beacon proxy: the implementation is read from a shared beacon.
    Beacon,
}

/// Static deployment configuration of a [`ProxyPattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternSpec {
    /// Name of the proxy artifact in the artifact store.
    pub proxy_artifact: &'static str,
    /// Whether an intermediate beacon must be deployed first.
    pub requires_beacon: bool,
}

impl ProxyPattern {
    /// Resolve a pattern literal, rejecting anything outside the supported set.
    pub fn from_literal(literal: &str) -> Result<Self, Error> {
        Self::from_str(literal.trim()).map_err(|_| Error::UnsupportedPattern {
            pattern: literal.to_string(),
        })
    }

    pub const fn spec(self) -> PatternSpec {
        match self {
            ProxyPattern::Transparent => PatternSpec {
                proxy_artifact: "TransparentUpgradeableProxy",
                requires_beacon: false,
            },
            ProxyPattern::Uups => PatternSpec {
                proxy_artifact: "ERC1967Proxy",
                requires_beacon: false,
            },
            ProxyPattern::Beacon => PatternSpec {
                proxy_artifact: "BeaconProxy",
                requires_beacon: true,
            },
        }
    }
}

/// Classification of an on-chain proxy as observed by the pattern detector.
///
/// Transparent and UUPS proxies answer the same `implementation()` probe, so
/// both are reported as [`PatternTag::AddressExposing`]. No further probe is
/// attempted to tell them apart.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PatternTag {
    /// Transparent or UUPS: exposes `implementation()` directly.
    AddressExposing,
    /// Beacon proxy: exposes `getBeacon()`.
    Beacon,
    /// Neither probe succeeded. Never an operating state.
    Unknown,
}

impl PatternTag {
    /// Whether this classification is consistent with a requested pattern.
    pub fn admits(self, pattern: ProxyPattern) -> bool {
        matches!(
            (self, pattern),
            (
                PatternTag::AddressExposing,
                ProxyPattern::Transparent | ProxyPattern::Uups
            ) | (PatternTag::Beacon, ProxyPattern::Beacon)
        )
    }

    /// The classification a freshly deployed proxy of `pattern` should produce.
    pub fn expected_for(pattern: ProxyPattern) -> Self {
        match pattern {
            ProxyPattern::Transparent | ProxyPattern::Uups => PatternTag::AddressExposing,
            ProxyPattern::Beacon => PatternTag::Beacon,
        }
    }

    pub fn is_known(self) -> bool {
        self != PatternTag::Unknown
    }
}
