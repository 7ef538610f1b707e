//! Read-only classification of on-chain proxies.

use alloy_core::primitives::{Address, Selector};

use crate::{
    ChainConnector, PatternTag,
    abi::{PROXY_DESCRIPTOR, PatternDescriptor, address_from_response},
};

/// Issue a zero-argument probe and extract an address from the answer.
///
/// Call failures and malformed answers both count as "no usable result".
async fn probe<C: ChainConnector>(
    connector: &C,
    target: Address,
    selector: Selector,
) -> Option<Address> {
    match connector
        .call(target, PatternDescriptor::probe(selector))
        .await
    {
        Ok(response) => {
            let address = address_from_response(&response);
            if address.is_none() {
                tracing::debug!(
                    target = %target,
                    selector = %selector,
                    response_len = response.len(),
                    "Probe returned no usable address"
                );
            }
            address
        }
        Err(e) => {
            tracing::debug!(target = %target, selector = %selector, error = %e, "Probe call failed");
            None
        }
    }
}

/// Read the implementation address exposed by `target` (a proxy or a beacon).
pub async fn read_implementation<C: ChainConnector>(
    connector: &C,
    target: Address,
) -> Option<Address> {
    probe(connector, target, PROXY_DESCRIPTOR.implementation).await
}

/// Read the beacon address a beacon proxy points at.
pub async fn read_beacon<C: ChainConnector>(connector: &C, proxy: Address) -> Option<Address> {
    probe(connector, proxy, PROXY_DESCRIPTOR.beacon).await
}

/// Classify the proxy at `proxy`.
///
/// The `implementation()` probe runs first; any usable answer classifies the
/// proxy as [`PatternTag::AddressExposing`], which covers both transparent and
/// UUPS proxies. Otherwise the `getBeacon()` probe decides between
/// [`PatternTag::Beacon`] and [`PatternTag::Unknown`].
///
/// Never fails and never writes. Callers must treat `Unknown` as an error.
pub async fn detect_pattern<C: ChainConnector>(connector: &C, proxy: Address) -> PatternTag {
    let tag = if read_implementation(connector, proxy).await.is_some() {
        PatternTag::AddressExposing
    } else if read_beacon(connector, proxy).await.is_some() {
        PatternTag::Beacon
    } else {
        PatternTag::Unknown
    };

    tracing::debug!(proxy = %proxy, pattern = %tag, "Detected proxy pattern");
    tag
}
