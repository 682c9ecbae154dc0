//! Top-level swap transaction decoder.
//!
//! Dispatches to the family sub-decoder based on the router address. All
//! decoders are pure: calldata in, zero or more [`DecodedSwap`]s out. Decode
//! misses are values, never errors — the vast majority of pending
//! transactions are not swaps on monitored routers.

pub mod universal;
pub mod v2;
pub mod v3;

use alloy::primitives::{Address, U256};
use tracing::trace;

use crate::config::{Config, RouterKind};
use crate::types::DecodedSwap;

/// Attempt to decode a pending transaction as one or more DEX swaps.
///
/// Returns an empty vec if:
/// - The `to` address is not on any router allow-list
/// - The calldata is too short (< 4 bytes)
/// - The function selector is not recognized
/// - ABI decoding fails
pub fn decode_transaction(
    config: &Config,
    to: Address,
    calldata: &[u8],
    value: U256,
) -> Vec<DecodedSwap> {
    let Some(kind) = config.router_family_of(&to) else {
        return Vec::new();
    };

    if calldata.len() < 4 {
        return Vec::new();
    }

    let selector: [u8; 4] = calldata[..4].try_into().expect("slice is exactly 4 bytes");

    let swaps = match kind {
        RouterKind::V2 => v2::decode_v2(to, selector, calldata, value)
            .map(|s| vec![s])
            .unwrap_or_default(),
        RouterKind::V3 => v3::decode_v3(to, selector, calldata)
            .map(|s| vec![s])
            .unwrap_or_default(),
        RouterKind::Universal => universal::decode_universal(to, selector, calldata, value),
    };

    if !swaps.is_empty() {
        trace!(
            router = %to,
            selector = %hex::encode(selector),
            count = swaps.len(),
            "decoded swap(s)"
        );
    }

    swaps
}
