//! Core types for the opportunity detector.
//!
//! `DecodedSwap` is the unified record every decoder family emits; the bus
//! envelope wraps it together with transaction context. All amounts travel
//! as base-10 decimal strings and all addresses serialize as lowercase hex
//! so the wire format is stable across consumers.

use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Router families
// ---------------------------------------------------------------------------

/// Which AMM family a swap routes through. Dictates the pool lookup and the
/// price-impact engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouterFamily {
    #[serde(rename = "v2")]
    V2,
    #[serde(rename = "v3")]
    V3,
}

impl RouterFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouterFamily::V2 => "v2",
            RouterFamily::V3 => "v3",
        }
    }
}

impl std::str::FromStr for RouterFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v2" => Ok(RouterFamily::V2),
            "v3" => Ok(RouterFamily::V3),
            other => Err(format!("unknown router family: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Swap methods
// ---------------------------------------------------------------------------

/// Symbolic method tag of a decoded swap.
///
/// Fee-on-transfer V2 variants decode to their base tag; universal-router
/// sub-actions use the command mnemonics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapMethod {
    #[serde(rename = "swapExactTokensForTokens")]
    SwapExactTokensForTokens,
    #[serde(rename = "swapTokensForExactTokens")]
    SwapTokensForExactTokens,
    #[serde(rename = "swapExactETHForTokens")]
    SwapExactEthForTokens,
    #[serde(rename = "swapExactTokensForETH")]
    SwapExactTokensForEth,
    #[serde(rename = "swapETHForExactTokens")]
    SwapEthForExactTokens,
    #[serde(rename = "swapTokensForExactETH")]
    SwapTokensForExactEth,
    #[serde(rename = "exactInputSingle")]
    ExactInputSingle,
    #[serde(rename = "exactInput")]
    ExactInput,
    #[serde(rename = "exactOutputSingle")]
    ExactOutputSingle,
    #[serde(rename = "exactOutput")]
    ExactOutput,
    #[serde(rename = "V3_EXACT_IN")]
    V3ExactIn,
    #[serde(rename = "V3_EXACT_OUT")]
    V3ExactOut,
    #[serde(rename = "V2_EXACT_IN")]
    V2ExactIn,
    #[serde(rename = "V2_EXACT_OUT")]
    V2ExactOut,
}

impl SwapMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapMethod::SwapExactTokensForTokens => "swapExactTokensForTokens",
            SwapMethod::SwapTokensForExactTokens => "swapTokensForExactTokens",
            SwapMethod::SwapExactEthForTokens => "swapExactETHForTokens",
            SwapMethod::SwapExactTokensForEth => "swapExactTokensForETH",
            SwapMethod::SwapEthForExactTokens => "swapETHForExactTokens",
            SwapMethod::SwapTokensForExactEth => "swapTokensForExactETH",
            SwapMethod::ExactInputSingle => "exactInputSingle",
            SwapMethod::ExactInput => "exactInput",
            SwapMethod::ExactOutputSingle => "exactOutputSingle",
            SwapMethod::ExactOutput => "exactOutput",
            SwapMethod::V3ExactIn => "V3_EXACT_IN",
            SwapMethod::V3ExactOut => "V3_EXACT_OUT",
            SwapMethod::V2ExactIn => "V2_EXACT_IN",
            SwapMethod::V2ExactOut => "V2_EXACT_OUT",
        }
    }
}

// ---------------------------------------------------------------------------
// Decoded swap
// ---------------------------------------------------------------------------

/// The unified intermediate record produced by all three decoder families.
///
/// Amount semantics: for exact-out methods `amount_in` is zero (unknown until
/// execution) and `amount_in_max` carries the user's cap; the evaluator
/// substitutes one for the other. `fee` is `"0"` for V2 and the pool fee
/// tier for V3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedSwap {
    pub router: Address,
    pub method: SwapMethod,
    pub router_family: RouterFamily,
    pub token_in: Address,
    pub token_out: Address,
    #[serde(with = "u256_dec")]
    pub amount_in: U256,
    #[serde(with = "u256_dec")]
    pub amount_out: U256,
    #[serde(with = "u256_dec")]
    pub amount_out_min: U256,
    #[serde(with = "u256_dec")]
    pub amount_in_max: U256,
    pub fee: String,
    pub recipient: Address,
    /// Unix seconds as a decimal string; `"0"` when the calldata carried none.
    pub deadline: String,
    pub payer_is_user: bool,
}

// ---------------------------------------------------------------------------
// Bus envelope
// ---------------------------------------------------------------------------

/// Raw transaction fields forwarded alongside the decoded swap, hex-encoded
/// exactly as the node returned them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTx {
    pub hash: String,
    pub to: Option<String>,
    pub from: Option<String>,
    pub value: String,
    pub data: String,
    pub gas_price: Option<String>,
    pub gas_limit: Option<String>,
}

/// JSON envelope published to the transactions topic, keyed by `txHash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxEnvelope {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub decoded_tx: DecodedSwap,
    pub router_address: Address,
    /// Producer-side wall clock, milliseconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_tx: Option<RawTx>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Lowercase `0x`-prefixed hex form of an address, the canonical form for
/// every persisted row and every case-insensitive comparison.
pub fn lower_hex(addr: &Address) -> String {
    format!("0x{}", hex::encode(addr.as_slice()))
}

/// Serde adapter: `U256` as a base-10 decimal string on the wire.
///
/// JSON numbers must not be used for 256-bit amounts; this keeps the bus
/// schema readable by consumers without big-integer JSON support.
pub mod u256_dec {
    use alloy::primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<U256>().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
