//! Canonical router addresses, swap function selectors, command bytes, and
//! detection thresholds for Ethereum mainnet.

use alloy::primitives::{address, Address};

// ---------------------------------------------------------------------------
// Router allow-lists (overridable via environment, see config.rs)
// ---------------------------------------------------------------------------

pub const UNISWAP_UNIVERSAL_ROUTER: Address = address!("3fC91A3afd70395Cd496C647d5a6CC9D4B2b7FAD");
pub const UNISWAP_UNIVERSAL_ROUTER_OLD: Address = address!("Ef1c6E67703c7BD7107eed8303Fbe6EC2554BF6B");
pub const UNISWAP_V2_ROUTER: Address = address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D");
pub const PANCAKE_V2_ROUTER: Address = address!("D99D1c33F9fC3444f8101754aBC46c52416550D1");
pub const UNISWAP_V3_ROUTER: Address = address!("E592427A0AEce92De3Edee1F18E0157C05861564");
pub const UNISWAP_V3_ROUTER_02: Address = address!("68b3465833fb72A70ecDF485E0e4C7bD8665Fc45");

pub const DEFAULT_UNIVERSAL_ROUTERS: [Address; 2] =
    [UNISWAP_UNIVERSAL_ROUTER, UNISWAP_UNIVERSAL_ROUTER_OLD];
pub const DEFAULT_V2_ROUTERS: [Address; 2] = [UNISWAP_V2_ROUTER, PANCAKE_V2_ROUTER];
pub const DEFAULT_V3_ROUTERS: [Address; 2] = [UNISWAP_V3_ROUTER, UNISWAP_V3_ROUTER_02];

/// The universal router exposes no `factory()`; pool lookups for its
/// sub-actions substitute these per-family canonical routers.
pub const CANONICAL_V2_ROUTER: Address = UNISWAP_V2_ROUTER;
pub const CANONICAL_V3_ROUTER: Address = UNISWAP_V3_ROUTER;

/// Uniswap V3 Quoter (quoteExactInputSingle via eth_call).
pub const V3_QUOTER: Address = address!("b27308f9F90D607463bb33eA1BeBb41C27CE5AB6");

// ---------------------------------------------------------------------------
// Swap function selectors
// ---------------------------------------------------------------------------

// V2 selectors (9)
pub const SEL_SWAP_EXACT_ETH_FOR_TOKENS: [u8; 4] = [0x7f, 0xf3, 0x6a, 0xb5];
pub const SEL_SWAP_EXACT_TOKENS_FOR_ETH: [u8; 4] = [0x18, 0xcb, 0xaf, 0xe5];
pub const SEL_SWAP_EXACT_TOKENS_FOR_TOKENS: [u8; 4] = [0x38, 0xed, 0x17, 0x39];
pub const SEL_SWAP_TOKENS_FOR_EXACT_TOKENS: [u8; 4] = [0x88, 0x03, 0xdb, 0xee];
pub const SEL_SWAP_EXACT_ETH_FOR_TOKENS_FEE: [u8; 4] = [0xb6, 0xf9, 0xde, 0x95];
pub const SEL_SWAP_ETH_FOR_EXACT_TOKENS: [u8; 4] = [0xfb, 0x3b, 0xdb, 0x41];
pub const SEL_SWAP_EXACT_TOKENS_FOR_TOKENS_FEE: [u8; 4] = [0x5c, 0x11, 0xd7, 0x95];
pub const SEL_SWAP_EXACT_TOKENS_FOR_ETH_FEE: [u8; 4] = [0x79, 0x1a, 0xc9, 0x47];
pub const SEL_SWAP_TOKENS_FOR_EXACT_ETH: [u8; 4] = [0x4a, 0x25, 0xd9, 0x4a];

// V3 selectors (4)
pub const SEL_EXACT_INPUT_SINGLE: [u8; 4] = [0x41, 0x4b, 0xf3, 0x89];
pub const SEL_EXACT_INPUT: [u8; 4] = [0xc0, 0x4b, 0x8d, 0x59];
pub const SEL_EXACT_OUTPUT_SINGLE: [u8; 4] = [0xdb, 0x3e, 0x21, 0x98];
pub const SEL_EXACT_OUTPUT: [u8; 4] = [0xf2, 0x8c, 0x04, 0x98];

// Universal Router execute selectors (2)
pub const SEL_EXECUTE_DEADLINE: [u8; 4] = [0x35, 0x93, 0x56, 0x4c];
pub const SEL_EXECUTE: [u8; 4] = [0x24, 0x85, 0x6b, 0xc3];

// ---------------------------------------------------------------------------
// Universal Router command bytes
// ---------------------------------------------------------------------------

/// The lower 5 bits of a command byte hold the command type; the high bits
/// are execution flags.
pub const UR_COMMAND_MASK: u8 = 0x1f;

pub const UR_V3_SWAP_EXACT_IN: u8 = 0x00;
pub const UR_V3_SWAP_EXACT_OUT: u8 = 0x01;
pub const UR_V2_SWAP_EXACT_IN: u8 = 0x08;
pub const UR_V2_SWAP_EXACT_OUT: u8 = 0x09;

// ---------------------------------------------------------------------------
// Detection thresholds and timeouts
// ---------------------------------------------------------------------------

/// Minimum price impact (as a fraction) for an opportunity verdict.
pub const MIN_PRICE_IMPACT: f64 = 0.005;

/// V3 pools below this raw liquidity are rejected.
pub const MIN_V3_LIQUIDITY: u128 = 1_000_000_000_000;

/// Historical artifact: V2 pools persist with this fee tier string even
/// though V2 has no per-pool fee. Kept opaque for schema compatibility.
pub const DEFAULT_POOL_FEE: u32 = 2500;

/// Per-call RPC timeout (seconds).
pub const RPC_CALL_TIMEOUT_SECS: u64 = 10;

/// Factory pool-lookup timeout (seconds).
pub const POOL_LOOKUP_TIMEOUT_SECS: u64 = 15;

/// Retry policy: up to 3 attempts, backoff 500 * 2^(n-1) ms.
pub const MAX_RPC_ATTEMPTS: u32 = 3;
pub const RETRY_BASE_DELAY_MS: u64 = 500;

/// Bus messages older than this are dropped by the consumer (seconds).
pub const DEFAULT_MAX_MESSAGE_AGE_SECS: i64 = 600;

/// Pending hashes received during this window after tap start are dropped
/// (reconnection backlog suppression), seconds.
pub const TAP_STARTUP_GRACE_SECS: u64 = 1;
