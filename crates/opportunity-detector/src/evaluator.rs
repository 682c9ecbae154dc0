//! Opportunity evaluation.
//!
//! `detect` runs the gate sequence over one decoded swap: token metadata →
//! pool lookup → liquidity admissibility → price impact → profit → deadline
//! → verdict. Required reads (tokens, pool) fail the verdict; transient
//! sub-reads (pool state, quoter) are logged and the evaluation proceeds
//! with whatever data is available.

use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::{Address, Uint, U256};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::cache::{PoolCache, TokenCache};
use crate::config::Config;
use crate::constants::{MIN_PRICE_IMPACT, MIN_V3_LIQUIDITY, V3_QUOTER};
use crate::contracts::IQuoter;
use crate::errors::{DetectorError, Result};
use crate::price_impact::{v2_price_impact, v3_impact_pct, v3_mid_price};
use crate::pool_state::{read_v2_state, read_v3_state};
use crate::providers::RpcPool;
use crate::types::{lower_hex, DecodedSwap, RouterFamily};

pub const REASON_TOKEN_INFO: &str = "Token information not available";
pub const REASON_POOL_NOT_FOUND: &str = "Pool not found";
pub const REASON_TRADE_TOO_LARGE: &str = "Insufficient liquidity: trade > 50% of reserve";
pub const REASON_LOW_LIQUIDITY: &str = "Low liquidity: reserve < 10x trade";
pub const REASON_ZERO_V3_LIQUIDITY: &str = "Zero liquidity in V3 pool";
pub const REASON_VERY_LOW_V3_LIQUIDITY: &str = "Very low V3 liquidity";
pub const REASON_IMPACT_UNAVAILABLE: &str = "Price impact not available";
pub const REASON_IMPACT_BELOW_THRESHOLD: &str = "Price impact below threshold";
pub const REASON_PROFIT_UNAVAILABLE: &str = "Expected profit not available";
pub const REASON_NO_PROFIT: &str = "No expected profit vs. declared minimum output";
pub const REASON_DETECTED: &str = "Profitable opportunity detected";
pub const REASON_DETECTED_EXPIRED: &str = "Opportunity detected but deadline has passed";

/// Verdict for a single decoded swap.
#[derive(Debug, Clone, Default)]
pub struct Detection {
    pub is_opportunity: bool,
    /// Profit in human tokenOut units, when computable.
    pub expected_profit: Option<Decimal>,
    pub expected_profit_formatted: Option<String>,
    /// Price impact as a decimal fraction (0.0023 = 0.23 %).
    pub price_impact: Option<f64>,
    /// Projected output in raw tokenOut units.
    pub amount_out: Option<U256>,
    pub pool_address: Option<String>,
    pub token_in_decimals: Option<u8>,
    pub token_out_decimals: Option<u8>,
    pub reason: String,
    pub time_to_submit_seconds: u64,
    pub deadline_timestamp: Option<i64>,
    pub is_expired: bool,
}

impl Detection {
    fn rejected(reason: &str) -> Self {
        Detection { reason: reason.to_string(), ..Default::default() }
    }
}

pub struct Evaluator {
    config: Arc<Config>,
    rpc: RpcPool,
    tokens: TokenCache,
    pools: PoolCache,
}

impl Evaluator {
    pub fn new(config: Arc<Config>, rpc: RpcPool, tokens: TokenCache, pools: PoolCache) -> Self {
        Self { config, rpc, tokens, pools }
    }

    /// Evaluate one decoded swap against live pool state.
    pub async fn detect(&self, tx_hash: &str, swap: &DecodedSwap) -> Detection {
        // 1. Token metadata, both sides required.
        let (token_in, token_out) = match tokio::join!(
            self.tokens.get_token(swap.token_in),
            self.tokens.get_token(swap.token_out),
        ) {
            (Ok(a), Ok(b)) => (a, b),
            (a, b) => {
                if let Err(e) = a.and(b) {
                    warn!(tx = tx_hash, error = %e, "token resolution failed");
                }
                return Detection::rejected(REASON_TOKEN_INFO);
            }
        };
        let dec_in = token_in.decimals.clamp(0, u8::MAX as i32) as u8;
        let dec_out = token_out.decimals.clamp(0, u8::MAX as i32) as u8;

        // 2. The universal router has no factory(); substitute the canonical
        //    per-family router before the pool lookup.
        let router = if self.config.is_universal_router(&swap.router) {
            self.config.canonical_router(swap.router_family)
        } else {
            swap.router
        };

        // 3. Pool lookup.
        let fee_tier = swap.fee.parse::<u32>().ok().filter(|f| *f > 0);
        let pool = match self
            .pools
            .get_pool(swap.token_in, swap.token_out, router, swap.router_family, fee_tier)
            .await
        {
            Ok(Some(pool)) => pool,
            Ok(None) => return Detection::rejected(REASON_POOL_NOT_FOUND),
            Err(e) => {
                warn!(tx = tx_hash, error = %e, "pool lookup failed");
                return Detection::rejected(REASON_POOL_NOT_FOUND);
            }
        };
        let Ok(pool_addr) = pool.pool_address.parse::<Address>() else {
            warn!(tx = tx_hash, pool = %pool.pool_address, "stored pool address invalid");
            return Detection::rejected(REASON_POOL_NOT_FOUND);
        };

        let mut detection = Detection {
            pool_address: Some(pool.pool_address.clone()),
            token_in_decimals: Some(dec_in),
            token_out_decimals: Some(dec_out),
            ..Default::default()
        };

        // 4. Effective input: exact-out swaps carry zero amountIn.
        let amount_in_effective = effective_amount_in(swap);

        // 5 + 6. Liquidity admissibility and price impact, per family. State
        //    read failures are transient: log and continue without impact.
        match swap.router_family {
            RouterFamily::V2 => match read_v2_state(&self.rpc, pool_addr).await {
                Ok(state) => {
                    let (reserve_in, reserve_out) = state.oriented_reserves(swap.token_in);
                    if let Some(reason) = v2_liquidity_gate(amount_in_effective, reserve_in) {
                        detection.reason = reason.to_string();
                        return detection;
                    }
                    let impact = v2_price_impact(
                        reserve_in,
                        reserve_out,
                        amount_in_effective,
                        dec_in,
                        dec_out,
                    );
                    detection.price_impact = Some(impact.impact_pct / 100.0);
                    detection.amount_out = Some(impact.amount_out);
                }
                Err(e) => {
                    warn!(tx = tx_hash, pool = %pool.pool_address, error = %e, "v2 state read failed, continuing");
                }
            },
            RouterFamily::V3 => match read_v3_state(&self.rpc, pool_addr).await {
                Ok(state) => {
                    if let Some(reason) = v3_liquidity_gate(amount_in_effective, state.liquidity) {
                        detection.reason = reason.to_string();
                        return detection;
                    }

                    let token_in_is_token0 = swap.token_in == state.token0;
                    let (dec0, dec1) =
                        if token_in_is_token0 { (dec_in, dec_out) } else { (dec_out, dec_in) };
                    let mid =
                        v3_mid_price(state.sqrt_price_x96, token_in_is_token0, dec0, dec1);

                    match self
                        .quote_v3(swap.token_in, swap.token_out, state.fee, amount_in_effective, pool_addr)
                        .await
                    {
                        Ok(quoted) => {
                            detection.amount_out = Some(quoted);
                            detection.price_impact = Some(
                                v3_impact_pct(amount_in_effective, quoted, dec_in, dec_out, mid)
                                    / 100.0,
                            );
                        }
                        Err(e) => {
                            warn!(tx = tx_hash, pool = %pool.pool_address, error = %e, "quoter failed, no impact data");
                        }
                    }
                }
                Err(e) => {
                    warn!(tx = tx_hash, pool = %pool.pool_address, error = %e, "v3 state read failed, continuing");
                }
            },
        }

        // 7. Profit vs. the user-declared minimum output.
        detection.expected_profit = detection
            .amount_out
            .and_then(|out| expected_profit(out, dec_out, swap.amount_out_min, dec_in));
        detection.expected_profit_formatted =
            detection.expected_profit.map(|p| p.normalize().to_string());

        // 8. Deadline.
        let now = Utc::now().timestamp();
        let (time_to_submit, is_expired, deadline_ts) = deadline_gate(&swap.deadline, now);
        detection.time_to_submit_seconds = time_to_submit;
        detection.is_expired = is_expired;
        detection.deadline_timestamp = deadline_ts;

        // 9. Verdict.
        let profitable = detection.expected_profit.is_some_and(|p| p > Decimal::ZERO);
        let impactful = detection.price_impact.is_some_and(|i| i >= MIN_PRICE_IMPACT);
        detection.is_opportunity = profitable && impactful;

        detection.reason = if detection.is_opportunity {
            if is_expired { REASON_DETECTED_EXPIRED } else { REASON_DETECTED }
        } else if detection.price_impact.is_none() {
            REASON_IMPACT_UNAVAILABLE
        } else if !impactful {
            REASON_IMPACT_BELOW_THRESHOLD
        } else if detection.expected_profit.is_none() {
            REASON_PROFIT_UNAVAILABLE
        } else {
            REASON_NO_PROFIT
        }
        .to_string();

        debug!(
            tx = tx_hash,
            opportunity = detection.is_opportunity,
            impact = ?detection.price_impact,
            profit = ?detection.expected_profit_formatted,
            reason = %detection.reason,
            "evaluated"
        );
        detection
    }

    /// Simulate the swap through the V3 quoter (eth_call; no state change).
    async fn quote_v3(
        &self,
        token_in: Address,
        token_out: Address,
        fee: u32,
        amount_in: U256,
        pool: Address,
    ) -> Result<U256> {
        self.rpc
            .with_retry("quoteExactInputSingle", |provider| async move {
                IQuoter::new(V3_QUOTER, provider)
                    .quoteExactInputSingle(
                        token_in,
                        token_out,
                        Uint::from(fee),
                        amount_in,
                        Uint::ZERO,
                    )
                    .call()
                    .await
                    .map_err(|e| DetectorError::QuoterRevert {
                        pool: lower_hex(&pool),
                        reason: e.to_string(),
                    })
            })
            .await
    }
}

/// V2 admissibility: the trade must not exceed half the input-side reserve,
/// and the reserve must cover the trade at least tenfold. A zero amount
/// skips the gates (nothing to size against).
fn v2_liquidity_gate(amount_in: U256, reserve_in: U256) -> Option<&'static str> {
    if amount_in.is_zero() {
        return None;
    }
    match amount_in.checked_mul(U256::from(2u64)) {
        Some(doubled) if doubled <= reserve_in => {}
        _ => return Some(REASON_TRADE_TOO_LARGE),
    }
    match amount_in.checked_mul(U256::from(10u64)) {
        Some(tenfold) if reserve_in >= tenfold => None,
        _ => Some(REASON_LOW_LIQUIDITY),
    }
}

/// V3 admissibility: in-range liquidity must be present and above the floor.
fn v3_liquidity_gate(amount_in: U256, liquidity: u128) -> Option<&'static str> {
    if amount_in.is_zero() {
        return None;
    }
    if liquidity == 0 {
        return Some(REASON_ZERO_V3_LIQUIDITY);
    }
    if liquidity < MIN_V3_LIQUIDITY {
        return Some(REASON_VERY_LOW_V3_LIQUIDITY);
    }
    None
}

/// Exact-out swaps encode `amount_in = 0`; fall back to the user's input cap.
fn effective_amount_in(swap: &DecodedSwap) -> U256 {
    if swap.amount_in.is_zero() && !swap.amount_in_max.is_zero() {
        swap.amount_in_max
    } else {
        swap.amount_in
    }
}

/// Profit in human units: projected output less the declared minimum.
///
/// The minimum is scaled by the input token's decimals, matching the
/// original arithmetic of the verdict writer. Equality yields zero profit;
/// a minimum above the projection yields `None` (no profit computable).
fn expected_profit(
    amount_out: U256,
    decimals_out: u8,
    amount_out_min: U256,
    decimals_in: u8,
) -> Option<Decimal> {
    let out = to_human_decimal(amount_out, decimals_out)?;
    let min = to_human_decimal(amount_out_min, decimals_in)?;
    if out > min {
        Some(out - min)
    } else if out == min {
        Some(Decimal::ZERO)
    } else {
        None
    }
}

/// Classify the swap deadline against `now` (unix seconds).
///
/// Returns `(time_to_submit_seconds, is_expired, deadline_timestamp)`.
/// Unparseable or elapsed deadlines classify as expired.
fn deadline_gate(deadline: &str, now: i64) -> (u64, bool, Option<i64>) {
    match deadline.parse::<i64>() {
        Ok(d) if d > now => ((d - now) as u64, false, Some(d)),
        Ok(d) => (0, true, Some(d)),
        Err(_) => (0, true, None),
    }
}

fn to_human_decimal(value: U256, decimals: u8) -> Option<Decimal> {
    let mut d = Decimal::from_str(&value.to_string()).ok()?;
    d.set_scale(decimals as u32).ok()?;
    Some(d)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use crate::types::SwapMethod;

    fn ether(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
    }

    fn swap_with_amounts(amount_in: U256, amount_in_max: U256) -> DecodedSwap {
        DecodedSwap {
            router: address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D"),
            method: SwapMethod::SwapTokensForExactTokens,
            router_family: RouterFamily::V2,
            token_in: address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
            token_out: address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
            amount_in,
            amount_out: U256::ZERO,
            amount_out_min: U256::ZERO,
            amount_in_max,
            fee: "0".to_string(),
            recipient: address!("1111111111111111111111111111111111111111"),
            deadline: "0".to_string(),
            payer_is_user: false,
        }
    }

    #[test]
    fn test_effective_amount_prefers_amount_in() {
        let swap = swap_with_amounts(ether(3), ether(5));
        assert_eq!(effective_amount_in(&swap), ether(3));
    }

    #[test]
    fn test_effective_amount_falls_back_to_max() {
        let swap = swap_with_amounts(U256::ZERO, ether(5));
        assert_eq!(effective_amount_in(&swap), ether(5));
    }

    #[test]
    fn test_effective_amount_zero_when_both_zero() {
        let swap = swap_with_amounts(U256::ZERO, U256::ZERO);
        assert_eq!(effective_amount_in(&swap), U256::ZERO);
    }

    #[test]
    fn test_profit_positive_across_decimals() {
        // ~19,742 USDC (6 decimals) out vs. a 1e18-raw minimum scaled by the
        // input token's 18 decimals: profit just under 19,742.
        let out = U256::from(19_742_000_000u64);
        let min = ether(1);
        let profit = expected_profit(out, 6, min, 18).unwrap();
        assert_eq!(profit, Decimal::from_str("19741").unwrap());
    }

    #[test]
    fn test_profit_equality_is_zero() {
        let out = U256::from(5_000_000u64);
        let min = U256::from(5_000_000u64);
        assert_eq!(expected_profit(out, 6, min, 6), Some(Decimal::ZERO));
    }

    #[test]
    fn test_profit_negative_is_none() {
        let out = U256::from(1_000_000u64);
        let min = U256::from(5_000_000u64);
        assert_eq!(expected_profit(out, 6, min, 6), None);
    }

    #[test]
    fn test_deadline_in_future() {
        let (tts, expired, ts) = deadline_gate("1000600", 1_000_000);
        assert_eq!(tts, 600);
        assert!(!expired);
        assert_eq!(ts, Some(1_000_600));
    }

    #[test]
    fn test_deadline_elapsed() {
        let (tts, expired, ts) = deadline_gate("999999", 1_000_000);
        assert_eq!(tts, 0);
        assert!(expired);
        assert_eq!(ts, Some(999_999));
    }

    #[test]
    fn test_deadline_unparseable() {
        let (tts, expired, ts) = deadline_gate("not-a-number", 1_000_000);
        assert_eq!(tts, 0);
        assert!(expired);
        assert_eq!(ts, None);
    }

    #[test]
    fn test_v2_gate_rejects_oversized_trade() {
        // Strictly more than half the reserve.
        let reason = v2_liquidity_gate(ether(51), ether(100));
        assert_eq!(reason, Some(REASON_TRADE_TOO_LARGE));
    }

    #[test]
    fn test_v2_gate_exact_half_fails_coverage_rule() {
        // Exactly half the reserve passes the 50 % rule (strict >) but the
        // reserve is only 2x the trade, failing the 10x coverage rule.
        let reason = v2_liquidity_gate(ether(50), ether(100));
        assert_eq!(reason, Some(REASON_LOW_LIQUIDITY));
    }

    #[test]
    fn test_v2_gate_passes_well_covered_trade() {
        assert_eq!(v2_liquidity_gate(ether(10), ether(100)), None);
        assert_eq!(v2_liquidity_gate(U256::ZERO, ether(100)), None);
    }

    #[test]
    fn test_v2_gate_overflow_rejects() {
        assert_eq!(v2_liquidity_gate(U256::MAX, ether(100)), Some(REASON_TRADE_TOO_LARGE));
    }

    #[test]
    fn test_v3_gate() {
        assert_eq!(v3_liquidity_gate(ether(1), 0), Some(REASON_ZERO_V3_LIQUIDITY));
        assert_eq!(v3_liquidity_gate(ether(1), 999), Some(REASON_VERY_LOW_V3_LIQUIDITY));
        assert_eq!(v3_liquidity_gate(ether(1), 10u128.pow(13)), None);
        assert_eq!(v3_liquidity_gate(U256::ZERO, 0), None);
    }

    #[test]
    fn test_rejection_carries_reason() {
        let d = Detection::rejected(REASON_POOL_NOT_FOUND);
        assert!(!d.is_opportunity);
        assert_eq!(d.reason, REASON_POOL_NOT_FOUND);
        assert!(d.price_impact.is_none());
    }
}
