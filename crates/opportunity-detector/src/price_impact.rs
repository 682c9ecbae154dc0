//! Price-impact engines.
//!
//! V2 uses the canonical constant-product formula with the 0.3 % swap fee and
//! compares decimal-adjusted marginal prices before and after the trade. V3
//! derives the mid price from `sqrtPriceX96` and compares it against a quoter
//! simulation. Both engines express impact as a percentage; the evaluator
//! stores the fraction.

use alloy::primitives::U256;

/// Result of the V2 constant-product engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct V2Impact {
    /// Projected output in raw tokenOut units.
    pub amount_out: U256,
    /// Absolute relative price change, percent.
    pub impact_pct: f64,
}

/// Constant-product output and price impact for a V2 trade.
///
/// `reserve_in`/`reserve_out` must already be oriented to the trade
/// direction. A zero input or empty reserve yields a zero result.
pub fn v2_price_impact(
    reserve_in: U256,
    reserve_out: U256,
    amount_in: U256,
    decimals_in: u8,
    decimals_out: u8,
) -> V2Impact {
    if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
        return V2Impact { amount_out: U256::ZERO, impact_pct: 0.0 };
    }

    // amountOut = amountIn*997*reserveOut / (reserveIn*1000 + amountIn*997)
    let amount_in_with_fee = amount_in * U256::from(997u64);
    let numerator = amount_in_with_fee * reserve_out;
    let denominator = reserve_in * U256::from(1000u64) + amount_in_with_fee;
    let amount_out = numerator / denominator;

    let reserve_in_h = to_human(reserve_in, decimals_in);
    let reserve_out_h = to_human(reserve_out, decimals_out);
    let amount_in_h = to_human(amount_in, decimals_in);
    let amount_out_h = to_human(amount_out, decimals_out);

    let price_before = reserve_out_h / reserve_in_h;
    let price_after = (reserve_out_h - amount_out_h) / (reserve_in_h + amount_in_h);
    let impact_pct = if price_before > 0.0 {
        ((price_before - price_after).abs() / price_before) * 100.0
    } else {
        0.0
    };

    V2Impact { amount_out, impact_pct }
}

/// Mid price of a V3 pool in tokenOut-per-tokenIn terms.
///
/// `sqrtPriceX96` is the square root of the token1/token0 price in Q96
/// fixed-point: `price1Over0 = sqrtPriceX96^2 / 2^192`, decimal-adjusted by
/// `10^(decimals0 - decimals1)` and inverted when token0 is the output side.
pub fn v3_mid_price(
    sqrt_price_x96: U256,
    token_in_is_token0: bool,
    decimals0: u8,
    decimals1: u8,
) -> f64 {
    let sqrt_price = u256_to_f64(sqrt_price_x96) / 2f64.powi(96);
    let price_1_over_0 = sqrt_price * sqrt_price * 10f64.powi(decimals0 as i32 - decimals1 as i32);

    if token_in_is_token0 {
        price_1_over_0
    } else if price_1_over_0 > 0.0 {
        1.0 / price_1_over_0
    } else {
        0.0
    }
}

/// Signed relative difference between the quoted execution price and the mid
/// price, percent.
pub fn v3_impact_pct(
    amount_in: U256,
    amount_out: U256,
    decimals_in: u8,
    decimals_out: u8,
    mid_price: f64,
) -> f64 {
    let amount_in_h = to_human(amount_in, decimals_in);
    let amount_out_h = to_human(amount_out, decimals_out);
    if amount_in_h <= 0.0 || mid_price <= 0.0 {
        return 0.0;
    }

    let quoted_price = amount_out_h / amount_in_h;
    ((quoted_price - mid_price) / mid_price) * 100.0
}

fn to_human(value: U256, decimals: u8) -> f64 {
    u256_to_f64(value) / 10f64.powi(decimals as i32)
}

/// Lossy but monotone conversion; adequate for price ratios.
fn u256_to_f64(value: U256) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ether(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
    }

    fn usdc(n: u64) -> U256 {
        U256::from(n) * U256::from(1_000_000u64)
    }

    #[test]
    fn test_v2_known_reserves() {
        // 1000 WETH / 2,000,000 USDC pool, selling 10 WETH.
        let result = v2_price_impact(ether(1000), usdc(2_000_000), ether(10), 18, 6);

        // amountOut = 10e18*997*2e12 / (1000e18*1000 + 10e18*997) ≈ 19,743 USDC
        let out = result.amount_out.to_string().parse::<f64>().unwrap() / 1e6;
        assert!((out - 19_743.0).abs() < 2.0, "amount_out was {out}");

        // Mid price moves from 2000 to ~1960.6: just under 2 %.
        assert!(result.impact_pct > 1.9 && result.impact_pct < 2.0);
    }

    #[test]
    fn test_v2_zero_input() {
        let result = v2_price_impact(ether(1000), usdc(2_000_000), U256::ZERO, 18, 6);
        assert_eq!(result.amount_out, U256::ZERO);
        assert_eq!(result.impact_pct, 0.0);
    }

    #[test]
    fn test_v2_empty_reserves() {
        let result = v2_price_impact(U256::ZERO, usdc(2_000_000), ether(1), 18, 6);
        assert_eq!(result.amount_out, U256::ZERO);
        assert_eq!(result.impact_pct, 0.0);
    }

    #[test]
    fn test_v2_small_trade_small_impact() {
        // 0.01 WETH into a 1000 WETH pool: impact well under the 0.5 % gate.
        let amount = U256::from(10u64).pow(U256::from(16u64));
        let result = v2_price_impact(ether(1000), usdc(2_000_000), amount, 18, 6);
        assert!(result.impact_pct < 0.5);
        assert!(result.amount_out > U256::ZERO);
    }

    #[test]
    fn test_v3_mid_price_unit() {
        // sqrtPriceX96 = 2^96 means price token1/token0 = 1 for equal decimals.
        let sqrt_one = U256::from(1u64) << 96;
        let mid = v3_mid_price(sqrt_one, true, 18, 18);
        assert!((mid - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_v3_mid_price_orientation() {
        // price1/0 = 4 → selling token1 sees 1/4.
        let sqrt_two = U256::from(2u64) << 96;
        let forward = v3_mid_price(sqrt_two, true, 18, 18);
        let backward = v3_mid_price(sqrt_two, false, 18, 18);
        assert!((forward - 4.0).abs() < 1e-9);
        assert!((backward - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_v3_mid_price_decimal_adjustment() {
        // Equal raw price but token0 has 18 decimals, token1 has 6:
        // human price scales by 10^(18-6).
        let sqrt_one = U256::from(1u64) << 96;
        let mid = v3_mid_price(sqrt_one, true, 18, 6);
        assert!((mid - 1e12).abs() / 1e12 < 1e-9);
    }

    #[test]
    fn test_v3_impact_sign() {
        // Quote below mid → negative; above mid → positive.
        let below = v3_impact_pct(ether(1), usdc(1_900), 18, 6, 2000.0);
        let above = v3_impact_pct(ether(1), usdc(2_100), 18, 6, 2000.0);
        assert!(below < 0.0);
        assert!(above > 0.0);
        assert!((below + 5.0).abs() < 1e-6);
        assert!((above - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_v3_impact_zero_guards() {
        assert_eq!(v3_impact_pct(U256::ZERO, usdc(1), 18, 6, 2000.0), 0.0);
        assert_eq!(v3_impact_pct(ether(1), usdc(1), 18, 6, 0.0), 0.0);
    }
}
