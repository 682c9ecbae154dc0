//! ABI decoding for V2-style router swap functions (9 selectors).
//!
//! All V2 methods take an `address[] path`; the unified record keeps only its
//! endpoints. ETH-in methods carry the input amount in `msg.value` and the
//! router requires `path[0]` to be the wrapped-native token, so no address
//! substitution is needed here. Exact-out methods emit `amount_in = 0`
//! ("unknown, use `amount_in_max`").

use alloy::primitives::{Address, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::constants::*;
use crate::types::{DecodedSwap, RouterFamily, SwapMethod};

sol! {
    function swapExactTokensForTokens(
        uint256 amountIn,
        uint256 amountOutMin,
        address[] path,
        address to,
        uint256 deadline
    );

    function swapTokensForExactTokens(
        uint256 amountOut,
        uint256 amountInMax,
        address[] path,
        address to,
        uint256 deadline
    );

    function swapExactETHForTokens(
        uint256 amountOutMin,
        address[] path,
        address to,
        uint256 deadline
    );

    function swapExactTokensForETH(
        uint256 amountIn,
        uint256 amountOutMin,
        address[] path,
        address to,
        uint256 deadline
    );

    function swapETHForExactTokens(
        uint256 amountOut,
        address[] path,
        address to,
        uint256 deadline
    );

    function swapTokensForExactETH(
        uint256 amountOut,
        uint256 amountInMax,
        address[] path,
        address to,
        uint256 deadline
    );

    // Fee-on-transfer variants decode to the same record as their base method.
    function swapExactETHForTokensSupportingFeeOnTransferTokens(
        uint256 amountOutMin,
        address[] path,
        address to,
        uint256 deadline
    );

    function swapExactTokensForETHSupportingFeeOnTransferTokens(
        uint256 amountIn,
        uint256 amountOutMin,
        address[] path,
        address to,
        uint256 deadline
    );

    function swapExactTokensForTokensSupportingFeeOnTransferTokens(
        uint256 amountIn,
        uint256 amountOutMin,
        address[] path,
        address to,
        uint256 deadline
    );
}

/// Decode a V2-style swap from calldata.
///
/// Returns `None` if the selector doesn't match or decoding fails.
pub fn decode_v2(
    router: Address,
    selector: [u8; 4],
    calldata: &[u8],
    value: U256,
) -> Option<DecodedSwap> {
    match selector {
        // --- Exact-in, token input ---
        SEL_SWAP_EXACT_TOKENS_FOR_TOKENS => {
            let call = swapExactTokensForTokensCall::abi_decode(calldata).ok()?;
            let (token_in, token_out) = path_ends(&call.path)?;
            Some(build_swap(
                router,
                SwapMethod::SwapExactTokensForTokens,
                token_in,
                token_out,
                call.amountIn,
                call.amountOutMin,
                U256::ZERO,
                call.to,
                call.deadline,
            ))
        }
        SEL_SWAP_EXACT_TOKENS_FOR_TOKENS_FEE => {
            let call =
                swapExactTokensForTokensSupportingFeeOnTransferTokensCall::abi_decode(calldata)
                    .ok()?;
            let (token_in, token_out) = path_ends(&call.path)?;
            Some(build_swap(
                router,
                SwapMethod::SwapExactTokensForTokens,
                token_in,
                token_out,
                call.amountIn,
                call.amountOutMin,
                U256::ZERO,
                call.to,
                call.deadline,
            ))
        }
        SEL_SWAP_EXACT_TOKENS_FOR_ETH => {
            let call = swapExactTokensForETHCall::abi_decode(calldata).ok()?;
            let (token_in, token_out) = path_ends(&call.path)?;
            Some(build_swap(
                router,
                SwapMethod::SwapExactTokensForEth,
                token_in,
                token_out,
                call.amountIn,
                call.amountOutMin,
                U256::ZERO,
                call.to,
                call.deadline,
            ))
        }
        SEL_SWAP_EXACT_TOKENS_FOR_ETH_FEE => {
            let call =
                swapExactTokensForETHSupportingFeeOnTransferTokensCall::abi_decode(calldata)
                    .ok()?;
            let (token_in, token_out) = path_ends(&call.path)?;
            Some(build_swap(
                router,
                SwapMethod::SwapExactTokensForEth,
                token_in,
                token_out,
                call.amountIn,
                call.amountOutMin,
                U256::ZERO,
                call.to,
                call.deadline,
            ))
        }

        // --- Exact-in, ETH input: msg.value is the amount in ---
        SEL_SWAP_EXACT_ETH_FOR_TOKENS => {
            let call = swapExactETHForTokensCall::abi_decode(calldata).ok()?;
            let (token_in, token_out) = path_ends(&call.path)?;
            Some(build_swap(
                router,
                SwapMethod::SwapExactEthForTokens,
                token_in,
                token_out,
                value,
                call.amountOutMin,
                U256::ZERO,
                call.to,
                call.deadline,
            ))
        }
        SEL_SWAP_EXACT_ETH_FOR_TOKENS_FEE => {
            let call =
                swapExactETHForTokensSupportingFeeOnTransferTokensCall::abi_decode(calldata)
                    .ok()?;
            let (token_in, token_out) = path_ends(&call.path)?;
            Some(build_swap(
                router,
                SwapMethod::SwapExactEthForTokens,
                token_in,
                token_out,
                value,
                call.amountOutMin,
                U256::ZERO,
                call.to,
                call.deadline,
            ))
        }
        SEL_SWAP_ETH_FOR_EXACT_TOKENS => {
            let call = swapETHForExactTokensCall::abi_decode(calldata).ok()?;
            let (token_in, token_out) = path_ends(&call.path)?;
            Some(build_swap(
                router,
                SwapMethod::SwapEthForExactTokens,
                token_in,
                token_out,
                value,
                call.amountOut,
                U256::ZERO,
                call.to,
                call.deadline,
            ))
        }

        // --- Exact-out, token input: amount in unknown until execution ---
        SEL_SWAP_TOKENS_FOR_EXACT_TOKENS => {
            let call = swapTokensForExactTokensCall::abi_decode(calldata).ok()?;
            let (token_in, token_out) = path_ends(&call.path)?;
            Some(build_swap(
                router,
                SwapMethod::SwapTokensForExactTokens,
                token_in,
                token_out,
                U256::ZERO,
                call.amountOut,
                call.amountInMax,
                call.to,
                call.deadline,
            ))
        }
        SEL_SWAP_TOKENS_FOR_EXACT_ETH => {
            let call = swapTokensForExactETHCall::abi_decode(calldata).ok()?;
            let (token_in, token_out) = path_ends(&call.path)?;
            // Historical quirk: this method reports amountInMax as the input
            // amount as well.
            Some(build_swap(
                router,
                SwapMethod::SwapTokensForExactEth,
                token_in,
                token_out,
                call.amountInMax,
                call.amountOut,
                call.amountInMax,
                call.to,
                call.deadline,
            ))
        }

        _ => None,
    }
}

fn path_ends(path: &[Address]) -> Option<(Address, Address)> {
    if path.len() < 2 {
        return None;
    }
    Some((path[0], *path.last().expect("path len >= 2")))
}

fn build_swap(
    router: Address,
    method: SwapMethod,
    token_in: Address,
    token_out: Address,
    amount_in: U256,
    amount_out: U256,
    amount_in_max: U256,
    recipient: Address,
    deadline: U256,
) -> DecodedSwap {
    DecodedSwap {
        router,
        method,
        router_family: RouterFamily::V2,
        token_in,
        token_out,
        amount_in,
        amount_out,
        amount_out_min: amount_out,
        amount_in_max,
        fee: "0".to_string(),
        recipient,
        deadline: deadline.to_string(),
        payer_is_user: false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
    const USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
    const RECIPIENT: Address = address!("1111111111111111111111111111111111111111");

    fn ether(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
    }

    #[test]
    fn test_selectors_match_abi() {
        assert_eq!(swapExactTokensForTokensCall::SELECTOR, SEL_SWAP_EXACT_TOKENS_FOR_TOKENS);
        assert_eq!(swapTokensForExactTokensCall::SELECTOR, SEL_SWAP_TOKENS_FOR_EXACT_TOKENS);
        assert_eq!(swapExactETHForTokensCall::SELECTOR, SEL_SWAP_EXACT_ETH_FOR_TOKENS);
        assert_eq!(swapExactTokensForETHCall::SELECTOR, SEL_SWAP_EXACT_TOKENS_FOR_ETH);
        assert_eq!(swapETHForExactTokensCall::SELECTOR, SEL_SWAP_ETH_FOR_EXACT_TOKENS);
        assert_eq!(swapTokensForExactETHCall::SELECTOR, SEL_SWAP_TOKENS_FOR_EXACT_ETH);
    }

    #[test]
    fn test_exact_in_decodes() {
        let call = swapExactTokensForTokensCall {
            amountIn: ether(10),
            amountOutMin: ether(1),
            path: vec![WETH, USDC],
            to: RECIPIENT,
            deadline: U256::from(1_712_000_600u64),
        };
        let calldata = call.abi_encode();
        let selector: [u8; 4] = calldata[..4].try_into().unwrap();

        let swap = decode_v2(UNISWAP_V2_ROUTER, selector, &calldata, U256::ZERO).unwrap();
        assert_eq!(swap.method, SwapMethod::SwapExactTokensForTokens);
        assert_eq!(swap.router_family, RouterFamily::V2);
        assert_eq!(swap.token_in, WETH);
        assert_eq!(swap.token_out, USDC);
        assert_eq!(swap.amount_in, ether(10));
        assert_eq!(swap.amount_out_min, ether(1));
        assert_eq!(swap.amount_in_max, U256::ZERO);
        assert_eq!(swap.fee, "0");
        assert_eq!(swap.recipient, RECIPIENT);
        assert_eq!(swap.deadline, "1712000600");
    }

    #[test]
    fn test_exact_out_zeroes_amount_in() {
        let call = swapTokensForExactTokensCall {
            amountOut: ether(1),
            amountInMax: ether(5),
            path: vec![USDC, WETH],
            to: RECIPIENT,
            deadline: U256::from(1_712_000_600u64),
        };
        let calldata = call.abi_encode();
        let selector: [u8; 4] = calldata[..4].try_into().unwrap();

        let swap = decode_v2(UNISWAP_V2_ROUTER, selector, &calldata, U256::ZERO).unwrap();
        assert_eq!(swap.amount_in, U256::ZERO);
        assert_eq!(swap.amount_in_max, ether(5));
        assert_eq!(swap.amount_out, ether(1));
    }

    #[test]
    fn test_eth_in_uses_tx_value() {
        let call = swapExactETHForTokensCall {
            amountOutMin: U256::from(1_000_000u64),
            path: vec![WETH, USDC],
            to: RECIPIENT,
            deadline: U256::from(1_712_000_600u64),
        };
        let calldata = call.abi_encode();
        let selector: [u8; 4] = calldata[..4].try_into().unwrap();

        let swap = decode_v2(UNISWAP_V2_ROUTER, selector, &calldata, ether(3)).unwrap();
        assert_eq!(swap.amount_in, ether(3));
        assert_eq!(swap.token_in, WETH);
    }

    #[test]
    fn test_tokens_for_exact_eth_quirk() {
        let call = swapTokensForExactETHCall {
            amountOut: ether(1),
            amountInMax: U256::from(4_000_000_000u64),
            path: vec![USDC, WETH],
            to: RECIPIENT,
            deadline: U256::from(1_712_000_600u64),
        };
        let calldata = call.abi_encode();
        let selector: [u8; 4] = calldata[..4].try_into().unwrap();

        let swap = decode_v2(UNISWAP_V2_ROUTER, selector, &calldata, U256::ZERO).unwrap();
        // amountIn mirrors amountInMax for this method.
        assert_eq!(swap.amount_in, U256::from(4_000_000_000u64));
        assert_eq!(swap.amount_in_max, U256::from(4_000_000_000u64));
    }

    #[test]
    fn test_fee_on_transfer_maps_to_base_method() {
        let call = swapExactTokensForTokensSupportingFeeOnTransferTokensCall {
            amountIn: ether(2),
            amountOutMin: ether(1),
            path: vec![WETH, USDC],
            to: RECIPIENT,
            deadline: U256::from(1_712_000_600u64),
        };
        let calldata = call.abi_encode();
        let selector: [u8; 4] = calldata[..4].try_into().unwrap();

        let swap = decode_v2(UNISWAP_V2_ROUTER, selector, &calldata, U256::ZERO).unwrap();
        assert_eq!(swap.method, SwapMethod::SwapExactTokensForTokens);
    }

    #[test]
    fn test_short_path_rejected() {
        let call = swapExactTokensForTokensCall {
            amountIn: ether(10),
            amountOutMin: ether(1),
            path: vec![WETH],
            to: RECIPIENT,
            deadline: U256::from(1_712_000_600u64),
        };
        let calldata = call.abi_encode();
        let selector: [u8; 4] = calldata[..4].try_into().unwrap();

        assert!(decode_v2(UNISWAP_V2_ROUTER, selector, &calldata, U256::ZERO).is_none());
    }

    #[test]
    fn test_unknown_selector_rejected() {
        assert!(decode_v2(UNISWAP_V2_ROUTER, [0xde, 0xad, 0xbe, 0xef], &[0u8; 68], U256::ZERO)
            .is_none());
    }
}
