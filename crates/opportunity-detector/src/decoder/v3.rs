//! ABI decoding for V3 concentrated-liquidity router swap functions.
//!
//! The single-hop variants carry both tokens and the fee tier directly; the
//! multi-hop variants carry a packed path `token(20) ‖ fee(3) ‖ token(20) …`
//! decoded by walking 23-byte stride windows. Exact-output paths are encoded
//! in reverse: the output token comes first.

use alloy::primitives::{Address, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::constants::*;
use crate::types::{DecodedSwap, RouterFamily, SwapMethod};

sol! {
    struct ExactInputSingleParams {
        address tokenIn;
        address tokenOut;
        uint24 fee;
        address recipient;
        uint256 deadline;
        uint256 amountIn;
        uint256 amountOutMinimum;
        uint160 sqrtPriceLimitX96;
    }

    struct ExactInputParams {
        bytes path;
        address recipient;
        uint256 deadline;
        uint256 amountIn;
        uint256 amountOutMinimum;
    }

    struct ExactOutputSingleParams {
        address tokenIn;
        address tokenOut;
        uint24 fee;
        address recipient;
        uint256 deadline;
        uint256 amountOut;
        uint256 amountInMaximum;
        uint160 sqrtPriceLimitX96;
    }

    struct ExactOutputParams {
        bytes path;
        address recipient;
        uint256 deadline;
        uint256 amountOut;
        uint256 amountInMaximum;
    }

    function exactInputSingle(ExactInputSingleParams params);
    function exactInput(ExactInputParams params);
    function exactOutputSingle(ExactOutputSingleParams params);
    function exactOutput(ExactOutputParams params);
}

/// Decode a V3 router swap from calldata.
pub fn decode_v3(router: Address, selector: [u8; 4], calldata: &[u8]) -> Option<DecodedSwap> {
    match selector {
        SEL_EXACT_INPUT_SINGLE => {
            let p = exactInputSingleCall::abi_decode(calldata).ok()?.params;
            Some(build_swap(
                router,
                SwapMethod::ExactInputSingle,
                p.tokenIn,
                p.tokenOut,
                p.amountIn,
                p.amountOutMinimum,
                U256::ZERO,
                p.fee.to::<u32>(),
                p.recipient,
                p.deadline,
            ))
        }
        SEL_EXACT_INPUT => {
            let p = exactInputCall::abi_decode(calldata).ok()?.params;
            let (token_in, token_out, fee) = parse_packed_path(&p.path)?;
            Some(build_swap(
                router,
                SwapMethod::ExactInput,
                token_in,
                token_out,
                p.amountIn,
                p.amountOutMinimum,
                U256::ZERO,
                fee,
                p.recipient,
                p.deadline,
            ))
        }
        SEL_EXACT_OUTPUT_SINGLE => {
            let p = exactOutputSingleCall::abi_decode(calldata).ok()?.params;
            Some(build_swap(
                router,
                SwapMethod::ExactOutputSingle,
                p.tokenIn,
                p.tokenOut,
                U256::ZERO,
                p.amountOut,
                p.amountInMaximum,
                p.fee.to::<u32>(),
                p.recipient,
                p.deadline,
            ))
        }
        SEL_EXACT_OUTPUT => {
            let p = exactOutputCall::abi_decode(calldata).ok()?.params;
            // Exact-output paths are reversed: output token first.
            let (token_out, token_in, fee) = parse_packed_path(&p.path)?;
            Some(build_swap(
                router,
                SwapMethod::ExactOutput,
                token_in,
                token_out,
                U256::ZERO,
                p.amountOut,
                p.amountInMaximum,
                fee,
                p.recipient,
                p.deadline,
            ))
        }
        _ => None,
    }
}

/// Walk a packed V3 path in 23-byte strides, returning the first token, the
/// last token, and the last fee tier observed.
///
/// Minimum valid length is one hop: 20 + 3 + 20 = 43 bytes.
pub fn parse_packed_path(path: &[u8]) -> Option<(Address, Address, u32)> {
    if path.len() < 43 || (path.len() - 20) % 23 != 0 {
        return None;
    }

    let first = Address::from_slice(&path[..20]);
    let mut last = first;
    let mut last_fee = 0u32;

    let mut offset = 20;
    while offset + 23 <= path.len() {
        last_fee = u32::from_be_bytes([0, path[offset], path[offset + 1], path[offset + 2]]);
        last = Address::from_slice(&path[offset + 3..offset + 23]);
        offset += 23;
    }

    Some((first, last, last_fee))
}

fn build_swap(
    router: Address,
    method: SwapMethod,
    token_in: Address,
    token_out: Address,
    amount_in: U256,
    amount_out: U256,
    amount_in_max: U256,
    fee: u32,
    recipient: Address,
    deadline: U256,
) -> DecodedSwap {
    DecodedSwap {
        router,
        method,
        router_family: RouterFamily::V3,
        token_in,
        token_out,
        amount_in,
        amount_out,
        amount_out_min: amount_out,
        amount_in_max,
        fee: fee.to_string(),
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
    use alloy::primitives::{address, Bytes};

    const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
    const USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
    const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
    const RECIPIENT: Address = address!("1111111111111111111111111111111111111111");

    fn ether(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
    }

    fn pack_path(hops: &[(Address, u32)], last: Address) -> Vec<u8> {
        let mut path = Vec::new();
        for (token, fee) in hops {
            path.extend_from_slice(token.as_slice());
            path.extend_from_slice(&fee.to_be_bytes()[1..4]);
        }
        path.extend_from_slice(last.as_slice());
        path
    }

    #[test]
    fn test_selectors_match_abi() {
        assert_eq!(exactInputSingleCall::SELECTOR, SEL_EXACT_INPUT_SINGLE);
        assert_eq!(exactInputCall::SELECTOR, SEL_EXACT_INPUT);
        assert_eq!(exactOutputSingleCall::SELECTOR, SEL_EXACT_OUTPUT_SINGLE);
        assert_eq!(exactOutputCall::SELECTOR, SEL_EXACT_OUTPUT);
    }

    #[test]
    fn test_exact_input_single() {
        let call = exactInputSingleCall {
            params: ExactInputSingleParams {
                tokenIn: WETH,
                tokenOut: USDC,
                fee: alloy::primitives::Uint::from(3000u32),
                recipient: RECIPIENT,
                deadline: U256::from(1_712_000_600u64),
                amountIn: ether(5),
                amountOutMinimum: U256::from(9_000_000_000u64),
                sqrtPriceLimitX96: alloy::primitives::Uint::ZERO,
            },
        };
        let calldata = call.abi_encode();
        let selector: [u8; 4] = calldata[..4].try_into().unwrap();

        let swap = decode_v3(UNISWAP_V3_ROUTER, selector, &calldata).unwrap();
        assert_eq!(swap.router_family, RouterFamily::V3);
        assert_eq!(swap.method, SwapMethod::ExactInputSingle);
        assert_eq!(swap.token_in, WETH);
        assert_eq!(swap.token_out, USDC);
        assert_eq!(swap.amount_in, ether(5));
        assert_eq!(swap.fee, "3000");
        assert_eq!(swap.deadline, "1712000600");
    }

    #[test]
    fn test_exact_input_multi_hop_path() {
        let path = pack_path(&[(WETH, 500), (DAI, 3000)], USDC);
        let call = exactInputCall {
            params: ExactInputParams {
                path: Bytes::from(path),
                recipient: RECIPIENT,
                deadline: U256::from(1_712_000_600u64),
                amountIn: ether(2),
                amountOutMinimum: U256::from(1u64),
            },
        };
        let calldata = call.abi_encode();
        let selector: [u8; 4] = calldata[..4].try_into().unwrap();

        let swap = decode_v3(UNISWAP_V3_ROUTER, selector, &calldata).unwrap();
        assert_eq!(swap.token_in, WETH);
        assert_eq!(swap.token_out, USDC);
        // Last fee observed along the path.
        assert_eq!(swap.fee, "3000");
    }

    #[test]
    fn test_exact_output_path_is_reversed() {
        // Exact-output encoding: output token first.
        let path = pack_path(&[(USDC, 500)], WETH);
        let call = exactOutputCall {
            params: ExactOutputParams {
                path: Bytes::from(path),
                recipient: RECIPIENT,
                deadline: U256::from(1_712_000_600u64),
                amountOut: U256::from(5_000_000_000u64),
                amountInMaximum: ether(3),
            },
        };
        let calldata = call.abi_encode();
        let selector: [u8; 4] = calldata[..4].try_into().unwrap();

        let swap = decode_v3(UNISWAP_V3_ROUTER, selector, &calldata).unwrap();
        assert_eq!(swap.token_in, WETH);
        assert_eq!(swap.token_out, USDC);
        assert_eq!(swap.amount_in, U256::ZERO);
        assert_eq!(swap.amount_in_max, ether(3));
    }

    #[test]
    fn test_packed_path_walk() {
        let path = pack_path(&[(WETH, 500), (DAI, 100)], USDC);
        let (first, last, fee) = parse_packed_path(&path).unwrap();
        assert_eq!(first, WETH);
        assert_eq!(last, USDC);
        assert_eq!(fee, 100);
    }

    #[test]
    fn test_packed_path_rejects_bad_lengths() {
        assert!(parse_packed_path(&[0u8; 42]).is_none());
        assert!(parse_packed_path(&[0u8; 44]).is_none());
        assert!(parse_packed_path(&[]).is_none());
    }
}
