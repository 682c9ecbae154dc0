//! ABI decoding for Universal Router `execute` calls.
//!
//! The universal router is a mini-interpreter: `commands` is a raw byte
//! string where each byte is an opcode, and `inputs[i]` carries the
//! ABI-encoded parameter tuple for `commands[i]`. This decoder interprets the
//! same stream, decoding every recognized swap opcode and skipping everything
//! else (PERMIT2, WRAP, SWEEP, …). The result is one [`DecodedSwap`] per
//! recognized sub-action, in command order, each carrying the enclosing
//! call's deadline.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::constants::*;
use crate::decoder::v3::parse_packed_path;
use crate::types::{DecodedSwap, RouterFamily, SwapMethod};

sol! {
    function execute(bytes commands, bytes[] inputs, uint256 deadline);
}

// Inner command parameter tuples, decoded from inputs[i] without a selector.
sol! {
    function v2SwapExactIn(
        address recipient,
        uint256 amountIn,
        uint256 amountOutMin,
        address[] path,
        bool payerIsUser
    );

    function v2SwapExactOut(
        address recipient,
        uint256 amountOut,
        uint256 amountInMax,
        address[] path,
        bool payerIsUser
    );

    function v3SwapExactIn(
        address recipient,
        uint256 amountIn,
        uint256 amountOutMin,
        bytes path,
        bool payerIsUser
    );

    function v3SwapExactOut(
        address recipient,
        uint256 amountOut,
        uint256 amountInMax,
        bytes path,
        bool payerIsUser
    );
}

/// Decode a Universal Router `execute` call into its swap sub-actions.
///
/// Returns an empty vec when the calldata is not an `execute` variant or
/// contains no recognized swap commands.
pub fn decode_universal(
    router: Address,
    selector: [u8; 4],
    calldata: &[u8],
    value: U256,
) -> Vec<DecodedSwap> {
    let Some((commands, inputs, deadline)) = decode_execute(selector, calldata) else {
        return Vec::new();
    };
    let deadline = deadline.map(|d| d.to_string()).unwrap_or_else(|| "0".to_string());

    let mut swaps = Vec::new();
    for (i, &cmd) in commands.iter().enumerate() {
        if i >= inputs.len() {
            break;
        }
        let input = &inputs[i];

        // The lower 5 bits hold the command type; high bits are flags.
        match cmd & UR_COMMAND_MASK {
            UR_V2_SWAP_EXACT_IN => {
                let Ok(args) = v2SwapExactInCall::abi_decode_raw(input) else { continue };
                let Some((token_in, token_out)) = path_ends(&args.path) else { continue };
                swaps.push(build_swap(
                    router,
                    SwapMethod::V2ExactIn,
                    RouterFamily::V2,
                    token_in,
                    token_out,
                    amount_or_value(args.amountIn, value),
                    args.amountOutMin,
                    U256::ZERO,
                    "0".to_string(),
                    args.recipient,
                    deadline.clone(),
                    args.payerIsUser,
                ));
            }
            UR_V2_SWAP_EXACT_OUT => {
                let Ok(args) = v2SwapExactOutCall::abi_decode_raw(input) else { continue };
                let Some((token_in, token_out)) = path_ends(&args.path) else { continue };
                swaps.push(build_swap(
                    router,
                    SwapMethod::V2ExactOut,
                    RouterFamily::V2,
                    token_in,
                    token_out,
                    U256::ZERO,
                    args.amountOut,
                    args.amountInMax,
                    "0".to_string(),
                    args.recipient,
                    deadline.clone(),
                    args.payerIsUser,
                ));
            }
            UR_V3_SWAP_EXACT_IN => {
                let Ok(args) = v3SwapExactInCall::abi_decode_raw(input) else { continue };
                let Some((token_in, token_out, fee)) = parse_packed_path(&args.path) else {
                    continue;
                };
                swaps.push(build_swap(
                    router,
                    SwapMethod::V3ExactIn,
                    RouterFamily::V3,
                    token_in,
                    token_out,
                    amount_or_value(args.amountIn, value),
                    args.amountOutMin,
                    U256::ZERO,
                    fee.to_string(),
                    args.recipient,
                    deadline.clone(),
                    args.payerIsUser,
                ));
            }
            UR_V3_SWAP_EXACT_OUT => {
                let Ok(args) = v3SwapExactOutCall::abi_decode_raw(input) else { continue };
                // Exact-output packed paths are reversed: output token first.
                let Some((token_out, token_in, fee)) = parse_packed_path(&args.path) else {
                    continue;
                };
                swaps.push(build_swap(
                    router,
                    SwapMethod::V3ExactOut,
                    RouterFamily::V3,
                    token_in,
                    token_out,
                    U256::ZERO,
                    args.amountOut,
                    args.amountInMax,
                    fee.to_string(),
                    args.recipient,
                    deadline.clone(),
                    args.payerIsUser,
                ));
            }
            _ => continue,
        }
    }

    swaps
}

/// Split an `execute` call into commands, inputs, and the optional deadline.
fn decode_execute(
    selector: [u8; 4],
    calldata: &[u8],
) -> Option<(Vec<u8>, Vec<Bytes>, Option<U256>)> {
    match selector {
        SEL_EXECUTE_DEADLINE => {
            let call = executeCall::abi_decode(calldata).ok()?;
            Some((call.commands.to_vec(), call.inputs, Some(call.deadline)))
        }
        SEL_EXECUTE => {
            // Same shape minus the trailing deadline word.
            let args =
                <(Bytes, Vec<Bytes>) as alloy::sol_types::SolValue>::abi_decode(&calldata[4..])
                    .ok()?;
            Some((args.0.to_vec(), args.1, None))
        }
        _ => None,
    }
}

/// A zero amount on an exact-in command means the input is the transaction's
/// native value.
fn amount_or_value(amount: U256, value: U256) -> U256 {
    if amount.is_zero() {
        value
    } else {
        amount
    }
}

fn path_ends(path: &[Address]) -> Option<(Address, Address)> {
    if path.len() < 2 {
        return None;
    }
    Some((path[0], *path.last().expect("path len >= 2")))
}

#[allow(clippy::too_many_arguments)]
fn build_swap(
    router: Address,
    method: SwapMethod,
    family: RouterFamily,
    token_in: Address,
    token_out: Address,
    amount_in: U256,
    amount_out: U256,
    amount_in_max: U256,
    fee: String,
    recipient: Address,
    deadline: String,
    payer_is_user: bool,
) -> DecodedSwap {
    DecodedSwap {
        router,
        method,
        router_family: family,
        token_in,
        token_out,
        amount_in,
        amount_out,
        amount_out_min: amount_out,
        amount_in_max,
        fee,
        recipient,
        deadline,
        payer_is_user,
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

    fn v3_path(a: Address, fee: u32, b: Address) -> Bytes {
        let mut path = Vec::new();
        path.extend_from_slice(a.as_slice());
        path.extend_from_slice(&fee.to_be_bytes()[1..4]);
        path.extend_from_slice(b.as_slice());
        Bytes::from(path)
    }

    fn encode_execute(commands: &[u8], inputs: Vec<Bytes>, deadline: u64) -> Vec<u8> {
        executeCall {
            commands: Bytes::from(commands.to_vec()),
            inputs,
            deadline: U256::from(deadline),
        }
        .abi_encode()
    }

    fn raw_tuple(encoded_call: Vec<u8>) -> Bytes {
        // Strip the 4-byte selector to obtain the bare parameter tuple.
        Bytes::from(encoded_call[4..].to_vec())
    }

    #[test]
    fn test_execute_selector_matches_abi() {
        assert_eq!(executeCall::SELECTOR, SEL_EXECUTE_DEADLINE);
    }

    #[test]
    fn test_multi_action_decodes_in_command_order() {
        let v3_input = raw_tuple(
            v3SwapExactInCall {
                recipient: RECIPIENT,
                amountIn: ether(1),
                amountOutMin: U256::from(1_500_000_000u64),
                path: v3_path(WETH, 500, USDC),
                payerIsUser: true,
            }
            .abi_encode(),
        );
        let v2_input = raw_tuple(
            v2SwapExactInCall {
                recipient: RECIPIENT,
                amountIn: ether(2),
                amountOutMin: U256::from(3_000_000_000u64),
                path: vec![WETH, USDC],
                payerIsUser: true,
            }
            .abi_encode(),
        );

        let calldata = encode_execute(
            &[UR_V3_SWAP_EXACT_IN, UR_V2_SWAP_EXACT_IN],
            vec![v3_input, v2_input],
            1_712_000_600,
        );
        let selector: [u8; 4] = calldata[..4].try_into().unwrap();

        let swaps =
            decode_universal(UNISWAP_UNIVERSAL_ROUTER, selector, &calldata, U256::ZERO);
        assert_eq!(swaps.len(), 2);

        assert_eq!(swaps[0].method, SwapMethod::V3ExactIn);
        assert_eq!(swaps[0].router_family, RouterFamily::V3);
        assert_eq!(swaps[0].fee, "500");
        assert_eq!(swaps[0].amount_in, ether(1));
        assert!(swaps[0].payer_is_user);

        assert_eq!(swaps[1].method, SwapMethod::V2ExactIn);
        assert_eq!(swaps[1].router_family, RouterFamily::V2);
        assert_eq!(swaps[1].fee, "0");
        assert_eq!(swaps[1].amount_in, ether(2));

        // Both carry the enclosing deadline.
        assert_eq!(swaps[0].deadline, "1712000600");
        assert_eq!(swaps[1].deadline, "1712000600");
    }

    #[test]
    fn test_unrecognized_commands_only_yields_empty_list() {
        // PERMIT2_PERMIT (0x0a) and WRAP_ETH (0x0b) are not swap commands.
        let calldata = encode_execute(
            &[0x0a, 0x0b],
            vec![Bytes::from(vec![0u8; 32]), Bytes::from(vec![0u8; 32])],
            1_712_000_600,
        );
        let selector: [u8; 4] = calldata[..4].try_into().unwrap();

        let swaps =
            decode_universal(UNISWAP_UNIVERSAL_ROUTER, selector, &calldata, U256::ZERO);
        assert!(swaps.is_empty());
    }

    #[test]
    fn test_command_flag_bits_are_masked() {
        let v2_input = raw_tuple(
            v2SwapExactInCall {
                recipient: RECIPIENT,
                amountIn: ether(1),
                amountOutMin: U256::ZERO,
                path: vec![WETH, USDC],
                payerIsUser: false,
            }
            .abi_encode(),
        );

        // 0x88 = FLAG_ALLOW_REVERT | V2_SWAP_EXACT_IN.
        let calldata = encode_execute(&[0x88], vec![v2_input], 1_712_000_600);
        let selector: [u8; 4] = calldata[..4].try_into().unwrap();

        let swaps =
            decode_universal(UNISWAP_UNIVERSAL_ROUTER, selector, &calldata, U256::ZERO);
        assert_eq!(swaps.len(), 1);
        assert_eq!(swaps[0].method, SwapMethod::V2ExactIn);
    }

    #[test]
    fn test_zero_amount_in_uses_tx_value() {
        let v2_input = raw_tuple(
            v2SwapExactInCall {
                recipient: RECIPIENT,
                amountIn: U256::ZERO,
                amountOutMin: U256::ZERO,
                path: vec![WETH, USDC],
                payerIsUser: false,
            }
            .abi_encode(),
        );

        let calldata = encode_execute(&[UR_V2_SWAP_EXACT_IN], vec![v2_input], 1_712_000_600);
        let selector: [u8; 4] = calldata[..4].try_into().unwrap();

        let swaps = decode_universal(UNISWAP_UNIVERSAL_ROUTER, selector, &calldata, ether(7));
        assert_eq!(swaps[0].amount_in, ether(7));
    }

    #[test]
    fn test_exact_out_path_reversal() {
        let v3_input = raw_tuple(
            v3SwapExactOutCall {
                recipient: RECIPIENT,
                amountOut: U256::from(5_000_000_000u64),
                amountInMax: ether(3),
                path: v3_path(USDC, 3000, WETH),
                payerIsUser: true,
            }
            .abi_encode(),
        );

        let calldata = encode_execute(&[UR_V3_SWAP_EXACT_OUT], vec![v3_input], 1_712_000_600);
        let selector: [u8; 4] = calldata[..4].try_into().unwrap();

        let swaps =
            decode_universal(UNISWAP_UNIVERSAL_ROUTER, selector, &calldata, U256::ZERO);
        assert_eq!(swaps[0].token_in, WETH);
        assert_eq!(swaps[0].token_out, USDC);
        assert_eq!(swaps[0].amount_in, U256::ZERO);
        assert_eq!(swaps[0].amount_in_max, ether(3));
    }
}
