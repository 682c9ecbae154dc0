//! Compile-time ABI definitions for on-chain contracts via Alloy `sol!`.

#![allow(clippy::too_many_arguments)]

use alloy::sol;

// ---------------------------------------------------------------------------
// ERC-20 metadata
// ---------------------------------------------------------------------------

sol! {
    /// Minimal ERC-20 metadata surface used by the token cache.
    #[sol(rpc)]
    interface IERC20Metadata {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
    }
}

// ---------------------------------------------------------------------------
// Routers — factory discovery only
// ---------------------------------------------------------------------------

sol! {
    /// V2 router surface: factory address and wrapped-native address.
    #[sol(rpc)]
    interface IV2Router {
        function factory() external view returns (address);
        function WETH() external view returns (address);
    }

    /// V3 router surface: factory address and wrapped-native address.
    #[sol(rpc)]
    interface IV3Router {
        function factory() external view returns (address);
        function WETH9() external view returns (address);
    }
}

// ---------------------------------------------------------------------------
// Factories
// ---------------------------------------------------------------------------

sol! {
    #[sol(rpc)]
    interface IV2Factory {
        function getPair(address tokenA, address tokenB) external view returns (address);
    }

    #[sol(rpc)]
    interface IV3Factory {
        function getPool(address tokenA, address tokenB, uint24 fee) external view returns (address);
    }
}

// ---------------------------------------------------------------------------
// Pools
// ---------------------------------------------------------------------------

sol! {
    /// V2 pair state reads.
    #[sol(rpc)]
    interface IV2Pair {
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
        function token0() external view returns (address);
        function token1() external view returns (address);
        function totalSupply() external view returns (uint256);
    }

    /// V3 pool state reads.
    #[sol(rpc)]
    interface IV3Pool {
        function slot0() external view returns (
            uint160 sqrtPriceX96,
            int24 tick,
            uint16 observationIndex,
            uint16 observationCardinality,
            uint16 observationCardinalityNext,
            uint8 feeProtocol,
            bool unlocked
        );
        function liquidity() external view returns (uint128);
        function fee() external view returns (uint24);
        function token0() external view returns (address);
        function token1() external view returns (address);
    }
}

// ---------------------------------------------------------------------------
// V3 Quoter
// ---------------------------------------------------------------------------

sol! {
    /// Simulates a V3 swap via eth_call without executing a trade.
    #[sol(rpc)]
    interface IQuoter {
        function quoteExactInputSingle(
            address tokenIn,
            address tokenOut,
            uint24 fee,
            uint256 amountIn,
            uint160 sqrtPriceLimitX96
        ) external returns (uint256 amountOut);
    }
}
