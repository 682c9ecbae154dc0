//! On-chain pool state reads.

use alloy::primitives::{Address, U256};
use tracing::debug;

use crate::contracts::{IV2Pair, IV3Pool};
use crate::errors::Result;
use crate::providers::{contract_err, RpcPool};

/// Snapshot of a V2 pair.
#[derive(Debug, Clone)]
pub struct V2PoolState {
    pub token0: Address,
    pub token1: Address,
    pub reserve0: U256,
    pub reserve1: U256,
    pub total_supply: U256,
    /// Constant-product invariant `reserve0 * reserve1`.
    pub k: U256,
}

impl V2PoolState {
    /// Reserves oriented so the first element is the `token_in` side.
    pub fn oriented_reserves(&self, token_in: Address) -> (U256, U256) {
        if token_in == self.token0 {
            (self.reserve0, self.reserve1)
        } else {
            (self.reserve1, self.reserve0)
        }
    }
}

/// Snapshot of a V3 pool.
#[derive(Debug, Clone)]
pub struct V3PoolState {
    pub token0: Address,
    pub token1: Address,
    pub sqrt_price_x96: U256,
    pub liquidity: u128,
    pub fee: u32,
}

/// Read reserves, token ordering, and supply from a V2 pair.
pub async fn read_v2_state(rpc: &RpcPool, pool: Address) -> Result<V2PoolState> {
    rpc.with_retry("v2 pool state", |provider| async move {
        let pair = IV2Pair::new(pool, provider);
        let (reserves, token0, token1, total_supply) = tokio::try_join!(
            async { pair.getReserves().call().await.map_err(contract_err("getReserves()")) },
            async { pair.token0().call().await.map_err(contract_err("token0()")) },
            async { pair.token1().call().await.map_err(contract_err("token1()")) },
            async { pair.totalSupply().call().await.map_err(contract_err("totalSupply()")) },
        )?;

        let reserve0 = U256::from(reserves.reserve0);
        let reserve1 = U256::from(reserves.reserve1);
        let state = V2PoolState {
            token0,
            token1,
            reserve0,
            reserve1,
            total_supply,
            k: reserve0 * reserve1,
        };
        debug!(pool = %pool, reserve0 = %state.reserve0, reserve1 = %state.reserve1, "v2 state");
        Ok(state)
    })
    .await
}

/// Read slot0, liquidity, fee, and token ordering from a V3 pool.
pub async fn read_v3_state(rpc: &RpcPool, pool: Address) -> Result<V3PoolState> {
    rpc.with_retry("v3 pool state", |provider| async move {
        let contract = IV3Pool::new(pool, provider);
        let (slot0, liquidity, fee, token0, token1) = tokio::try_join!(
            async { contract.slot0().call().await.map_err(contract_err("slot0()")) },
            async { contract.liquidity().call().await.map_err(contract_err("liquidity()")) },
            async { contract.fee().call().await.map_err(contract_err("fee()")) },
            async { contract.token0().call().await.map_err(contract_err("token0()")) },
            async { contract.token1().call().await.map_err(contract_err("token1()")) },
        )?;

        let state = V3PoolState {
            token0,
            token1,
            sqrt_price_x96: U256::from(slot0.sqrtPriceX96),
            liquidity,
            fee: fee.to::<u32>(),
        };
        debug!(pool = %pool, liquidity = state.liquidity, "v3 state");
        Ok(state)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn test_oriented_reserves() {
        let token0 = address!("aaaa000000000000000000000000000000000000");
        let token1 = address!("bbbb000000000000000000000000000000000000");
        let state = V2PoolState {
            token0,
            token1,
            reserve0: U256::from(100u64),
            reserve1: U256::from(200u64),
            total_supply: U256::from(10u64),
            k: U256::from(20_000u64),
        };

        assert_eq!(state.oriented_reserves(token0), (U256::from(100u64), U256::from(200u64)));
        assert_eq!(state.oriented_reserves(token1), (U256::from(200u64), U256::from(100u64)));
    }
}
