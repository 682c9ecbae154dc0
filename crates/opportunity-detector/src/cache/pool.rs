//! Pool address cache keyed by `(tokenA, tokenB, router, family, fee)`.

use alloy::primitives::{Address, Uint};
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::constants::{DEFAULT_POOL_FEE, POOL_LOOKUP_TIMEOUT_SECS};
use crate::contracts::{IV2Factory, IV3Factory};
use crate::db::models::PoolRecord;
use crate::db::repositories::PoolRepository;
use crate::errors::{DetectorError, Result};
use crate::providers::{contract_err, RpcPool};
use crate::types::{lower_hex, RouterFamily};

use super::FactoryCache;

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

#[derive(Clone)]
pub struct PoolCache {
    db: PgPool,
    rpc: RpcPool,
    factories: FactoryCache,
    chain_id: i64,
}

impl PoolCache {
    pub fn new(db: PgPool, rpc: RpcPool, factories: FactoryCache, chain_id: i64) -> Self {
        Self { db, rpc, factories, chain_id }
    }

    /// Resolve the pool for a token pair, DB-first with factory fallback.
    ///
    /// `Ok(None)` means "pool confirmed absent": the factory returned the
    /// zero address, or the store memoizes absence. A zero-address pool is
    /// never inserted. If the factory call times out after retries, the
    /// store is searched once more (a concurrent writer may have resolved
    /// the pair meanwhile) before the timeout propagates.
    pub async fn get_pool(
        &self,
        token_a: Address,
        token_b: Address,
        router: Address,
        family: RouterFamily,
        fee: Option<u32>,
    ) -> Result<Option<PoolRecord>> {
        let a = lower_hex(&token_a);
        let b = lower_hex(&token_b);

        if let Some(record) = self.find_in_store(&a, &b, family).await? {
            return Ok(filter_absent(record));
        }

        let factory = self.factories.get_factory(router, family).await?;
        let factory_addr: Address = factory
            .factory_address
            .parse()
            .map_err(|e| DetectorError::Config(format!("stored factory address invalid: {e}")))?;

        let lookup = self
            .rpc
            .with_retry_timeout("factory pool lookup", POOL_LOOKUP_TIMEOUT_SECS, |provider| {
                async move {
                    match family {
                        RouterFamily::V2 => IV2Factory::new(factory_addr, provider)
                            .getPair(token_a, token_b)
                            .call()
                            .await
                            .map_err(contract_err("getPair()")),
                        RouterFamily::V3 => IV3Factory::new(factory_addr, provider)
                            .getPool(
                                token_a,
                                token_b,
                                Uint::from(fee.unwrap_or(DEFAULT_POOL_FEE)),
                            )
                            .call()
                            .await
                            .map_err(contract_err("getPool()")),
                    }
                }
            })
            .await;

        let pool_address = match lookup {
            Ok(addr) => addr,
            Err(e) if e.is_timeout_class() => {
                warn!(token0 = %a, token1 = %b, error = %e, "pool lookup timed out, retrying store");
                if let Some(record) = self.find_in_store(&a, &b, family).await? {
                    return Ok(filter_absent(record));
                }
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        if pool_address == Address::ZERO {
            debug!(token0 = %a, token1 = %b, family = family.as_str(), "pool absent");
            return Ok(None);
        }

        let record = PoolRecord {
            chain_id: self.chain_id,
            pool_address: lower_hex(&pool_address),
            token0: a,
            token1: b,
            exists: true,
            router_family: family.as_str().to_string(),
            fee: fee.unwrap_or(DEFAULT_POOL_FEE).to_string(),
        };
        PoolRepository::upsert(&self.db, &record).await?;
        debug!(pool = %record.pool_address, family = %record.router_family, "pool cached");

        Ok(Some(record))
    }

    async fn find_in_store(
        &self,
        token_a: &str,
        token_b: &str,
        family: RouterFamily,
    ) -> Result<Option<PoolRecord>> {
        PoolRepository::find_by_tokens(&self.db, self.chain_id, token_a, token_b, family.as_str())
            .await
    }
}

/// A stored row can itself memoize absence: `exists = false`, or a zero
/// address written by an external producer.
fn filter_absent(record: PoolRecord) -> Option<PoolRecord> {
    if !record.exists || record.pool_address == ZERO_ADDRESS {
        return None;
    }
    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pool_address: &str, exists: bool) -> PoolRecord {
        PoolRecord {
            chain_id: 1,
            pool_address: pool_address.to_string(),
            token0: "0xaaaa000000000000000000000000000000000000".to_string(),
            token1: "0xbbbb000000000000000000000000000000000000".to_string(),
            exists,
            router_family: "v2".to_string(),
            fee: "2500".to_string(),
        }
    }

    #[test]
    fn test_zero_address_row_is_absent() {
        assert!(filter_absent(record(ZERO_ADDRESS, true)).is_none());
    }

    #[test]
    fn test_exists_false_row_is_absent() {
        assert!(filter_absent(record("0xcccc000000000000000000000000000000000000", false))
            .is_none());
    }

    #[test]
    fn test_live_row_passes() {
        let rec = filter_absent(record("0xcccc000000000000000000000000000000000000", true));
        assert!(rec.is_some());
    }
}
