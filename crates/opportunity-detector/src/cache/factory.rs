//! Router → factory/wrapped-native cache.

use alloy::primitives::Address;
use sqlx::PgPool;
use tracing::debug;

use crate::contracts::{IV2Router, IV3Router};
use crate::db::models::FactoryRecord;
use crate::db::repositories::FactoryRepository;
use crate::errors::Result;
use crate::providers::{contract_err, RpcPool};
use crate::types::{lower_hex, RouterFamily};

#[derive(Clone)]
pub struct FactoryCache {
    db: PgPool,
    rpc: RpcPool,
    chain_id: i64,
}

impl FactoryCache {
    pub fn new(db: PgPool, rpc: RpcPool, chain_id: i64) -> Self {
        Self { db, rpc, chain_id }
    }

    /// Resolve a router's factory and wrapped-native addresses, DB-first.
    ///
    /// On miss the router itself is queried: `factory()` plus `WETH()` (V2)
    /// or `WETH9()` (V3), then the binding is written through.
    pub async fn get_factory(
        &self,
        router: Address,
        family: RouterFamily,
    ) -> Result<FactoryRecord> {
        let key = lower_hex(&router);

        if let Some(record) = FactoryRepository::find(&self.db, self.chain_id, &key).await? {
            return Ok(record);
        }

        let (factory, wrapped_native) = self
            .rpc
            .with_retry("router factory lookup", |provider| async move {
                match family {
                    RouterFamily::V2 => {
                        let contract = IV2Router::new(router, provider);
                        let factory = contract
                            .factory()
                            .call()
                            .await
                            .map_err(contract_err("factory()"))?;
                        let weth =
                            contract.WETH().call().await.map_err(contract_err("WETH()"))?;
                        Ok((factory, weth))
                    }
                    RouterFamily::V3 => {
                        let contract = IV3Router::new(router, provider);
                        let factory = contract
                            .factory()
                            .call()
                            .await
                            .map_err(contract_err("factory()"))?;
                        let weth =
                            contract.WETH9().call().await.map_err(contract_err("WETH9()"))?;
                        Ok((factory, weth))
                    }
                }
            })
            .await?;

        let record = FactoryRecord {
            chain_id: self.chain_id,
            router: key.clone(),
            factory_address: lower_hex(&factory),
            wrapped_native_address: lower_hex(&wrapped_native),
            router_family: family.as_str().to_string(),
        };
        FactoryRepository::upsert(&self.db, &record).await?;
        debug!(router = %key, factory = %record.factory_address, "factory cached");

        Ok(record)
    }
}
