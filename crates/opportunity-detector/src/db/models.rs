//! Row types for the persisted caches and the opportunity store.
//!
//! Addresses are stored as lowercase hex text; 256-bit amounts as decimal
//! strings. Each cache table is content-addressed by its natural key.

use sqlx::FromRow;

/// `tokens` — unique on `(chain_id, token_address)`.
#[derive(Debug, Clone, FromRow)]
pub struct TokenRecord {
    pub chain_id: i64,
    pub token_address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: i32,
}

/// `factory_addresses` — unique on `(chain_id, router)`.
#[derive(Debug, Clone, FromRow)]
pub struct FactoryRecord {
    pub chain_id: i64,
    pub router: String,
    pub factory_address: String,
    pub wrapped_native_address: String,
    pub router_family: String,
}

/// `pools` — unique on `(chain_id, pool_address)`.
///
/// `exists = false` memoizes a confirmed-absent pool. `token0`/`token1`
/// ordering is whatever the factory lookup used; no canonical ordering is
/// imposed, so readers disambiguate `token_in` against `token0` themselves.
#[derive(Debug, Clone, FromRow)]
pub struct PoolRecord {
    pub chain_id: i64,
    pub pool_address: String,
    pub token0: String,
    pub token1: String,
    pub exists: bool,
    pub router_family: String,
    pub fee: String,
}

/// Insert/update payload for an `opportunities` upsert — the table is unique
/// on `(chain_id, tx_hash)`; `id` and the timestamps are store-assigned.
#[derive(Debug, Clone)]
pub struct NewOpportunity {
    pub chain_id: i64,
    pub tx_hash: String,
    pub router: String,
    pub router_family: String,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: String,
    pub amount_out_min: String,
    pub amount_in_max: String,
    pub fee: String,
    pub pool_address: Option<String>,
    pub method: String,
    pub recipient: String,
    pub deadline: String,
    pub block_number: Option<i64>,
    pub status: String,
    pub metadata: serde_json::Value,
}
