//! ERC-20 token metadata cache.

use std::time::Duration;

use alloy::primitives::Address;
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::constants::RPC_CALL_TIMEOUT_SECS;
use crate::contracts::IERC20Metadata;
use crate::db::models::TokenRecord;
use crate::db::repositories::TokenRepository;
use crate::errors::Result;
use crate::providers::RpcPool;
use crate::types::lower_hex;

#[derive(Clone)]
pub struct TokenCache {
    db: PgPool,
    rpc: RpcPool,
    chain_id: i64,
}

impl TokenCache {
    pub fn new(db: PgPool, rpc: RpcPool, chain_id: i64) -> Self {
        Self { db, rpc, chain_id }
    }

    /// Resolve token metadata, DB-first with on-chain fallback.
    ///
    /// Each metadata call degrades independently to a safe default
    /// (`"Unknown"`, `"UNKNOWN"`, 18) so a non-standard token never blocks
    /// detection. The resolved record is written through before returning.
    pub async fn get_token(&self, address: Address) -> Result<TokenRecord> {
        let key = lower_hex(&address);

        if let Some(record) = TokenRepository::find(&self.db, self.chain_id, &key).await? {
            return Ok(record);
        }

        let contract = IERC20Metadata::new(address, self.rpc.provider());
        let call_timeout = Duration::from_secs(RPC_CALL_TIMEOUT_SECS);
        let name_call = contract.name();
        let symbol_call = contract.symbol();
        let decimals_call = contract.decimals();
        let (name, symbol, decimals) = tokio::join!(
            tokio::time::timeout(call_timeout, name_call.call()),
            tokio::time::timeout(call_timeout, symbol_call.call()),
            tokio::time::timeout(call_timeout, decimals_call.call()),
        );

        let name = match name {
            Ok(Ok(n)) => n,
            _ => {
                warn!(token = %key, "name() failed, defaulting");
                "Unknown".to_string()
            }
        };
        let symbol = match symbol {
            Ok(Ok(s)) => s,
            _ => {
                warn!(token = %key, "symbol() failed, defaulting");
                "UNKNOWN".to_string()
            }
        };
        let decimals = match decimals {
            Ok(Ok(d)) => i32::from(d),
            _ => {
                warn!(token = %key, "decimals() failed, defaulting to 18");
                18
            }
        };

        let record = TokenRecord {
            chain_id: self.chain_id,
            token_address: key.clone(),
            name,
            symbol,
            decimals,
        };
        TokenRepository::upsert(&self.db, &record).await?;
        debug!(token = %key, symbol = %record.symbol, decimals = record.decimals, "token cached");

        Ok(record)
    }
}
