use sqlx::PgPool;

use crate::db::models::PoolRecord;
use crate::errors::Result;

pub struct PoolRepository;

impl PoolRepository {
    /// Search for a pool by its token pair and family, in either token
    /// ordering. Addresses must already be lowercase.
    pub async fn find_by_tokens(
        pool: &PgPool,
        chain_id: i64,
        token_a: &str,
        token_b: &str,
        router_family: &str,
    ) -> Result<Option<PoolRecord>> {
        let record = sqlx::query_as::<_, PoolRecord>(
            r#"
            SELECT chain_id, pool_address, token0, token1, "exists", router_family, fee
            FROM pools
            WHERE chain_id = $1
              AND router_family = $4
              AND ((token0 = $2 AND token1 = $3) OR (token0 = $3 AND token1 = $2))
            "#,
        )
        .bind(chain_id)
        .bind(token_a)
        .bind(token_b)
        .bind(router_family)
        .fetch_optional(pool)
        .await?;
        Ok(record)
    }

    /// Insert or update a pool (idempotent upsert on `(chain_id, pool_address)`).
    pub async fn upsert(pool: &PgPool, record: &PoolRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pools (chain_id, pool_address, token0, token1, "exists", router_family, fee)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (chain_id, pool_address) DO UPDATE SET
                token0 = EXCLUDED.token0,
                token1 = EXCLUDED.token1,
                "exists" = EXCLUDED."exists",
                router_family = EXCLUDED.router_family,
                fee = EXCLUDED.fee
            "#,
        )
        .bind(record.chain_id)
        .bind(&record.pool_address)
        .bind(&record.token0)
        .bind(&record.token1)
        .bind(record.exists)
        .bind(&record.router_family)
        .bind(&record.fee)
        .execute(pool)
        .await?;
        Ok(())
    }
}
