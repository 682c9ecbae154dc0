use sqlx::PgPool;

use crate::db::models::TokenRecord;
use crate::errors::Result;

pub struct TokenRepository;

impl TokenRepository {
    /// Look up a token by its lowercase address.
    pub async fn find(
        pool: &PgPool,
        chain_id: i64,
        token_address: &str,
    ) -> Result<Option<TokenRecord>> {
        let record = sqlx::query_as::<_, TokenRecord>(
            "SELECT chain_id, token_address, name, symbol, decimals
             FROM tokens WHERE chain_id = $1 AND token_address = $2",
        )
        .bind(chain_id)
        .bind(token_address)
        .fetch_optional(pool)
        .await?;
        Ok(record)
    }

    /// Insert or update a token (idempotent upsert).
    pub async fn upsert(pool: &PgPool, record: &TokenRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tokens (chain_id, token_address, name, symbol, decimals)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (chain_id, token_address) DO UPDATE SET
                name = EXCLUDED.name,
                symbol = EXCLUDED.symbol,
                decimals = EXCLUDED.decimals
            "#,
        )
        .bind(record.chain_id)
        .bind(&record.token_address)
        .bind(&record.name)
        .bind(&record.symbol)
        .bind(record.decimals)
        .execute(pool)
        .await?;
        Ok(())
    }
}
