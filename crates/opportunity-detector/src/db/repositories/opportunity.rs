use sqlx::PgPool;

use crate::db::models::NewOpportunity;
use crate::errors::Result;

pub struct OpportunityRepository;

impl OpportunityRepository {
    /// Upsert an opportunity on `(chain_id, tx_hash)`.
    ///
    /// Re-observation replaces the verdict and bumps `processed_at`;
    /// `detected_at` keeps its original value.
    pub async fn upsert(pool: &PgPool, record: &NewOpportunity) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO opportunities
                (chain_id, tx_hash, router, router_family, token_in, token_out,
                 amount_in, amount_out_min, amount_in_max, fee, pool_address,
                 method, recipient, deadline, block_number, status, metadata,
                 detected_at, processed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, NOW(), NOW())
            ON CONFLICT (chain_id, tx_hash) DO UPDATE SET
                router = EXCLUDED.router,
                router_family = EXCLUDED.router_family,
                token_in = EXCLUDED.token_in,
                token_out = EXCLUDED.token_out,
                amount_in = EXCLUDED.amount_in,
                amount_out_min = EXCLUDED.amount_out_min,
                amount_in_max = EXCLUDED.amount_in_max,
                fee = EXCLUDED.fee,
                pool_address = EXCLUDED.pool_address,
                method = EXCLUDED.method,
                recipient = EXCLUDED.recipient,
                deadline = EXCLUDED.deadline,
                block_number = EXCLUDED.block_number,
                status = EXCLUDED.status,
                metadata = EXCLUDED.metadata,
                processed_at = NOW()
            "#,
        )
        .bind(record.chain_id)
        .bind(&record.tx_hash)
        .bind(&record.router)
        .bind(&record.router_family)
        .bind(&record.token_in)
        .bind(&record.token_out)
        .bind(&record.amount_in)
        .bind(&record.amount_out_min)
        .bind(&record.amount_in_max)
        .bind(&record.fee)
        .bind(&record.pool_address)
        .bind(&record.method)
        .bind(&record.recipient)
        .bind(&record.deadline)
        .bind(record.block_number)
        .bind(&record.status)
        .bind(&record.metadata)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Delete every opportunity with the given status. Returns the row count.
    pub async fn delete_by_status(pool: &PgPool, chain_id: i64, status: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM opportunities WHERE chain_id = $1 AND status = $2")
            .bind(chain_id)
            .bind(status)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete `detected` rows whose metadata already carries the expired
    /// marker. Returns the row count.
    pub async fn delete_detected_marked_expired(pool: &PgPool, chain_id: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM opportunities
            WHERE chain_id = $1 AND status = 'detected'
              AND metadata ->> 'isExpired' = 'true'
            "#,
        )
        .bind(chain_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Fetch the id and metadata of every remaining `detected` row.
    pub async fn fetch_detected(
        pool: &PgPool,
        chain_id: i64,
    ) -> Result<Vec<(i64, serde_json::Value)>> {
        let rows = sqlx::query_as::<_, (i64, serde_json::Value)>(
            "SELECT id, metadata FROM opportunities WHERE chain_id = $1 AND status = 'detected'",
        )
        .bind(chain_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Delete opportunities by id. Returns the row count.
    pub async fn delete_by_ids(pool: &PgPool, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM opportunities WHERE id = ANY($1)")
            .bind(ids)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
