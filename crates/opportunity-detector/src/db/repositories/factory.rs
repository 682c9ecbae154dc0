use sqlx::PgPool;

use crate::db::models::FactoryRecord;
use crate::errors::Result;

pub struct FactoryRepository;

impl FactoryRepository {
    /// Look up the factory binding for a router (lowercase address).
    pub async fn find(
        pool: &PgPool,
        chain_id: i64,
        router: &str,
    ) -> Result<Option<FactoryRecord>> {
        let record = sqlx::query_as::<_, FactoryRecord>(
            "SELECT chain_id, router, factory_address, wrapped_native_address, router_family
             FROM factory_addresses WHERE chain_id = $1 AND router = $2",
        )
        .bind(chain_id)
        .bind(router)
        .fetch_optional(pool)
        .await?;
        Ok(record)
    }

    /// Insert or update a factory binding (idempotent upsert).
    pub async fn upsert(pool: &PgPool, record: &FactoryRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO factory_addresses
                (chain_id, router, factory_address, wrapped_native_address, router_family)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (chain_id, router) DO UPDATE SET
                factory_address = EXCLUDED.factory_address,
                wrapped_native_address = EXCLUDED.wrapped_native_address,
                router_family = EXCLUDED.router_family
            "#,
        )
        .bind(record.chain_id)
        .bind(&record.router)
        .bind(&record.factory_address)
        .bind(&record.wrapped_native_address)
        .bind(&record.router_family)
        .execute(pool)
        .await?;
        Ok(())
    }
}
