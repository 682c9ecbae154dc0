//! Postgres access layer.
//!
//! A thin pool wrapper plus one repository per table. Every write is an
//! idempotent `ON CONFLICT` upsert on the table's natural key, so concurrent
//! writers and horizontal replicas never surface unique-constraint races.

pub mod models;
pub mod repositories;

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::errors::Result;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to Postgres.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await?;

        info!("database connection pool established");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check connectivity.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the pool gracefully.
    pub async fn close(&self) {
        info!("closing database connection pool");
        self.pool.close().await;
    }
}
