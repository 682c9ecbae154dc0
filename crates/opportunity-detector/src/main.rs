//! Opportunity Detector — mempool DEX-swap detection pipeline.
//!
//! Subscribes to pending transactions over WebSocket, decodes swaps targeted
//! at monitored V2/V3/universal routers, publishes them onto a Kafka topic,
//! and consumes that topic to evaluate each swap against live pool state.
//! Swaps clearing the profitability and price-impact thresholds are upserted
//! as opportunities; a periodic loop prunes expired and stale rows.

mod bus;
mod cache;
mod cleanup;
mod config;
mod constants;
mod contracts;
mod db;
mod decoder;
mod errors;
mod evaluator;
mod logging;
mod mempool;
mod pool_state;
mod price_impact;
mod providers;
mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::bus::BusProducer;
use crate::cache::{FactoryCache, PoolCache, TokenCache};
use crate::config::Config;
use crate::db::Database;
use crate::evaluator::Evaluator;
use crate::providers::RpcPool;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignore if missing).
    let _ = dotenvy::dotenv();

    logging::init_tracing();

    let config = Arc::new(Config::from_env().context("failed to load configuration")?);

    info!(
        chain_id = config.chain_id,
        rpc_endpoints = config.http_rpc_urls.len(),
        wss_url = %config.wss_rpc_url,
        kafka_brokers = %config.kafka_brokers,
        transactions_topic = %config.transactions_topic,
        "opportunity detector starting"
    );

    // -----------------------------------------------------------------------
    // Components
    // -----------------------------------------------------------------------

    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;
    db.health_check().await.context("database health check failed")?;

    let rpc = RpcPool::new(&config.http_rpc_urls).context("failed to build RPC pool")?;
    let producer =
        Arc::new(BusProducer::new(&config).context("failed to create bus producer")?);

    let token_cache = TokenCache::new(db.pool().clone(), rpc.clone(), config.chain_id);
    let factory_cache = FactoryCache::new(db.pool().clone(), rpc.clone(), config.chain_id);
    let pool_cache =
        PoolCache::new(db.pool().clone(), rpc.clone(), factory_cache, config.chain_id);
    let evaluator =
        Arc::new(Evaluator::new(config.clone(), rpc.clone(), token_cache, pool_cache));

    let shutdown = CancellationToken::new();

    // -----------------------------------------------------------------------
    // Spawn background tasks
    // -----------------------------------------------------------------------

    // 1. Mempool tap — pending stream → decoders → bus.
    let tap_handle = tokio::spawn(mempool::run_mempool_tap(
        config.clone(),
        rpc.clone(),
        producer.clone(),
        shutdown.clone(),
    ));

    // 2. Bus consumer — topic → evaluator → opportunity store.
    let consumer_ctx = bus::consumer::ConsumerContext {
        config: config.clone(),
        db: db.clone(),
        rpc: rpc.clone(),
        evaluator,
    };
    let consumer_handle =
        tokio::spawn(bus::consumer::run_consumer(consumer_ctx, shutdown.clone()));

    // 3. Cleanup loop — runs once at startup, then on the interval.
    let cleanup_handle = tokio::spawn(cleanup::run_cleanup_loop(
        config.clone(),
        db.clone(),
        shutdown.clone(),
    ));

    info!("all tasks running");

    // -----------------------------------------------------------------------
    // Wait for shutdown
    // -----------------------------------------------------------------------

    wait_for_shutdown_signal().await?;

    info!("shutdown signal received, stopping gracefully...");
    shutdown.cancel();

    let (tap_res, consumer_res, cleanup_res) =
        tokio::join!(tap_handle, consumer_handle, cleanup_handle);
    if let Err(e) = tap_res {
        error!(error = %e, "mempool tap task panicked");
    }
    if let Err(e) = consumer_res {
        error!(error = %e, "bus consumer task panicked");
    }
    if let Err(e) = cleanup_res {
        error!(error = %e, "cleanup task panicked");
    }

    producer.flush();
    db.close().await;

    info!("shutdown complete");
    Ok(())
}

/// Block until SIGINT or SIGTERM.
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .context("failed to install SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.context("failed to listen for Ctrl+C")?,
            _ = sigterm.recv() => {}
        }
        return Ok(());
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.context("failed to listen for Ctrl+C")
    }
}
