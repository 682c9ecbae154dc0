//! Runtime configuration, loaded from environment variables with defaults.

use alloy::primitives::Address;
use anyhow::{bail, Context, Result};

use crate::constants::*;
use crate::types::RouterFamily;

/// Process-wide configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP JSON-RPC endpoints; one is sampled uniformly per call.
    pub http_rpc_urls: Vec<String>,
    /// WebSocket endpoint for the pending-transaction subscription.
    pub wss_rpc_url: String,
    /// Chain id partitioning every cached record.
    pub chain_id: i64,
    /// Postgres connection string.
    pub database_url: String,

    // -- Kafka --------------------------------------------------------------
    pub kafka_brokers: String,
    pub kafka_client_id: String,
    pub kafka_group_id: String,
    pub transactions_topic: String,
    pub opportunities_topic: String,

    // -- Router allow-lists -------------------------------------------------
    pub universal_routers: Vec<Address>,
    pub v2_routers: Vec<Address>,
    pub v3_routers: Vec<Address>,

    // -- Tap tuning ---------------------------------------------------------
    pub dedup_cache_size: usize,
    pub reconnect_delay_seconds: u64,
    pub max_reconnect_attempts: u32,

    // -- Consumer / cleanup -------------------------------------------------
    pub max_message_age_seconds: i64,
    pub cleanup_interval_minutes: u64,
    pub cleanup_prune_pending: bool,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// `HTTP_RPC_URL`, `WSS_RPC_URL`, and `DATABASE_URL` are required;
    /// everything else has a default. Invalid values are fatal.
    pub fn from_env() -> Result<Self> {
        let http_rpc_urls = split_csv(
            &std::env::var("HTTP_RPC_URL").context("HTTP_RPC_URL is required")?,
        );
        if http_rpc_urls.is_empty() {
            bail!("HTTP_RPC_URL must contain at least one URL");
        }

        let wss_rpc_url = std::env::var("WSS_RPC_URL").context("WSS_RPC_URL is required")?;
        if wss_rpc_url.is_empty() {
            bail!("WSS_RPC_URL must not be empty");
        }

        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;

        let chain_id = env_parse("CHAIN_ID").unwrap_or(1);

        let universal_routers = match std::env::var("UNIVERSAL_ROUTER") {
            Ok(raw) if !raw.is_empty() => {
                parse_addr_list(&raw).context("invalid UNIVERSAL_ROUTER")?
            }
            _ => DEFAULT_UNIVERSAL_ROUTERS.to_vec(),
        };

        Ok(Self {
            http_rpc_urls,
            wss_rpc_url,
            chain_id,
            database_url,
            kafka_brokers: env_or("KAFKA_BROKERS", "localhost:9092"),
            kafka_client_id: env_or("KAFKA_CLIENT_ID", "opportunity-detector"),
            kafka_group_id: env_or("KAFKA_GROUP_ID", "opportunity-detector-group"),
            transactions_topic: env_or("KAFKA_TRANSACTIONS_TOPIC", "transactions"),
            opportunities_topic: env_or("KAFKA_OPPORTUNITIES_TOPIC", "opportunities"),
            universal_routers,
            v2_routers: DEFAULT_V2_ROUTERS.to_vec(),
            v3_routers: DEFAULT_V3_ROUTERS.to_vec(),
            dedup_cache_size: env_parse("DEDUP_CACHE_SIZE").unwrap_or(100_000),
            reconnect_delay_seconds: env_parse("RECONNECT_DELAY_SECONDS").unwrap_or(5),
            max_reconnect_attempts: env_parse("MAX_RECONNECT_ATTEMPTS").unwrap_or(10),
            max_message_age_seconds: env_parse("MAX_MESSAGE_AGE_SECONDS")
                .unwrap_or(DEFAULT_MAX_MESSAGE_AGE_SECS),
            cleanup_interval_minutes: env_parse("CLEANUP_INTERVAL_MINUTES").unwrap_or(60),
            cleanup_prune_pending: env_parse("CLEANUP_PRUNE_PENDING").unwrap_or(true),
        })
    }

    /// Whether `to` is a universal-router address.
    pub fn is_universal_router(&self, to: &Address) -> bool {
        self.universal_routers.contains(to)
    }

    /// The decoder family responsible for a router, if any.
    pub fn router_family_of(&self, to: &Address) -> Option<RouterKind> {
        if self.universal_routers.contains(to) {
            Some(RouterKind::Universal)
        } else if self.v2_routers.contains(to) {
            Some(RouterKind::V2)
        } else if self.v3_routers.contains(to) {
            Some(RouterKind::V3)
        } else {
            None
        }
    }

    /// Canonical router to use for pool lookups of a universal-router swap.
    pub fn canonical_router(&self, family: RouterFamily) -> Address {
        match family {
            RouterFamily::V2 => CANONICAL_V2_ROUTER,
            RouterFamily::V3 => CANONICAL_V3_ROUTER,
        }
    }
}

/// Which decoder handles a transaction's `to` address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterKind {
    Universal,
    V2,
    V3,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable into a type that implements `FromStr`.
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse a comma-separated address list; addresses compare case-insensitively
/// once parsed.
fn parse_addr_list(raw: &str) -> Result<Vec<Address>> {
    split_csv(raw)
        .iter()
        .map(|s| s.parse::<Address>().with_context(|| format!("invalid address: {s}")))
        .collect()
}
