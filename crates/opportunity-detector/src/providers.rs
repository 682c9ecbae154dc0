//! Load-balanced JSON-RPC access.
//!
//! Providers are allocated fresh per call from a uniformly sampled HTTP URL
//! (cheap, stateless — no shared-client contention). Every call runs under a
//! hard timeout and timeout-class failures retry with exponential backoff;
//! other errors fail fast.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::B256;
use alloy::providers::{Provider, RootProvider};
use alloy::transports::http::reqwest::Url;
use rand::Rng;
use tracing::{debug, warn};

use crate::constants::{MAX_RPC_ATTEMPTS, RETRY_BASE_DELAY_MS, RPC_CALL_TIMEOUT_SECS};
use crate::errors::{DetectorError, Result};

/// Concrete provider type: Alloy HTTP provider over the Ethereum network.
pub type HttpProvider = RootProvider;

/// Pool of HTTP JSON-RPC endpoints.
#[derive(Clone)]
pub struct RpcPool {
    urls: Arc<Vec<Url>>,
}

impl RpcPool {
    pub fn new(urls: &[String]) -> Result<Self> {
        if urls.is_empty() {
            return Err(DetectorError::Config("no HTTP RPC URLs configured".into()));
        }
        let parsed = urls
            .iter()
            .map(|u| {
                u.parse::<Url>()
                    .map_err(|e| DetectorError::Config(format!("invalid RPC URL {u}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { urls: Arc::new(parsed) })
    }

    /// A fresh provider over a uniformly sampled endpoint.
    pub fn provider(&self) -> HttpProvider {
        let idx = rand::rng().random_range(0..self.urls.len());
        RootProvider::new_http(self.urls[idx].clone())
    }

    /// Run `f` against a sampled provider with the standard 10 s timeout and
    /// retry policy.
    pub async fn with_retry<T, F, Fut>(&self, op: &'static str, f: F) -> Result<T>
    where
        F: Fn(HttpProvider) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.with_retry_timeout(op, RPC_CALL_TIMEOUT_SECS, f).await
    }

    /// As [`with_retry`], with an explicit per-attempt timeout.
    ///
    /// Timeout-class errors retry up to [`MAX_RPC_ATTEMPTS`] with backoff
    /// `500 * 2^(n-1)` ms; everything else returns immediately.
    pub async fn with_retry_timeout<T, F, Fut>(
        &self,
        op: &'static str,
        timeout_secs: u64,
        f: F,
    ) -> Result<T>
    where
        F: Fn(HttpProvider) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let provider = self.provider();
            let outcome =
                tokio::time::timeout(Duration::from_secs(timeout_secs), f(provider)).await;

            let err = match outcome {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) if e.is_timeout_class() => e,
                Ok(Err(e)) => return Err(e),
                Err(_elapsed) => DetectorError::Timeout { op, seconds: timeout_secs },
            };

            if attempt >= MAX_RPC_ATTEMPTS {
                return Err(err);
            }

            let delay = RETRY_BASE_DELAY_MS * 2u64.pow(attempt - 1);
            debug!(op, attempt, delay_ms = delay, error = %err, "RPC retry");
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    /// Hydrate a pending transaction. `None` means the node no longer knows
    /// the hash.
    pub async fn get_transaction_by_hash(&self, hash: B256) -> Result<Option<serde_json::Value>> {
        self.with_retry("eth_getTransactionByHash", move |provider| async move {
            let value: serde_json::Value = provider
                .raw_request("eth_getTransactionByHash".into(), (hash,))
                .await?;
            Ok(if value.is_null() { None } else { Some(value) })
        })
        .await
    }

    /// Current head block number.
    pub async fn block_number(&self) -> Result<u64> {
        self.with_retry("eth_blockNumber", |provider| async move {
            provider.get_block_number().await.map_err(DetectorError::from)
        })
        .await
    }
}

impl std::fmt::Debug for RpcPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcPool").field("endpoints", &self.urls.len()).finish()
    }
}

/// Map a contract-call error into the detector error space, preserving the
/// message so timeout classification still works.
pub fn contract_err(op: &'static str) -> impl Fn(alloy::contract::Error) -> DetectorError {
    move |e| {
        warn!(op, error = %e, "contract call failed");
        DetectorError::Rpc { op, reason: e.to_string() }
    }
}
