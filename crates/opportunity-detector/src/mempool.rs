//! Mempool tap: WebSocket pending-transaction subscription.
//!
//! Subscribes to `eth_subscribe("newPendingTransactions")`, deduplicates
//! hashes through an LRU window, and hydrates each new hash over the RPC
//! pool in an independent task. Hydrated transactions that are still pending
//! and target a monitored router are decoded and published to the bus keyed
//! by transaction hash. Reconnects with capped backoff on disconnection.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy::primitives::{Address, B256, U256};
use futures::{SinkExt, StreamExt};
use lru::LruCache;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::bus::BusProducer;
use crate::config::Config;
use crate::constants::TAP_STARTUP_GRACE_SECS;
use crate::decoder;
use crate::providers::RpcPool;
use crate::types::{RawTx, TxEnvelope};

/// Run the tap until shutdown, reconnecting on failure.
pub async fn run_mempool_tap(
    config: Arc<Config>,
    rpc: RpcPool,
    producer: Arc<BusProducer>,
    shutdown: CancellationToken,
) {
    let cache_size =
        NonZeroUsize::new(config.dedup_cache_size).expect("dedup cache size must be non-zero");
    let mut dedup_cache: LruCache<B256, ()> = LruCache::new(cache_size);
    let mut attempt = 0u32;

    loop {
        if shutdown.is_cancelled() {
            info!("mempool tap shutdown requested");
            return;
        }

        info!(url = %config.wss_rpc_url, attempt = attempt + 1, "connecting to pending stream");

        match connect_and_listen(&config, &rpc, &producer, &mut dedup_cache, &shutdown).await {
            Ok(()) => {
                info!("mempool tap stopped cleanly");
                return;
            }
            Err(e) => {
                attempt += 1;
                if attempt >= config.max_reconnect_attempts {
                    error!(error = %e, attempts = attempt, "max reconnect attempts reached, giving up");
                    return;
                }

                let delay = config.reconnect_delay_seconds * u64::from(attempt).min(6);
                warn!(error = %e, attempt, delay_secs = delay, "pending stream disconnected, reconnecting");

                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(delay)) => {}
                    _ = shutdown.cancelled() => return,
                }
            }
        }
    }
}

async fn connect_and_listen(
    config: &Arc<Config>,
    rpc: &RpcPool,
    producer: &Arc<BusProducer>,
    dedup_cache: &mut LruCache<B256, ()>,
    shutdown: &CancellationToken,
) -> Result<(), anyhow::Error> {
    let (ws_stream, _response) = connect_async(&config.wss_rpc_url).await?;
    let (mut write, mut read) = ws_stream.split();

    let subscribe_msg = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "eth_subscribe",
        "params": ["newPendingTransactions"]
    });
    write.send(Message::Text(subscribe_msg.to_string().into())).await?;

    info!("subscribed to newPendingTransactions");

    // Hashes arriving during the first second are reconnection backlog.
    let started = Instant::now();

    let mut total_received = 0u64;
    let mut total_deduped = 0u64;

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        total_received += 1;

                        if let Some(hash) = extract_pending_hash(&text) {
                            if dedup_cache.contains(&hash) {
                                total_deduped += 1;
                            } else {
                                dedup_cache.put(hash, ());
                                let config = config.clone();
                                let rpc = rpc.clone();
                                let producer = producer.clone();
                                tokio::spawn(async move {
                                    handle_pending_hash(config, rpc, producer, hash, started).await;
                                });
                            }
                        }

                        if total_received % 10_000 == 0 {
                            info!(received = total_received, deduped = total_deduped, "tap stats");
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = write.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) => {
                        return Err(anyhow::anyhow!("WebSocket closed by server"));
                    }
                    Some(Err(e)) => {
                        return Err(e.into());
                    }
                    None => {
                        return Err(anyhow::anyhow!("WebSocket stream ended"));
                    }
                    _ => {} // Binary, Pong, Frame — ignore.
                }
            }
            _ = shutdown.cancelled() => {
                info!("shutdown requested, closing pending stream");
                return Ok(());
            }
        }
    }
}

/// Hydrate one pending hash and publish any decoded swaps.
///
/// Every drop path is silent-but-logged: the upstream feed is not a source
/// of truth, so losing a hash is acceptable.
async fn handle_pending_hash(
    config: Arc<Config>,
    rpc: RpcPool,
    producer: Arc<BusProducer>,
    hash: B256,
    started: Instant,
) {
    let tx_json = match rpc.get_transaction_by_hash(hash).await {
        Ok(Some(v)) => v,
        Ok(None) => {
            debug!(tx = %hash, "hash unknown to node, dropped");
            return;
        }
        Err(e) => {
            debug!(tx = %hash, error = %e, "hydrate failed after retries, dropped");
            return;
        }
    };

    // Already mined transactions carry a block number.
    if tx_json.get("blockNumber").is_some_and(|b| !b.is_null()) {
        debug!(tx = %hash, "already mined, dropped");
        return;
    }

    if started.elapsed() < Duration::from_secs(TAP_STARTUP_GRACE_SECS) {
        debug!(tx = %hash, "startup grace window, dropped");
        return;
    }

    let Some(pending) = parse_pending_tx(&tx_json) else {
        return;
    };

    let swaps =
        decoder::decode_transaction(config.as_ref(), pending.to, &pending.input, pending.value);
    if swaps.is_empty() {
        return;
    }

    let raw_tx = raw_tx_from_json(&tx_json);
    for swap in swaps {
        let envelope = TxEnvelope {
            tx_hash: hash,
            block_number: None,
            decoded_tx: swap,
            router_address: pending.to,
            timestamp: chrono::Utc::now().timestamp_millis(),
            raw_tx: Some(raw_tx.clone()),
        };
        if let Err(e) = producer.publish(&envelope).await {
            warn!(tx = %hash, error = %e, "failed to publish decoded swap");
        }
    }
}

/// Fields a decoder needs from a hydrated transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTx {
    pub to: Address,
    pub input: Vec<u8>,
    pub value: U256,
}

/// Extract the pending hash from a subscription notification.
///
/// Non-notification frames (subscription confirmations, errors) yield `None`.
pub fn extract_pending_hash(text: &str) -> Option<B256> {
    let msg: serde_json::Value = serde_json::from_str(text).ok()?;
    let hash = msg.get("params")?.get("result")?.as_str()?;
    hash.parse().ok()
}

/// Parse the decoder-relevant fields out of a hydrated transaction object.
///
/// Contract creations (`to = null`) and malformed objects yield `None`.
pub fn parse_pending_tx(tx: &serde_json::Value) -> Option<PendingTx> {
    let to: Address = tx.get("to")?.as_str()?.parse().ok()?;
    let input_str = tx.get("input")?.as_str()?;
    let input = hex::decode(input_str.strip_prefix("0x").unwrap_or(input_str)).ok()?;

    let value_str = tx.get("value").and_then(|v| v.as_str()).unwrap_or("0x0");
    let value =
        U256::from_str_radix(value_str.strip_prefix("0x").unwrap_or(value_str), 16)
            .unwrap_or(U256::ZERO);

    Some(PendingTx { to, input, value })
}

fn raw_tx_from_json(tx: &serde_json::Value) -> RawTx {
    let field = |key: &str| tx.get(key).and_then(|v| v.as_str()).map(str::to_string);
    RawTx {
        hash: field("hash").unwrap_or_default(),
        to: field("to"),
        from: field("from"),
        value: field("value").unwrap_or_else(|| "0x0".to_string()),
        data: field("input").unwrap_or_default(),
        gas_price: field("gasPrice"),
        gas_limit: field("gas"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_pending_hash() {
        let notification = r#"{
            "jsonrpc": "2.0",
            "method": "eth_subscription",
            "params": {
                "subscription": "0x9cef478923ff08bf67fde6c64013158d",
                "result": "0xd99d1c33f9fc3444f8101754abc46c52416550d1aaaaaaaaaaaaaaaaaaaaaaaa"
            }
        }"#;
        let hash = extract_pending_hash(notification).unwrap();
        assert_eq!(
            hash.to_string(),
            "0xd99d1c33f9fc3444f8101754abc46c52416550d1aaaaaaaaaaaaaaaaaaaaaaaa"
        );
    }

    #[test]
    fn test_subscription_ack_yields_none() {
        let ack = r#"{"jsonrpc":"2.0","id":1,"result":"0x9cef478923ff08bf67fde6c64013158d"}"#;
        assert!(extract_pending_hash(ack).is_none());
        assert!(extract_pending_hash("not json").is_none());
    }

    #[test]
    fn test_parse_pending_tx() {
        let tx = serde_json::json!({
            "hash": "0xaaaa",
            "to": "0x7a250d5630b4cf539739df2c5dacb4c659f2488d",
            "input": "0x38ed1739",
            "value": "0xde0b6b3a7640000",
            "blockNumber": null
        });
        let pending = parse_pending_tx(&tx).unwrap();
        assert_eq!(pending.input, vec![0x38, 0xed, 0x17, 0x39]);
        assert_eq!(pending.value, U256::from(10u64).pow(U256::from(18u64)));
    }

    #[test]
    fn test_parse_contract_creation_yields_none() {
        let tx = serde_json::json!({
            "hash": "0xaaaa",
            "to": null,
            "input": "0x6080",
            "value": "0x0"
        });
        assert!(parse_pending_tx(&tx).is_none());
    }

    #[test]
    fn test_parse_missing_value_defaults_to_zero() {
        let tx = serde_json::json!({
            "to": "0x7a250d5630b4cf539739df2c5dacb4c659f2488d",
            "input": "0x"
        });
        let pending = parse_pending_tx(&tx).unwrap();
        assert_eq!(pending.value, U256::ZERO);
        assert!(pending.input.is_empty());
    }
}
