//! Bus consumer and opportunity writer.
//!
//! Reads the transactions topic (`auto.offset.reset = latest`), gates each
//! message on age and mined-status, evaluates the decoded swap, and upserts
//! the verdict on `(chain_id, tx_hash)`. An error in one message never
//! crashes the consumer: it is logged with context and the stream advances.

use std::sync::Arc;

use chrono::Utc;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::BorrowedMessage;
use rdkafka::{ClientConfig, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::db::models::NewOpportunity;
use crate::db::repositories::OpportunityRepository;
use crate::db::Database;
use crate::errors::Result;
use crate::evaluator::Evaluator;
use crate::providers::RpcPool;
use crate::types::{lower_hex, TxEnvelope};

pub struct ConsumerContext {
    pub config: Arc<Config>,
    pub db: Database,
    pub rpc: RpcPool,
    pub evaluator: Arc<Evaluator>,
}

/// Run the consumer loop until shutdown.
pub async fn run_consumer(ctx: ConsumerContext, shutdown: CancellationToken) {
    let consumer: StreamConsumer = match ClientConfig::new()
        .set("bootstrap.servers", &ctx.config.kafka_brokers)
        .set("client.id", &ctx.config.kafka_client_id)
        .set("group.id", &ctx.config.kafka_group_id)
        .set("enable.auto.commit", "true")
        .set("auto.offset.reset", "latest")
        .create()
    {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to create bus consumer");
            return;
        }
    };

    if let Err(e) = consumer.subscribe(&[ctx.config.transactions_topic.as_str()]) {
        error!(error = %e, topic = %ctx.config.transactions_topic, "failed to subscribe");
        return;
    }

    info!(topic = %ctx.config.transactions_topic, group = %ctx.config.kafka_group_id, "bus consumer running");

    let mut processed = 0u64;
    let mut persisted = 0u64;

    loop {
        tokio::select! {
            received = consumer.recv() => {
                match received {
                    Ok(message) => {
                        processed += 1;
                        match handle_message(&ctx, &message).await {
                            Ok(true) => persisted += 1,
                            Ok(false) => {}
                            Err(e) => {
                                warn!(
                                    error = %e,
                                    offset = message.offset(),
                                    partition = message.partition(),
                                    "message handling failed, advancing"
                                );
                            }
                        }

                        if processed % 1000 == 0 {
                            info!(processed, persisted, "consumer stats");
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "bus receive error");
                        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                    }
                }
            }
            _ = shutdown.cancelled() => {
                info!(processed, persisted, "bus consumer shutting down");
                return;
            }
        }
    }
}

/// Process one envelope; returns whether an opportunity row was written.
async fn handle_message(ctx: &ConsumerContext, message: &BorrowedMessage<'_>) -> Result<bool> {
    let Some(payload) = message.payload() else {
        return Ok(false);
    };
    let envelope: TxEnvelope = serde_json::from_slice(payload)?;
    let tx_hash = envelope.tx_hash.to_string();

    // Age gate: prefer the envelope timestamp, fall back to the broker's.
    let now_ms = Utc::now().timestamp_millis();
    if is_stale(
        envelope.timestamp,
        message.timestamp().to_millis(),
        now_ms,
        ctx.config.max_message_age_seconds,
    ) {
        debug!(tx = %tx_hash, "stale message, dropped");
        return Ok(false);
    }

    // Already-mined gate.
    if envelope.block_number.is_some() {
        debug!(tx = %tx_hash, "already mined, dropped");
        return Ok(false);
    }

    let swap = &envelope.decoded_tx;
    let (detection, current_block) =
        tokio::join!(ctx.evaluator.detect(&tx_hash, swap), ctx.rpc.block_number());

    if !detection.is_opportunity {
        debug!(tx = %tx_hash, reason = %detection.reason, "not an opportunity");
        return Ok(false);
    }

    let block_number = match current_block {
        Ok(n) => Some(n as i64),
        Err(e) => {
            warn!(tx = %tx_hash, error = %e, "block number fetch failed");
            None
        }
    };

    let status = if detection.is_expired { "expired" } else { "detected" };
    let metadata = serde_json::json!({
        "decimals": {
            "tokenIn": detection.token_in_decimals,
            "tokenOut": detection.token_out_decimals,
        },
        "decodedSwap": serde_json::to_value(swap)?,
        "reason": detection.reason,
        "timeToSubmitSeconds": detection.time_to_submit_seconds,
        "deadlineTimestamp": detection.deadline_timestamp,
        "isExpired": detection.is_expired,
        "priceImpact": detection.price_impact,
        "expectedProfit": detection.expected_profit_formatted,
        "amountOut": detection.amount_out.map(|v| v.to_string()),
        "poolAddress": detection.pool_address,
    });

    let record = NewOpportunity {
        chain_id: ctx.config.chain_id,
        tx_hash: tx_hash.clone(),
        router: lower_hex(&swap.router),
        router_family: swap.router_family.as_str().to_string(),
        token_in: lower_hex(&swap.token_in),
        token_out: lower_hex(&swap.token_out),
        amount_in: swap.amount_in.to_string(),
        amount_out_min: swap.amount_out_min.to_string(),
        amount_in_max: swap.amount_in_max.to_string(),
        fee: swap.fee.clone(),
        pool_address: detection.pool_address.clone(),
        method: swap.method.as_str().to_string(),
        recipient: lower_hex(&swap.recipient),
        deadline: swap.deadline.clone(),
        block_number,
        status: status.to_string(),
        metadata,
    };
    OpportunityRepository::upsert(ctx.db.pool(), &record).await?;

    info!(
        tx = %tx_hash,
        status,
        impact = ?detection.price_impact,
        profit = ?detection.expected_profit_formatted,
        "opportunity persisted"
    );
    Ok(true)
}

/// Whether a message is older than the age window. A non-positive envelope
/// timestamp defers to the broker timestamp; with neither, the message is
/// kept.
fn is_stale(
    envelope_ts_ms: i64,
    broker_ts_ms: Option<i64>,
    now_ms: i64,
    max_age_secs: i64,
) -> bool {
    let ts = if envelope_ts_ms > 0 { Some(envelope_ts_ms) } else { broker_ts_ms };
    match ts {
        Some(ts) => now_ms - ts > max_age_secs * 1000,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_712_000_000_000;
    const MAX_AGE: i64 = 600;

    #[test]
    fn test_fresh_message_kept() {
        assert!(!is_stale(NOW - 1_000, None, NOW, MAX_AGE));
    }

    #[test]
    fn test_old_message_dropped() {
        assert!(is_stale(NOW - 601_000, None, NOW, MAX_AGE));
    }

    #[test]
    fn test_exact_boundary_kept() {
        // Strictly-older-than semantics.
        assert!(!is_stale(NOW - 600_000, None, NOW, MAX_AGE));
    }

    #[test]
    fn test_broker_timestamp_fallback() {
        assert!(is_stale(0, Some(NOW - 601_000), NOW, MAX_AGE));
        assert!(!is_stale(0, Some(NOW - 1_000), NOW, MAX_AGE));
    }

    #[test]
    fn test_no_timestamp_kept() {
        assert!(!is_stale(0, None, NOW, MAX_AGE));
    }
}
