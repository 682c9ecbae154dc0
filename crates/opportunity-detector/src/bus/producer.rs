//! Kafka producer for decoded-swap envelopes.

use std::time::Duration;

use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use rdkafka::ClientConfig;
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::{DetectorError, Result};
use crate::types::TxEnvelope;

/// Process-lifecycle producer handle: constructed once at startup, shared by
/// reference, flushed at shutdown.
pub struct BusProducer {
    producer: FutureProducer,
    topic: String,
}

impl BusProducer {
    pub fn new(config: &Config) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.kafka_brokers)
            .set("client.id", &config.kafka_client_id)
            .set("message.timeout.ms", "5000")
            .create()?;

        info!(brokers = %config.kafka_brokers, topic = %config.transactions_topic, "bus producer ready");
        Ok(Self { producer, topic: config.transactions_topic.clone() })
    }

    /// Publish one envelope, keyed by transaction hash.
    pub async fn publish(&self, envelope: &TxEnvelope) -> Result<()> {
        let payload = serde_json::to_string(envelope)?;
        let key = envelope.tx_hash.to_string();

        self.producer
            .send(
                FutureRecord::to(&self.topic).key(&key).payload(&payload),
                Timeout::After(Duration::from_secs(5)),
            )
            .await
            .map_err(|(e, _msg)| DetectorError::from(e))?;

        debug!(tx = %key, bytes = payload.len(), "published envelope");
        Ok(())
    }

    /// Flush in-flight messages; called on shutdown.
    pub fn flush(&self) {
        if let Err(e) = self.producer.flush(Timeout::After(Duration::from_secs(5))) {
            tracing::warn!(error = %e, "producer flush failed");
        }
    }
}
