use thiserror::Error;

/// Typed error hierarchy for the detector.
///
/// Library-internal errors use specific variants; application code wraps with
/// `anyhow::Context` for propagation. Decode misses and pool absence are not
/// errors — they surface as `None`/empty values at the decoder and cache
/// boundaries.
#[derive(Error, Debug)]
pub enum DetectorError {
    // -- RPC ----------------------------------------------------------------
    #[error("RPC call timed out after {seconds}s: {op}")]
    Timeout { op: &'static str, seconds: u64 },

    #[error("RPC call failed: {op}: {reason}")]
    Rpc { op: &'static str, reason: String },

    // -- Quoter -------------------------------------------------------------
    #[error("V3 quoter reverted for pool {pool}: {reason}")]
    QuoterRevert { pool: String, reason: String },

    // -- Configuration ------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),

    // -- Forwarded errors ---------------------------------------------------
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] alloy::transports::TransportError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DetectorError {
    /// Timeout-class errors are retried by the provider pool; everything
    /// else fails fast.
    pub fn is_timeout_class(&self) -> bool {
        match self {
            DetectorError::Timeout { .. } => true,
            DetectorError::Rpc { reason, .. } => {
                let reason = reason.to_ascii_lowercase();
                reason.contains("timeout")
                    || reason.contains("timed out")
                    || reason.contains("connection reset")
            }
            DetectorError::Transport(e) => {
                let text = e.to_string().to_ascii_lowercase();
                text.contains("timeout")
                    || text.contains("timed out")
                    || text.contains("connection reset")
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, DetectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_classification() {
        let e = DetectorError::Timeout { op: "eth_call", seconds: 10 };
        assert!(e.is_timeout_class());

        let e = DetectorError::Rpc { op: "eth_call", reason: "request timed out".into() };
        assert!(e.is_timeout_class());

        let e = DetectorError::Rpc { op: "eth_call", reason: "execution reverted".into() };
        assert!(!e.is_timeout_class());

        let e = DetectorError::Config("bad".into());
        assert!(!e.is_timeout_class());
    }
}
