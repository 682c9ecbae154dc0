//! Periodic opportunity cleanup.
//!
//! Runs once at startup and on a fixed interval thereafter. Three passes:
//! expired rows, pending rows (all of them, unless disabled by config), and
//! detected rows whose deadline has passed. Deadlines are re-checked
//! in-process because JSON-numeric comparison in the store is unreliable.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::repositories::OpportunityRepository;
use crate::db::Database;
use crate::errors::Result;

/// Run the cleanup loop until shutdown.
pub async fn run_cleanup_loop(config: Arc<Config>, db: Database, shutdown: CancellationToken) {
    let interval = Duration::from_secs(config.cleanup_interval_minutes * 60);

    loop {
        match cleanup_once(&config, &db).await {
            Ok(deleted) => info!(deleted, "cleanup pass complete"),
            Err(e) => warn!(error = %e, "cleanup pass failed"),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.cancelled() => {
                info!("cleanup loop shutting down");
                return;
            }
        }
    }
}

/// One full cleanup pass; returns the combined deleted-row count.
async fn cleanup_once(config: &Config, db: &Database) -> Result<u64> {
    let pool = db.pool();
    let chain_id = config.chain_id;
    let mut deleted = 0u64;

    deleted += OpportunityRepository::delete_by_status(pool, chain_id, "expired").await?;

    if config.cleanup_prune_pending {
        deleted += OpportunityRepository::delete_by_status(pool, chain_id, "pending").await?;
    }

    deleted += OpportunityRepository::delete_detected_marked_expired(pool, chain_id).await?;

    // Second pass over the survivors: compare deadlines in-process.
    let now = Utc::now().timestamp();
    let detected = OpportunityRepository::fetch_detected(pool, chain_id).await?;
    let stale_ids: Vec<i64> = detected
        .iter()
        .filter(|(_, metadata)| {
            deadline_timestamp(metadata).is_some_and(|deadline| deadline < now)
        })
        .map(|(id, _)| *id)
        .collect();
    deleted += OpportunityRepository::delete_by_ids(pool, &stale_ids).await?;

    Ok(deleted)
}

/// Read `deadlineTimestamp` out of a metadata bag, tolerating both JSON
/// number and decimal-string encodings.
fn deadline_timestamp(metadata: &serde_json::Value) -> Option<i64> {
    let value = metadata.get("deadlineTimestamp")?;
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    value.as_str()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_from_number() {
        let meta = serde_json::json!({"deadlineTimestamp": 1712000000});
        assert_eq!(deadline_timestamp(&meta), Some(1_712_000_000));
    }

    #[test]
    fn test_deadline_from_string() {
        let meta = serde_json::json!({"deadlineTimestamp": "1712000000"});
        assert_eq!(deadline_timestamp(&meta), Some(1_712_000_000));
    }

    #[test]
    fn test_deadline_missing_or_null() {
        assert_eq!(deadline_timestamp(&serde_json::json!({})), None);
        assert_eq!(
            deadline_timestamp(&serde_json::json!({"deadlineTimestamp": null})),
            None
        );
        assert_eq!(
            deadline_timestamp(&serde_json::json!({"deadlineTimestamp": "soon"})),
            None
        );
    }
}
