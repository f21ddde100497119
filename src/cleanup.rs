//! Best-effort purge of temporary notes whose `delete_after` has elapsed.
//!
//! Failures are never fatal: the interval loop logs and retries on the next
//! tick.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::store::NoteStore;

pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 15 * 60;

/// One sweep pass. Returns how many notes were purged.
pub fn sweep_once(store: &NoteStore) -> Result<usize> {
    store.purge_expired(Utc::now())
}

/// Periodic sweep loop. Runs until the task is dropped.
pub async fn run_sweeper(store: Arc<NoteStore>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        match sweep_once(&store) {
            Ok(0) => {}
            Ok(purged) => info!(purged, "purged expired notes"),
            Err(err) => warn!(%err, "cleanup sweep failed, will retry"),
        }
    }
}
