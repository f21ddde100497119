//! One-shot reminder scheduling tied to note ids.
//!
//! Delivery is a platform concern; this layer owns the timers and hands fired
//! reminders to whoever holds the channel receiver.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

/// Trait for reminder backends. Scheduling is fire-and-forget and idempotent
/// by note id: re-scheduling replaces any pending reminder for that note.
pub trait ReminderScheduler: Send + Sync {
    fn schedule(&self, note_id: Uuid, title: &str, at: DateTime<Utc>);
    fn cancel(&self, note_id: Uuid);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderFired {
    pub note_id: Uuid,
    pub title: String,
    pub at: DateTime<Utc>,
}

/// Timer-per-note scheduler. Must be created inside a tokio runtime.
pub struct TokioReminderScheduler {
    timers: Mutex<HashMap<Uuid, JoinHandle<()>>>,
    fired_tx: mpsc::UnboundedSender<ReminderFired>,
}

impl TokioReminderScheduler {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ReminderFired>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let scheduler = Arc::new(Self {
            timers: Mutex::new(HashMap::new()),
            fired_tx,
        });
        (scheduler, fired_rx)
    }

    fn timers(&self) -> MutexGuard<'_, HashMap<Uuid, JoinHandle<()>>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ReminderScheduler for TokioReminderScheduler {
    fn schedule(&self, note_id: Uuid, title: &str, at: DateTime<Utc>) {
        let delay = (at - Utc::now()).to_std().unwrap_or_default();
        let title = title.to_string();
        let fired_tx = self.fired_tx.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!(%note_id, %title, "reminder fired");
            let _ = fired_tx.send(ReminderFired {
                note_id,
                title,
                at,
            });
        });

        // replacing an existing timer cancels it
        if let Some(old) = self.timers().insert(note_id, handle) {
            old.abort();
        }
    }

    fn cancel(&self, note_id: Uuid) {
        if let Some(handle) = self.timers().remove(&note_id) {
            handle.abort();
        }
    }
}
