use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;

use crate::cleanup::{run_sweeper, DEFAULT_SWEEP_INTERVAL_SECS};
use crate::reminder::{ReminderScheduler, TokioReminderScheduler};
use crate::store::NoteStore;

use super::list::format_row;

/// Execute the watch command: follow the reactive note list, run the cleanup
/// sweeper and fire reminders until the user presses Enter.
pub fn run_watch(store: Arc<NoteStore>) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let (reminders, mut fired) = TokioReminderScheduler::new();
        for note in store.upcoming_reminders(Utc::now())? {
            if let Some(at) = note.reminder_time {
                reminders.schedule(note.id, &note.title, at);
            }
        }

        let mut notes_rx = store.subscribe();
        let sweeper = tokio::spawn(run_sweeper(
            store.clone(),
            Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        ));

        println!(
            "Watching {} note(s). Press Enter to stop.",
            notes_rx.borrow().len()
        );

        let mut stop = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            let _ = std::io::stdin().read_line(&mut line);
        });

        loop {
            tokio::select! {
                _ = &mut stop => break,
                changed = notes_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let notes = notes_rx.borrow_and_update().clone();
                    println!("-- {} note(s) --", notes.len());
                    for note in notes.iter().take(10) {
                        println!("{}", format_row(note));
                    }
                }
                Some(event) = fired.recv() => {
                    println!("Reminder: {}", event.title);
                }
            }
        }

        sweeper.abort();
        Ok(())
    })
}
