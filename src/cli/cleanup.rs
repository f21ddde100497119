use anyhow::Result;

use crate::cleanup::sweep_once;
use crate::store::NoteStore;

/// Execute the cleanup command: one sweep pass over expired temporary notes.
pub fn run_cleanup(store: &NoteStore) -> Result<()> {
    match sweep_once(store) {
        Ok(0) => println!("Nothing to purge."),
        Ok(purged) => println!("Purged {} expired note(s).", purged),
        Err(err) => println!("Cleanup failed: {}. It will be retried next run.", err),
    }
    Ok(())
}
