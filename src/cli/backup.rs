use std::path::Path;

use anyhow::Result;

use crate::backup::{read_backup, write_backup};
use crate::store::NoteStore;

/// Execute the backup command
pub fn run_backup(store: &NoteStore, path: &Path) -> Result<()> {
    let notes = store.list()?;
    if notes.is_empty() {
        println!("No notes to back up.");
        return Ok(());
    }

    write_backup(&notes, path)?;
    let ids: Vec<_> = notes.iter().map(|n| n.id).collect();
    store.mark_synced(&ids)?;
    println!("Backed up {} note(s) to {}", notes.len(), path.display());
    Ok(())
}

/// Execute the restore command
pub fn run_restore(store: &NoteStore, path: &Path) -> Result<()> {
    let payload = read_backup(path)?;
    if payload.notes.is_empty() {
        println!("Archive contains no notes.");
        return Ok(());
    }

    store.restore(&payload.notes)?;
    println!(
        "Restored {} note(s) from backup taken {}",
        payload.notes.len(),
        payload.exported_at.format("%Y-%m-%d %H:%M")
    );
    Ok(())
}
