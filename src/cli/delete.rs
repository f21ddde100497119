use anyhow::Result;
use inquire::Confirm;

use crate::store::NoteStore;

use super::show::resolve_note;

/// Execute the delete command
pub fn run_delete(store: &NoteStore, identifier: &str, force: bool) -> Result<()> {
    let Some(note) = resolve_note(store, identifier)? else {
        println!("No note found: {}", identifier);
        return Ok(());
    };

    if !force {
        let title = if note.title.trim().is_empty() {
            "(untitled)"
        } else {
            note.title.trim()
        };
        let confirmed = Confirm::new(&format!("Delete \"{}\"?", title))
            .with_default(false)
            .prompt_skippable()?;
        if confirmed != Some(true) {
            println!("Kept.");
            return Ok(());
        }
    }

    match store.delete(note.id) {
        Ok(_) => println!("Deleted."),
        Err(err) => {
            // abandoned for this attempt; the user may retry
            println!("Delete failed: {}. Try again.", err);
        }
    }
    Ok(())
}
