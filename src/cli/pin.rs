use anyhow::Result;

use crate::store::NoteStore;

use super::show::resolve_note;

/// Execute the pin command: toggles the pinned flag.
pub fn run_pin(store: &NoteStore, identifier: &str) -> Result<()> {
    let Some(note) = resolve_note(store, identifier)? else {
        println!("No note found: {}", identifier);
        return Ok(());
    };

    match store.toggle_pin(note.id)? {
        Some(true) => println!("Pinned."),
        Some(false) => println!("Unpinned."),
        None => println!("No note found: {}", identifier),
    }
    Ok(())
}
