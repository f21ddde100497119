use anyhow::Result;

use crate::search::count_matches;
use crate::store::NoteStore;
use crate::text;

use super::list::format_row;

/// Execute the search command
pub fn run_search(store: &NoteStore, query: &str) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        println!("No search term.");
        return Ok(());
    }

    let results = store.search(query)?;
    if results.is_empty() {
        println!("No matches.");
        return Ok(());
    }

    for note in &results {
        let body = text::plain_text(&note.content);
        let in_body = count_matches(&body, query);
        if in_body > 0 {
            println!("{}  ({} in text)", format_row(note), in_body);
        } else {
            println!("{}", format_row(note));
        }
    }
    println!("{} note(s).", results.len());
    Ok(())
}
