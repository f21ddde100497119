use anyhow::Result;

use crate::models::{Category, Note};
use crate::store::NoteStore;

/// Execute the list command
pub fn run_list(store: &NoteStore, category: Option<&str>, limit: usize, all: bool) -> Result<()> {
    let notes = match category {
        Some(c) => store.list_category(Category::parse(c))?,
        None => store.list()?,
    };

    if notes.is_empty() {
        println!("No notes.");
        return Ok(());
    }

    let shown = if all { notes.len() } else { limit.min(notes.len()) };
    for note in &notes[..shown] {
        println!("{}", format_row(note));
    }
    if shown < notes.len() {
        println!("... and {} more (use --all)", notes.len() - shown);
    }

    Ok(())
}

pub fn format_row(note: &Note) -> String {
    let pin = if note.is_pinned { "*" } else { " " };
    let title = if note.title.trim().is_empty() {
        "(untitled)"
    } else {
        note.title.trim()
    };
    let mut row = format!(
        "{} {}  {}  [{}]",
        pin,
        short_id(note),
        title,
        note.category.as_str()
    );
    if !note.tags.is_empty() {
        row.push_str(&format!("  #{}", note.tags.join(" #")));
    }
    if note.reminder_time.is_some() {
        row.push_str("  (reminder)");
    }
    if note.has_audio {
        row.push_str("  (audio)");
    }
    row
}

pub fn short_id(note: &Note) -> String {
    note.id.to_string().chars().take(8).collect()
}
