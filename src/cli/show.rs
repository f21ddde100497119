use anyhow::Result;
use uuid::Uuid;

use crate::models::Note;
use crate::store::NoteStore;
use crate::text;

/// Execute the show command
pub fn run_show(store: &NoteStore, identifier: &str) -> Result<()> {
    match resolve_note(store, identifier)? {
        Some(note) => print_full_note(&note),
        None => println!("No note found: {}", identifier),
    }
    Ok(())
}

/// Resolve a full UUID or a unique id prefix to a note.
pub fn resolve_note(store: &NoteStore, identifier: &str) -> Result<Option<Note>> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Ok(None);
    }

    if let Ok(id) = Uuid::parse_str(identifier) {
        return store.get(id);
    }

    let prefix = identifier.to_lowercase();
    let matches: Vec<Note> = store
        .list()?
        .into_iter()
        .filter(|n| n.id.to_string().starts_with(&prefix))
        .collect();

    match matches.len() {
        1 => Ok(matches.into_iter().next()),
        0 => Ok(None),
        _ => {
            println!("Ambiguous id prefix: {} notes match.", matches.len());
            Ok(None)
        }
    }
}

pub fn print_full_note(note: &Note) {
    let title = if note.title.trim().is_empty() {
        "(untitled)"
    } else {
        note.title.trim()
    };
    println!("{}", title);
    println!("id:       {}", note.id);
    println!("category: {}  color: {}", note.category.as_str(), note.color.as_str());
    if !note.tags.is_empty() {
        println!("tags:     {}", note.tags.join(", "));
    }
    println!("created:  {}", note.created_at.format("%Y-%m-%d %H:%M"));
    println!("updated:  {}", note.updated_at.format("%Y-%m-%d %H:%M"));
    if let Some(at) = note.reminder_time {
        println!("reminder: {}", at.format("%Y-%m-%d %H:%M"));
    }
    if let Some(after) = note.delete_after {
        println!("expires:  {}", after.format("%Y-%m-%d %H:%M"));
    }
    if let Some(audio) = &note.audio_path {
        println!("audio:    {}", audio);
    }
    println!();
    let body = text::plain_text(&note.content);
    let body = body.trim_end();
    if body.is_empty() {
        println!("(empty)");
    } else {
        println!("{}", body);
    }
}
