//! One-shot export of materialized notes.
//!
//! Exports are best-effort: callers log failures and move on, nothing here
//! feeds back into the note data model.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::models::Note;
use crate::text;

/// Lines per page in the paginated document format.
pub const PAGE_LINES: usize = 40;

/// Shareable plain-text payload: title, a metadata line, then the stripped
/// content.
pub fn note_to_plain_text(note: &Note) -> String {
    let mut out = String::new();
    if !note.title.trim().is_empty() {
        out.push_str(note.title.trim());
        out.push('\n');
    }
    out.push_str(&format!(
        "[{} | {} | {}]\n",
        note.category.as_str(),
        note.updated_at.format("%Y-%m-%d %H:%M"),
        if note.tags.is_empty() {
            "no tags".to_string()
        } else {
            note.tags.join(", ")
        },
    ));
    out.push('\n');
    let body = text::plain_text(&note.content);
    out.push_str(body.trim_end());
    out.push('\n');
    out
}

pub fn write_plain_text(note: &Note, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(note_to_plain_text(note).as_bytes())?;
    Ok(())
}

/// Split text into pages of at most `lines_per_page` lines.
pub fn paginate(text: &str, lines_per_page: usize) -> Vec<String> {
    let lines_per_page = lines_per_page.max(1);
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return vec![String::new()];
    }
    lines
        .chunks(lines_per_page)
        .map(|chunk| chunk.join("\n"))
        .collect()
}

/// Paginated document with per-page headers. The rendering canvas is the
/// platform's job; the page layout is ours.
pub fn write_document(note: &Note, path: &Path) -> Result<()> {
    let body = note_to_plain_text(note);
    let pages = paginate(&body, PAGE_LINES);
    let total = pages.len();

    let mut file = File::create(path)?;
    for (i, page) in pages.iter().enumerate() {
        writeln!(file, "--- Page {} of {} ---", i + 1, total)?;
        writeln!(file, "{}", page)?;
        if i + 1 < total {
            writeln!(file)?;
        }
    }
    Ok(())
}

/// One CSV row per note.
///
/// Headers match field names exactly; content is the plain-text projection.
#[derive(Debug, Serialize)]
struct ExportRow {
    id: String,
    title: String,
    category: String,
    tags: String,
    created_at: String,
    updated_at: String,
    pinned: bool,
    content: String,
}

impl ExportRow {
    fn from_note(note: &Note) -> Self {
        Self {
            id: note.id.to_string(),
            title: note.title.clone(),
            category: note.category.as_str().to_string(),
            tags: note.tags.join(";"),
            created_at: note.created_at.to_rfc3339(),
            updated_at: note.updated_at.to_rfc3339(),
            pinned: note.is_pinned,
            content: text::plain_text(&note.content),
        }
    }
}

pub fn write_csv<W: Write>(notes: &[Note], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for note in notes {
        csv.serialize(ExportRow::from_note(note))?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_csv_file(notes: &[Note], path: &Path) -> Result<()> {
    write_csv(notes, File::create(path)?)
}
