use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};

use crate::models::{Category, Note};
use crate::store::NoteStore;

/// Execute the add command: a one-shot save with no editor session.
pub fn run_add(
    store: &NoteStore,
    title: Option<String>,
    content: Option<String>,
    category: Option<&str>,
    tags: &[String],
    expire_days: Option<i64>,
) -> Result<()> {
    let mut note = Note::new(title.unwrap_or_default(), content.unwrap_or_default());
    if note.is_blank() {
        println!("Nothing to save.");
        return Ok(());
    }
    if let Some(c) = category {
        note.category = Category::parse(c);
    }
    for tag in tags {
        if let Err(err) = note.add_tag(tag) {
            println!("{}", err);
        }
    }
    match expire_days {
        Some(days) if days > 0 => note.make_temporary(Utc::now() + ChronoDuration::days(days)),
        Some(_) => println!("Ignoring --expire-days: must be positive."),
        None => {}
    }

    store.save(&note)?;
    println!("Saved {}", super::list::short_id(&note));
    Ok(())
}
