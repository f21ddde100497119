use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use inquire::{Confirm, Select, Text};

use crate::editor::{EditorSession, SessionStatus};
use crate::models::Category;
use crate::reminder::TokioReminderScheduler;
use crate::search::{replace_all, replace_one, FindSession};
use crate::store::NoteStore;
use crate::text;

use super::show::resolve_note;

/// Execute the edit command: an interactive editor session. Every change is
/// applied through the auto-save controller, so the note persists while the
/// user is still in the menu.
pub fn run_edit(store: Arc<NoteStore>, identifier: Option<&str>) -> Result<()> {
    let existing = match identifier {
        Some(id) => {
            let Some(note) = resolve_note(&store, id)? else {
                println!("No note found: {}", id);
                return Ok(());
            };
            Some(note)
        }
        None => None,
    };

    // the debounce timer and reminder timers need a live runtime
    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();
    let (reminders, _fired) = TokioReminderScheduler::new();

    let session = match existing {
        Some(note) => EditorSession::resume(store.clone(), reminders, note),
        None => EditorSession::new(store.clone(), reminders),
    };

    loop {
        let choice = Select::new(
            "",
            vec![
                "title",
                "append paragraph",
                "tags",
                "category",
                "reminder",
                "find/replace",
                "delete",
                "done",
            ],
        )
        .prompt_skippable()?;

        match choice {
            Some("title") => {
                let draft = session.draft();
                let input = Text::new("title:")
                    .with_initial_value(&draft.title)
                    .prompt_skippable()?;
                if let Some(title) = input {
                    session.edit(|d| d.title = title);
                }
            }
            Some("append paragraph") => {
                let input = Text::new("text:").prompt_skippable()?;
                if let Some(text) = input {
                    if !text.is_empty() {
                        session.edit(|d| d.content.push_str(&format!("<p>{}</p>", text)));
                    }
                }
            }
            Some("tags") => edit_tags(&session)?,
            Some("category") => {
                let names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
                if let Some(picked) = Select::new("category:", names).prompt_skippable()? {
                    session.edit(|d| d.category = Category::parse(picked));
                }
            }
            Some("reminder") => {
                let input = Text::new("remind in minutes (blank clears):").prompt_skippable()?;
                match input.as_deref() {
                    Some("") => session.edit(|d| d.reminder_time = None),
                    Some(minutes) => match minutes.parse::<i64>() {
                        Ok(m) if m > 0 => session.edit(|d| {
                            d.reminder_time = Some(Utc::now() + ChronoDuration::minutes(m));
                        }),
                        _ => println!("Not a valid number of minutes."),
                    },
                    None => {}
                }
            }
            Some("find/replace") => find_replace(&session)?,
            Some("delete") => {
                let confirmed = Confirm::new("Delete this note?")
                    .with_default(false)
                    .prompt_skippable()?;
                if confirmed == Some(true) {
                    match session.delete() {
                        Ok(()) => {
                            println!("Deleted.");
                            return Ok(());
                        }
                        Err(err) => println!("Delete failed: {}. Try again.", err),
                    }
                }
            }
            Some("done") | None => break,
            Some(_) => {}
        }
    }

    session.flush_on_exit()?;
    match session.status() {
        SessionStatus::Deleted => println!("Deleted empty note."),
        _ if session.current_note().is_some() => println!("Saved."),
        _ => println!("Nothing to save."),
    }
    Ok(())
}

fn edit_tags(session: &EditorSession) -> Result<()> {
    let draft = session.draft();
    if !draft.tags.is_empty() {
        println!("tags: {}", draft.tags.join(", "));
    }
    let input = Text::new("add tag (prefix with - to remove):").prompt_skippable()?;
    let Some(input) = input else {
        return Ok(());
    };
    if input.is_empty() {
        return Ok(());
    }

    if let Some(name) = input.strip_prefix('-') {
        let name = name.trim().to_string();
        session.edit(move |d| {
            if !d.remove_tag(&name) {
                println!("No such tag: {}", name);
            }
        });
    } else {
        session.edit(move |d| {
            if let Err(err) = d.add_tag(&input) {
                println!("{}", err);
            }
        });
    }
    Ok(())
}

fn find_replace(session: &EditorSession) -> Result<()> {
    let query = match Text::new("find:").prompt_skippable()? {
        Some(q) if !q.is_empty() => q,
        _ => return Ok(()),
    };

    let mut plain = text::plain_text(&session.draft().content);
    let mut find = FindSession::new(&plain, &query);
    if find.total() == 0 {
        println!("No matches.");
        return Ok(());
    }

    loop {
        match find.current() {
            Some(at) => println!(
                "match {}/{}: {}",
                find.current_ordinal(&plain).unwrap_or(0),
                find.total(),
                snippet(&plain, at, query.len())
            ),
            None => {
                println!("No matches.");
                break;
            }
        }

        let choice = Select::new("", vec!["next", "previous", "replace", "replace all", "back"])
            .prompt_skippable()?;
        match choice {
            Some("next") => {
                find.next(&plain);
            }
            Some("previous") => {
                find.previous(&plain);
            }
            Some("replace") => {
                let Some(replacement) = Text::new("replace with:").prompt_skippable()? else {
                    continue;
                };
                let Some(at) = find.current() else { continue };
                let content = session.draft().content;
                match replace_one(&content, &query, &replacement, at, at + query.len()) {
                    Some(updated) => {
                        session.edit(|d| d.content = updated);
                        plain = text::plain_text(&session.draft().content);
                        find.rescan(&plain);
                    }
                    None => println!("Nothing replaced."),
                }
            }
            Some("replace all") => {
                let Some(replacement) = Text::new("replace with:").prompt_skippable()? else {
                    continue;
                };
                let updated = replace_all(&session.draft().content, &query, &replacement);
                session.edit(|d| d.content = updated);
                plain = text::plain_text(&session.draft().content);
                find.clear();
                println!("Replaced all.");
                break;
            }
            Some("back") | None => break,
            Some(_) => {}
        }
    }
    Ok(())
}

fn snippet(text: &str, at: usize, len: usize) -> String {
    let mut start = at.saturating_sub(20);
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (at + len + 20).min(text.len());
    while !text.is_char_boundary(end) {
        end += 1;
    }
    format!("...{}...", text[start..end].replace('\n', " "))
}
