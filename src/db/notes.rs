use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use uuid::Uuid;

use super::Database;
use crate::models::{Category, Note, NoteColor};

/// Helper to convert UUID parse errors to rusqlite errors
fn parse_uuid(s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_instant(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl Database {
    // ==================== NOTE WRITE ====================

    /// Idempotent upsert by id. Inserting the same id twice updates the row.
    pub fn upsert_note(&self, note: &Note) -> Result<()> {
        self.conn.execute(
            r#"INSERT INTO notes (
                id, title, content, category, tags, color,
                is_temporary, is_pinned, is_synced, has_audio, is_checklist,
                audio_path, created_at, updated_at, delete_after, reminder_time
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                category = excluded.category,
                tags = excluded.tags,
                color = excluded.color,
                is_temporary = excluded.is_temporary,
                is_pinned = excluded.is_pinned,
                is_synced = excluded.is_synced,
                has_audio = excluded.has_audio,
                is_checklist = excluded.is_checklist,
                audio_path = excluded.audio_path,
                updated_at = excluded.updated_at,
                delete_after = excluded.delete_after,
                reminder_time = excluded.reminder_time"#,
            params![
                note.id.to_string(),
                note.title,
                note.content,
                note.category.as_str(),
                serde_json::to_string(&note.tags)?,
                note.color.as_str(),
                note.is_temporary as i32,
                note.is_pinned as i32,
                note.is_synced as i32,
                note.has_audio as i32,
                note.is_checklist as i32,
                note.audio_path,
                note.created_at.to_rfc3339(),
                note.updated_at.to_rfc3339(),
                note.delete_after.map(|dt| dt.to_rfc3339()),
                note.reminder_time.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    pub fn set_pinned(&self, id: Uuid, pinned: bool) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE notes SET is_pinned = ? WHERE id = ?",
            params![pinned as i32, id.to_string()],
        )?;
        Ok(rows > 0)
    }

    pub fn mark_synced(&self, ids: &[Uuid]) -> Result<()> {
        for id in ids {
            self.conn.execute(
                "UPDATE notes SET is_synced = 1 WHERE id = ?",
                [id.to_string()],
            )?;
        }
        Ok(())
    }

    // ==================== NOTE READ ====================

    pub fn get_note_by_id(&self, id: Uuid) -> Result<Option<Note>> {
        let mut stmt = self.conn.prepare("SELECT * FROM notes WHERE id = ?")?;

        let result = stmt.query_row([id.to_string()], Self::row_to_note);

        match result {
            Ok(note) => Ok(Some(note)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All notes, pinned first, then most recently updated.
    pub fn list_notes(&self) -> Result<Vec<Note>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM notes ORDER BY is_pinned DESC, updated_at DESC")?;

        let notes = stmt
            .query_map([], Self::row_to_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(notes)
    }

    pub fn list_notes_by_category(&self, category: Category) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM notes WHERE category = ? ORDER BY is_pinned DESC, updated_at DESC",
        )?;

        let notes = stmt
            .query_map([category.as_str()], Self::row_to_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(notes)
    }

    /// Case-insensitive substring search over title, content and tags.
    pub fn search_notes(&self, query: &str) -> Result<Vec<Note>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(vec![]);
        }

        // ESCAPE '\' enables backslash escaping for % and _ literals
        let pattern = format!("%{}%", Self::escape_like(&query.to_lowercase()));
        let mut stmt = self.conn.prepare(
            r#"SELECT * FROM notes
               WHERE LOWER(title) LIKE ?1 ESCAPE '\'
                  OR LOWER(content) LIKE ?1 ESCAPE '\'
                  OR LOWER(tags) LIKE ?1 ESCAPE '\'
               ORDER BY is_pinned DESC, updated_at DESC"#,
        )?;

        let notes = stmt
            .query_map([pattern], Self::row_to_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(notes)
    }

    pub fn count_notes(&self) -> Result<u32> {
        let count: u32 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Notes carrying a reminder at or after `now`.
    pub fn notes_with_upcoming_reminders(&self, now: DateTime<Utc>) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM notes WHERE reminder_time IS NOT NULL AND reminder_time >= ? ORDER BY reminder_time ASC",
        )?;

        let notes = stmt
            .query_map([now.to_rfc3339()], Self::row_to_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(notes)
    }

    /// Temporary notes whose `delete_after` has elapsed.
    pub fn expired_notes(&self, now: DateTime<Utc>) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM notes WHERE delete_after IS NOT NULL AND delete_after <= ?",
        )?;

        let notes = stmt
            .query_map([now.to_rfc3339()], Self::row_to_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(notes)
    }

    // ==================== NOTE DELETE ====================

    pub fn delete_note(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ==================== HELPERS ====================

    fn row_to_note(row: &Row) -> rusqlite::Result<Note> {
        let id: String = row.get("id")?;
        let category: String = row.get("category")?;
        let tags: String = row.get("tags")?;
        let color: String = row.get("color")?;
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;
        let delete_after: Option<String> = row.get("delete_after")?;
        let reminder_time: Option<String> = row.get("reminder_time")?;

        Ok(Note {
            id: parse_uuid(&id)?,
            title: row.get("title")?,
            content: row.get("content")?,
            category: Category::parse(&category),
            tags: serde_json::from_str(&tags).unwrap_or_default(),
            color: NoteColor::parse(&color),
            is_temporary: row.get::<_, i32>("is_temporary")? == 1,
            is_pinned: row.get::<_, i32>("is_pinned")? == 1,
            is_synced: row.get::<_, i32>("is_synced")? == 1,
            has_audio: row.get::<_, i32>("has_audio")? == 1,
            is_checklist: row.get::<_, i32>("is_checklist")? == 1,
            audio_path: row.get("audio_path")?,
            created_at: parse_instant(&created_at),
            updated_at: parse_instant(&updated_at),
            delete_after: delete_after.as_deref().map(parse_instant),
            reminder_time: reminder_time.as_deref().map(parse_instant),
        })
    }

    fn escape_like(s: &str) -> String {
        let mut result = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '%' | '_' | '\\' => {
                    result.push('\\');
                    result.push(c);
                }
                _ => result.push(c),
            }
        }
        result
    }
}
