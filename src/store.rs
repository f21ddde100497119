//! Repository facade over the database.
//!
//! All persistence goes through `NoteStore`, which serializes access to the
//! connection and republishes the pinned-first note list to `watch`
//! subscribers after every mutation. The UI side holds a receiver and re-reads
//! on change; dropping it cancels the subscription.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::warn;
use uuid::Uuid;

use crate::db::Database;
use crate::models::{Category, Note};

/// The seam the editor session writes through. `NoteStore` is the production
/// implementation; tests substitute recording fakes.
pub trait NoteRepository: Send + Sync {
    fn save(&self, note: &Note) -> Result<()>;
    fn delete(&self, id: Uuid) -> Result<bool>;
}

pub struct NoteStore {
    db: Mutex<Database>,
    notes_tx: watch::Sender<Vec<Note>>,
}

impl NoteStore {
    pub fn new(db: Database) -> Result<Self> {
        let initial = db.list_notes()?;
        let (notes_tx, _) = watch::channel(initial);
        Ok(Self {
            db: Mutex::new(db),
            notes_tx,
        })
    }

    /// Reactive pinned-first list. The receiver sees a fresh value after
    /// every mutation made through this store.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Note>> {
        self.notes_tx.subscribe()
    }

    pub fn get(&self, id: Uuid) -> Result<Option<Note>> {
        self.db().get_note_by_id(id)
    }

    pub fn list(&self) -> Result<Vec<Note>> {
        self.db().list_notes()
    }

    pub fn list_category(&self, category: Category) -> Result<Vec<Note>> {
        self.db().list_notes_by_category(category)
    }

    pub fn search(&self, query: &str) -> Result<Vec<Note>> {
        self.db().search_notes(query)
    }

    pub fn upcoming_reminders(&self, now: DateTime<Utc>) -> Result<Vec<Note>> {
        self.db().notes_with_upcoming_reminders(now)
    }

    pub fn count(&self) -> Result<u32> {
        self.db().count_notes()
    }

    pub fn save(&self, note: &Note) -> Result<()> {
        self.db().upsert_note(note)?;
        self.republish();
        Ok(())
    }

    /// Delete the row and any audio file the note owns. Audio removal
    /// failures are logged, not propagated.
    pub fn delete(&self, id: Uuid) -> Result<bool> {
        let note = {
            let db = self.db();
            let note = db.get_note_by_id(id)?;
            db.delete_note(id)?;
            note
        };

        let Some(note) = note else {
            return Ok(false);
        };
        if let Some(audio) = &note.audio_path {
            remove_audio_file(audio);
        }
        self.republish();
        Ok(true)
    }

    pub fn toggle_pin(&self, id: Uuid) -> Result<Option<bool>> {
        let pinned = {
            let db = self.db();
            let Some(note) = db.get_note_by_id(id)? else {
                return Ok(None);
            };
            let pinned = !note.is_pinned;
            db.set_pinned(id, pinned)?;
            pinned
        };
        self.republish();
        Ok(Some(pinned))
    }

    pub fn mark_synced(&self, ids: &[Uuid]) -> Result<()> {
        self.db().mark_synced(ids)?;
        self.republish();
        Ok(())
    }

    /// Drop the audio reference from a note and remove its file.
    pub fn clear_audio(&self, id: Uuid) -> Result<bool> {
        let removed = {
            let db = self.db();
            let Some(mut note) = db.get_note_by_id(id)? else {
                return Ok(false);
            };
            let path = note.clear_audio();
            note.touch();
            db.upsert_note(&note)?;
            path
        };
        if let Some(audio) = removed {
            remove_audio_file(&audio);
        }
        self.republish();
        Ok(true)
    }

    /// Purge temporary notes whose `delete_after` has elapsed. Returns how
    /// many rows were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let expired = {
            let db = self.db();
            let expired = db.expired_notes(now)?;
            for note in &expired {
                db.delete_note(note.id)?;
            }
            expired
        };

        if expired.is_empty() {
            return Ok(0);
        }
        for note in &expired {
            if let Some(audio) = &note.audio_path {
                remove_audio_file(audio);
            }
        }
        self.republish();
        Ok(expired.len())
    }

    /// Upsert a batch of restored notes in one pass.
    pub fn restore(&self, notes: &[Note]) -> Result<()> {
        {
            let db = self.db();
            for note in notes {
                db.upsert_note(note)?;
            }
        }
        self.republish();
        Ok(())
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn republish(&self) {
        match self.db().list_notes() {
            Ok(notes) => {
                self.notes_tx.send_replace(notes);
            }
            Err(err) => warn!(%err, "failed to refresh note list"),
        }
    }
}

impl NoteRepository for NoteStore {
    fn save(&self, note: &Note) -> Result<()> {
        NoteStore::save(self, note)
    }

    fn delete(&self, id: Uuid) -> Result<bool> {
        NoteStore::delete(self, id)
    }
}

fn remove_audio_file(path: &str) {
    if !Path::new(path).exists() {
        return;
    }
    if let Err(err) = std::fs::remove_file(path) {
        warn!(%err, path, "failed to remove audio file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::io::Write;

    fn store() -> NoteStore {
        NoteStore::new(Database::open_memory().unwrap()).unwrap()
    }

    #[test]
    fn test_save_republishes_pinned_first() {
        let store = store();
        let mut rx = store.subscribe();
        assert!(rx.borrow().is_empty());

        let mut a = Note::new("a".to_string(), String::new());
        store.save(&a).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        let mut b = Note::new("b".to_string(), String::new());
        b.is_pinned = true;
        store.save(&b).unwrap();
        assert_eq!(rx.borrow_and_update()[0].title, "b");

        a.touch();
        store.save(&a).unwrap();
        // pinned note stays first regardless of recency
        assert_eq!(rx.borrow_and_update()[0].title, "b");
    }

    #[test]
    fn test_delete_missing_is_false() {
        let store = store();
        assert!(!store.delete(Uuid::new_v4()).unwrap());
    }

    #[test]
    fn test_delete_removes_owned_audio_file() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("memo.m4a");
        let mut file = std::fs::File::create(&audio).unwrap();
        file.write_all(b"pcm").unwrap();

        let store = store();
        let mut note = Note::new("voice".to_string(), String::new());
        note.set_audio(audio.to_string_lossy().to_string());
        store.save(&note).unwrap();

        assert!(store.delete(note.id).unwrap());
        assert!(!audio.exists());
    }

    #[test]
    fn test_toggle_pin() {
        let store = store();
        let note = Note::new("p".to_string(), String::new());
        store.save(&note).unwrap();

        assert_eq!(store.toggle_pin(note.id).unwrap(), Some(true));
        assert_eq!(store.toggle_pin(note.id).unwrap(), Some(false));
        assert_eq!(store.toggle_pin(Uuid::new_v4()).unwrap(), None);
    }

    #[test]
    fn test_purge_expired_republishes() {
        let store = store();
        let now = Utc::now();

        let mut expired = Note::new("old".to_string(), String::new());
        expired.make_temporary(now - Duration::minutes(5));
        store.save(&expired).unwrap();
        let keep = Note::new("keep".to_string(), String::new());
        store.save(&keep).unwrap();

        let mut rx = store.subscribe();
        assert_eq!(store.purge_expired(now).unwrap(), 1);
        let notes = rx.borrow_and_update();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "keep");
    }

    #[test]
    fn test_clear_audio_detaches_and_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("memo.m4a");
        std::fs::write(&audio, b"pcm").unwrap();

        let store = store();
        let mut note = Note::new("voice".to_string(), "<p>x</p>".to_string());
        note.set_audio(audio.to_string_lossy().to_string());
        store.save(&note).unwrap();

        assert!(store.clear_audio(note.id).unwrap());
        assert!(!audio.exists());
        let loaded = store.get(note.id).unwrap().unwrap();
        assert!(!loaded.has_audio);
        assert_eq!(loaded.audio_path, None);
    }

    #[test]
    fn test_restore_upserts_batch() {
        let store = store();
        let a = Note::new("a".to_string(), String::new());
        let b = Note::new("b".to_string(), String::new());
        store.save(&a).unwrap();

        store.restore(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }
}
