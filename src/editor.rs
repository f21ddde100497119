//! Auto-save controller for one editor session.
//!
//! Reconciles continuous edits with the persisted note: rapid edits coalesce
//! into one debounced save, a brand-new note that stays blank is never
//! written, and a deleted note can never be resurrected by a save that was
//! already in flight. At most one row is created per session; the first
//! successful write binds the session to the persisted note and later saves
//! update it in place.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::models::{clip_title, validate_tag, Category, Note, NoteColor, NoteError};
use crate::reminder::ReminderScheduler;
use crate::store::NoteRepository;
use crate::text;

/// Quiet period after the last edit before the pending save fires.
pub const SAVE_DEBOUNCE_MS: u64 = 500;

/// Session lifecycle. `Deleting` is entered before the delete call is issued,
/// so a save racing it sees a non-active session; the only way back to
/// `Active` is the explicit rollback when the delete fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Deleting,
    Deleted,
}

/// In-memory working copy of the editable fields.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub title: String,
    pub content: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub color: NoteColor,
    pub is_checklist: bool,
    pub reminder_time: Option<DateTime<Utc>>,
}

impl Draft {
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            category: note.category,
            tags: note.tags.clone(),
            color: note.color,
            is_checklist: note.is_checklist,
            reminder_time: note.reminder_time,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && text::is_blank(&self.content)
    }

    pub fn add_tag(&mut self, tag: &str) -> Result<(), NoteError> {
        let tag = validate_tag(&self.tags, tag)?;
        self.tags.push(tag);
        Ok(())
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| !t.eq_ignore_ascii_case(tag));
        self.tags.len() != before
    }

    /// Materialize a note to persist. Identity and creation time come from
    /// the already-bound note when there is one; `updated_at` never moves
    /// backwards.
    fn to_note(&self, current: Option<&Note>, now: DateTime<Utc>) -> Note {
        let mut note = match current {
            Some(existing) => existing.clone(),
            None => Note::new(String::new(), String::new()),
        };
        note.title = clip_title(&self.title);
        note.content = self.content.clone();
        note.category = self.category;
        note.tags = self.tags.clone();
        note.color = self.color;
        note.is_checklist = self.is_checklist;
        note.reminder_time = self.reminder_time;
        // edits invalidate the last backup
        note.is_synced = false;
        note.updated_at = now.max(note.updated_at);
        note
    }
}

struct SessionState {
    draft: Draft,
    current: Option<Note>,
    status: SessionStatus,
    pending: Option<JoinHandle<()>>,
}

struct SessionShared {
    store: Arc<dyn NoteRepository>,
    reminders: Arc<dyn ReminderScheduler>,
    state: Mutex<SessionState>,
}

pub struct EditorSession {
    shared: Arc<SessionShared>,
}

impl EditorSession {
    /// Open the editor on a brand-new note. Nothing is persisted until the
    /// draft has content.
    pub fn new(store: Arc<dyn NoteRepository>, reminders: Arc<dyn ReminderScheduler>) -> Self {
        Self::with_state(store, reminders, Draft::default(), None)
    }

    /// Open the editor on an existing note.
    pub fn resume(
        store: Arc<dyn NoteRepository>,
        reminders: Arc<dyn ReminderScheduler>,
        note: Note,
    ) -> Self {
        let draft = Draft::from_note(&note);
        Self::with_state(store, reminders, draft, Some(note))
    }

    fn with_state(
        store: Arc<dyn NoteRepository>,
        reminders: Arc<dyn ReminderScheduler>,
        draft: Draft,
        current: Option<Note>,
    ) -> Self {
        Self {
            shared: Arc::new(SessionShared {
                store,
                reminders,
                state: Mutex::new(SessionState {
                    draft,
                    current,
                    status: SessionStatus::Active,
                    pending: None,
                }),
            }),
        }
    }

    /// Apply an edit to the draft and re-arm the debounce timer. Must be
    /// called from within a tokio runtime.
    pub fn edit(&self, apply: impl FnOnce(&mut Draft)) {
        let mut state = self.shared.state();
        if state.status != SessionStatus::Active {
            return;
        }
        apply(&mut state.draft);

        cancel_pending(&mut state);
        let shared = Arc::clone(&self.shared);
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(SAVE_DEBOUNCE_MS)).await;
            if let Err(err) = shared.save_now() {
                warn!(%err, "auto-save failed");
            }
        }));
    }

    /// Persist the draft immediately, canceling any pending debounce.
    pub fn save(&self) -> Result<()> {
        self.shared.save_now().map(|_| ())
    }

    /// Delete the persisted note. The sticky guard is set before the store
    /// call is issued and rolled back only if the delete fails.
    pub fn delete(&self) -> Result<()> {
        let mut state = self.shared.state();
        self.shared.delete_locked(&mut state)
    }

    /// Called when the editor closes: an existing note emptied during the
    /// session is deleted, anything else is saved.
    pub fn flush_on_exit(&self) -> Result<()> {
        let mut state = self.shared.state();
        if state.status != SessionStatus::Active {
            cancel_pending(&mut state);
            return Ok(());
        }
        if state.current.is_some() && state.draft.is_blank() {
            self.shared.delete_locked(&mut state)
        } else {
            self.shared.save_locked(&mut state).map(|_| ())
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.shared.state().status
    }

    /// The persisted note this session is bound to, if any save succeeded.
    pub fn current_note(&self) -> Option<Note> {
        self.shared.state().current.clone()
    }

    pub fn draft(&self) -> Draft {
        self.shared.state().draft.clone()
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        // the timer must not outlive the session
        cancel_pending(&mut self.shared.state());
    }
}

impl SessionShared {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn save_now(&self) -> Result<Option<Note>> {
        let mut state = self.state();
        self.save_locked(&mut state)
    }

    fn save_locked(&self, state: &mut SessionState) -> Result<Option<Note>> {
        cancel_pending(state);
        if state.status != SessionStatus::Active {
            return Ok(None);
        }
        // never create a row for a note that was never given content
        if state.current.is_none() && state.draft.is_blank() {
            return Ok(None);
        }

        let now = Utc::now();
        let note = state.draft.to_note(state.current.as_ref(), now);
        self.store.save(&note)?;
        state.current = Some(note.clone());

        match note.reminder_time {
            Some(at) if at > now => self.reminders.schedule(note.id, &note.title, at),
            _ => self.reminders.cancel(note.id),
        }
        Ok(Some(note))
    }

    fn delete_locked(&self, state: &mut SessionState) -> Result<()> {
        if state.status != SessionStatus::Active {
            return Ok(());
        }
        cancel_pending(state);
        state.status = SessionStatus::Deleting;

        if let Some(current) = &state.current {
            let id = current.id;
            if let Err(err) = self.store.delete(id) {
                // leave the session usable so the user can retry
                state.status = SessionStatus::Active;
                return Err(err);
            }
            self.reminders.cancel(id);
        }
        state.status = SessionStatus::Deleted;
        Ok(())
    }
}

fn cancel_pending(state: &mut SessionState) {
    if let Some(handle) = state.pending.take() {
        handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingStore {
        saves: Mutex<Vec<Note>>,
        deletes: Mutex<Vec<Uuid>>,
        fail_delete: AtomicBool,
    }

    impl RecordingStore {
        fn saves(&self) -> Vec<Note> {
            self.saves.lock().unwrap().clone()
        }

        fn deletes(&self) -> Vec<Uuid> {
            self.deletes.lock().unwrap().clone()
        }
    }

    impl NoteRepository for RecordingStore {
        fn save(&self, note: &Note) -> Result<()> {
            self.saves.lock().unwrap().push(note.clone());
            Ok(())
        }

        fn delete(&self, id: Uuid) -> Result<bool> {
            if self.fail_delete.load(Ordering::SeqCst) {
                anyhow::bail!("disk full");
            }
            self.deletes.lock().unwrap().push(id);
            Ok(true)
        }
    }

    #[derive(Default)]
    struct RecordingScheduler {
        scheduled: Mutex<Vec<(Uuid, DateTime<Utc>)>>,
        canceled: Mutex<Vec<Uuid>>,
    }

    impl ReminderScheduler for RecordingScheduler {
        fn schedule(&self, note_id: Uuid, _title: &str, at: DateTime<Utc>) {
            self.scheduled.lock().unwrap().push((note_id, at));
        }

        fn cancel(&self, note_id: Uuid) {
            self.canceled.lock().unwrap().push(note_id);
        }
    }

    fn session() -> (EditorSession, Arc<RecordingStore>, Arc<RecordingScheduler>) {
        let store = Arc::new(RecordingStore::default());
        let reminders = Arc::new(RecordingScheduler::default());
        let session = EditorSession::new(store.clone(), reminders.clone());
        (session, store, reminders)
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_edits_coalesce_into_one_save() {
        let (session, store, _) = session();

        for word in ["g", "gr", "groceries"] {
            session.edit(|d| d.title = word.to_string());
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_millis(600)).await;

        let saves = store.saves();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].title, "groceries");
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_spaced_past_debounce_save_each() {
        let (session, store, _) = session();

        session.edit(|d| d.title = "one".to_string());
        tokio::time::sleep(Duration::from_millis(600)).await;
        session.edit(|d| d.title = "two".to_string());
        tokio::time::sleep(Duration::from_millis(600)).await;

        let saves = store.saves();
        assert_eq!(saves.len(), 2);
        // the same row both times
        assert_eq!(saves[0].id, saves[1].id);
        assert_eq!(saves[0].created_at, saves[1].created_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_untouched_new_note_never_persisted() {
        let (session, store, _) = session();

        session.edit(|_| {});
        tokio::time::sleep(Duration::from_millis(600)).await;
        session.flush_on_exit().unwrap();

        assert!(store.saves().is_empty());
        assert!(store.deletes().is_empty());
        assert!(session.current_note().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_markup_only_draft_counts_as_blank() {
        let (session, store, _) = session();

        session.edit(|d| d.content = "<p><br></p>".to_string());
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert!(store.saves().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_row_per_session_under_rapid_saves() {
        let (session, store, _) = session();

        session.edit(|d| d.title = "a".to_string());
        session.save().unwrap();
        session.edit(|d| d.content = "<p>b</p>".to_string());
        session.save().unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        let saves = store.saves();
        assert!(saves.len() >= 2);
        let first_id = saves[0].id;
        assert!(saves.iter().all(|n| n.id == first_id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_existing_note_emptied_is_deleted_on_exit_only() {
        let store = Arc::new(RecordingStore::default());
        let reminders = Arc::new(RecordingScheduler::default());
        let note = Note::new("shopping".to_string(), "<p>milk</p>".to_string());
        let id = note.id;
        let session = EditorSession::resume(store.clone(), reminders.clone(), note);

        session.edit(|d| {
            d.title.clear();
            d.content.clear();
        });
        tokio::time::sleep(Duration::from_millis(600)).await;
        // mid-session blank state stays saved as a recovery point
        assert_eq!(store.saves().len(), 1);
        assert!(store.deletes().is_empty());

        session.flush_on_exit().unwrap();
        assert_eq!(store.deletes(), vec![id]);
        assert_eq!(session.status(), SessionStatus::Deleted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_blocks_in_flight_auto_save() {
        let store = Arc::new(RecordingStore::default());
        let reminders = Arc::new(RecordingScheduler::default());
        let note = Note::new("doomed".to_string(), String::new());
        let session = EditorSession::resume(store.clone(), reminders.clone(), note);

        session.edit(|d| d.title = "still typing".to_string());
        session.delete().unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert!(store.saves().is_empty());
        assert_eq!(store.deletes().len(), 1);
        assert_eq!(session.status(), SessionStatus::Deleted);

        // further edits and saves are inert
        session.edit(|d| d.title = "zombie".to_string());
        session.save().unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(store.saves().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_failure_rolls_back_guard() {
        let store = Arc::new(RecordingStore::default());
        let reminders = Arc::new(RecordingScheduler::default());
        let note = Note::new("sticky".to_string(), String::new());
        let session = EditorSession::resume(store.clone(), reminders.clone(), note);

        store.fail_delete.store(true, Ordering::SeqCst);
        assert!(session.delete().is_err());
        assert_eq!(session.status(), SessionStatus::Active);

        store.fail_delete.store(false, Ordering::SeqCst);
        session.delete().unwrap();
        assert_eq!(session.status(), SessionStatus::Deleted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_is_idempotent() {
        let store = Arc::new(RecordingStore::default());
        let reminders = Arc::new(RecordingScheduler::default());
        let note = Note::new("once".to_string(), String::new());
        let session = EditorSession::resume(store.clone(), reminders.clone(), note);

        session.delete().unwrap();
        session.delete().unwrap();
        assert_eq!(store.deletes().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_future_reminder_scheduled_past_reminder_canceled() {
        let (session, _, reminders) = session();
        let future = Utc::now() + chrono::Duration::hours(1);

        session.edit(|d| {
            d.title = "call".to_string();
            d.reminder_time = Some(future);
        });
        session.save().unwrap();
        assert_eq!(reminders.scheduled.lock().unwrap().len(), 1);

        session.edit(|d| d.reminder_time = None);
        session.save().unwrap();
        assert_eq!(reminders.canceled.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_on_exit_saves_latest_draft() {
        let (session, store, _) = session();

        session.edit(|d| d.title = "quick".to_string());
        // exit before the debounce elapses
        session.flush_on_exit().unwrap();

        let saves = store.saves();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].title, "quick");

        // the canceled timer never fires a second save
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(store.saves().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_updated_at_monotonic() {
        let (session, store, _) = session();

        session.edit(|d| d.title = "t".to_string());
        session.save().unwrap();
        session.edit(|d| d.title = "t2".to_string());
        session.save().unwrap();

        let saves = store.saves();
        assert!(saves[1].updated_at >= saves[0].updated_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_creates_one_row_end_to_end() {
        use crate::db::Database;
        use crate::store::NoteStore;

        let store = Arc::new(NoteStore::new(Database::open_memory().unwrap()).unwrap());
        let reminders = Arc::new(RecordingScheduler::default());
        let session = EditorSession::new(store.clone(), reminders);

        session.edit(|d| d.title = "first".to_string());
        tokio::time::sleep(Duration::from_millis(600)).await;
        session.edit(|d| d.content = "<p>body</p>".to_string());
        tokio::time::sleep(Duration::from_millis(600)).await;
        session.flush_on_exit().unwrap();

        assert_eq!(store.count().unwrap(), 1);
        let notes = store.list().unwrap();
        assert_eq!(notes[0].title, "first");
        assert_eq!(notes[0].content, "<p>body</p>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_draft_tag_validation() {
        let (session, _, _) = session();
        session.edit(|d| {
            d.title = "tags".to_string();
            d.add_tag("home").unwrap();
        });

        let mut draft = session.draft();
        assert_eq!(
            draft.add_tag("HOME"),
            Err(NoteError::DuplicateTag("HOME".to_string()))
        );
        assert_eq!(draft.tags, vec!["home".to_string()]);
    }
}
