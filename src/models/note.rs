use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::text;

/// Titles longer than this are clipped, not rejected.
pub const TITLE_MAX_CHARS: usize = 200;
pub const TAG_MAX_CHARS: usize = 50;

/// Validation errors surfaced to the user as transient messages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NoteError {
    #[error("Tag cannot be empty.")]
    EmptyTag,
    #[error("Tag cannot be longer than {TAG_MAX_CHARS} characters.")]
    TagTooLong,
    #[error("Tag already exists: {0}")]
    DuplicateTag(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    General,
    Personal,
    Work,
    Study,
    Ideas,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Self::General,
        Self::Personal,
        Self::Work,
        Self::Study,
        Self::Ideas,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Personal => "personal",
            Self::Work => "work",
            Self::Study => "study",
            Self::Ideas => "ideas",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "personal" => Self::Personal,
            "work" => Self::Work,
            "study" => Self::Study,
            "ideas" => Self::Ideas,
            _ => Self::General,
        }
    }
}

/// Visual tag shown in list views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    #[default]
    Default,
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

impl NoteColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Red => "red",
            Self::Orange => "orange",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Purple => "purple",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "red" => Self::Red,
            "orange" => Self::Orange,
            "yellow" => Self::Yellow,
            "green" => Self::Green,
            "blue" => Self::Blue,
            "purple" => Self::Purple,
            _ => Self::Default,
        }
    }
}

/// A persisted note. Content is HTML-formatted rich text; searching and
/// emptiness checks go through the plain-text projection in `crate::text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub color: NoteColor,
    pub is_temporary: bool,
    pub is_pinned: bool,
    pub is_synced: bool,
    pub has_audio: bool,
    pub is_checklist: bool,
    pub audio_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Only set while `is_temporary`; the cleanup sweep purges elapsed notes.
    pub delete_after: Option<DateTime<Utc>>,
    pub reminder_time: Option<DateTime<Utc>>,
}

impl Note {
    pub fn new(title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: clip_title(&title),
            content,
            category: Category::default(),
            tags: Vec::new(),
            color: NoteColor::default(),
            is_temporary: false,
            is_pinned: false,
            is_synced: false,
            has_audio: false,
            is_checklist: false,
            audio_path: None,
            created_at: now,
            updated_at: now,
            delete_after: None,
            reminder_time: None,
        }
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = clip_title(title);
    }

    /// Blank title and blank stripped content. Blank notes are never inserted
    /// as new rows, though an existing row may hold blank state mid-edit.
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && text::is_blank(&self.content)
    }

    pub fn add_tag(&mut self, tag: &str) -> Result<(), NoteError> {
        let tag = validate_tag(&self.tags, tag)?;
        self.tags.push(tag);
        Ok(())
    }

    /// Remove a tag by case-insensitive match. Returns whether one was removed.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| !t.eq_ignore_ascii_case(tag));
        self.tags.len() != before
    }

    pub fn make_temporary(&mut self, delete_after: DateTime<Utc>) {
        self.is_temporary = true;
        self.delete_after = Some(delete_after);
    }

    /// Clears `delete_after`: a permanent note never carries one.
    pub fn make_permanent(&mut self) {
        self.is_temporary = false;
        self.delete_after = None;
    }

    /// Bump `updated_at`, keeping it monotonically non-decreasing.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at);
    }

    pub fn set_audio(&mut self, path: String) {
        self.audio_path = Some(path);
        self.has_audio = true;
    }

    /// Detach the audio reference. The caller owns removing the file.
    pub fn clear_audio(&mut self) -> Option<String> {
        self.has_audio = false;
        self.audio_path.take()
    }
}

/// Clip to `TITLE_MAX_CHARS` by characters, not bytes.
pub fn clip_title(title: &str) -> String {
    if title.chars().count() <= TITLE_MAX_CHARS {
        title.to_string()
    } else {
        title.chars().take(TITLE_MAX_CHARS).collect()
    }
}

/// Validate a tag against an existing list: trimmed, non-empty, at most
/// `TAG_MAX_CHARS` characters, unique case-insensitively. Returns the
/// normalized tag to store.
pub fn validate_tag(existing: &[String], tag: &str) -> Result<String, NoteError> {
    let tag = tag.trim();
    if tag.is_empty() {
        return Err(NoteError::EmptyTag);
    }
    if tag.chars().count() > TAG_MAX_CHARS {
        return Err(NoteError::TagTooLong);
    }
    if existing.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
        return Err(NoteError::DuplicateTag(tag.to_string()));
    }
    Ok(tag.to_string())
}
