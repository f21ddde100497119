//! Zip backup of the full note set.
//!
//! The archive carries one well-known entry, `notes.json`, holding a versioned
//! JSON payload. Import refuses archives without that entry.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::models::Note;

pub const BACKUP_ENTRY: &str = "notes.json";
pub const BACKUP_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("no notes found")]
    NoNotesFound,

    #[error("unsupported backup version {0}")]
    UnsupportedVersion(u32),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackupPayload {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub notes: Vec<Note>,
}

/// Write all notes into a zip archive at `path`.
pub fn write_backup(notes: &[Note], path: &Path) -> Result<(), BackupError> {
    let payload = BackupPayload {
        version: BACKUP_VERSION,
        exported_at: Utc::now(),
        notes: notes.to_vec(),
    };
    let json = serde_json::to_vec_pretty(&payload)?;

    let file = File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(BACKUP_ENTRY, opts)?;
    zip.write_all(&json)?;
    zip.finish()?;
    Ok(())
}

/// Read a backup archive. Fails with `NoNotesFound` when the well-known entry
/// is missing and `UnsupportedVersion` on a version from the future.
pub fn read_backup(path: &Path) -> Result<BackupPayload, BackupError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;

    let mut entry = match archive.by_name(BACKUP_ENTRY) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Err(BackupError::NoNotesFound),
        Err(e) => return Err(e.into()),
    };

    let mut json = String::new();
    entry.read_to_string(&mut json)?;
    let payload: BackupPayload = serde_json::from_str(&json)?;

    if payload.version > BACKUP_VERSION {
        return Err(BackupError::UnsupportedVersion(payload.version));
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notes() -> Vec<Note> {
        let mut a = Note::new("first".to_string(), "<p>one</p>".to_string());
        a.add_tag("t").unwrap();
        let b = Note::new("second".to_string(), "<p>two</p>".to_string());
        vec![a, b]
    }

    #[test]
    fn test_backup_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.zip");
        let original = notes();

        write_backup(&original, &path).unwrap();
        let payload = read_backup(&path).unwrap();

        assert_eq!(payload.version, BACKUP_VERSION);
        assert_eq!(payload.notes, original);
    }

    #[test]
    fn test_archive_without_entry_is_no_notes_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.zip");

        let file = File::create(&path).unwrap();
        let mut zip = ZipWriter::new(file);
        zip.start_file("something_else.txt", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"not notes").unwrap();
        zip.finish().unwrap();

        match read_backup(&path) {
            Err(BackupError::NoNotesFound) => {}
            other => panic!("expected NoNotesFound, got {:?}", other.map(|p| p.version)),
        }
    }

    #[test]
    fn test_future_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.zip");

        let payload = BackupPayload {
            version: BACKUP_VERSION + 1,
            exported_at: Utc::now(),
            notes: vec![],
        };
        let file = File::create(&path).unwrap();
        let mut zip = ZipWriter::new(file);
        zip.start_file(BACKUP_ENTRY, SimpleFileOptions::default())
            .unwrap();
        zip.write_all(&serde_json::to_vec(&payload).unwrap())
            .unwrap();
        zip.finish().unwrap();

        match read_backup(&path) {
            Err(BackupError::UnsupportedVersion(v)) => assert_eq!(v, BACKUP_VERSION + 1),
            other => panic!("expected UnsupportedVersion, got {:?}", other.map(|p| p.version)),
        }
    }
}
