use std::path::Path;

use anyhow::Result;
use tracing::warn;

use crate::export;
use crate::store::NoteStore;

use super::show::resolve_note;

/// Execute the export command. Export is best-effort: failures are reported
/// and logged, never propagated.
pub fn run_export(
    store: &NoteStore,
    identifier: Option<&str>,
    format: &str,
    out: &Path,
) -> Result<()> {
    let outcome = match (format, identifier) {
        ("csv", _) => {
            let notes = match identifier {
                Some(id) => match resolve_note(store, id)? {
                    Some(note) => vec![note],
                    None => {
                        println!("No note found: {}", id);
                        return Ok(());
                    }
                },
                None => store.list()?,
            };
            export::write_csv_file(&notes, out)
        }
        (_, None) => {
            println!("Pass a note id, or use --format csv for all notes.");
            return Ok(());
        }
        (format, Some(id)) => {
            let Some(note) = resolve_note(store, id)? else {
                println!("No note found: {}", id);
                return Ok(());
            };
            match format {
                "doc" => export::write_document(&note, out),
                "text" => export::write_plain_text(&note, out),
                other => {
                    println!("Unknown format: {} (use text, doc or csv)", other);
                    return Ok(());
                }
            }
        }
    };

    match outcome {
        Ok(()) => println!("Exported to {}", out.display()),
        Err(err) => {
            warn!(%err, path = %out.display(), "export failed");
            println!("Export failed.");
        }
    }
    Ok(())
}
