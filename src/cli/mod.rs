use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub mod add;
pub mod backup;
pub mod cleanup;
pub mod delete;
pub mod edit;
pub mod export;
pub mod list;
pub mod pin;
pub mod search;
pub mod show;
pub mod watch;

pub use add::run_add;
pub use backup::{run_backup, run_restore};
pub use cleanup::run_cleanup;
pub use delete::run_delete;
pub use edit::run_edit;
pub use export::run_export;
pub use list::run_list;
pub use pin::run_pin;
pub use search::run_search;
pub use show::run_show;
pub use watch::run_watch;

#[derive(Parser)]
#[command(name = "notecmd")]
#[command(about = "Personal notes for the command line")]
#[command(version)]
pub struct Cli {
    /// Use a database file other than the default
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List notes, pinned first
    List(ListArgs),
    /// Search notes by title, content or tag
    Search(SearchArgs),
    /// Show one note in full
    Show(ShowArgs),
    /// Add a note without opening the editor
    Add(AddArgs),
    /// Edit a note interactively (auto-saves while you type)
    Edit(EditArgs),
    /// Delete a note
    Delete(DeleteArgs),
    /// Pin or unpin a note
    Pin(PinArgs),
    /// Export a note (or all notes) to text, document or CSV
    Export(ExportArgs),
    /// Back up all notes to a zip archive
    Backup(BackupArgs),
    /// Restore notes from a zip archive
    Restore(RestoreArgs),
    /// Purge expired temporary notes
    Cleanup,
    /// Follow the note list and fire reminders until interrupted
    Watch,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only notes in this category: general, personal, work, study, ideas
    #[arg(short, long)]
    pub category: Option<String>,
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
    #[arg(short, long)]
    pub all: bool,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Search query
    #[arg(default_value = "")]
    pub query: String,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Note id (or unique id prefix)
    pub identifier: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// Note title
    #[arg(short, long)]
    pub title: Option<String>,
    /// Note content; HTML markup is kept as-is
    pub content: Option<String>,
    #[arg(short, long)]
    pub category: Option<String>,
    /// Tags, repeatable
    #[arg(long)]
    pub tag: Vec<String>,
    /// Make the note temporary: purge it after this many days
    #[arg(long)]
    pub expire_days: Option<i64>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Note id (or unique id prefix); omit to start a new note
    pub identifier: Option<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Note id (or unique id prefix)
    pub identifier: String,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct PinArgs {
    /// Note id (or unique id prefix)
    pub identifier: String,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Note id; omit with --format csv to export all notes
    pub identifier: Option<String>,
    /// Output format: text, doc or csv
    #[arg(short, long, default_value = "text")]
    pub format: String,
    /// Output file
    #[arg(short, long)]
    pub out: PathBuf,
}

#[derive(Args)]
pub struct BackupArgs {
    /// Archive path to write
    pub path: PathBuf,
}

#[derive(Args)]
pub struct RestoreArgs {
    /// Archive path to read
    pub path: PathBuf,
}
