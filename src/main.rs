use std::sync::Arc;

use clap::Parser;
use notecmd::cli::{
    run_add, run_backup, run_cleanup, run_delete, run_edit, run_export, run_list, run_pin,
    run_restore, run_search, run_show, run_watch, Cli, Commands,
};
use notecmd::db::Database;
use notecmd::store::NoteStore;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db = match cli.db {
        Some(path) => Database::open_at(path)?,
        None => Database::open()?,
    };
    let store = Arc::new(NoteStore::new(db)?);

    match cli.command {
        None => {
            // No subcommand provided - show the note list
            run_list(&store, None, 20, false)?;
        }
        Some(Commands::List(args)) => {
            run_list(&store, args.category.as_deref(), args.limit, args.all)?;
        }
        Some(Commands::Search(args)) => {
            run_search(&store, &args.query)?;
        }
        Some(Commands::Show(args)) => {
            run_show(&store, &args.identifier)?;
        }
        Some(Commands::Add(args)) => {
            run_add(
                &store,
                args.title,
                args.content,
                args.category.as_deref(),
                &args.tag,
                args.expire_days,
            )?;
        }
        Some(Commands::Edit(args)) => {
            run_edit(store.clone(), args.identifier.as_deref())?;
        }
        Some(Commands::Delete(args)) => {
            run_delete(&store, &args.identifier, args.force)?;
        }
        Some(Commands::Pin(args)) => {
            run_pin(&store, &args.identifier)?;
        }
        Some(Commands::Export(args)) => {
            run_export(&store, args.identifier.as_deref(), &args.format, &args.out)?;
        }
        Some(Commands::Backup(args)) => {
            run_backup(&store, &args.path)?;
        }
        Some(Commands::Restore(args)) => {
            run_restore(&store, &args.path)?;
        }
        Some(Commands::Cleanup) => {
            run_cleanup(&store)?;
        }
        Some(Commands::Watch) => {
            run_watch(store.clone())?;
        }
    }

    Ok(())
}
