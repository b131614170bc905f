use clap::{Parser, Subcommand};
use inkdown::config::Config;
use inkdown::document::{NotePatch, NoteStore, StoreError};
use inkdown::export::markdown_export;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "inkdown")]
#[command(about = "A rich-text notes editor with Markdown interchange", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List all notes (pinned first)
    Ls,
    /// Create a new note
    New {
        /// Title of the new note
        title: String,
    },
    /// Print a note's content
    Show {
        /// Id of the note
        id: String,
    },
    /// Export a note as a Markdown file
    Export {
        /// Id of the note
        id: String,
        /// Directory to write the file into
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Pin a note to the top of the list
    Pin {
        /// Id of the note
        id: String,
    },
    /// Unpin a note
    Unpin {
        /// Id of the note
        id: String,
    },
    /// Delete a note
    Rm {
        /// Id of the note
        id: String,
    },
    /// Write all notes to a JSON backup archive
    Backup {
        /// Path of the archive to write
        file: PathBuf,
    },
    /// Restore notes from a JSON backup archive (upserts by id)
    Restore {
        /// Path of the archive to read
        file: PathBuf,
    },
}

fn cmd_ls(store: &NoteStore) -> Result<(), StoreError> {
    for note in store.list()? {
        let pin = if note.is_pinned { "*" } else { " " };
        println!(
            "{} {}  {}  {}",
            pin,
            note.id,
            note.updated_at.format("%Y-%m-%d %H:%M"),
            note.title
        );
    }
    Ok(())
}

fn cmd_new(store: &NoteStore, title: &str) -> Result<(), StoreError> {
    let note = store.create(title)?;
    println!("{}", note.id);
    Ok(())
}

fn cmd_show(store: &NoteStore, id: &str) -> Result<(), StoreError> {
    let note = store.get(id)?;
    if note.content.is_empty() {
        println!("(empty)");
    } else {
        println!("{}", note.content);
    }
    Ok(())
}

fn cmd_export(store: &NoteStore, id: &str, out: &PathBuf) -> Result<(), StoreError> {
    let note = store.get(id)?;
    let export = markdown_export(&note);
    let path = out.join(&export.file_name);
    fs::write(&path, &export.text)?;
    println!("{}", path.display());
    Ok(())
}

fn cmd_set_pinned(store: &NoteStore, id: &str, pinned: bool) -> Result<(), StoreError> {
    store.update(id, NotePatch::pinned(pinned))?;
    Ok(())
}

fn cmd_backup(store: &NoteStore, file: &PathBuf) -> Result<(), StoreError> {
    let archive = store.export_backup()?;
    fs::write(file, archive)?;
    println!("{}", file.display());
    Ok(())
}

fn cmd_restore(store: &NoteStore, file: &PathBuf) -> Result<(), StoreError> {
    let archive = fs::read_to_string(file)?;
    let count = store.import_backup(&archive)?;
    println!("imported {} notes", count);
    Ok(())
}

fn main() {
    let args = Args::parse();
    let config = Config::load();
    let notes_dir = config.notes_dir();

    if !notes_dir.exists() {
        if let Err(e) = fs::create_dir_all(&notes_dir) {
            eprintln!(
                "Error: Failed to create notes directory '{}': {}",
                notes_dir.display(),
                e
            );
            std::process::exit(1);
        }
    }

    let store = NoteStore::new(notes_dir);

    let result = match args.command {
        Commands::Ls => cmd_ls(&store),
        Commands::New { title } => cmd_new(&store, &title),
        Commands::Show { id } => cmd_show(&store, &id),
        Commands::Export { id, out } => cmd_export(&store, &id, &out),
        Commands::Pin { id } => cmd_set_pinned(&store, &id, true),
        Commands::Unpin { id } => cmd_set_pinned(&store, &id, false),
        Commands::Rm { id } => store.delete(&id),
        Commands::Backup { file } => cmd_backup(&store, &file),
        Commands::Restore { file } => cmd_restore(&store, &file),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
