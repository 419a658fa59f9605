//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

/// synapse-engine: a local knowledge-synthesis engine over a note corpus.
#[derive(Parser, Debug)]
#[command(name = "synapse-engine")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the `SQLite` database file.
    ///
    /// Defaults to [`crate::config::Config::from_env`]'s `database_url`.
    #[arg(long, env = "DATABASE_URL")]
    pub db_path: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the notes database and vector index files.
    Init,

    /// Show database status: note/chunk counts, schema version, index size.
    Status,

    /// Ingest a text file as a note: chunk, embed, and index it.
    Ingest {
        /// Path to the note's plain-text content.
        file: PathBuf,

        /// Title for the note. Defaults to the file name.
        #[arg(short, long)]
        title: Option<String>,
    },

    /// List all notes.
    #[command(name = "list-notes", alias = "ls")]
    ListNotes,

    /// Run the insight-generation pipeline for one note, synchronously,
    /// printing the final result as JSON.
    Run {
        /// The source note's id.
        note_id: Uuid,
    },

    /// Start the HTTP surface.
    Serve {
        /// Address to bind, e.g. `0.0.0.0:8080`.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }
}
