//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use crate::cli::output::{
    OutputFormat, StatusReport, format_note_list, format_pipeline_result, format_status,
};
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::domain::Note;
use crate::embedding::DEFAULT_DIMENSIONS;
use crate::error::Result;
use crate::jobs::JobManager;
use crate::llm::Router;
use crate::notes::{NotesStore, upsert_embeddings};
use crate::vector_index::VectorIndex;
use crate::web_search::WebSearch;
use std::sync::Arc;
use uuid::Uuid;

/// Resolves the [`Config`] for this invocation, honoring `--db-path` as an
/// override of `DATABASE_URL`.
fn resolve_config(cli: &Cli) -> Config {
    let mut config = Config::from_env();
    if let Some(db_path) = &cli.db_path {
        config.database_url = db_path.to_string_lossy().into_owned();
    }
    config
}

fn open_store(config: &Config) -> Result<NotesStore> {
    NotesStore::open(&config.database_url)
}

/// Loads the vector index from disk if both its files exist, otherwise
/// returns a fresh empty index at the default dimensionality.
fn load_or_create_index(config: &Config) -> VectorIndex {
    if config.vector_index_path.exists() && config.vector_id_mapping_path.exists() {
        VectorIndex::load(&config.vector_index_path, &config.vector_id_mapping_path)
            .unwrap_or_else(|_| VectorIndex::new(DEFAULT_DIMENSIONS))
    } else {
        VectorIndex::new(DEFAULT_DIMENSIONS)
    }
}

fn save_index(config: &Config, index: &VectorIndex) -> Result<()> {
    if let Some(parent) = config.vector_index_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    index.save(&config.vector_index_path, &config.vector_id_mapping_path)
}

/// Executes the parsed CLI command.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub async fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let config = resolve_config(cli);

    match &cli.command {
        Commands::Init => cmd_init(&config),
        Commands::Status => cmd_status(&config, format),
        Commands::Ingest { file, title } => cmd_ingest(&config, file, title.as_deref()).await,
        Commands::ListNotes => cmd_list_notes(&config, format),
        Commands::Run { note_id } => cmd_run(&config, *note_id, format).await,
        Commands::Serve { addr } => cmd_serve(&config, addr).await,
    }
}

fn cmd_init(config: &Config) -> Result<String> {
    if let Some(parent) = std::path::Path::new(&config.database_url).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = open_store(config)?;
    store.init()?;
    let index = VectorIndex::new(DEFAULT_DIMENSIONS);
    save_index(config, &index)?;
    Ok(format!("initialized {} and {}\n", config.database_url, config.vector_index_path.display()))
}

fn cmd_status(config: &Config, format: OutputFormat) -> Result<String> {
    let store = open_store(config)?;
    let schema_version = store.schema_version().unwrap_or(None);
    let note_count = store.list_notes().map(|n| n.len()).unwrap_or(0);
    let index = load_or_create_index(config);
    let report = StatusReport {
        schema_version,
        note_count,
        index_size: index.len(),
        index_dimensions: index.dimensions(),
    };
    Ok(format_status(&report, format))
}

async fn cmd_ingest(config: &Config, file: &std::path::Path, title: Option<&str>) -> Result<String> {
    let content = crate::io::read_file(file)?;
    let title = title.map(str::to_string).unwrap_or_else(|| {
        file.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "untitled".to_string())
    });

    let store = open_store(config)?;
    store.init()?;
    let index = load_or_create_index(config);
    let router = Router::new(config.clone());

    let note = Note::new(title, content);
    store.upsert_note(&note)?;
    upsert_embeddings(&router, &store, &index, note.id, &note.content).await?;
    save_index(config, &index)?;

    Ok(format!("ingested note {}\n", note.id))
}

fn cmd_list_notes(config: &Config, format: OutputFormat) -> Result<String> {
    let store = open_store(config)?;
    let notes = store.list_notes()?;
    Ok(format_note_list(&notes, format))
}

async fn cmd_run(config: &Config, note_id: Uuid, format: OutputFormat) -> Result<String> {
    let store = open_store(config)?;
    let index = load_or_create_index(config);
    let router = Router::new(config.clone());
    let web_search = WebSearch::new(config.serpapi_api_key.clone());
    let jobs = JobManager::new();
    let (job, _cancelled) = jobs.create();

    let result = crate::orchestrator::run_pipeline(job.id, &jobs, &router, &store, &index, &web_search, note_id).await?;
    Ok(format_pipeline_result(&result, format))
}

async fn cmd_serve(config: &Config, addr: &str) -> Result<String> {
    let store = Arc::new(open_store(config)?);
    store.init()?;
    let index = Arc::new(load_or_create_index(config));
    let router = Arc::new(Router::new(config.clone()));
    let web_search = Arc::new(WebSearch::new(config.serpapi_api_key.clone()));
    let jobs = Arc::new(JobManager::new());

    let state = crate::http::AppState { jobs, store, index, llm: router, web_search };
    let app = crate::http::router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "synapse-engine HTTP surface listening");
    axum::serve(listener, app).await?;
    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config { embeddings_fake: true, gateway_token: None, gateway_url: None, ..Config::from_env() };
        config.database_url = dir.path().join("notes.db").to_string_lossy().into_owned();
        config.vector_index_path = dir.path().join("vector.index");
        config.vector_id_mapping_path = dir.path().join("vector.ids.json");
        (dir, config)
    }

    #[test]
    fn init_creates_schema_and_empty_index() {
        let (_dir, config) = temp_config();
        cmd_init(&config).unwrap();
        let store = open_store(&config).unwrap();
        assert!(store.schema_version().unwrap().is_some());
        assert!(config.vector_index_path.exists());
    }

    #[test]
    fn status_before_init_reports_uninitialized() {
        let (_dir, config) = temp_config();
        let out = cmd_status(&config, OutputFormat::Json).unwrap();
        assert!(out.contains("\"schema_version\": null"));
    }

    #[tokio::test]
    async fn ingest_then_list_notes_shows_one_entry() {
        let (dir, config) = temp_config();
        cmd_init(&config).unwrap();

        let file_path = dir.path().join("note.txt");
        std::fs::write(&file_path, "Hello world.\n\nA second paragraph.").unwrap();
        cmd_ingest(&config, &file_path, Some("My Note")).await.unwrap();

        let out = cmd_list_notes(&config, OutputFormat::Text).unwrap();
        assert!(out.contains("My Note"));
    }
}
