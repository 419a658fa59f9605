//! `SQLite`-backed persistence for notes, their chunks, and embeddings.
//!
//! Wrapped in a [`std::sync::Mutex`] rather than requiring `&mut self`,
//! since the pipeline orchestrator and the HTTP surface both need shared
//! access to one store from different async tasks.

use crate::Result;
use crate::domain::note::{Chunk, Embedding, Note, current_timestamp_ms};
use crate::error::StorageError;
use crate::notes::schema::{CHECK_SCHEMA_SQL, CURRENT_SCHEMA_VERSION, GET_VERSION_SQL, SCHEMA_SQL, SET_VERSION_SQL};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

/// A `SQLite`-backed notes store.
pub struct NotesStore {
    conn: Mutex<Connection>,
}

impl NotesStore {
    /// Opens or creates a database file at `path`, enabling WAL mode and
    /// foreign keys, then applies the schema.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the database cannot be opened or the
    /// schema cannot be applied.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(StorageError::from)?;
            }
        }
        let conn = Connection::open(path).map_err(StorageError::from)?;
        Self::configure(&conn)?;
        let store = Self { conn: Mutex::new(conn) };
        store.init()?;
        Ok(store)
    }

    /// Opens an in-memory database. Used in tests.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the schema cannot be applied.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        conn.execute("PRAGMA foreign_keys = ON;", []).map_err(StorageError::from)?;
        let store = Self { conn: Mutex::new(conn) };
        store.init()?;
        Ok(store)
    }

    fn configure(conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys = ON;", []).map_err(StorageError::from)?;
        let _: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0)).map_err(StorageError::from)?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Applies the schema if it has not been applied yet. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the schema cannot be created.
    pub fn init(&self) -> Result<()> {
        let conn = self.lock();
        let is_init: i64 = conn.query_row(CHECK_SCHEMA_SQL, [], |row| row.get(0)).map_err(StorageError::from)?;
        if is_init == 0 {
            conn.execute_batch(SCHEMA_SQL).map_err(StorageError::from)?;
            conn.execute(SET_VERSION_SQL, params![CURRENT_SCHEMA_VERSION.to_string()]).map_err(StorageError::from)?;
        }
        Ok(())
    }

    /// Current schema version recorded in the database.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the query fails.
    pub fn schema_version(&self) -> Result<Option<u32>> {
        let conn = self.lock();
        let version: Option<String> = conn.query_row(GET_VERSION_SQL, [], |row| row.get(0)).optional().map_err(StorageError::from)?;
        Ok(version.and_then(|v| v.parse().ok()))
    }

    /// Inserts a new note or overwrites an existing one by id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the write fails.
    pub fn upsert_note(&self, note: &Note) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO notes (id, title, content, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET title = excluded.title, content = excluded.content, updated_at = excluded.updated_at",
            params![note.id.to_string(), note.title, note.content, note.created_at, note.updated_at],
        )
        .map_err(StorageError::from)?;
        Ok(())
    }

    /// Fetches a note by id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the query fails.
    pub fn get_note(&self, id: Uuid) -> Result<Option<Note>> {
        let conn = self.lock();
        conn.query_row(
            "SELECT id, title, content, created_at, updated_at FROM notes WHERE id = ?1",
            params![id.to_string()],
            row_to_note,
        )
        .optional()
        .map_err(|e| StorageError::from(e).into())
    }

    /// Lists every stored note, ordered by most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the query fails.
    pub fn list_notes(&self) -> Result<Vec<Note>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare("SELECT id, title, content, created_at, updated_at FROM notes ORDER BY updated_at DESC")
            .map_err(StorageError::from)?;
        let notes = stmt.query_map([], row_to_note).map_err(StorageError::from)?;
        notes.collect::<rusqlite::Result<Vec<_>>>().map_err(|e| StorageError::from(e).into())
    }

    /// Deletes a note and cascades to its chunks and embeddings.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the delete fails.
    pub fn delete_note(&self, id: Uuid) -> Result<()> {
        let conn = self.lock();
        conn.execute("DELETE FROM notes WHERE id = ?1", params![id.to_string()]).map_err(StorageError::from)?;
        Ok(())
    }

    /// Replaces every chunk belonging to `note_id` with `contents`, in
    /// order, returning the newly assigned chunks. Part of the upsert
    /// flow: old chunks (and their embeddings, via cascade) are deleted
    /// before the new ones are inserted.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if either step fails.
    pub fn replace_chunks(&self, note_id: Uuid, contents: &[String]) -> Result<Vec<Chunk>> {
        let conn = self.lock();
        let tx = conn.unchecked_transaction().map_err(StorageError::from)?;
        tx.execute("DELETE FROM chunks WHERE note_id = ?1", params![note_id.to_string()]).map_err(StorageError::from)?;

        let mut chunks = Vec::with_capacity(contents.len());
        for (index, content) in contents.iter().enumerate() {
            tx.execute(
                "INSERT INTO chunks (note_id, content, chunk_index) VALUES (?1, ?2, ?3)",
                params![note_id.to_string(), content, index as i64],
            )
            .map_err(StorageError::from)?;
            let id = tx.last_insert_rowid();
            chunks.push(Chunk { id, note_id, content: content.clone(), index });
        }
        tx.commit().map_err(StorageError::from)?;
        Ok(chunks)
    }

    /// Fetches every chunk for a note, in index order.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the query fails.
    pub fn get_chunks(&self, note_id: Uuid) -> Result<Vec<Chunk>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare("SELECT id, note_id, content, chunk_index FROM chunks WHERE note_id = ?1 ORDER BY chunk_index")
            .map_err(StorageError::from)?;
        let chunks = stmt.query_map(params![note_id.to_string()], row_to_chunk).map_err(StorageError::from)?;
        chunks.collect::<rusqlite::Result<Vec<_>>>().map_err(|e| StorageError::from(e).into())
    }

    /// Looks up which note a chunk belongs to, used by vector-ranked
    /// search results to map chunk ids back to note ids.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the query fails.
    pub fn note_id_for_chunk(&self, chunk_id: i64) -> Result<Option<Uuid>> {
        let conn = self.lock();
        let raw: Option<String> = conn
            .query_row("SELECT note_id FROM chunks WHERE id = ?1", params![chunk_id], |row| row.get(0))
            .optional()
            .map_err(StorageError::from)?;
        Ok(raw.and_then(|s| Uuid::parse_str(&s).ok()))
    }

    /// Persists embeddings tied to already-inserted chunks.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the write fails.
    pub fn insert_embeddings(&self, embeddings: &[Embedding]) -> Result<()> {
        let conn = self.lock();
        let tx = conn.unchecked_transaction().map_err(StorageError::from)?;
        for embedding in embeddings {
            let bytes = vector_to_bytes(&embedding.vector);
            tx.execute(
                "INSERT INTO embeddings (chunk_id, model, dimensions, vector) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(chunk_id) DO UPDATE SET model = excluded.model, dimensions = excluded.dimensions, vector = excluded.vector",
                params![embedding.chunk_id, embedding.model, embedding.vector.len() as i64, bytes],
            )
            .map_err(StorageError::from)?;
        }
        tx.commit().map_err(StorageError::from)?;
        Ok(())
    }

    /// Loads the stored embedding vector for a chunk, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the query fails.
    pub fn get_embedding(&self, chunk_id: i64) -> Result<Option<Vec<f32>>> {
        let conn = self.lock();
        let bytes: Option<Vec<u8>> = conn
            .query_row("SELECT vector FROM embeddings WHERE chunk_id = ?1", params![chunk_id], |row| row.get(0))
            .optional()
            .map_err(StorageError::from)?;
        Ok(bytes.map(|b| bytes_to_vector(&b)))
    }

    /// Touches a note's `updated_at` to the current time.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the write fails.
    pub fn touch_note(&self, id: Uuid) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "UPDATE notes SET updated_at = ?1 WHERE id = ?2",
            params![current_timestamp_ms(), id.to_string()],
        )
        .map_err(StorageError::from)?;
        Ok(())
    }
}

fn row_to_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<Note> {
    let id: String = row.get(0)?;
    Ok(Note {
        id: Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::nil()),
        title: row.get(1)?,
        content: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn row_to_chunk(row: &rusqlite::Row<'_>) -> rusqlite::Result<Chunk> {
    let note_id: String = row.get(1)?;
    let index: i64 = row.get(3)?;
    Ok(Chunk {
        id: row.get(0)?,
        note_id: Uuid::parse_str(&note_id).unwrap_or_else(|_| Uuid::nil()),
        content: row.get(2)?,
        index: index as usize,
    })
}

fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn bytes_to_vector(bytes: &[u8]) -> Vec<f32> {
    bytes.chunks_exact(4).map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_note() -> Note {
        Note::new("Title".to_string(), "Body paragraph one.\n\nBody paragraph two.".to_string())
    }

    #[test]
    fn upsert_and_get_note_round_trips() {
        let store = NotesStore::in_memory().unwrap();
        let note = sample_note();
        store.upsert_note(&note).unwrap();
        let fetched = store.get_note(note.id).unwrap().unwrap();
        assert_eq!(fetched.title, note.title);
        assert_eq!(fetched.content, note.content);
    }

    #[test]
    fn upsert_twice_updates_in_place() {
        let store = NotesStore::in_memory().unwrap();
        let mut note = sample_note();
        store.upsert_note(&note).unwrap();
        note.content = "Changed.".to_string();
        store.upsert_note(&note).unwrap();
        assert_eq!(store.list_notes().unwrap().len(), 1);
        assert_eq!(store.get_note(note.id).unwrap().unwrap().content, "Changed.");
    }

    #[test]
    fn delete_note_cascades_chunks() {
        let store = NotesStore::in_memory().unwrap();
        let note = sample_note();
        store.upsert_note(&note).unwrap();
        store.replace_chunks(note.id, &["a".to_string(), "b".to_string()]).unwrap();
        store.delete_note(note.id).unwrap();
        assert!(store.get_chunks(note.id).unwrap().is_empty());
    }

    #[test]
    fn replace_chunks_drops_previous_set() {
        let store = NotesStore::in_memory().unwrap();
        let note = sample_note();
        store.upsert_note(&note).unwrap();
        store.replace_chunks(note.id, &["a".to_string(), "b".to_string(), "c".to_string()]).unwrap();
        let second = store.replace_chunks(note.id, &["x".to_string()]).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(store.get_chunks(note.id).unwrap().len(), 1);
    }

    #[test]
    fn note_id_for_chunk_resolves_back() {
        let store = NotesStore::in_memory().unwrap();
        let note = sample_note();
        store.upsert_note(&note).unwrap();
        let chunks = store.replace_chunks(note.id, &["a".to_string()]).unwrap();
        assert_eq!(store.note_id_for_chunk(chunks[0].id).unwrap(), Some(note.id));
    }

    #[test]
    fn embeddings_round_trip_through_blob() {
        let store = NotesStore::in_memory().unwrap();
        let note = sample_note();
        store.upsert_note(&note).unwrap();
        let chunks = store.replace_chunks(note.id, &["a".to_string()]).unwrap();
        let embedding = Embedding { id: 0, chunk_id: chunks[0].id, model: "fallback".to_string(), vector: vec![1.0, -2.5, 3.25] };
        store.insert_embeddings(&[embedding]).unwrap();
        let loaded = store.get_embedding(chunks[0].id).unwrap().unwrap();
        assert_eq!(loaded, vec![1.0, -2.5, 3.25]);
    }
}
