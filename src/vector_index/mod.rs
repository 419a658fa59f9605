//! Concurrent flat L2 vector index.
//!
//! Unlike an HNSW-based approximate index, this crate's data model calls
//! for an exact flat index: every `add`/`search`/`remove`
//! is O(n) in the number of stored vectors, but the deterministic ordering
//! and the absence of index-build tuning parameters make results easy to
//! reason about at the data scale a single-user notes store operates at.
//!
//! A single [`std::sync::Mutex`] guards all mutating operations and
//! coherent reads, matching the "one writer lock, no partial views" shape
//! the job manager and retrieval layer both expect.

use crate::Result;
use crate::error::Error;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Mutex;

/// A single nearest-neighbor search hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// The external id passed to `add` (a chunk id).
    pub id: i64,
    /// Squared L2 distance to the query vector; lower is closer.
    pub distance: f32,
}

struct State {
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
    ids: Vec<i64>,
}

impl State {
    fn position_of(&self, id: i64) -> Option<usize> {
        self.ids.iter().position(|&x| x == id)
    }
}

/// Thread-safe flat L2 vector index.
pub struct VectorIndex {
    state: Mutex<State>,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        f.debug_struct("VectorIndex")
            .field("dimensions", &guard.dimensions)
            .field("len", &guard.ids.len())
            .finish()
    }
}

impl VectorIndex {
    /// Creates an empty index fixed at `dimensions`.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            state: Mutex::new(State {
                dimensions,
                vectors: Vec::new(),
                ids: Vec::new(),
            }),
        }
    }

    /// The configured vector dimensionality.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.lock().dimensions
    }

    /// Number of vectors currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().ids.len()
    }

    /// Whether the index holds no vectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Adds or replaces vectors for the given ids.
    ///
    /// All pairs are validated against the index's dimensionality before
    /// any mutation happens, so a single malformed vector in a batch
    /// leaves the index untouched rather than partially applied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if any vector's length does not
    /// equal [`VectorIndex::dimensions`].
    pub fn add(&self, items: &[(i64, Vec<f32>)]) -> Result<()> {
        let mut guard = self.lock();
        for (_, vector) in items {
            if vector.len() != guard.dimensions {
                return Err(Error::DimensionMismatch {
                    expected: guard.dimensions,
                    actual: vector.len(),
                });
            }
        }
        for (id, vector) in items {
            if let Some(pos) = guard.position_of(*id) {
                guard.vectors[pos] = vector.clone();
            } else {
                guard.ids.push(*id);
                guard.vectors.push(vector.clone());
            }
        }
        Ok(())
    }

    /// Finds the `k` nearest stored vectors to `query` by squared L2
    /// distance, sorted ascending (closest first).
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `query`'s length does not
    /// equal [`VectorIndex::dimensions`].
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>> {
        let guard = self.lock();
        if query.len() != guard.dimensions {
            return Err(Error::DimensionMismatch {
                expected: guard.dimensions,
                actual: query.len(),
            });
        }
        let mut hits: Vec<Hit> = guard
            .ids
            .iter()
            .zip(guard.vectors.iter())
            .filter(|(&id, _)| id >= 0)
            .map(|(&id, v)| Hit {
                id,
                distance: crate::embedding::l2_distance_squared(query, v),
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    /// Removes the given ids, rebuilding the backing storage so no
    /// tombstones are left behind. Ids not present are silently ignored.
    pub fn remove(&self, ids: &[i64]) {
        let mut guard = self.lock();
        let mut keep_ids = Vec::with_capacity(guard.ids.len());
        let mut keep_vectors = Vec::with_capacity(guard.vectors.len());
        for (id, vector) in guard.ids.drain(..).zip(guard.vectors.drain(..)) {
            if !ids.contains(&id) {
                keep_ids.push(id);
                keep_vectors.push(vector);
            }
        }
        guard.ids = keep_ids;
        guard.vectors = keep_vectors;
    }

    /// Drops every stored vector, keeping the configured dimensionality.
    pub fn clear(&self) {
        let mut guard = self.lock();
        guard.ids.clear();
        guard.vectors.clear();
    }

    /// Persists the index to two sibling files: a binary vectors file at
    /// `index_path` and a JSON id-mapping file at `id_map_path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if either file cannot be written.
    pub fn save(&self, index_path: &Path, id_map_path: &Path) -> Result<()> {
        let guard = self.lock();
        let mut writer = BufWriter::new(File::create(index_path)?);
        writer.write_all(&(guard.dimensions as u32).to_le_bytes())?;
        writer.write_all(&(guard.ids.len() as u32).to_le_bytes())?;
        for vector in &guard.vectors {
            for component in vector {
                writer.write_all(&component.to_le_bytes())?;
            }
        }
        writer.flush()?;

        let id_map_json = serde_json::to_vec(&guard.ids)?;
        std::fs::write(id_map_path, id_map_json)?;
        Ok(())
    }

    /// Loads an index previously written by [`VectorIndex::save`].
    ///
    /// The dimensionality recorded in the file overrides whatever value
    /// the caller might otherwise have configured: a vector index is only
    /// ever meaningful at the dimension it was built with. A later `add`
    /// call at a different dimension is rejected with
    /// [`Error::DimensionMismatch`] rather than silently re-dimensioning
    /// the index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if either file is missing or malformed, or
    /// [`Error::Json`] if the id-mapping file is not valid JSON.
    pub fn load(index_path: &Path, id_map_path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(index_path)?);
        let mut dim_bytes = [0u8; 4];
        reader.read_exact(&mut dim_bytes)?;
        let dimensions = u32::from_le_bytes(dim_bytes) as usize;

        let mut count_bytes = [0u8; 4];
        reader.read_exact(&mut count_bytes)?;
        let count = u32::from_le_bytes(count_bytes) as usize;

        let mut vectors = Vec::with_capacity(count);
        for _ in 0..count {
            let mut vector = vec![0.0f32; dimensions];
            for component in &mut vector {
                let mut bytes = [0u8; 4];
                reader.read_exact(&mut bytes)?;
                *component = f32::from_le_bytes(bytes);
            }
            vectors.push(vector);
        }

        let id_map_bytes = std::fs::read(id_map_path)?;
        let ids: Vec<i64> = serde_json::from_slice(&id_map_bytes)?;

        Ok(Self {
            state: Mutex::new(State { dimensions, vectors, ids }),
        })
    }
}
