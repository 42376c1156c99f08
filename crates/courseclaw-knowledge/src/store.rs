//! SQLite record store: course text plus embedding, ranked by exact L2 distance.

use std::path::Path;
use std::sync::Mutex;

use courseclaw_core::error::{CourseClawError, Result};
use rusqlite::{Connection, OptionalExtension, params};

/// One nearest-neighbor result.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: i64,
    pub text: String,
    pub distance: f32,
}

/// Persistent course index.
///
/// All vectors in a store share one dimension, recorded in `store_meta` on
/// first open and checked on every reopen.
pub struct RecordStore {
    conn: Mutex<Connection>,
    dimensions: usize,
}

fn storage_err(e: impl std::fmt::Display) -> CourseClawError {
    CourseClawError::Storage(e.to_string())
}

impl RecordStore {
    /// Open (or create) a store on disk.
    pub fn open(path: &Path, dimensions: usize) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let existed = path.exists();
        let conn = Connection::open(path).map_err(storage_err)?;
        if existed {
            tracing::info!("🗄️ Using existing database: {}", path.display());
        } else {
            tracing::info!("🗄️ Creating new database: {}", path.display());
        }
        Self::init(conn, dimensions)
    }

    /// Open a throwaway in-memory store.
    pub fn open_in_memory(dimensions: usize) -> Result<Self> {
        Self::init(Connection::open_in_memory().map_err(storage_err)?, dimensions)
    }

    fn init(conn: Connection, dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(CourseClawError::Storage("embedding dimension must be > 0".into()));
        }

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS course (
                id INTEGER PRIMARY KEY,
                plain TEXT NOT NULL,
                embedding BLOB NOT NULL
            );
            CREATE TABLE IF NOT EXISTS store_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .map_err(storage_err)?;

        let stored: Option<String> = conn
            .query_row(
                "SELECT value FROM store_meta WHERE key = 'dimensions'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(storage_err)?;

        match stored {
            Some(value) => {
                let existing: usize = value
                    .parse()
                    .map_err(|e| storage_err(format!("corrupt dimensions entry {value:?}: {e}")))?;
                if existing != dimensions {
                    return Err(CourseClawError::Storage(format!(
                        "store holds {existing}-dimensional embeddings, configured for {dimensions}"
                    )));
                }
            }
            None => {
                conn.execute(
                    "INSERT INTO store_meta (key, value) VALUES ('dimensions', ?1)",
                    params![dimensions.to_string()],
                )
                .map_err(storage_err)?;
            }
        }

        Ok(Self {
            conn: Mutex::new(conn),
            dimensions,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Insert one entry. Ids are caller-assigned; reusing one is an error.
    pub fn put(&self, id: i64, text: &str, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dimensions {
            return Err(CourseClawError::DimensionMismatch {
                expected: self.dimensions,
                got: embedding.len(),
            });
        }
        if embedding.iter().any(|x| !x.is_finite()) {
            return Err(CourseClawError::Embedding(format!(
                "entry {id} has a non-finite component"
            )));
        }
        let conn = self.conn.lock().map_err(storage_err)?;
        conn.execute(
            "INSERT INTO course (id, plain, embedding) VALUES (?1, ?2, ?3)",
            params![id, text, f32_vec_to_bytes(embedding)],
        )
        .map_err(storage_err)?;
        Ok(())
    }

    /// Up to `k` entries ordered by ascending L2 distance, ties by ascending id.
    pub fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<Hit>> {
        if query.len() != self.dimensions {
            return Err(CourseClawError::DimensionMismatch {
                expected: self.dimensions,
                got: query.len(),
            });
        }
        if query.iter().any(|x| !x.is_finite()) {
            return Err(CourseClawError::Embedding(
                "query embedding has a non-finite component".into(),
            ));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock().map_err(storage_err)?;
        let mut stmt = conn
            .prepare("SELECT id, plain, embedding FROM course")
            .map_err(storage_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                ))
            })
            .map_err(storage_err)?;

        let mut hits = Vec::new();
        for row in rows {
            let (id, text, blob) = row.map_err(storage_err)?;
            let stored = bytes_to_f32_vec(&blob);
            if stored.len() != self.dimensions {
                tracing::warn!("Skipping entry {id}: {} stored components", stored.len());
                continue;
            }
            let distance = l2_distance(query, &stored);
            if distance.is_nan() {
                tracing::warn!("Skipping entry {id}: distance is NaN");
                continue;
            }
            hits.push(Hit { id, text, distance });
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
        hits.truncate(k);
        Ok(hits)
    }

    /// Number of stored entries.
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock().map_err(storage_err)?;
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM course", [], |r| r.get(0))
            .map_err(storage_err)?;
        Ok(n as usize)
    }
}

/// Euclidean distance.
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Convert f32 slice to bytes (little-endian).
fn f32_vec_to_bytes(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert bytes back to f32 vec.
fn bytes_to_f32_vec(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
