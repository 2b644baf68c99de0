use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult};
use shared::types::Result;
use std::path::Path;

/// SQLite cache of corpus question vectors, keyed by model and question text.
pub struct EmbeddingStorage {
    conn: Connection,
}

pub fn cache_key(model: &str, text: &str) -> String {
    let mut material = Vec::with_capacity(model.len() + text.len() + 1);
    material.extend_from_slice(model.as_bytes());
    material.push(0);
    material.extend_from_slice(text.as_bytes());
    format!("{:x}", md5::compute(material))
}

impl EmbeddingStorage {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Self::setup_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::setup_db(&conn)?;
        Ok(Self { conn })
    }

    fn setup_db(conn: &Connection) -> SqlResult<()> {
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            CREATE TABLE IF NOT EXISTS corpus_embeddings (
                key TEXT PRIMARY KEY,
                model TEXT NOT NULL,
                text TEXT NOT NULL,
                vector BLOB NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_corpus_embeddings_model ON corpus_embeddings(model);
        ",
        )
    }

    pub fn get_embedding(&self, model: &str, text: &str) -> Result<Option<Vec<f32>>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT vector FROM corpus_embeddings WHERE key = ?1")?;
        let bytes: Option<Vec<u8>> = stmt
            .query_row([cache_key(model, text)], |row| row.get(0))
            .optional()?;
        match bytes {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn insert_embeddings(&self, model: &str, entries: &[(&str, &[f32])]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO corpus_embeddings (key, model, text, vector) VALUES (?, ?, ?, ?)",
            )?;
            for (text, vector) in entries {
                let vector_bytes = serde_json::to_vec(vector)?;
                stmt.execute(params![cache_key(model, text), model, text, vector_bytes])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn count_for_model(&self, model: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM corpus_embeddings WHERE model = ?1",
            [model],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
