// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Persistence adapter: one opaque blob per logical store, rewritten in full.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Sipfolio", "sipfolio"));

pub const LEDGER_KEY: &str = "ledger_state";

pub trait Store {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&mut self, key: &str, blob: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

pub fn data_dir() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    Ok(proj.data_dir().to_path_buf())
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens `<dir>/sipfolio.sqlite`, creating the directory and schema as needed.
    pub fn open_or_init(dir: Option<&Path>) -> Result<Self> {
        let dir = match dir {
            Some(d) => d.to_path_buf(),
            None => data_dir()?,
        };
        fs::create_dir_all(&dir).context("Failed to create data dir")?;
        let path = dir.join("sipfolio.sqlite");
        let conn =
            Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
        CREATE TABLE IF NOT EXISTS blobs(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
        )?;
        Ok(Self { conn })
    }
}

impl Store for SqliteStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let v: Option<String> = self
            .conn
            .query_row("SELECT value FROM blobs WHERE key=?1", params![key], |r| {
                r.get(0)
            })
            .optional()?;
        Ok(v)
    }

    fn save(&mut self, key: &str, blob: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO blobs(key, value) VALUES(?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=datetime('now')",
            params![key, blob],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM blobs WHERE key=?1", params![key])?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    blobs: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(key: &str, blob: &str) -> Self {
        let mut s = Self::default();
        s.blobs.insert(key.to_string(), blob.to_string());
        s
    }
}

impl Store for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn save(&mut self, key: &str, blob: &str) -> Result<()> {
        self.blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.blobs.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_store_upserts_blobs() {
        let mut s = SqliteStore::in_memory().unwrap();
        assert_eq!(s.load(LEDGER_KEY).unwrap(), None);
        s.save(LEDGER_KEY, "{\"balance\":\"1\"}").unwrap();
        s.save(LEDGER_KEY, "{\"balance\":\"2\"}").unwrap();
        assert_eq!(
            s.load(LEDGER_KEY).unwrap().as_deref(),
            Some("{\"balance\":\"2\"}")
        );
        s.remove(LEDGER_KEY).unwrap();
        assert_eq!(s.load(LEDGER_KEY).unwrap(), None);
    }

    #[test]
    fn sqlite_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut s = SqliteStore::open_or_init(Some(dir.path())).unwrap();
            s.save("k", "v").unwrap();
        }
        let s = SqliteStore::open_or_init(Some(dir.path())).unwrap();
        assert_eq!(s.load("k").unwrap().as_deref(), Some("v"));
    }
}
