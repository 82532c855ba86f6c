use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info};

use crate::fingerprint::Fingerprint;

pub type Visits = BTreeMap<Fingerprint, u32>;

pub struct VisitStore {
    path: PathBuf,
}

impl VisitStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // missing database or table is a first run
    pub fn load_all(&self) -> Result<Visits> {
        let mut output = BTreeMap::new();
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no visit store yet");
            return Ok(output);
        }

        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        let exists: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'data'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Ok(output);
        }

        let mut stmt = conn.prepare("SELECT hash, visits FROM data")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, Fingerprint>(0)?, row.get::<_, u32>(1)?))
        })?;
        for row in rows {
            let (hash, visits) = row?;
            output.insert(hash, visits);
        }

        info!(path = %self.path.display(), known = output.len(), "loaded visits");
        Ok(output)
    }

    // one transaction, a failure leaves the previous count in place
    pub fn increment(&self, fingerprint: &Fingerprint) -> Result<u32> {
        let mut conn = Connection::open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        let tx = conn.transaction()?;
        tx.execute(
            "CREATE TABLE IF NOT EXISTS data (hash TEXT PRIMARY KEY NOT NULL, visits INTEGER NOT NULL)",
            [],
        )?;

        let updated = tx.execute(
            "UPDATE data SET visits = visits + 1 WHERE hash = ?1",
            params![fingerprint],
        )?;
        if updated == 0 {
            tx.execute(
                "INSERT INTO data (hash, visits) VALUES (?1, 1)",
                params![fingerprint],
            )?;
        }

        let visits: u32 = tx.query_row(
            "SELECT visits FROM data WHERE hash = ?1",
            params![fingerprint],
            |row| row.get(0),
        )?;
        tx.commit()
            .with_context(|| format!("failed to save visit to {}", self.path.display()))?;

        info!(%fingerprint, visits, "recorded visit");
        Ok(visits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, VisitStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = VisitStore::new(dir.path().join("testing.db"));
        (dir, store)
    }

    #[test]
    fn first_run_is_empty() {
        let (_dir, store) = store();
        assert!(store.load_all().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn round_trip() {
        let (_dir, store) = store();
        let fp = Fingerprint::from("abc123");

        assert_eq!(store.increment(&fp).unwrap(), 1);
        assert_eq!(store.load_all().unwrap(), BTreeMap::from([(fp.clone(), 1)]));

        assert_eq!(store.increment(&fp).unwrap(), 2);
        assert_eq!(store.load_all().unwrap(), BTreeMap::from([(fp, 2)]));
    }

    #[test]
    fn counts_every_selection() {
        let (_dir, store) = store();
        let a = Fingerprint::from("aaaa");
        let b = Fingerprint::from("bbbb");
        for _ in 0..5 {
            // new handle each time, like separate runs
            VisitStore::new(store.path()).increment(&a).unwrap();
        }
        store.increment(&b).unwrap();

        let visits = store.load_all().unwrap();
        assert_eq!(visits.get(&a), Some(&5));
        assert_eq!(visits.get(&b), Some(&1));
        assert_eq!(visits.len(), 2);
    }

    #[test]
    fn quotes_are_data() {
        let (_dir, store) = store();
        let fp = Fingerprint::from("x'); DROP TABLE data; --");
        store.increment(&fp).unwrap();
        store.increment(&fp).unwrap();
        assert_eq!(store.load_all().unwrap().get(&fp), Some(&2));
    }

    #[test]
    fn file_without_table() {
        let (_dir, store) = store();
        Connection::open(store.path())
            .unwrap()
            .execute_batch("PRAGMA user_version = 1;")
            .unwrap();
        assert!(store.path().exists());
        assert!(store.load_all().unwrap().is_empty());

        let fp = Fingerprint::from("abc123");
        assert_eq!(store.increment(&fp).unwrap(), 1);
    }

    #[test]
    fn table_without_key() {
        // layout written by earlier versions of the tool
        let (_dir, store) = store();
        let conn = Connection::open(store.path()).unwrap();
        conn.execute("CREATE TABLE data (hash text, visits integer)", [])
            .unwrap();
        conn.execute("INSERT INTO data VALUES ('abc123', 3)", [])
            .unwrap();
        drop(conn);

        let fp = Fingerprint::from("abc123");
        assert_eq!(store.load_all().unwrap().get(&fp), Some(&3));
        assert_eq!(store.increment(&fp).unwrap(), 4);
    }
}
