use std::path::Path;

use rusqlite::{params, Connection};

use crate::models::PlannerEntry;
use crate::planner::{PlannerStorage, StorageError};
use crate::utils;

/// SQLite-backed planner storage.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        utils::ensure_parent(path);
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS planner_entries(
                position INTEGER NOT NULL,
                id TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                added_at_utc TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}

impl PlannerStorage for Store {
    fn save(&self, entries: &[PlannerEntry]) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM planner_entries", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO planner_entries (position, id, payload, added_at_utc)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, entry) in entries.iter().enumerate() {
                let payload = serde_json::to_string(entry)?;
                stmt.execute(params![position as i64, entry.id, payload, entry.added_at])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn load(&self) -> Result<Vec<PlannerEntry>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT payload FROM planner_entries ORDER BY position")?;
        let rows = stmt.query_map([], |row| {
            let payload: String = row.get(0)?;
            serde_json::from_str::<PlannerEntry>(&payload).map_err(|err| {
                rusqlite::Error::FromSqlConversionFailure(
                    payload.len(),
                    rusqlite::types::Type::Text,
                    Box::new(err),
                )
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(id: &str, minute: u32) -> PlannerEntry {
        PlannerEntry {
            id: id.to_string(),
            name: format!("Show {id}"),
            date: "2024-05-01".to_string(),
            venue: "Test Arena".to_string(),
            added_at: Utc
                .with_ymd_and_hms(2024, 4, 1, 12, minute, 0)
                .single()
                .expect("time"),
        }
    }

    #[test]
    fn empty_store_loads_nothing() {
        let store = Store::open_in_memory().expect("store");
        assert!(store.load().expect("load").is_empty());
    }

    #[test]
    fn save_then_load_preserves_order_and_fields() {
        let store = Store::open_in_memory().expect("store");
        let entries = vec![entry("z", 1), entry("a", 2), entry("m", 3)];
        store.save(&entries).expect("save");
        assert_eq!(store.load().expect("load"), entries);
    }

    #[test]
    fn save_replaces_previous_snapshot() {
        let store = Store::open_in_memory().expect("store");
        store.save(&[entry("a", 1), entry("b", 2)]).expect("first save");
        store.save(&[entry("b", 2)]).expect("second save");
        assert_eq!(store.load().expect("load"), vec![entry("b", 2)]);
    }

    #[test]
    fn entries_survive_reopening_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data").join("planner.sqlite");
        {
            let store = Store::open(&path).expect("open");
            store.save(&[entry("a", 1)]).expect("save");
        }
        let reopened = Store::open(&path).expect("reopen");
        assert_eq!(reopened.load().expect("load"), vec![entry("a", 1)]);
    }

    #[test]
    fn corrupt_payload_surfaces_as_error() {
        let store = Store::open_in_memory().expect("store");
        store
            .conn
            .execute(
                "INSERT INTO planner_entries (position, id, payload, added_at_utc)
                 VALUES (0, 'bad', '{not json', '2024-04-01T00:00:00Z')",
                [],
            )
            .expect("insert");
        assert!(store.load().is_err());
    }
}
