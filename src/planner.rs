use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::models::{AddToPlanner, PlannerEntry};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable home for the planner. `save` followed by `load` must give back
/// the same entries in the same order.
pub trait PlannerStorage: Send {
    fn save(&self, entries: &[PlannerEntry]) -> Result<(), StorageError>;
    fn load(&self) -> Result<Vec<PlannerEntry>, StorageError>;
}

/// Keeps the planner for the lifetime of the process only. Clones share the snapshot.
#[derive(Clone, Default)]
pub struct SessionStorage {
    snapshot: Arc<Mutex<Vec<PlannerEntry>>>,
}

impl PlannerStorage for SessionStorage {
    fn save(&self, entries: &[PlannerEntry]) -> Result<(), StorageError> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|_| StorageError::Unavailable("session storage poisoned".to_string()))?;
        *guard = entries.to_vec();
        Ok(())
    }

    fn load(&self) -> Result<Vec<PlannerEntry>, StorageError> {
        let guard = self
            .snapshot
            .lock()
            .map_err(|_| StorageError::Unavailable("session storage poisoned".to_string()))?;
        Ok(guard.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added(PlannerEntry),
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed(PlannerEntry),
    Absent,
}

/// The user's selected events. Identifiers are unique.
pub struct Planner {
    entries: Vec<PlannerEntry>,
    storage: Box<dyn PlannerStorage>,
}

impl Planner {
    pub fn new(storage: Box<dyn PlannerStorage>) -> Self {
        Self {
            entries: Vec::new(),
            storage,
        }
    }

    /// Starts from whatever `storage` holds; a failed load starts empty.
    pub fn load(storage: Box<dyn PlannerStorage>) -> Self {
        let mut planner = Self::new(storage);
        match planner.storage.load() {
            Ok(stored) => {
                for entry in stored {
                    if !planner.contains(&entry.id) {
                        planner.entries.push(entry);
                    }
                }
                info!(count = planner.entries.len(), "planner loaded");
            }
            Err(err) => error!("error loading planner: {err}"),
        }
        planner
    }

    pub fn entries(&self) -> &[PlannerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn add(&mut self, draft: AddToPlanner) -> AddOutcome {
        self.add_at(draft, Utc::now())
    }

    pub fn add_at(&mut self, draft: AddToPlanner, added_at: DateTime<Utc>) -> AddOutcome {
        if self.contains(&draft.id) {
            debug!(id = %draft.id, "planner already holds event");
            return AddOutcome::Duplicate;
        }
        let entry = PlannerEntry::from_draft(draft, added_at);
        self.entries.push(entry.clone());
        self.persist();
        AddOutcome::Added(entry)
    }

    pub fn remove(&mut self, id: &str) -> RemoveOutcome {
        match self.entries.iter().position(|entry| entry.id == id) {
            Some(index) => {
                let removed = self.entries.remove(index);
                self.persist();
                RemoveOutcome::Removed(removed)
            }
            None => RemoveOutcome::Absent,
        }
    }

    fn persist(&self) {
        match self.storage.save(&self.entries) {
            Ok(()) => debug!(count = self.entries.len(), "planner saved"),
            Err(err) => error!("error saving planner: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft(id: &str) -> AddToPlanner {
        AddToPlanner {
            id: id.to_string(),
            name: format!("Event {id}"),
            date: "2024-05-01".to_string(),
            venue: "Test Arena".to_string(),
        }
    }

    fn ids(planner: &Planner) -> Vec<&str> {
        planner.entries().iter().map(|entry| entry.id.as_str()).collect()
    }

    struct FailingStorage;

    impl PlannerStorage for FailingStorage {
        fn save(&self, _entries: &[PlannerEntry]) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk full".to_string()))
        }

        fn load(&self) -> Result<Vec<PlannerEntry>, StorageError> {
            Err(StorageError::Unavailable("disk gone".to_string()))
        }
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let mut planner = Planner::new(Box::new(SessionStorage::default()));
        assert!(matches!(planner.add(draft("a")), AddOutcome::Added(_)));
        assert_eq!(planner.add(draft("a")), AddOutcome::Duplicate);
        assert_eq!(planner.len(), 1);
    }

    #[test]
    fn removing_absent_id_changes_nothing() {
        let mut planner = Planner::new(Box::new(SessionStorage::default()));
        planner.add(draft("a"));
        assert_eq!(planner.remove("missing"), RemoveOutcome::Absent);
        assert_eq!(ids(&planner), vec!["a"]);
    }

    #[test]
    fn add_add_remove_leaves_only_second() {
        let mut planner = Planner::new(Box::new(SessionStorage::default()));
        planner.add(draft("a"));
        planner.add(draft("b"));
        assert!(matches!(planner.remove("a"), RemoveOutcome::Removed(entry) if entry.id == "a"));
        assert_eq!(ids(&planner), vec!["b"]);
    }

    #[test]
    fn entries_carry_the_addition_time() {
        let when = Utc.with_ymd_and_hms(2024, 4, 30, 8, 15, 0).single().expect("time");
        let mut planner = Planner::new(Box::new(SessionStorage::default()));
        match planner.add_at(draft("a"), when) {
            AddOutcome::Added(entry) => {
                assert_eq!(entry.added_at, when);
                assert_eq!(entry.venue, "Test Arena");
            }
            AddOutcome::Duplicate => panic!("first add must succeed"),
        }
    }

    #[test]
    fn mutations_are_saved_and_reload_round_trips() {
        let storage = SessionStorage::default();
        let mut planner = Planner::new(Box::new(storage.clone()));
        planner.add(draft("a"));
        planner.add(draft("b"));
        planner.add(draft("c"));
        planner.remove("b");

        let saved = storage.load().expect("load");
        assert_eq!(saved, planner.entries().to_vec());

        let reloaded = Planner::load(Box::new(storage));
        assert_eq!(reloaded.entries(), planner.entries());
    }

    #[test]
    fn load_drops_duplicate_ids() {
        let storage = SessionStorage::default();
        let when = Utc::now();
        let first = PlannerEntry::from_draft(draft("a"), when);
        let mut second = PlannerEntry::from_draft(draft("a"), when);
        second.name = "Imposter".to_string();
        storage.save(&[first.clone(), second]).expect("save");

        let planner = Planner::load(Box::new(storage));
        assert_eq!(planner.entries(), &[first]);
    }

    #[test]
    fn storage_failures_do_not_undo_changes() {
        let mut planner = Planner::load(Box::new(FailingStorage));
        assert!(planner.is_empty());
        assert!(matches!(planner.add(draft("a")), AddOutcome::Added(_)));
        assert!(planner.contains("a"));
        assert!(matches!(planner.remove("a"), RemoveOutcome::Removed(_)));
        assert!(planner.is_empty());
    }
}
