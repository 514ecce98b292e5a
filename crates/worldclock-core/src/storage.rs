//! Persistent storage using redb.
//!
//! This module provides ACID-compliant storage for:
//! - The local tier: the dashboard's entry list, one JSON array under a fixed key
//! - The server tier: per-user timezone sets behind the sync endpoint

use crate::error::ClockError;
use crate::types::TimezoneEntry;
use parking_lot::{Mutex, RwLock};
use redb::{Database, ReadableTable, TableDefinition};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod user_timezones;

use user_timezones::USER_TIMEZONES_TABLE;

/// File name of the database inside a data directory
pub const DATABASE_FILE: &str = "worldclock.redb";

/// Key of the serialized entry list in the local tier
pub const TIMEZONES_KEY: &str = "timezones";

const LOCAL_STORAGE_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("local_storage");

/// Local tier of the persistence protocol
///
/// Holds the whole entry list as one value. Implementations must keep
/// insertion order.
pub trait LocalStore: Send + Sync {
    /// Load the saved list; `None` when nothing was ever saved
    fn load_entries(&self) -> Result<Option<Vec<TimezoneEntry>>, ClockError>;

    /// Overwrite the saved list
    fn save_entries(&self, entries: &[TimezoneEntry]) -> Result<(), ClockError>;
}

/// Storage layer using redb for ACID-compliant persistence
#[derive(Clone)]
pub struct Storage {
    db: Arc<RwLock<Database>>,
    path: PathBuf,
}

impl Storage {
    /// Create a new storage instance at the given path.
    ///
    /// This will:
    /// - Create the database directory if it doesn't exist
    /// - Initialize the database file
    /// - Create all required tables
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ClockError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(LOCAL_STORAGE_TABLE)?;
            let _ = write_txn.open_table(USER_TIMEZONES_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(RwLock::new(db)),
            path: path.to_path_buf(),
        })
    }

    /// Open (or create) the database inside a data directory
    pub fn open_in(data_dir: impl AsRef<Path>) -> Result<Self, ClockError> {
        Self::new(data_dir.as_ref().join(DATABASE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a reference to the shared database handle
    pub fn db_handle(&self) -> Arc<RwLock<Database>> {
        self.db.clone()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Local Tier
    // ═══════════════════════════════════════════════════════════════════════

    /// Store a raw value in the local tier
    pub fn set_item(&self, key: &str, value: &[u8]) -> Result<(), ClockError> {
        let db = self.db.read();
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(LOCAL_STORAGE_TABLE)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Read a raw value from the local tier
    pub fn get_item(&self, key: &str) -> Result<Option<Vec<u8>>, ClockError> {
        let db = self.db.read();
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(LOCAL_STORAGE_TABLE)?;

        Ok(table.get(key)?.map(|v| v.value().to_vec()))
    }
}

impl LocalStore for Storage {
    fn load_entries(&self) -> Result<Option<Vec<TimezoneEntry>>, ClockError> {
        match self.get_item(TIMEZONES_KEY)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save_entries(&self, entries: &[TimezoneEntry]) -> Result<(), ClockError> {
        let data = serde_json::to_vec(entries)?;
        self.set_item(TIMEZONES_KEY, &data)
    }
}

/// In-memory local tier for sessions without a data directory
///
/// Stores the serialized JSON so loads go through the same codec as
/// [`Storage`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw JSON currently held, if any
    pub fn raw(&self) -> Option<String> {
        self.data.lock().clone()
    }
}

impl LocalStore for MemoryStore {
    fn load_entries(&self) -> Result<Option<Vec<TimezoneEntry>>, ClockError> {
        match self.data.lock().as_deref() {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn save_entries(&self, entries: &[TimezoneEntry]) -> Result<(), ClockError> {
        let json = serde_json::to_string(entries)?;
        *self.data.lock() = Some(json);
        Ok(())
    }
}
