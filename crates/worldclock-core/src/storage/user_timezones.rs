//! Server-side timezone sets, one per user.
//!
//! The sync endpoint replaces a user's whole set on every push. The set is kept
//! as a single JSON value per user so delete-then-insert happens inside one
//! write transaction and readers never see a half-written set.

use crate::error::ClockError;
use crate::types::RemoteTimezone;
use redb::{ReadableTable, TableDefinition};
use tracing::debug;

use super::Storage;

/// Table of per-user sets (key: user key, value: JSON array of RemoteTimezone)
pub(crate) const USER_TIMEZONES_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("user_timezones");

impl Storage {
    // ═══════════════════════════════════════════════════════════════════════
    // User Timezone Operations
    // ═══════════════════════════════════════════════════════════════════════

    /// List a user's timezones in insertion order
    ///
    /// Returns an empty list for unknown users.
    pub fn list_user_timezones(&self, user: &str) -> Result<Vec<RemoteTimezone>, ClockError> {
        let db = self.db_handle();
        let db_guard = db.read();
        let read_txn = db_guard.begin_read()?;
        let table = read_txn.open_table(USER_TIMEZONES_TABLE)?;

        match table.get(user)? {
            Some(data) => {
                let mut records: Vec<RemoteTimezone> = serde_json::from_slice(data.value())?;
                records.sort_by_key(|r| r.created_at);
                Ok(records)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Replace a user's timezones: delete all, then insert `records`, atomically
    pub fn replace_user_timezones(
        &self,
        user: &str,
        records: &[RemoteTimezone],
    ) -> Result<(), ClockError> {
        let serialized = serde_json::to_vec(records)?;

        let db = self.db_handle();
        let db_guard = db.read();
        let write_txn = db_guard.begin_write()?;
        {
            let mut table = write_txn.open_table(USER_TIMEZONES_TABLE)?;
            table.remove(user)?;
            if !records.is_empty() {
                table.insert(user, serialized.as_slice())?;
            }
        }
        write_txn.commit()?;

        debug!(user, count = records.len(), "Replaced user timezones");
        Ok(())
    }
}
