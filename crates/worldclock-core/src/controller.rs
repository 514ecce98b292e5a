//! Ordered set of timezone entries with local and remote persistence.
//!
//! ## Persistence protocol
//!
//! ```text
//! mutation ──► entries (in memory, authoritative)
//!          ├─► LocalStore::save_entries      synchronous, every time
//!          └─► Debouncer::schedule           only when a remote is attached
//!                 └─► RemoteSync::push       after the quiet period
//! ```
//!
//! Local write failures are logged and ignored: the in-memory set stays
//! authoritative for the session. Remote failures never touch local state.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::cities::{fallback_city_label, CityLookup};
use crate::clock::Clock;
use crate::error::{ClockError, ClockResult};
use crate::storage::LocalStore;
use crate::sync::{Debouncer, RemoteSync, SyncEvent, SyncStatus};
use crate::time_model::parse_timezone;
use crate::types::{CityData, EntryId, EntryPatch, RemoteTimezone, TimezoneEntry};

/// Manager of the dashboard's timezone entries
pub struct TimezoneSetController {
    entries: Vec<TimezoneEntry>,
    selected: Option<EntryId>,
    home: TimezoneEntry,
    local: Arc<dyn LocalStore>,
    cities: Arc<dyn CityLookup>,
    clock: Arc<dyn Clock>,
    debouncer: Option<Debouncer>,
}

impl TimezoneSetController {
    /// Create an empty controller; call [`initialize`](Self::initialize) next
    pub fn new(
        local: Arc<dyn LocalStore>,
        cities: Arc<dyn CityLookup>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            entries: Vec::new(),
            selected: None,
            home: TimezoneEntry::new(EntryId::home(), "UTC", "", "UTC"),
            local,
            cities,
            clock,
            debouncer: None,
        }
    }

    /// Load the saved set, seeding it with the home entry on first run.
    ///
    /// `detected_timezone` is the viewer's own IANA zone. A saved set that
    /// cannot be read is treated as missing. A saved set without the home
    /// entry gets it back at the front.
    pub fn initialize(&mut self, detected_timezone: &str) {
        self.home = self.home_entry(detected_timezone);

        let saved = match self.local.load_entries() {
            Ok(saved) => saved.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Could not read saved timezones, starting fresh");
                Vec::new()
            }
        };

        let loaded = saved.len();
        let (entries, repaired) = self.normalize(saved);
        self.entries = entries;
        self.selected = Some(EntryId::home());

        if repaired {
            info!(loaded, count = self.entries.len(), "Seeded timezone set");
            self.persist_local();
        } else {
            debug!(count = self.entries.len(), "Loaded timezone set");
        }
    }

    /// Home entry for a zone: city table label, or one derived from the id
    fn home_entry(&self, timezone: &str) -> TimezoneEntry {
        match self.cities.find_by_timezone(timezone) {
            Some(city) => TimezoneEntry::new(EntryId::home(), city.city, city.country, timezone),
            None => TimezoneEntry::new(
                EntryId::home(),
                fallback_city_label(timezone),
                "",
                timezone,
            ),
        }
    }

    /// Drop duplicate ids and restore the home entry.
    ///
    /// Returns the cleaned list and whether anything changed.
    fn normalize(&self, entries: Vec<TimezoneEntry>) -> (Vec<TimezoneEntry>, bool) {
        let original_len = entries.len();
        let mut seen = HashSet::new();
        let mut cleaned: Vec<TimezoneEntry> = entries
            .into_iter()
            .filter(|e| seen.insert(e.id.clone()))
            .collect();
        let mut repaired = cleaned.len() != original_len;

        if !cleaned.iter().any(TimezoneEntry::is_home) {
            cleaned.insert(0, self.home.clone());
            repaired = true;
        }
        (cleaned, repaired)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════════

    /// Entries in display order
    pub fn entries(&self) -> &[TimezoneEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &EntryId) -> Option<&TimezoneEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn selected(&self) -> Option<&EntryId> {
        self.selected.as_ref()
    }

    pub fn is_selected(&self, id: &EntryId) -> bool {
        self.selected.as_ref() == Some(id)
    }

    /// Whether [`remove`](Self::remove) would accept this id
    pub fn can_delete(&self, id: &EntryId) -> bool {
        self.entries.len() > 1 && !id.is_home() && self.get(id).is_some()
    }

    pub fn cities(&self) -> &Arc<dyn CityLookup> {
        &self.cities
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Mutations
    // ═══════════════════════════════════════════════════════════════════════

    /// Append a city under a fresh id and select it
    pub fn add(&mut self, city: CityData) -> ClockResult<EntryId> {
        parse_timezone(&city.timezone)?;

        let id = self.fresh_id(&city.city);
        self.entries.push(TimezoneEntry::new(
            id.clone(),
            city.city,
            city.country,
            city.timezone,
        ));
        self.selected = Some(id.clone());

        info!(entry_id = %id, "Added timezone");
        self.commit();
        Ok(id)
    }

    /// `<slug>-<now ms>`, bumping the timestamp until it is unused
    fn fresh_id(&self, city: &str) -> EntryId {
        let mut created_at = self.clock.now_ms();
        loop {
            let id = EntryId::generate(city, created_at);
            if self.get(&id).is_none() {
                return id;
            }
            created_at += 1;
        }
    }

    /// Patch an entry in place; `Ok(false)` when the id is unknown
    pub fn update(&mut self, id: &EntryId, patch: EntryPatch) -> ClockResult<bool> {
        if let Some(timezone) = &patch.timezone {
            parse_timezone(timezone)?;
        }

        let Some(entry) = self.entries.iter_mut().find(|e| &e.id == id) else {
            debug!(entry_id = %id, "Update for unknown entry ignored");
            return Ok(false);
        };

        if let Some(city) = patch.city {
            entry.city = city;
        }
        if let Some(country) = patch.country {
            entry.country = country;
        }
        if let Some(timezone) = patch.timezone {
            entry.timezone = timezone;
        }

        info!(entry_id = %id, "Updated timezone");
        self.commit();
        Ok(true)
    }

    /// Remove an entry.
    ///
    /// Refused for the home entry and for the last remaining entry. A removed
    /// selection falls back to the first remaining entry.
    pub fn remove(&mut self, id: &EntryId) -> ClockResult<()> {
        if id.is_home() {
            return Err(ClockError::RemovalRefused(
                "the home entry cannot be removed".to_string(),
            ));
        }
        let index = self
            .entries
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| ClockError::EntryNotFound(id.to_string()))?;
        if self.entries.len() <= 1 {
            return Err(ClockError::RemovalRefused(
                "the last entry cannot be removed".to_string(),
            ));
        }

        self.entries.remove(index);
        if self.selected.as_ref() == Some(id) {
            self.selected = self.entries.first().map(|e| e.id.clone());
        }

        info!(entry_id = %id, "Removed timezone");
        self.commit();
        Ok(())
    }

    /// Mark an entry as selected, or clear the selection.
    ///
    /// Unknown ids are ignored and return `false`.
    pub fn set_selected(&mut self, id: Option<EntryId>) -> bool {
        match id {
            Some(id) if self.get(&id).is_none() => false,
            other => {
                self.selected = other;
                true
            }
        }
    }

    /// Overwrite the whole set
    pub fn replace_all(&mut self, entries: Vec<TimezoneEntry>) {
        self.apply_entries(entries);
        self.commit();
    }

    /// Install a new list without scheduling a push
    fn apply_entries(&mut self, entries: Vec<TimezoneEntry>) {
        let (entries, _) = self.normalize(entries);
        self.entries = entries;

        let still_there = self
            .selected
            .as_ref()
            .is_some_and(|id| self.entries.iter().any(|e| &e.id == id));
        if !still_there {
            self.selected = self.entries.first().map(|e| e.id.clone());
        }
        self.persist_local();
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Persistence
    // ═══════════════════════════════════════════════════════════════════════

    fn commit(&mut self) {
        self.persist_local();
        if let Some(debouncer) = &self.debouncer {
            debouncer.schedule(self.entries.clone());
        }
    }

    fn persist_local(&self) {
        if let Err(e) = self.local.save_entries(&self.entries) {
            warn!(error = %e, "Local save failed, keeping in-memory set");
        }
    }

    /// Turn remote records into entries, keeping client ids where present
    fn entries_from_remote(&self, records: Vec<RemoteTimezone>) -> Vec<TimezoneEntry> {
        let mut entries: Vec<TimezoneEntry> = Vec::with_capacity(records.len());
        for record in records {
            let id = match record.entry_id {
                Some(id) if !entries.iter().any(|e| e.id == id) => id,
                _ => {
                    let mut created_at = record.created_at;
                    loop {
                        let id = EntryId::generate(&record.city, created_at);
                        if !entries.iter().any(|e| e.id == id) {
                            break id;
                        }
                        created_at += 1;
                    }
                }
            };
            entries.push(TimezoneEntry::new(
                id,
                record.city,
                record.country,
                record.timezone,
            ));
        }
        entries
    }

    /// Attach the remote tier.
    ///
    /// Fetches once: a non-empty remote set replaces the local one, an empty
    /// one is seeded with the local set. From then on every mutation schedules
    /// a push after `quiet_period`. Fetch and seed failures are logged and
    /// leave local state untouched.
    pub async fn attach_remote(&mut self, remote: Arc<dyn RemoteSync>, quiet_period: Duration) {
        self.detach_remote();
        let debouncer = Debouncer::start(remote.clone(), quiet_period);

        match remote.fetch().await {
            Ok(records) if !records.is_empty() => {
                let entries = self.entries_from_remote(records);
                self.apply_entries(entries);
                info!(count = self.entries.len(), "Adopted remote timezone set");
                debouncer.emit(SyncEvent::Adopted {
                    count: self.entries.len(),
                });
            }
            Ok(_) => match remote.push(&self.entries).await {
                Ok(()) => {
                    info!(count = self.entries.len(), "Seeded remote timezone set");
                    debouncer.emit(SyncEvent::Seeded {
                        count: self.entries.len(),
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Seeding remote failed");
                    debouncer.emit(SyncEvent::Failed {
                        message: e.to_string(),
                    });
                }
            },
            Err(e) => {
                warn!(error = %e, "Fetching remote timezones failed");
                debouncer.emit(SyncEvent::Failed {
                    message: e.to_string(),
                });
            }
        }

        self.debouncer = Some(debouncer);
    }

    /// Stop remote sync, discarding any pending push
    pub fn detach_remote(&mut self) {
        if let Some(debouncer) = self.debouncer.take() {
            debug!("Detaching remote");
            debouncer.stop();
        }
    }

    pub fn is_remote_attached(&self) -> bool {
        self.debouncer.is_some()
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.debouncer
            .as_ref()
            .map(Debouncer::status)
            .unwrap_or_default()
    }

    /// Subscribe to sync events; `None` without a remote
    pub fn subscribe_sync(&self) -> Option<broadcast::Receiver<SyncEvent>> {
        self.debouncer.as_ref().map(Debouncer::subscribe)
    }
}
