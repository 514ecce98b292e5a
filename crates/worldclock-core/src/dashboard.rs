//! The mounted timezone view.
//!
//! A `Dashboard` owns everything with a lifetime: the shared time model, the
//! entry controller, the tick task and the remote. `mount()` starts ticking
//! and, when a remote is configured, fetches the remote set and resumes
//! pushing. `unmount()` cancels the tick and any pending remote push; the
//! remote itself is kept for the next mount.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use crate::cities::StaticCityTable;
use crate::clock::{Clock, SystemClock};
use crate::config::{ClockConfig, DEFAULT_SYNC_QUIET_PERIOD};
use crate::controller::TimezoneSetController;
use crate::error::{ClockError, ClockResult};
use crate::storage::Storage;
use crate::sync::{HttpRemote, RemoteSync};
use crate::ticker::Ticker;
use crate::time_model::{detect_local_timezone, SharedTimeModel, TimeModel, ZonedTime};
use crate::types::{EntryId, TimezoneEntry};

/// Everything a card needs to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub id: EntryId,
    pub city: String,
    pub country: String,
    pub timezone: String,
    pub is_home: bool,
    pub is_selected: bool,
    pub can_delete: bool,
    pub time: ZonedTime,
}

impl CardView {
    /// Slider handle position, minutes since local midnight
    pub fn slider_minutes(&self) -> i64 {
        self.time.minutes_of_day()
    }
}

/// Time model plus timezone set, with the tick lifecycle
pub struct Dashboard {
    model: SharedTimeModel,
    controller: TimezoneSetController,
    ticker: Option<Ticker>,
    tick_interval: Duration,
    remote: Option<Arc<dyn RemoteSync>>,
    sync_quiet_period: Duration,
}

impl Dashboard {
    pub fn new(
        controller: TimezoneSetController,
        clock: Arc<dyn Clock>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            model: TimeModel::new(clock).shared(),
            controller,
            ticker: None,
            tick_interval,
            remote: None,
            sync_quiet_period: DEFAULT_SYNC_QUIET_PERIOD,
        }
    }

    /// Sync with `remote` while mounted, pushing after `quiet_period`
    pub fn with_remote(mut self, remote: Arc<dyn RemoteSync>, quiet_period: Duration) -> Self {
        self.remote = Some(remote);
        self.sync_quiet_period = quiet_period;
        self
    }

    /// Open the on-disk set, remembering the remote when one is configured.
    ///
    /// Nothing touches the network until [`mount`](Self::mount).
    pub async fn open(config: &ClockConfig) -> ClockResult<Self> {
        let storage = Storage::open_in(&config.data_dir)?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let mut controller = TimezoneSetController::new(
            Arc::new(storage),
            Arc::new(StaticCityTable::builtin()),
            clock.clone(),
        );
        let home_timezone = config
            .home_timezone
            .clone()
            .unwrap_or_else(detect_local_timezone);
        controller.initialize(&home_timezone);

        let dashboard = Self::new(controller, clock, config.tick_interval);
        match &config.remote {
            Some(remote) => {
                let http = HttpRemote::new(&remote.base_url, remote.token.clone())?;
                info!(endpoint = %http.endpoint(), "Remote sync enabled");
                Ok(dashboard.with_remote(Arc::new(http), config.sync_quiet_period))
            }
            None => Ok(dashboard),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════════

    /// Start ticking and attach the remote; no-op when already mounted.
    ///
    /// With a remote, this fetches once: a non-empty remote set replaces the
    /// local one, an empty one is seeded from it.
    pub async fn mount(&mut self) {
        if self.ticker.is_none() {
            self.model.write().tick();
            self.ticker = Some(Ticker::start(self.model.clone(), self.tick_interval));
        }
        if let Some(remote) = &self.remote {
            if !self.controller.is_remote_attached() {
                self.controller
                    .attach_remote(remote.clone(), self.sync_quiet_period)
                    .await;
            }
        }
    }

    /// Stop ticking and cancel any pending remote push
    pub fn unmount(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
        self.controller.detach_remote();
    }

    pub fn is_mounted(&self) -> bool {
        self.ticker.is_some()
    }

    /// Virtual time after every tick; `None` while unmounted
    pub fn subscribe_ticks(&self) -> Option<watch::Receiver<i64>> {
        self.ticker.as_ref().map(Ticker::subscribe)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Time
    // ═══════════════════════════════════════════════════════════════════════

    pub fn model(&self) -> &SharedTimeModel {
        &self.model
    }

    pub fn base_time(&self) -> i64 {
        self.model.read().base_time()
    }

    pub fn time_offset(&self) -> i64 {
        self.model.read().time_offset()
    }

    /// Drag the slider of one card to `minutes` past its local midnight
    pub fn drag(&mut self, id: &EntryId, minutes: i64) -> ClockResult<bool> {
        let timezone = self
            .controller
            .get(id)
            .map(|e| e.timezone.clone())
            .ok_or_else(|| ClockError::EntryNotFound(id.to_string()))?;
        self.model.write().drag_slider(&timezone, minutes)
    }

    pub fn reset_time(&mut self) {
        self.model.write().reset();
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Entries
    // ═══════════════════════════════════════════════════════════════════════

    pub fn controller(&self) -> &TimezoneSetController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut TimezoneSetController {
        &mut self.controller
    }

    /// Render one card at the current virtual time
    pub fn card(&self, id: &EntryId) -> ClockResult<CardView> {
        let entry = self
            .controller
            .get(id)
            .ok_or_else(|| ClockError::EntryNotFound(id.to_string()))?;
        self.render(entry, self.base_time())
    }

    /// Render every card from one snapshot of the virtual time.
    ///
    /// A card with a corrupt timezone yields an error in its slot; the other
    /// cards still render.
    pub fn cards(&self) -> Vec<ClockResult<CardView>> {
        let base_time = self.base_time();
        self.controller
            .entries()
            .iter()
            .map(|entry| self.render(entry, base_time))
            .collect()
    }

    fn render(&self, entry: &TimezoneEntry, base_time: i64) -> ClockResult<CardView> {
        let time = crate::time_model::project(base_time, &entry.timezone)?;
        Ok(CardView {
            id: entry.id.clone(),
            city: entry.city.clone(),
            country: entry.country.clone(),
            timezone: entry.timezone.clone(),
            is_home: entry.is_home(),
            is_selected: self.controller.is_selected(&entry.id),
            can_delete: self.controller.can_delete(&entry.id),
            time,
        })
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.unmount();
    }
}
