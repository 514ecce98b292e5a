//! World Clock Core Library
//!
//! A shared virtual clock projected across a user-chosen set of timezones.
//!
//! ## Overview
//!
//! Every card on the dashboard renders the same instant, `base_time`, in its
//! own IANA timezone. Dragging one card's 24-hour slider moves `base_time`, so
//! every other card shifts by the same real-world delta. The set of cards is
//! persisted locally on every edit and, for signed-in users, pushed to a sync
//! endpoint once edits go quiet.
//!
//! ## Components
//!
//! - [`TimeModel`]: virtual now, offset from wall-clock, projection, slider math
//! - [`TimezoneSetController`]: ordered entries with stable ids, local and
//!   remote persistence
//! - [`Dashboard`]: owns both plus the tick task, with `mount`/`unmount`
//!
//! ## Quick Start
//!
//! ```ignore
//! use worldclock_core::{CityData, ClockConfig, Dashboard, EntryId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClockConfig::default();
//!     let mut dashboard = Dashboard::open(&config).await?;
//!     dashboard.mount().await;
//!
//!     dashboard
//!         .controller_mut()
//!         .add(CityData::new("Tokyo", "Japan", "Asia/Tokyo"))?;
//!
//!     // What time is it everywhere when it's 15:00 at home?
//!     dashboard.drag(&EntryId::home(), 15 * 60)?;
//!     for card in dashboard.cards() {
//!         let card = card?;
//!         println!("{:<12} {}", card.city, card.time.hh_mm());
//!     }
//!
//!     dashboard.unmount();
//!     Ok(())
//! }
//! ```

pub mod cities;
pub mod clock;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod error;
pub mod storage;
pub mod sync;
pub mod testing;
pub mod ticker;
pub mod time_model;
pub mod types;

// Re-exports
pub use cities::{fallback_city_label, CityLookup, StaticCityTable};
pub use clock::{Clock, SystemClock};
pub use config::{ClockConfig, RemoteConfig};
pub use controller::TimezoneSetController;
pub use dashboard::{CardView, Dashboard};
pub use error::{ClockError, ClockResult};
pub use storage::{LocalStore, MemoryStore, Storage};
pub use sync::{
    Debouncer, HttpRemote, PushResponse, RemoteSync, SyncEvent, SyncStatus, SYNC_PATH,
};
pub use ticker::Ticker;
pub use time_model::{
    detect_local_timezone, parse_timezone, project, SharedTimeModel, TimeModel, ZonedTime,
    MINUTES_PER_DAY,
};
pub use types::*;
