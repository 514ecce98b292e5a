//! Shared virtual clock.
//!
//! Every card renders from one `base_time`. Dragging any card's slider moves
//! `base_time` by a whole number of minutes, so all cards shift by the same
//! real-world delta and the differences between zones stay correct.
//!
//! ```text
//! base_time = clock.now_ms() + time_offset
//!
//!   drag card A to M minutes:
//!     current = project(base_time, A).minutes_of_day()
//!     delta   = M - current            (0 => no-op)
//!     set_absolute_time(base_time + delta * 60_000)
//! ```

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Offset, Timelike, Utc};
use chrono_tz::Tz;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::error::{ClockError, ClockResult};

/// Number of slider positions (minutes in a day)
pub const MINUTES_PER_DAY: i64 = 24 * 60;

const MS_PER_MINUTE: i64 = 60_000;

/// Time model shared between the ticker task and the views
pub type SharedTimeModel = Arc<RwLock<TimeModel>>;

/// Resolve an IANA identifier against the timezone database
pub fn parse_timezone(timezone: &str) -> ClockResult<Tz> {
    timezone
        .parse::<Tz>()
        .map_err(|_| ClockError::InvalidTimezone(timezone.to_string()))
}

/// The viewer's IANA zone as reported by the host, or `UTC`
///
/// Zones the timezone database does not know also fall back to `UTC`, so the
/// home entry always projects.
pub fn detect_local_timezone() -> String {
    match iana_time_zone::get_timezone() {
        Ok(tz) if parse_timezone(&tz).is_ok() => tz,
        Ok(tz) => {
            warn!(timezone = %tz, "Host timezone not in database, using UTC");
            "UTC".to_string()
        }
        Err(e) => {
            warn!(error = %e, "Could not detect host timezone, using UTC");
            "UTC".to_string()
        }
    }
}

/// Wall-clock fields of an instant as observed in one timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZonedTime {
    /// The projected instant (epoch ms)
    pub instant_ms: i64,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    /// Seconds east of UTC in effect at this instant
    pub utc_offset_seconds: i32,
    pub date: NaiveDate,
}

impl ZonedTime {
    /// Slider position for this time
    pub fn minutes_of_day(&self) -> i64 {
        i64::from(self.hour) * 60 + i64::from(self.minute)
    }

    /// UTC offset as `+06:00` / `-04:00`
    pub fn offset_label(&self) -> String {
        let sign = if self.utc_offset_seconds < 0 { '-' } else { '+' };
        let abs = self.utc_offset_seconds.unsigned_abs();
        format!("{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
    }

    /// 12-hour clock face, `hh:mm:ss`
    pub fn clock_label(&self) -> String {
        let hour = match self.hour % 12 {
            0 => 12,
            h => h,
        };
        format!("{:02}:{:02}:{:02}", hour, self.minute, self.second)
    }

    /// 24-hour `HH:MM`
    pub fn hh_mm(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }

    pub fn meridiem(&self) -> &'static str {
        if self.hour < 12 {
            "AM"
        } else {
            "PM"
        }
    }

    /// Short date, `Oct 19`
    pub fn date_label(&self) -> String {
        self.date.format("%b %d").to_string()
    }
}

/// Project an instant into the given IANA timezone.
///
/// Fails with [`ClockError::InvalidTimezone`] when the identifier is unknown;
/// there is no UTC fallback. DST rules come from the timezone database.
pub fn project(instant_ms: i64, timezone: &str) -> ClockResult<ZonedTime> {
    let tz = parse_timezone(timezone)?;
    let utc = DateTime::<Utc>::from_timestamp_millis(instant_ms).ok_or_else(|| {
        ClockError::InvalidOperation(format!("instant {} is out of range", instant_ms))
    })?;
    let local = utc.with_timezone(&tz);

    Ok(ZonedTime {
        instant_ms,
        hour: local.hour(),
        minute: local.minute(),
        second: local.second(),
        utc_offset_seconds: local.offset().fix().local_minus_utc(),
        date: local.date_naive(),
    })
}

/// The shared virtual "now"
pub struct TimeModel {
    clock: Arc<dyn Clock>,
    base_time: i64,
    time_offset: i64,
}

impl TimeModel {
    /// Create a model tracking wall-clock time (zero offset)
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let base_time = clock.now_ms();
        Self {
            clock,
            base_time,
            time_offset: 0,
        }
    }

    /// Wrap into the shared handle used by the ticker
    pub fn shared(self) -> SharedTimeModel {
        Arc::new(RwLock::new(self))
    }

    /// Current virtual instant (epoch ms)
    pub fn base_time(&self) -> i64 {
        self.base_time
    }

    /// Signed distance from wall-clock time in ms
    pub fn time_offset(&self) -> i64 {
        self.time_offset
    }

    pub fn is_adjusted(&self) -> bool {
        self.time_offset != 0
    }

    /// Advance `base_time` to `now + time_offset`
    pub fn tick(&mut self) {
        self.base_time = self.clock.now_ms() + self.time_offset;
    }

    /// Make `new_base_time` the virtual now and keep it moving with the clock
    pub fn set_absolute_time(&mut self, new_base_time: i64) {
        self.time_offset = new_base_time - self.clock.now_ms();
        self.base_time = new_base_time;
        debug!(offset_ms = self.time_offset, "Virtual time adjusted");
    }

    /// Jump back to real time
    pub fn reset(&mut self) {
        self.time_offset = 0;
        self.base_time = self.clock.now_ms();
        debug!("Virtual time reset");
    }

    /// Project the current virtual instant into a timezone
    pub fn project(&self, timezone: &str) -> ClockResult<ZonedTime> {
        project(self.base_time, timezone)
    }

    /// Slider position of a card showing `timezone`
    pub fn slider_minutes(&self, timezone: &str) -> ClockResult<i64> {
        Ok(self.project(timezone)?.minutes_of_day())
    }

    /// Move the slider of a card showing `timezone` to `new_minutes`.
    ///
    /// Returns `Ok(false)` without touching the model when the slider is
    /// already in that minute bucket. Across a DST transition in `timezone`
    /// the resulting wall clock can differ from `new_minutes` by the size of
    /// the transition.
    pub fn drag_slider(&mut self, timezone: &str, new_minutes: i64) -> ClockResult<bool> {
        if !(0..MINUTES_PER_DAY).contains(&new_minutes) {
            return Err(ClockError::SliderOutOfRange(new_minutes));
        }

        let current = self.slider_minutes(timezone)?;
        let delta_minutes = new_minutes - current;
        if delta_minutes == 0 {
            return Ok(false);
        }

        self.set_absolute_time(self.base_time + delta_minutes * MS_PER_MINUTE);
        Ok(true)
    }
}

impl std::fmt::Debug for TimeModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeModel")
            .field("base_time", &self.base_time)
            .field("time_offset", &self.time_offset)
            .finish()
    }
}
