//! Text rendering of dashboard cards

use anyhow::{bail, Result};
use worldclock_core::{CardView, CityData, MINUTES_PER_DAY};

/// One card per line:
/// `* Dhaka, Bangladesh   03:00:00 PM  GMT+06:00  Jan 15  [local] (home)`
pub fn card_line(card: &CardView) -> String {
    let marker = if card.is_selected { '*' } else { ' ' };
    let place = if card.country.is_empty() {
        card.city.clone()
    } else {
        format!("{}, {}", card.city, card.country)
    };
    let mut line = format!(
        "{} {:<28} {} {}  GMT{}  {}  [{}]",
        marker,
        place,
        card.time.clock_label(),
        card.time.meridiem(),
        card.time.offset_label(),
        card.time.date_label(),
        card.id,
    );
    if card.is_home {
        line.push_str(" (home)");
    }
    line
}

pub fn city_line(city: &CityData) -> String {
    if city.country.is_empty() {
        format!("  {:<20} {}", city.city, city.timezone)
    } else {
        format!("  {:<20} {:<20} {}", city.city, city.country, city.timezone)
    }
}

/// Human form of the virtual time offset, e.g. `+3h 00m`
pub fn offset_summary(offset_ms: i64) -> String {
    if offset_ms == 0 {
        return "live".to_string();
    }
    let sign = if offset_ms < 0 { '-' } else { '+' };
    let minutes = offset_ms.unsigned_abs() / 60_000;
    format!("{}{}h {:02}m", sign, minutes / 60, minutes % 60)
}

/// Parse `HH:MM` (24-hour) into minutes past midnight
pub fn parse_hh_mm(s: &str) -> Result<i64> {
    let Some((hours, minutes)) = s.split_once(':') else {
        bail!("Invalid time '{}'. Expected HH:MM", s);
    };
    let hours: i64 = hours
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid hour in '{}'", s))?;
    let minutes: i64 = minutes
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid minute in '{}'", s))?;

    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        bail!("Time '{}' is out of range (00:00 - 23:59)", s);
    }
    let total = hours * 60 + minutes;
    debug_assert!(total < MINUTES_PER_DAY);
    Ok(total)
}
