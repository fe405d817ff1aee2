use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use log::{debug, warn};
use std::collections::HashSet;

use crate::models::Payout;

pub const DEFAULT_RECENT_MINUTES: i64 = 5;

/// Formats carrying an explicit offset. `%#z` accepts `+03`, `+0300` and `+03:00`.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f %#z",
];

/// Formats without an offset, read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%d.%m.%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M",
];

/// Date-only formats, read as midnight UTC.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];

/// Zone names that mean UTC when trailing a timestamp.
const UTC_ZONE_NAMES: &[&str] = &["UTC", "GMT", "Z"];

/// Parse a backend timestamp leniently and normalize it to UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(local) = strip_utc_zone_name(raw) {
        return parse_timestamp(local);
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `"2025-10-18 15:56:16 UTC"` -> `Some("2025-10-18 15:56:16")`.
fn strip_utc_zone_name(raw: &str) -> Option<&str> {
    let (rest, zone) = raw.rsplit_once(' ')?;
    let rest = rest.trim_end();
    let is_utc = UTC_ZONE_NAMES
        .iter()
        .any(|name| zone.eq_ignore_ascii_case(name));
    (is_utc && !rest.is_empty()).then_some(rest)
}

/// Picks the payouts worth surfacing out of a backend snapshot.
#[derive(Debug, Clone)]
pub struct IntakeFilter {
    recent_window: Duration,
}

impl Default for IntakeFilter {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_RECENT_MINUTES))
    }
}

impl IntakeFilter {
    pub fn new(recent_window: Duration) -> Self {
        Self { recent_window }
    }

    /// Payouts that are unprocessed, created within the recency window and
    /// larger than at least one comparable pending amount, in source order.
    ///
    /// Returns nothing when no pending amount is comparable.
    pub fn select_new_high_value(
        &self,
        all_payouts: &[Payout],
        pending_payouts: &[Payout],
        processed: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> Vec<Payout> {
        let pending_amounts: Vec<f64> = pending_payouts
            .iter()
            .filter_map(Payout::amount_value)
            .collect();
        if pending_amounts.is_empty() {
            debug!("Pending payouts contain no comparable amounts");
            return Vec::new();
        }

        let cutoff = now - self.recent_window;
        let mut seen = HashSet::new();
        let mut selected = Vec::new();

        for payout in all_payouts {
            if payout.uuid.is_empty() || processed.contains(&payout.uuid) {
                continue;
            }
            if !seen.insert(payout.uuid.as_str()) {
                continue;
            }

            let Some(amount) = payout.amount_value() else {
                warn!(
                    "Skipping payout {}: unparsable amount {}",
                    payout.uuid, payout.amount
                );
                continue;
            };
            if !pending_amounts.iter().any(|pending| amount > *pending) {
                continue;
            }

            let Some(created) = parse_timestamp(&payout.creation_time) else {
                warn!(
                    "Error parsing payout time: {} - {}",
                    payout.uuid, payout.creation_time
                );
                continue;
            };
            if created < cutoff {
                debug!("Skipping stale payout {} created at {}", payout.uuid, created);
                continue;
            }

            selected.push(payout.clone());
        }

        selected
    }
}
