use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use tracing::debug;

use crate::models::{BookableSlot, DayKey, SlotQuery};

pub const SLOT_LENGTH_MINUTES: u32 = 30;
pub const MAX_SLOTS_PER_DAY: usize = 12;

/// No slot may start within this hour, regardless of the schedule ranges.
const LUNCH_HOUR: u32 = 12;

/// Compute the ordered bookable slots for a single date.
///
/// Pure and idempotent: identical `(date, schedule)` input always yields the
/// identical slot list. Malformed time strings degrade to "that range
/// contributes nothing" rather than failing the whole computation.
pub fn compute_slots(query: &SlotQuery, cutoff: NaiveDate) -> Vec<BookableSlot> {
    // Cutoff comparison is by calendar date only.
    if query.target_date < cutoff {
        debug!(
            "Target date {} precedes booking cutoff {}, no slots",
            query.target_date, cutoff
        );
        return Vec::new();
    }

    let day_key = DayKey::from_weekday(query.target_date.weekday());
    let Some(day) = query.schedule.get(&day_key) else {
        return Vec::new();
    };
    if !day.active || day.slots.is_empty() {
        return Vec::new();
    }

    let day_of_month = query.target_date.day();

    // Overlapping ranges union: the set dedupes repeated boundaries and keeps
    // the overall output chronological no matter the range order.
    let mut kept: BTreeSet<u32> = BTreeSet::new();

    for range in &day.slots {
        let (Some(start), Some(end)) =
            (parse_display_time(&range.start), parse_display_time(&range.end))
        else {
            debug!("Skipping unparseable range {} - {}", range.start, range.end);
            continue;
        };

        // First clock-aligned 30-minute boundary at or after the range start.
        let first = start.div_ceil(SLOT_LENGTH_MINUTES) * SLOT_LENGTH_MINUTES;

        let mut idx: u32 = 0;
        let mut t = first;
        while t + SLOT_LENGTH_MINUTES <= end {
            // idx counts every enumerated boundary, including lunch-hour ones.
            if t / 60 != LUNCH_HOUR && slot_is_open(day_of_month, idx) {
                kept.insert(t);
            }
            idx += 1;
            t += SLOT_LENGTH_MINUTES;
        }
    }

    kept.into_iter()
        .take(MAX_SLOTS_PER_DAY)
        .map(|minutes| BookableSlot(format_display_time(minutes)))
        .collect()
}

/// Deterministic pseudo-occupancy filter: roughly 40% of candidate slots read
/// as already booked, reproducibly per day-of-month.
fn slot_is_open(day_of_month: u32, idx: u32) -> bool {
    let pseudo = (day_of_month * 13 + idx * 7) % 10;
    pseudo < 3 || pseudo > 7
}

/// Parse a 12-hour display string ("09:00 AM") into minutes since midnight.
fn parse_display_time(raw: &str) -> Option<u32> {
    NaiveTime::parse_from_str(raw.trim(), "%I:%M %p")
        .ok()
        .map(|t| t.hour() * 60 + t.minute())
}

fn format_display_time(minutes: u32) -> String {
    let hour = minutes / 60;
    let minute = minutes % 60;
    let period = if hour < 12 { "AM" } else { "PM" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{:02}:{:02} {}", display_hour, minute, period)
}
