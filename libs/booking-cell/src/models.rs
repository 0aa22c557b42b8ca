use std::collections::BTreeMap;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// The seven fixed day identifiers a weekly schedule is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayKey {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl DayKey {
    pub const ALL: [DayKey; 7] = [
        DayKey::Sun,
        DayKey::Mon,
        DayKey::Tue,
        DayKey::Wed,
        DayKey::Thu,
        DayKey::Fri,
        DayKey::Sat,
    ];

    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sun => DayKey::Sun,
            Weekday::Mon => DayKey::Mon,
            Weekday::Tue => DayKey::Tue,
            Weekday::Wed => DayKey::Wed,
            Weekday::Thu => DayKey::Thu,
            Weekday::Fri => DayKey::Fri,
            Weekday::Sat => DayKey::Sat,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DayKey::Sun => "Sunday",
            DayKey::Mon => "Monday",
            DayKey::Tue => "Tuesday",
            DayKey::Wed => "Wednesday",
            DayKey::Thu => "Thursday",
            DayKey::Fri => "Friday",
            DayKey::Sat => "Saturday",
        }
    }
}

/// A working window within one day, as 12-hour clock display strings
/// (e.g. "09:00 AM"). Malformed strings contribute no slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub active: bool,
    #[serde(default)]
    pub slots: Vec<TimeRange>,
}

/// Days absent from the map are treated as inactive.
pub type WeeklySchedule = BTreeMap<DayKey, DaySchedule>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotQuery {
    pub target_date: NaiveDate,
    pub schedule: WeeklySchedule,
}

/// A bookable 30-minute slot start, as a 12-hour display string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookableSlot(pub String);

impl BookableSlot {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
