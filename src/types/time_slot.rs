use serde::{Deserialize, Serialize};
use std::fmt;

/// One weekday, Monday..Friday, matching the fixed five-day academic week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
}

pub const WEEKDAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

impl Weekday {
    pub fn index(&self) -> usize {
        match self {
            Weekday::Mon => 0,
            Weekday::Tue => 1,
            Weekday::Wed => 2,
            Weekday::Thu => 3,
            Weekday::Fri => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A period of the day: a 2-hour block with a start/end minute-of-day and
/// an afternoon flag. The default table is the four standard blocks
/// (09-11, 11-13, 14-16, 16-18).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodDef {
    pub index: u8,
    pub start_minute: u16,
    pub end_minute: u16,
    pub is_afternoon: bool,
}

pub fn default_periods() -> Vec<PeriodDef> {
    vec![
        PeriodDef {
            index: 0,
            start_minute: 9 * 60,
            end_minute: 11 * 60,
            is_afternoon: false,
        },
        PeriodDef {
            index: 1,
            start_minute: 11 * 60,
            end_minute: 13 * 60,
            is_afternoon: false,
        },
        PeriodDef {
            index: 2,
            start_minute: 14 * 60,
            end_minute: 16 * 60,
            is_afternoon: true,
        },
        PeriodDef {
            index: 3,
            start_minute: 16 * 60,
            end_minute: 18 * 60,
            is_afternoon: true,
        },
    ]
}

/// A concrete `(day, period)` slot. Equality and hashing are on `(day, period)`
/// only, matching the source's `TimeSlot.__eq__`/`__hash__` override: two
/// slots with the same day/period index are the same slot even if derived
/// from distinct `PeriodDef` start/end metadata.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeSlot {
    pub day: Weekday,
    pub period: u8,
    pub start_minute: u16,
    pub end_minute: u16,
    pub is_afternoon: bool,
}

impl TimeSlot {
    pub fn key(&self) -> (Weekday, u8) {
        (self.day, self.period)
    }

    pub fn overlaps(&self, start_minute: u16, end_minute: u16) -> bool {
        self.start_minute < end_minute && self.end_minute > start_minute
    }
}

impl PartialEq for TimeSlot {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}
impl Eq for TimeSlot {}

impl std::hash::Hash for TimeSlot {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} P{}", self.day, self.period + 1)
    }
}

/// Builds the full set of `(day, period)` slots from a period table.
pub fn all_time_slots(periods: &[PeriodDef]) -> Vec<TimeSlot> {
    let mut slots = Vec::with_capacity(WEEKDAYS.len() * periods.len());
    for day in WEEKDAYS {
        for p in periods {
            slots.push(TimeSlot {
                day,
                period: p.index,
                start_minute: p.start_minute,
                end_minute: p.end_minute,
                is_afternoon: p.is_afternoon,
            });
        }
    }
    slots
}

/// A single available-time range for a part-time lecturer on a given day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AvailabilityRange {
    pub day: Weekday,
    pub start_minute: u16,
    pub end_minute: u16,
}
