//! Calendar of special events and the dates they fall on.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::{DayOfWeek, SpecialEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
/// Rule describing which day of a year an event falls on.
pub enum EventDate {
    /// Same month and day every year.
    Fixed {
        /// Month, 1-12.
        month: u32,
        /// Day of month.
        day: u32,
    },
    /// The `nth` given weekday of a month, e.g. the second Sunday in May.
    NthWeekday {
        /// Month, 1-12.
        month: u32,
        /// Weekday to count.
        weekday: DayOfWeek,
        /// Occurrence, starting at 1.
        nth: u8,
    },
}

impl EventDate {
    /// Concrete date in `year`, if the rule produces one.
    #[must_use]
    pub fn in_year(self, year: i32) -> Option<NaiveDate> {
        match self {
            EventDate::Fixed { month, day } => NaiveDate::from_ymd_opt(year, month, day),
            EventDate::NthWeekday {
                month,
                weekday,
                nth,
            } => NaiveDate::from_weekday_of_month_opt(year, month, weekday.into(), nth),
        }
    }

    /// Whether `date` is the event day of its year.
    #[must_use]
    pub fn matches(self, date: NaiveDate) -> bool {
        self.in_year(date.year()) == Some(date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// One event and its date rule.
pub struct CalendarEntry {
    /// Event key.
    pub event: SpecialEvent,
    /// When it happens.
    #[serde(flatten)]
    pub date: EventDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
/// Special events recognised when evaluating a delivery date.
pub struct EventCalendar {
    entries: Vec<CalendarEntry>,
}

impl EventCalendar {
    /// Calendar from explicit entries. Earlier entries win when two match.
    #[must_use]
    pub fn new(entries: Vec<CalendarEntry>) -> Self {
        Self { entries }
    }

    /// Event that falls on `date`, if any.
    #[must_use]
    pub fn event_on(&self, date: NaiveDate) -> Option<SpecialEvent> {
        self.entries
            .iter()
            .find(|entry| entry.date.matches(date))
            .map(|entry| entry.event)
    }

    /// All configured entries.
    #[must_use]
    pub fn entries(&self) -> &[CalendarEntry] {
        &self.entries
    }
}

impl Default for EventCalendar {
    /// Valentine's Day on February 14th, Mother's Day on the second Sunday in May.
    fn default() -> Self {
        Self::new(vec![
            CalendarEntry {
                event: SpecialEvent::ValentinesDay,
                date: EventDate::Fixed { month: 2, day: 14 },
            },
            CalendarEntry {
                event: SpecialEvent::MothersDay,
                date: EventDate::NthWeekday {
                    month: 5,
                    weekday: DayOfWeek::Sunday,
                    nth: 2,
                },
            },
        ])
    }
}
