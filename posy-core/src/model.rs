//! Domain data structures for florists, delivery schedules, and eligibility results.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

const MINUTES_PER_DAY: u16 = 24 * 60;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
/// Malformed values rejected at the parsing boundary.
pub enum InvalidInput {
    /// Latitude is not finite or outside `-90..=90`.
    #[error("Latitude out of range: {0}")]
    Latitude(f64),
    /// Longitude is not finite or outside `-180..=180`.
    #[error("Longitude out of range: {0}")]
    Longitude(f64),
    /// Time string is not a zero-padded 24-hour `HH:MM`.
    #[error("Invalid time {0:?}, expected HH:MM")]
    Time(String),
    /// Delivery radius is negative or not finite.
    #[error("Invalid delivery radius: {0}")]
    Radius(f64),
    /// Slot ends before it starts.
    #[error("Slot {0:?} ends before it starts")]
    SlotRange(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
/// WGS84 coordinate in degrees. Always finite and in range.
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    lat: f64,
    lng: f64,
}

impl Coordinate {
    /// Build a validated coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput`] when either component is NaN, infinite, or out of range.
    pub fn new(lat: f64, lng: f64) -> Result<Self, InvalidInput> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(InvalidInput::Latitude(lat));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(InvalidInput::Longitude(lng));
        }
        Ok(Self { lat, lng })
    }

    /// Latitude in degrees.
    #[must_use]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    #[must_use]
    pub fn lng(&self) -> f64 {
        self.lng
    }
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = InvalidInput;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::new(raw.lat, raw.lng)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{},{}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
/// Wall-clock time of day with minute precision, written as `HH:MM`.
pub struct TimeOfDay {
    minutes: u16,
}

impl TimeOfDay {
    /// Parse a zero-padded 24-hour `HH:MM` string.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput::Time`] for anything else, including `9:00` and `24:00`.
    pub fn parse(raw: &str) -> Result<Self, InvalidInput> {
        let invalid = || InvalidInput::Time(raw.to_owned());

        let (hours, minutes) = raw.split_once(':').ok_or_else(invalid)?;
        let two_digits =
            |part: &str| part.len() == 2 && part.bytes().all(|byte| byte.is_ascii_digit());
        if !two_digits(hours) || !two_digits(minutes) {
            return Err(invalid());
        }

        let hours: u16 = hours.parse().map_err(|_| invalid())?;
        let minutes: u16 = minutes.parse().map_err(|_| invalid())?;
        if hours >= 24 || minutes >= 60 {
            return Err(invalid());
        }

        Ok(Self {
            minutes: hours * 60 + minutes,
        })
    }

    /// Minutes since midnight (`hours * 60 + minutes`).
    #[must_use]
    pub fn minutes(self) -> u16 {
        self.minutes
    }

    /// Same instant as a [`NaiveTime`] with zero seconds.
    #[must_use]
    pub fn as_naive_time(self) -> NaiveTime {
        NaiveTime::from_num_seconds_from_midnight_opt(u32::from(self.minutes) * 60, 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

impl From<NaiveTime> for TimeOfDay {
    /// Truncates seconds.
    fn from(time: NaiveTime) -> Self {
        // hour() < 24 and minute() < 60, so the product always fits.
        let minutes = time.hour() * 60 + time.minute();
        Self {
            minutes: u16::try_from(minutes).unwrap_or(MINUTES_PER_DAY - 1),
        }
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = InvalidInput;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<TimeOfDay> for String {
    fn from(time: TimeOfDay) -> Self {
        time.to_string()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:02}:{:02}", self.minutes / 60, self.minutes % 60)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Day of the week used as a key for hours and cutoff overrides.
pub enum DayOfWeek {
    /// Monday.
    Monday,
    /// Tuesday.
    Tuesday,
    /// Wednesday.
    Wednesday,
    /// Thursday.
    Thursday,
    /// Friday.
    Friday,
    /// Saturday.
    Saturday,
    /// Sunday.
    Sunday,
}

impl DayOfWeek {
    /// Saturday and Sunday use the weekend slot set.
    #[must_use]
    pub fn is_weekend(self) -> bool {
        matches!(self, DayOfWeek::Saturday | DayOfWeek::Sunday)
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl From<DayOfWeek> for Weekday {
    fn from(day: DayOfWeek) -> Self {
        match day {
            DayOfWeek::Monday => Weekday::Mon,
            DayOfWeek::Tuesday => Weekday::Tue,
            DayOfWeek::Wednesday => Weekday::Wed,
            DayOfWeek::Thursday => Weekday::Thu,
            DayOfWeek::Friday => Weekday::Fri,
            DayOfWeek::Saturday => Weekday::Sat,
            DayOfWeek::Sunday => Weekday::Sun,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        };
        write!(formatter, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Calendar events with their own delivery rules.
pub enum SpecialEvent {
    /// February 14th.
    ValentinesDay,
    /// Mother's Day.
    MothersDay,
}

impl fmt::Display for SpecialEvent {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            SpecialEvent::ValentinesDay => "valentines_day",
            SpecialEvent::MothersDay => "mothers_day",
        };
        write!(formatter, "{key}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Opaque identifier for a florist.
pub struct FloristId(pub String);

impl fmt::Display for FloristId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
/// Opening hours for a single day.
pub struct DayHours {
    /// Opening time.
    pub open: TimeOfDay,
    /// Closing time.
    pub close: TimeOfDay,
    /// Whether the shop is closed all day.
    #[serde(default)]
    pub closed: bool,
}

/// Opening hours keyed by day. A missing day counts as open.
pub type BusinessHours = BTreeMap<DayOfWeek, DayHours>;

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Order cutoff with optional per-day overrides.
///
/// Serialized as `{ "default": "14:00", "friday": "12:00", "sunday": null }`.
pub struct CutoffSchedule {
    /// Cutoff used when a day has no override.
    pub default: TimeOfDay,
    /// Per-day overrides; `None` falls back to `default`.
    #[serde(flatten)]
    pub overrides: BTreeMap<DayOfWeek, Option<TimeOfDay>>,
}

impl CutoffSchedule {
    /// Cutoff that applies on `day`.
    #[must_use]
    pub fn for_day(&self, day: DayOfWeek) -> TimeOfDay {
        self.overrides
            .get(&day)
            .copied()
            .flatten()
            .unwrap_or(self.default)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Per-florist rules for a special event.
pub struct SpecialEventRules {
    /// Whether the florist accepts orders for the event at all.
    pub enabled: bool,
    /// Latest time on the event date at which orders are taken.
    pub cutoff_time: TimeOfDay,
    /// Multiplier applied to the normal delivery fee.
    pub delivery_fee_multiplier: f64,
    /// Multiplier applied to the normal minimum order value.
    pub minimum_order_multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Named delivery window.
pub struct Slot {
    /// Display name such as "Morning".
    pub name: String,
    /// Window start (inclusive).
    pub start: TimeOfDay,
    /// Window end (inclusive).
    pub end: TimeOfDay,
    /// Disabled slots are never offered.
    pub enabled: bool,
    /// Order capacity; zero means unlimited.
    #[serde(default)]
    pub max_orders: u32,
    /// Surcharge for choosing this slot.
    #[serde(default)]
    pub premium_fee: f64,
}

impl Slot {
    /// Both bounds are inclusive.
    #[must_use]
    pub fn contains(&self, time: TimeOfDay) -> bool {
        self.start <= time && time <= self.end
    }

    /// Human-readable range, e.g. `09:00-12:00`.
    #[must_use]
    pub fn range_label(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }

    /// Whether `booked` orders exhaust this slot.
    #[must_use]
    pub fn is_full(&self, booked: u32) -> bool {
        self.max_orders > 0 && booked >= self.max_orders
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Slot sets for normal days and special events.
pub struct DeliverySlots {
    /// Monday to Friday.
    #[serde(default)]
    pub weekdays: Vec<Slot>,
    /// Saturday and Sunday.
    #[serde(default)]
    pub weekends: Vec<Slot>,
    /// Replacement slot sets for special events.
    #[serde(default)]
    pub special_events: BTreeMap<SpecialEvent, Vec<Slot>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Delivery configuration for one florist, as read from the catalog.
pub struct FloristDeliveryProfile {
    /// Florist identifier.
    pub id: FloristId,
    /// Shop name.
    #[serde(default)]
    pub name: String,
    /// Fulfillment origin.
    pub coordinates: Coordinate,
    /// Maximum service distance in kilometres.
    pub delivery_radius_km: f64,
    /// Weekly opening hours.
    #[serde(default)]
    pub business_hours: BusinessHours,
    /// Cutoff for same-day orders.
    pub same_day_cutoff: CutoffSchedule,
    /// Whether `next_day_cutoff` is enforced.
    #[serde(default)]
    pub next_day_cutoff_enabled: bool,
    /// Cutoff (today) for next-day orders.
    #[serde(default)]
    pub next_day_cutoff: Option<CutoffSchedule>,
    /// Per-event rules.
    #[serde(default)]
    pub special_events: BTreeMap<SpecialEvent, SpecialEventRules>,
    /// Delivery windows.
    #[serde(default)]
    pub delivery_slots: DeliverySlots,
}

impl FloristDeliveryProfile {
    /// Check the invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput`] for a negative radius or an inverted slot.
    pub fn validate(&self) -> Result<(), InvalidInput> {
        if !self.delivery_radius_km.is_finite() || self.delivery_radius_km < 0.0 {
            return Err(InvalidInput::Radius(self.delivery_radius_km));
        }

        let slots = &self.delivery_slots;
        let all_slots = slots
            .weekdays
            .iter()
            .chain(&slots.weekends)
            .chain(slots.special_events.values().flatten());
        for slot in all_slots {
            if slot.end < slot.start {
                return Err(InvalidInput::SlotRange(slot.name.clone()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Where a travel distance came from.
pub enum DistanceSource {
    /// Live routing call.
    Measured,
    /// Straight-line estimate after the routing call failed.
    Estimated,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Driving distance and duration between two points.
pub struct TravelEstimate {
    /// Distance in kilometres.
    pub distance_km: f64,
    /// Duration in whole minutes.
    pub duration_min: u32,
    /// Measured or estimated.
    pub source: DistanceSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Provider identifier for an autocomplete candidate.
pub struct CandidateId(pub String);

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Autocomplete suggestion returned by an address search.
pub struct AddressCandidate {
    /// Identifier used to resolve the candidate.
    pub id: CandidateId,
    /// Full one-line description.
    pub description: String,
    /// Primary text, usually street and number.
    pub main_text: String,
    /// Secondary text, usually suburb and state.
    pub secondary_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Structured address with its coordinate. Missing parts stay `None`.
pub struct ResolvedAddress {
    /// Candidate this address was resolved from.
    pub candidate_id: CandidateId,
    /// Provider formatted address.
    pub formatted: String,
    /// Location of the address.
    pub coordinate: Coordinate,
    /// Street number.
    pub street_number: Option<String>,
    /// Street name.
    pub street_name: Option<String>,
    /// Suburb or locality.
    pub locality: Option<String>,
    /// State or region.
    pub region: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// Country.
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
/// Outcome of a delivery check. Built once per evaluation.
pub struct DeliveryEligibility {
    /// Whether the florist can deliver.
    pub can_deliver: bool,
    /// Why delivery is not possible, or context for the decision.
    pub reason: Option<String>,
    /// Distance used for the radius decision.
    pub estimated_distance_km: Option<f64>,
    /// Open slot ranges such as `09:00-12:00`.
    pub available_slots: Vec<String>,
    /// Name of the slot containing the requested time.
    pub matched_slot: Option<String>,
    /// Surcharge of the matched slot.
    pub premium_fee: Option<f64>,
    /// Special event whose rules applied.
    pub event: Option<SpecialEvent>,
    /// Event delivery fee multiplier.
    pub delivery_fee_multiplier: Option<f64>,
    /// Event minimum order multiplier.
    pub minimum_order_multiplier: Option<f64>,
}

impl DeliveryEligibility {
    /// Negative result with a reason.
    #[must_use]
    pub fn denied(reason: impl Into<String>, distance_km: f64) -> Self {
        Self {
            can_deliver: false,
            reason: Some(reason.into()),
            estimated_distance_km: Some(distance_km),
            ..Self::default()
        }
    }

    /// Positive result.
    #[must_use]
    pub fn accepted(distance_km: f64) -> Self {
        Self {
            can_deliver: true,
            estimated_distance_km: Some(distance_km),
            ..Self::default()
        }
    }
}
