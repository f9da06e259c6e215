//! Cutoff and delivery-slot evaluation for a single florist and date.
//!
//! [`evaluate_delivery`] is a pure decision over its inputs. The current time is
//! passed in, never read from the clock, and every reason a florist cannot
//! deliver comes back as a [`DeliveryEligibility`] with `can_deliver == false`.
//!
//! Checks run in this order and the first terminal one wins:
//!
//! 1. radius
//! 2. past date
//! 3. weekly closure
//! 4. special event (replaces 5-7 entirely when the florist configures the event)
//! 5. same-day cutoff
//! 6. next-day cutoff
//! 7. slot resolution

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::events::EventCalendar;
use crate::model::{
    DayOfWeek, DeliveryEligibility, FloristDeliveryProfile, Slot, SpecialEvent,
    SpecialEventRules, TimeOfDay,
};

#[derive(Debug, Clone)]
/// Date and optional time a customer wants flowers delivered.
pub struct DeliveryRequest {
    /// Requested delivery date.
    pub date: NaiveDate,
    /// Requested time; `None` browses all open slots.
    pub time: Option<TimeOfDay>,
    /// Orders already booked per slot name on `date`.
    pub booked_orders: HashMap<String, u32>,
}

impl DeliveryRequest {
    /// Request for any slot on `date`.
    #[must_use]
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date,
            time: None,
            booked_orders: HashMap::new(),
        }
    }

    /// Narrow the request to a specific time.
    #[must_use]
    pub fn at(mut self, time: TimeOfDay) -> Self {
        self.time = Some(time);
        self
    }

    /// Attach booked order counts for capacity checks.
    #[must_use]
    pub fn with_bookings(mut self, booked_orders: HashMap<String, u32>) -> Self {
        self.booked_orders = booked_orders;
        self
    }

    fn booked(&self, slot: &Slot) -> u32 {
        self.booked_orders.get(&slot.name).copied().unwrap_or(0)
    }
}

/// Decide whether `profile` can deliver `request` given the florist's distance
/// to the customer and the current local time.
#[must_use]
pub fn evaluate_delivery(
    profile: &FloristDeliveryProfile,
    request: &DeliveryRequest,
    distance_km: f64,
    now: NaiveDateTime,
    calendar: &EventCalendar,
) -> DeliveryEligibility {
    let deny = |reason: String| {
        debug!(florist = %profile.id, date = %request.date, %reason, "delivery denied");
        DeliveryEligibility::denied(reason, distance_km)
    };

    // NaN and infinity never count as in range.
    let in_range = distance_km <= profile.delivery_radius_km;
    if !in_range {
        return deny("outside delivery radius".to_owned());
    }

    let today = now.date();
    if request.date < today {
        return deny("selected date is in the past".to_owned());
    }

    let day = DayOfWeek::from(request.date.weekday());
    if profile
        .business_hours
        .get(&day)
        .is_some_and(|hours| hours.closed)
    {
        return deny(format!("closed on {day}"));
    }

    if let Some(event) = calendar.event_on(request.date)
        && let Some(rules) = profile.special_events.get(&event)
    {
        return evaluate_event(profile, request, distance_km, now, event, rules);
    }

    if request.date == today {
        let cutoff = profile.same_day_cutoff.for_day(day);
        if is_past(now, today, cutoff) {
            return deny(format!("same-day delivery cutoff {cutoff} has passed"));
        }
    }

    if today.succ_opt() == Some(request.date)
        && profile.next_day_cutoff_enabled
        && let Some(next_day) = &profile.next_day_cutoff
    {
        let cutoff = next_day.for_day(day);
        if is_past(now, today, cutoff) {
            return deny(format!("next-day delivery cutoff {cutoff} has passed"));
        }
    }

    let slot_set = if day.is_weekend() {
        &profile.delivery_slots.weekends
    } else {
        &profile.delivery_slots.weekdays
    };
    let slots = open_slots(slot_set, request, now);
    if slots.is_empty() {
        return deny("no delivery slots available for the selected date".to_owned());
    }

    match pick_slot(&slots, request, distance_km) {
        Ok(eligibility) => {
            debug!(florist = %profile.id, date = %request.date, "delivery available");
            eligibility
        }
        Err(reason) => deny(reason),
    }
}

/// Special-event rules. Normal cutoffs and slot sets are never consulted here.
fn evaluate_event(
    profile: &FloristDeliveryProfile,
    request: &DeliveryRequest,
    distance_km: f64,
    now: NaiveDateTime,
    event: SpecialEvent,
    rules: &SpecialEventRules,
) -> DeliveryEligibility {
    let deny = |reason: String| {
        debug!(florist = %profile.id, %event, %reason, "event delivery denied");
        DeliveryEligibility::denied(reason, distance_km)
    };

    if !rules.enabled {
        return deny(format!("not accepting orders for {event}"));
    }

    if is_past(now, request.date, rules.cutoff_time) {
        return deny(format!("past cutoff for {event} ({})", rules.cutoff_time));
    }

    let slot_set = profile
        .delivery_slots
        .special_events
        .get(&event)
        .map_or(&[][..], Vec::as_slice);
    let slots = open_slots(slot_set, request, now);
    if slots.is_empty() {
        return deny(format!("no delivery slots available for {event}"));
    }

    match pick_slot(&slots, request, distance_km) {
        Ok(eligibility) => {
            debug!(florist = %profile.id, %event, "event delivery available");
            DeliveryEligibility {
                event: Some(event),
                delivery_fee_multiplier: Some(rules.delivery_fee_multiplier),
                minimum_order_multiplier: Some(rules.minimum_order_multiplier),
                ..eligibility
            }
        }
        Err(reason) => deny(reason),
    }
}

/// Whether `now` is strictly after `cutoff` on `date`.
fn is_past(now: NaiveDateTime, date: NaiveDate, cutoff: TimeOfDay) -> bool {
    now > date.and_time(cutoff.as_naive_time())
}

/// Enabled slots with spare capacity. On the current day, slots that have
/// already started are dropped too.
fn open_slots<'slots>(
    slots: &'slots [Slot],
    request: &DeliveryRequest,
    now: NaiveDateTime,
) -> Vec<&'slots Slot> {
    let same_day = request.date == now.date();
    slots
        .iter()
        .filter(|slot| slot.enabled && !slot.is_full(request.booked(slot)))
        .filter(|slot| !(same_day && is_past(now, request.date, slot.start)))
        .collect()
}

/// Match the requested time against `slots`, or list them all when no time was asked for.
///
/// A slot starting exactly at the requested time beats one ending there; otherwise
/// the earliest-starting containing slot wins.
fn pick_slot(
    slots: &[&Slot],
    request: &DeliveryRequest,
    distance_km: f64,
) -> Result<DeliveryEligibility, String> {
    let available_slots: Vec<String> = slots.iter().map(|slot| slot.range_label()).collect();

    let Some(time) = request.time else {
        return Ok(DeliveryEligibility {
            available_slots,
            ..DeliveryEligibility::accepted(distance_km)
        });
    };

    let matched = slots
        .iter()
        .filter(|slot| slot.contains(time))
        .min_by_key(|slot| (slot.start != time, slot.start));

    match matched {
        Some(slot) => Ok(DeliveryEligibility {
            available_slots,
            matched_slot: Some(slot.name.clone()),
            premium_fee: Some(slot.premium_fee),
            ..DeliveryEligibility::accepted(distance_km)
        }),
        None => Err(format!(
            "requested time {time} is outside available slots: {}",
            available_slots.join(", ")
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::{
        Coordinate, CutoffSchedule, DayHours, DeliverySlots, FloristId, SpecialEventRules,
    };

    fn time(raw: &str) -> TimeOfDay {
        TimeOfDay::parse(raw).expect("valid time")
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn at(day: NaiveDate, raw: &str) -> NaiveDateTime {
        day.and_time(time(raw).as_naive_time())
    }

    fn slot(name: &str, start: &str, end: &str, premium_fee: f64) -> Slot {
        Slot {
            name: name.to_owned(),
            start: time(start),
            end: time(end),
            enabled: true,
            max_orders: 0,
            premium_fee,
        }
    }

    fn profile() -> FloristDeliveryProfile {
        FloristDeliveryProfile {
            id: FloristId("petals".into()),
            name: "Petals".into(),
            coordinates: Coordinate::new(-33.87, 151.21).expect("valid"),
            delivery_radius_km: 10.0,
            business_hours: BTreeMap::new(),
            same_day_cutoff: CutoffSchedule {
                default: time("14:00"),
                overrides: BTreeMap::new(),
            },
            next_day_cutoff_enabled: false,
            next_day_cutoff: None,
            special_events: BTreeMap::new(),
            delivery_slots: DeliverySlots {
                weekdays: vec![
                    slot("Morning", "09:00", "12:00", 0.0),
                    slot("Afternoon", "12:00", "15:00", 5.0),
                    slot("Evening", "15:00", "18:00", 10.0),
                ],
                weekends: vec![slot("Weekend", "10:00", "14:00", 8.0)],
                special_events: BTreeMap::new(),
            },
        }
    }

    fn valentines_rules(enabled: bool) -> SpecialEventRules {
        SpecialEventRules {
            enabled,
            cutoff_time: time("10:00"),
            delivery_fee_multiplier: 1.5,
            minimum_order_multiplier: 2.0,
        }
    }

    fn wednesday() -> NaiveDate {
        date(2026, 10, 14)
    }

    fn evaluate(
        profile: &FloristDeliveryProfile,
        request: &DeliveryRequest,
        now: NaiveDateTime,
    ) -> DeliveryEligibility {
        evaluate_delivery(profile, request, 2.0, now, &EventCalendar::default())
    }

    #[test]
    fn outside_radius_is_denied_first() {
        let result = evaluate_delivery(
            &profile(),
            &DeliveryRequest::on(wednesday()),
            10.5,
            at(wednesday(), "08:00"),
            &EventCalendar::default(),
        );
        assert!(!result.can_deliver);
        assert_eq!(result.reason.as_deref(), Some("outside delivery radius"));
        assert_eq!(result.estimated_distance_km, Some(10.5));
    }

    #[test]
    fn radius_boundary_counts_as_in_range() {
        let result = evaluate_delivery(
            &profile(),
            &DeliveryRequest::on(wednesday().succ_opt().expect("valid")),
            10.0,
            at(wednesday(), "08:00"),
            &EventCalendar::default(),
        );
        assert!(result.can_deliver);
    }

    #[test]
    fn past_dates_are_denied() {
        let result = evaluate(
            &profile(),
            &DeliveryRequest::on(date(2026, 10, 13)),
            at(wednesday(), "08:00"),
        );
        assert_eq!(
            result.reason.as_deref(),
            Some("selected date is in the past")
        );
    }

    #[test]
    fn closed_day_is_denied() {
        let mut florist = profile();
        florist.business_hours.insert(
            DayOfWeek::Wednesday,
            DayHours {
                open: time("09:00"),
                close: time("17:00"),
                closed: true,
            },
        );

        let result = evaluate(
            &florist,
            &DeliveryRequest::on(wednesday()),
            at(wednesday(), "08:00"),
        );
        assert_eq!(result.reason.as_deref(), Some("closed on wednesday"));
    }

    #[test]
    fn same_day_cutoff_boundary() {
        let florist = profile();
        let request = DeliveryRequest::on(wednesday());

        assert!(evaluate(&florist, &request, at(wednesday(), "13:59")).can_deliver);
        assert!(evaluate(&florist, &request, at(wednesday(), "14:00")).can_deliver);

        let late = evaluate(&florist, &request, at(wednesday(), "14:01"));
        assert!(!late.can_deliver);
        assert!(
            late.reason.as_deref().is_some_and(|reason| reason.contains("14:00")),
            "reason was {:?}",
            late.reason
        );
    }

    #[test]
    fn same_day_cutoff_uses_day_override() {
        let mut florist = profile();
        florist
            .same_day_cutoff
            .overrides
            .insert(DayOfWeek::Wednesday, Some(time("11:00")));

        let result = evaluate(
            &florist,
            &DeliveryRequest::on(wednesday()),
            at(wednesday(), "11:30"),
        );
        assert!(!result.can_deliver);
        assert!(result.reason.as_deref().is_some_and(|reason| reason.contains("11:00")));
    }

    #[test]
    fn same_day_drops_started_slots() {
        let result = evaluate(
            &profile(),
            &DeliveryRequest::on(wednesday()),
            at(wednesday(), "12:30"),
        );
        assert!(result.can_deliver);
        assert_eq!(result.available_slots, ["15:00-18:00"]);
    }

    #[test]
    fn slot_starting_now_is_still_open() {
        let result = evaluate(
            &profile(),
            &DeliveryRequest::on(wednesday()),
            at(wednesday(), "12:00"),
        );
        assert_eq!(result.available_slots, ["12:00-15:00", "15:00-18:00"]);
    }

    #[test]
    fn next_day_cutoff_only_when_enabled() {
        let mut florist = profile();
        florist.next_day_cutoff = Some(CutoffSchedule {
            default: time("16:00"),
            overrides: BTreeMap::new(),
        });
        let tomorrow = DeliveryRequest::on(wednesday().succ_opt().expect("valid"));
        let evening = at(wednesday(), "17:00");

        assert!(evaluate(&florist, &tomorrow, evening).can_deliver);

        florist.next_day_cutoff_enabled = true;
        let result = evaluate(&florist, &tomorrow, evening);
        assert!(!result.can_deliver);
        assert!(result.reason.as_deref().is_some_and(|reason| reason.contains("16:00")));
    }

    #[test]
    fn next_day_cutoff_boundary() {
        let mut florist = profile();
        florist.next_day_cutoff_enabled = true;
        florist.next_day_cutoff = Some(CutoffSchedule {
            default: time("16:00"),
            overrides: BTreeMap::new(),
        });
        let tomorrow = DeliveryRequest::on(wednesday().succ_opt().expect("valid"));

        assert!(evaluate(&florist, &tomorrow, at(wednesday(), "16:00")).can_deliver);

        let late = evaluate(&florist, &tomorrow, at(wednesday(), "16:01"));
        assert!(!late.can_deliver);
        assert!(late.reason.as_deref().is_some_and(|reason| reason.contains("next-day")));
    }

    #[test]
    fn weekend_uses_weekend_slots() {
        let saturday = date(2026, 10, 17);
        let result = evaluate(
            &profile(),
            &DeliveryRequest::on(saturday),
            at(wednesday(), "08:00"),
        );
        assert_eq!(result.available_slots, ["10:00-14:00"]);
    }

    #[test]
    fn disabled_and_full_slots_are_skipped() {
        let mut florist = profile();
        if let Some(morning) = florist.delivery_slots.weekdays.first_mut() {
            morning.enabled = false;
        }
        if let Some(afternoon) = florist.delivery_slots.weekdays.get_mut(1) {
            afternoon.max_orders = 3;
        }
        let request = DeliveryRequest::on(date(2026, 10, 15))
            .with_bookings(HashMap::from([("Afternoon".to_owned(), 3)]));

        let result = evaluate(&florist, &request, at(wednesday(), "08:00"));
        assert_eq!(result.available_slots, ["15:00-18:00"]);
    }

    #[test]
    fn no_open_slots_is_denied() {
        let mut florist = profile();
        florist.delivery_slots.weekdays.clear();
        let result = evaluate(
            &florist,
            &DeliveryRequest::on(date(2026, 10, 15)),
            at(wednesday(), "08:00"),
        );
        assert_eq!(
            result.reason.as_deref(),
            Some("no delivery slots available for the selected date")
        );
    }

    #[test]
    fn requested_time_on_shared_boundary_picks_later_slot() {
        let request = DeliveryRequest::on(date(2026, 10, 15)).at(time("12:00"));
        let result = evaluate(&profile(), &request, at(wednesday(), "08:00"));
        assert!(result.can_deliver);
        assert_eq!(result.matched_slot.as_deref(), Some("Afternoon"));
        assert_eq!(result.premium_fee, Some(5.0));
    }

    #[test]
    fn requested_time_at_slot_end_is_contained() {
        let request = DeliveryRequest::on(date(2026, 10, 15)).at(time("18:00"));
        let result = evaluate(&profile(), &request, at(wednesday(), "08:00"));
        assert_eq!(result.matched_slot.as_deref(), Some("Evening"));
    }

    #[test]
    fn requested_time_outside_slots_lists_ranges() {
        let request = DeliveryRequest::on(date(2026, 10, 15)).at(time("19:30"));
        let result = evaluate(&profile(), &request, at(wednesday(), "08:00"));
        assert!(!result.can_deliver);
        let reason = result.reason.unwrap_or_default();
        assert!(reason.contains("19:30"));
        assert!(reason.contains("09:00-12:00, 12:00-15:00, 15:00-18:00"));
    }

    #[test]
    fn disabled_valentines_day_overrides_normal_rules() {
        let valentines = date(2027, 2, 14);
        let mut florist = profile();
        florist
            .special_events
            .insert(SpecialEvent::ValentinesDay, valentines_rules(false));
        // Normal rules alone would allow this.
        florist.same_day_cutoff.default = time("23:59");

        let result = evaluate(
            &florist,
            &DeliveryRequest::on(valentines),
            at(date(2027, 2, 1), "08:00"),
        );
        assert!(!result.can_deliver);
        assert!(
            result
                .reason
                .as_deref()
                .is_some_and(|reason| reason.contains("valentines_day"))
        );
    }

    #[test]
    fn special_event_uses_its_own_slots_and_fees() {
        let valentines = date(2027, 2, 14);
        let mut florist = profile();
        florist
            .special_events
            .insert(SpecialEvent::ValentinesDay, valentines_rules(true));
        florist.delivery_slots.special_events.insert(
            SpecialEvent::ValentinesDay,
            vec![slot("Sweetheart", "08:00", "20:00", 15.0)],
        );

        let result = evaluate(
            &florist,
            &DeliveryRequest::on(valentines).at(time("19:00")),
            at(date(2027, 2, 13), "18:00"),
        );
        assert!(result.can_deliver);
        assert_eq!(result.event, Some(SpecialEvent::ValentinesDay));
        assert_eq!(result.matched_slot.as_deref(), Some("Sweetheart"));
        assert_eq!(result.premium_fee, Some(15.0));
        assert_eq!(result.delivery_fee_multiplier, Some(1.5));
        assert_eq!(result.minimum_order_multiplier, Some(2.0));
    }

    #[test]
    fn special_event_cutoff_is_checked_against_now() {
        let valentines = date(2027, 2, 14);
        let mut florist = profile();
        florist
            .special_events
            .insert(SpecialEvent::ValentinesDay, valentines_rules(true));
        florist.delivery_slots.special_events.insert(
            SpecialEvent::ValentinesDay,
            vec![slot("Sweetheart", "08:00", "20:00", 15.0)],
        );

        let result = evaluate(
            &florist,
            &DeliveryRequest::on(valentines),
            at(valentines, "10:01"),
        );
        assert_eq!(
            result.reason.as_deref(),
            Some("past cutoff for valentines_day (10:00)")
        );
    }

    #[test]
    fn special_event_without_slots_is_denied() {
        let valentines = date(2027, 2, 14);
        let mut florist = profile();
        florist
            .special_events
            .insert(SpecialEvent::ValentinesDay, valentines_rules(true));

        let result = evaluate(
            &florist,
            &DeliveryRequest::on(valentines),
            at(date(2027, 2, 1), "08:00"),
        );
        assert_eq!(
            result.reason.as_deref(),
            Some("no delivery slots available for valentines_day")
        );
    }

    #[test]
    fn unconfigured_event_falls_back_to_normal_rules() {
        // 2027-02-14 is a Sunday.
        let result = evaluate(
            &profile(),
            &DeliveryRequest::on(date(2027, 2, 14)),
            at(date(2027, 2, 1), "08:00"),
        );
        assert!(result.can_deliver);
        assert_eq!(result.event, None);
        assert_eq!(result.available_slots, ["10:00-14:00"]);
    }
}
