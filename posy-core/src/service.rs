//! High-level service facade combining the gateway and the delivery rules.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info};

use crate::events::EventCalendar;
use crate::gateway::Gateway;
use crate::geo::DistanceEstimator;
use crate::model::{
    AddressCandidate, CandidateId, Coordinate, DeliveryEligibility, DistanceSource,
    FloristDeliveryProfile, FloristId, ResolvedAddress, TimeOfDay, TravelEstimate,
};
use crate::ports::{AddressQuery, GatewayError, TravelDistance};
use crate::radius::{RadiusMatch, filter_by_radius, rank_by_distance};
use crate::schedule::{DeliveryRequest, evaluate_delivery};

#[derive(Debug, Clone)]
/// One florist search from a customer location.
pub struct SearchRequest {
    /// Customer delivery address.
    pub customer: Coordinate,
    /// Delivery date; today when `None`.
    pub date: Option<NaiveDate>,
    /// Delivery time; all open slots are listed when `None`.
    pub time: Option<TimeOfDay>,
    /// Booked orders per florist and slot name.
    pub bookings: HashMap<FloristId, HashMap<String, u32>>,
}

impl SearchRequest {
    /// Browse-by-date search without a specific time.
    #[must_use]
    pub fn new(customer: Coordinate, date: Option<NaiveDate>) -> Self {
        Self {
            customer,
            date,
            time: None,
            bookings: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
/// Florist that can deliver, with its distance and slot details.
pub struct EligibleFlorist {
    /// Florist identifier.
    pub id: FloristId,
    /// Shop name.
    pub name: String,
    /// Road distance to the customer.
    pub distance_km: f64,
    /// Driving time to the customer.
    pub estimated_duration_min: u32,
    /// Measured or estimated distance.
    pub source: DistanceSource,
    /// Slots, fees, and event details.
    pub eligibility: DeliveryEligibility,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
/// Result of a florist search.
pub struct SearchOutcome {
    /// Florists that can deliver, nearest first.
    pub florists: Vec<EligibleFlorist>,
    /// Distance to the nearest florist whose radius does not reach the customer.
    pub nearest_out_of_range_km: Option<f64>,
}

/// Public entry point for address lookup and florist searches.
pub struct DeliveryService {
    gateway: Gateway,
    estimator: DistanceEstimator,
    calendar: EventCalendar,
}

impl DeliveryService {
    /// Create a new service bound to the provided gateway.
    #[must_use]
    pub fn new(gateway: Gateway, estimator: DistanceEstimator, calendar: EventCalendar) -> Self {
        Self {
            gateway,
            estimator,
            calendar,
        }
    }

    /// Special events this service recognises.
    #[must_use]
    pub fn calendar(&self) -> &EventCalendar {
        &self.calendar
    }

    /// Suggest addresses for free text. Empty queries never reach the provider.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the provider call fails.
    pub async fn search_address(
        &self,
        query: &AddressQuery,
    ) -> Result<Vec<AddressCandidate>, GatewayError> {
        if query.is_empty() || query.limit == 0 {
            return Ok(Vec::new());
        }
        self.gateway.address_port.search_address(query).await
    }

    /// Resolve a chosen candidate into an address with a coordinate.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the provider call fails or the candidate is unknown.
    pub async fn resolve_candidate(
        &self,
        id: &CandidateId,
    ) -> Result<ResolvedAddress, GatewayError> {
        self.gateway.address_port.resolve_candidate(id).await
    }

    /// Live routing call without fallback.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the provider call fails.
    pub async fn travel_distance(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<TravelDistance, GatewayError> {
        self.gateway
            .routing_port
            .travel_distance(origin, destination)
            .await
    }

    /// Road distance that falls back to an estimate instead of failing.
    pub async fn road_distance(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> TravelEstimate {
        self.estimator
            .road_distance(self.gateway.routing_port.as_ref(), origin, destination)
            .await
    }

    /// Distance of every florist to `customer`, nearest first, out-of-range included.
    pub async fn filter_by_radius(
        &self,
        customer: Coordinate,
        florists: &[FloristDeliveryProfile],
    ) -> Vec<RadiusMatch> {
        filter_by_radius(
            &self.estimator,
            self.gateway.routing_port.as_ref(),
            customer,
            florists,
        )
        .await
    }

    /// Whether one florist can deliver to `customer`.
    pub async fn check_florist(
        &self,
        customer: Coordinate,
        florist: &FloristDeliveryProfile,
        request: &DeliveryRequest,
        now: NaiveDateTime,
    ) -> DeliveryEligibility {
        let travel = self.road_distance(florist.coordinates, customer).await;
        evaluate_delivery(florist, request, travel.distance_km, now, &self.calendar)
    }

    /// Florists that can deliver for `request`, nearest first.
    ///
    /// Distances from the radius pass are reused by the schedule evaluation.
    pub async fn search_florists(
        &self,
        request: &SearchRequest,
        florists: &[FloristDeliveryProfile],
        now: NaiveDateTime,
    ) -> SearchOutcome {
        let date = request.date.unwrap_or_else(|| now.date());
        let ranked = rank_by_distance(
            &self.estimator,
            self.gateway.routing_port.as_ref(),
            request.customer,
            florists,
        )
        .await;

        let mut outcome = SearchOutcome::default();
        for (profile, matched) in ranked {
            if !matched.is_within_range {
                if outcome.nearest_out_of_range_km.is_none() && matched.distance_km.is_finite() {
                    outcome.nearest_out_of_range_km = Some(matched.distance_km);
                }
                continue;
            }

            let delivery = DeliveryRequest {
                date,
                time: request.time,
                booked_orders: request.bookings.get(&profile.id).cloned().unwrap_or_default(),
            };
            let eligibility =
                evaluate_delivery(profile, &delivery, matched.distance_km, now, &self.calendar);
            if !eligibility.can_deliver {
                debug!(florist = %profile.id, reason = ?eligibility.reason, "florist filtered out");
                continue;
            }

            outcome.florists.push(EligibleFlorist {
                id: matched.id,
                name: profile.name.clone(),
                distance_km: matched.distance_km,
                estimated_duration_min: matched.estimated_duration_min,
                source: matched.source,
                eligibility,
            });
        }

        info!(
            gateway = self.gateway.name,
            %date,
            candidates = florists.len(),
            eligible = outcome.florists.len(),
            "florist search finished"
        );
        outcome
    }
}
