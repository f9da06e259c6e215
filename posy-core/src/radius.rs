//! Delivery radius filter run on every search.

use futures::future::join_all;
use serde::Serialize;

use crate::geo::DistanceEstimator;
use crate::model::{Coordinate, DistanceSource, FloristDeliveryProfile, FloristId};
use crate::ports::RoutingPort;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
/// Distance from one florist to the customer and whether it is in range.
pub struct RadiusMatch {
    /// Florist identifier.
    pub id: FloristId,
    /// Road distance, measured or estimated. Infinite when unavailable.
    pub distance_km: f64,
    /// Driving time in minutes.
    pub estimated_duration_min: u32,
    /// Where the distance came from.
    pub source: DistanceSource,
    /// `distance_km <= delivery_radius_km`.
    pub is_within_range: bool,
}

/// Measure every florist against `customer` and sort ascending by distance.
///
/// Out-of-range florists are kept with `is_within_range == false`. All
/// distance lookups run concurrently and are joined before sorting.
pub async fn filter_by_radius(
    estimator: &DistanceEstimator,
    routing: &dyn RoutingPort,
    customer: Coordinate,
    florists: &[FloristDeliveryProfile],
) -> Vec<RadiusMatch> {
    rank_by_distance(estimator, routing, customer, florists)
        .await
        .into_iter()
        .map(|(_, matched)| matched)
        .collect()
}

/// Same as [`filter_by_radius`] but keeps each match paired with its profile.
pub(crate) async fn rank_by_distance<'profiles>(
    estimator: &DistanceEstimator,
    routing: &dyn RoutingPort,
    customer: Coordinate,
    florists: &'profiles [FloristDeliveryProfile],
) -> Vec<(&'profiles FloristDeliveryProfile, RadiusMatch)> {
    let lookups = florists.iter().map(|florist| async move {
        let travel = estimator
            .road_distance(routing, florist.coordinates, customer)
            .await;

        let distance_km = if travel.distance_km.is_finite() {
            travel.distance_km
        } else {
            f64::INFINITY
        };

        let matched = RadiusMatch {
            id: florist.id.clone(),
            distance_km,
            estimated_duration_min: travel.duration_min,
            source: travel.source,
            is_within_range: distance_km <= florist.delivery_radius_km,
        };
        (florist, matched)
    });

    let mut ranked = join_all(lookups).await;
    ranked.sort_by(|(_, left), (_, right)| left.distance_km.total_cmp(&right.distance_km));
    ranked
}
