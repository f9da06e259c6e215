//! Straight-line geometry and road-distance estimation.
//!
//! Every distance the rest of the crate reports comes from here, either a live
//! routing result or the haversine-based estimate used when routing fails.

use tracing::{debug, warn};

use crate::model::{Coordinate, DistanceSource, TravelEstimate};
use crate::ports::RoutingPort;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Typical excess of road travel over straight-line distance.
pub const ROAD_CORRECTION_FACTOR: f64 = 1.3;
/// Assumed average delivery speed.
pub const DEFAULT_AVG_SPEED_KMH: f64 = 30.0;

/// Great-circle distance between two coordinates in kilometres.
#[must_use]
pub fn haversine_distance_km(from: Coordinate, to: Coordinate) -> f64 {
    let from_lat = from.lat().to_radians();
    let to_lat = to.lat().to_radians();
    let delta_lat = (to.lat() - from.lat()).to_radians();
    let delta_lng = (to.lng() - from.lng()).to_radians();

    let half_chord = (delta_lat / 2.0).sin().powi(2)
        + from_lat.cos() * to_lat.cos() * (delta_lng / 2.0).sin().powi(2);
    let angle = 2.0 * half_chord.sqrt().atan2((1.0 - half_chord).sqrt());

    EARTH_RADIUS_KM * angle
}

/// Road distance approximated from a straight-line distance.
///
/// `road_factor` is normally [`ROAD_CORRECTION_FACTOR`].
#[must_use]
pub fn estimate_road_distance_km(straight_line_km: f64, road_factor: f64) -> f64 {
    straight_line_km * road_factor
}

/// Whole minutes needed to cover `distance_km` at `avg_speed_kmh`, rounded up.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "minute counts are small and non-negative; `as` saturates otherwise"
)]
pub fn estimate_delivery_minutes(distance_km: f64, avg_speed_kmh: f64) -> u32 {
    (distance_km / avg_speed_kmh * 60.0).ceil() as u32
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Tunable estimator used when no live route is available.
pub struct DistanceEstimator {
    /// Straight-line to road correction factor, greater than one.
    pub road_factor: f64,
    /// Average delivery speed in km/h.
    pub avg_speed_kmh: f64,
}

impl Default for DistanceEstimator {
    fn default() -> Self {
        Self {
            road_factor: ROAD_CORRECTION_FACTOR,
            avg_speed_kmh: DEFAULT_AVG_SPEED_KMH,
        }
    }
}

impl DistanceEstimator {
    /// Create an estimator with explicit settings.
    #[must_use]
    pub fn new(road_factor: f64, avg_speed_kmh: f64) -> Self {
        Self {
            road_factor,
            avg_speed_kmh,
        }
    }

    /// Estimated road distance and duration without any network call.
    #[must_use]
    pub fn estimate(&self, origin: Coordinate, destination: Coordinate) -> TravelEstimate {
        let straight_line_km = haversine_distance_km(origin, destination);
        let distance_km = estimate_road_distance_km(straight_line_km, self.road_factor);
        TravelEstimate {
            distance_km,
            duration_min: estimate_delivery_minutes(distance_km, self.avg_speed_kmh),
            source: DistanceSource::Estimated,
        }
    }

    /// Live road distance, degrading to [`DistanceEstimator::estimate`] on any
    /// routing failure. Never fails.
    pub async fn road_distance(
        &self,
        routing: &dyn RoutingPort,
        origin: Coordinate,
        destination: Coordinate,
    ) -> TravelEstimate {
        match routing.travel_distance(origin, destination).await {
            Ok(travel) if travel.distance_km.is_finite() && travel.distance_km >= 0.0 => {
                debug!(%origin, %destination, distance_km = travel.distance_km, "measured route");
                TravelEstimate {
                    distance_km: travel.distance_km,
                    duration_min: travel.duration_min,
                    source: DistanceSource::Measured,
                }
            }
            Ok(travel) => {
                warn!(
                    %origin,
                    %destination,
                    distance_km = travel.distance_km,
                    "routing returned an unusable distance, using estimate"
                );
                self.estimate(origin, destination)
            }
            Err(error) => {
                warn!(%origin, %destination, %error, "routing failed, using estimate");
                self.estimate(origin, destination)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::ports::{GatewayError, TravelDistance};

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).expect("valid coordinate")
    }

    struct FailingRouting;

    #[async_trait]
    impl RoutingPort for FailingRouting {
        async fn travel_distance(
            &self,
            _origin: Coordinate,
            _destination: Coordinate,
        ) -> Result<TravelDistance, GatewayError> {
            Err(GatewayError::Status {
                status: "OVER_QUERY_LIMIT".into(),
                message: "quota".into(),
            })
        }
    }

    struct FixedRouting(f64);

    #[async_trait]
    impl RoutingPort for FixedRouting {
        async fn travel_distance(
            &self,
            _origin: Coordinate,
            _destination: Coordinate,
        ) -> Result<TravelDistance, GatewayError> {
            Ok(TravelDistance {
                distance_km: self.0,
                duration_min: 7,
            })
        }
    }

    #[test]
    fn haversine_is_symmetric_and_zero_on_identity() {
        let sydney = coord(-33.87, 151.21);
        let melbourne = coord(-37.81, 144.96);

        let there = haversine_distance_km(sydney, melbourne);
        let back = haversine_distance_km(melbourne, sydney);
        assert!((there - back).abs() < 1e-9);
        assert!(haversine_distance_km(sydney, sydney).abs() < f64::EPSILON);
        assert!((700.0..730.0).contains(&there), "got {there}");
    }

    #[test]
    fn short_hop_in_sydney_is_about_one_and_a_half_km() {
        let florist = coord(-33.87, 151.21);
        let customer = coord(-33.88, 151.20);
        let distance = haversine_distance_km(florist, customer);
        assert!((1.0..2.0).contains(&distance), "got {distance}");
    }

    #[test]
    fn road_estimate_exceeds_straight_line() {
        for straight in [0.1, 1.0, 12.5, 400.0] {
            assert!(estimate_road_distance_km(straight, ROAD_CORRECTION_FACTOR) > straight);
        }
    }

    #[test]
    fn estimate_applies_configured_road_factor() {
        let origin = coord(-33.87, 151.21);
        let destination = coord(-33.88, 151.20);
        let straight = haversine_distance_km(origin, destination);

        let travel = DistanceEstimator::new(1.5, 20.0).estimate(origin, destination);
        assert_eq!(travel.source, DistanceSource::Estimated);
        assert!((travel.distance_km - estimate_road_distance_km(straight, 1.5)).abs() < 1e-12);
        assert_eq!(
            travel.duration_min,
            estimate_delivery_minutes(travel.distance_km, 20.0)
        );
    }

    #[test]
    fn delivery_minutes_round_up_and_grow_with_distance() {
        assert_eq!(estimate_delivery_minutes(0.0, 30.0), 0);
        assert_eq!(estimate_delivery_minutes(10.0, 30.0), 20);
        assert_eq!(estimate_delivery_minutes(10.1, 30.0), 21);
        assert!(estimate_delivery_minutes(50.0, 30.0) >= estimate_delivery_minutes(49.0, 30.0));
    }

    #[tokio::test]
    async fn road_distance_falls_back_when_routing_fails() {
        let estimator = DistanceEstimator::default();
        let origin = coord(-33.87, 151.21);
        let destination = coord(-33.88, 151.20);

        let travel = estimator
            .road_distance(&FailingRouting, origin, destination)
            .await;

        assert_eq!(travel.source, DistanceSource::Estimated);
        assert!(travel.distance_km.is_finite());
        let expected = haversine_distance_km(origin, destination) * ROAD_CORRECTION_FACTOR;
        assert!((travel.distance_km - expected).abs() < 1e-9);
        assert!(travel.duration_min > 0);
    }

    #[tokio::test]
    async fn road_distance_prefers_measured_route() {
        let estimator = DistanceEstimator::default();
        let travel = estimator
            .road_distance(&FixedRouting(4.2), coord(0.0, 0.0), coord(0.0, 0.01))
            .await;
        assert_eq!(travel.source, DistanceSource::Measured);
        assert_eq!(travel.duration_min, 7);
    }

    #[tokio::test]
    async fn road_distance_rejects_nan_from_provider() {
        let estimator = DistanceEstimator::default();
        let travel = estimator
            .road_distance(&FixedRouting(f64::NAN), coord(0.0, 0.0), coord(0.0, 0.01))
            .await;
        assert_eq!(travel.source, DistanceSource::Estimated);
        assert!(travel.distance_km.is_finite());
    }
}
