//! Environment-driven application configuration.

use std::env::VarError;
use std::path::PathBuf;

use crate::geo::DistanceEstimator;
use crate::model::Coordinate;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
const DEFAULT_REGION_BOUNDS: &str = "-44.0,112.0,-10.0,154.0";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
/// Configuration could not be built from the environment.
pub enum ConfigError {
    /// Required variable is not set.
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),
    /// Variable is set but unusable.
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar {
        /// Variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
/// Country restriction and bias rectangle for address autocomplete.
pub struct RegionBias {
    /// ISO 3166-1 alpha-2 country code, lowercase.
    pub country: String,
    /// South-west corner of the bias rectangle.
    pub south_west: Coordinate,
    /// North-east corner of the bias rectangle.
    pub north_east: Coordinate,
}

#[derive(Debug, Clone)]
/// Settings for the provider, the estimator, and the terminal front-end.
pub struct AppConfig {
    /// Provider credential.
    pub maps_api_key: String,
    /// Provider API root.
    pub maps_base_url: String,
    /// Autocomplete restriction.
    pub region: RegionBias,
    /// Provider response language.
    pub language: String,
    /// Average delivery speed for time estimates.
    pub avg_speed_kmh: f64,
    /// Straight-line to road correction factor.
    pub road_factor: f64,
    /// Provider HTTP timeout.
    pub request_timeout_secs: u64,
    /// Florist catalog file.
    pub catalog_path: PathBuf,
    /// Tracing filter directive.
    pub log_level: String,
    /// Log destination.
    pub log_file: PathBuf,
}

impl AppConfig {
    /// Estimator built from the configured speed and correction factor.
    #[must_use]
    pub fn estimator(&self) -> DistanceEstimator {
        DistanceEstimator::new(self.road_factor, self.avg_speed_kmh)
    }
}

/// Load configuration from the environment after reading a `.env` file, if any.
///
/// # Errors
///
/// Returns [`ConfigError`] if required variables are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config(|key| std::env::var(key))
}

/// Parse and validate configuration using `lookup` for variable access.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_owned()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_owned())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_owned(),
        reason,
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        let value = raw
            .trim()
            .parse::<f64>()
            .map_err(|error| invalid(var, error.to_string()))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(invalid(var, format!("{raw} is not a finite number")))
        }
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u64>()
            .map_err(|error| invalid(var, error.to_string()))
    };

    let maps_api_key = require("POSY_MAPS_API_KEY")?;
    let maps_base_url = or_default("POSY_MAPS_BASE_URL", DEFAULT_BASE_URL);
    let language = or_default("POSY_LANGUAGE", "en");

    let country = or_default("POSY_REGION_COUNTRY", "au").to_lowercase();
    let bounds = or_default("POSY_REGION_BOUNDS", DEFAULT_REGION_BOUNDS);
    let (south_west, north_east) =
        parse_bounds(&bounds).map_err(|reason| invalid("POSY_REGION_BOUNDS", reason))?;

    let avg_speed_kmh = parse_f64("POSY_AVG_SPEED_KMH", "30")?;
    if avg_speed_kmh <= 0.0 {
        return Err(invalid("POSY_AVG_SPEED_KMH", "must be positive".to_owned()));
    }

    let road_factor = parse_f64("POSY_ROAD_FACTOR", "1.3")?;
    if road_factor <= 1.0 {
        return Err(invalid("POSY_ROAD_FACTOR", "must be greater than 1".to_owned()));
    }

    let request_timeout_secs = parse_u64("POSY_REQUEST_TIMEOUT_SECS", "10")?;
    if request_timeout_secs == 0 {
        return Err(invalid(
            "POSY_REQUEST_TIMEOUT_SECS",
            "must be at least 1".to_owned(),
        ));
    }

    Ok(AppConfig {
        maps_api_key,
        maps_base_url,
        region: RegionBias {
            country,
            south_west,
            north_east,
        },
        language,
        avg_speed_kmh,
        road_factor,
        request_timeout_secs,
        catalog_path: PathBuf::from(or_default("POSY_CATALOG_PATH", "./florists.json")),
        log_level: or_default("POSY_LOG_LEVEL", "info"),
        log_file: PathBuf::from(or_default("POSY_LOG_FILE", "./posy.log")),
    })
}

/// Parse `south,west,north,east` into two corners.
fn parse_bounds(raw: &str) -> Result<(Coordinate, Coordinate), String> {
    let parts = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.to_string())?;

    let [south, west, north, east] = parts.as_slice() else {
        return Err(format!("expected south,west,north,east but got {raw:?}"));
    };
    if south > north {
        return Err("south edge is north of the north edge".to_owned());
    }

    let south_west = Coordinate::new(*south, *west).map_err(|error| error.to_string())?;
    let north_east = Coordinate::new(*north, *east).map_err(|error| error.to_string())?;
    Ok((south_west, north_east))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from_map<'map>(
        map: &'map HashMap<&'map str, &'map str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'map {
        move |key| {
            map.get(key)
                .map(|value| (*value).to_owned())
                .ok_or(VarError::NotPresent)
        }
    }

    fn full_env<'map>() -> HashMap<&'map str, &'map str> {
        HashMap::from([("POSY_MAPS_API_KEY", "test-key")])
    }

    #[test]
    fn fails_without_api_key() {
        let map = HashMap::new();
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(
                result,
                Err(ConfigError::MissingEnvVar(ref var)) if var == "POSY_MAPS_API_KEY"
            ),
            "expected MissingEnvVar, got: {result:?}"
        );
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let map = HashMap::from([("POSY_MAPS_API_KEY", "  ")]);
        assert!(matches!(
            build_app_config(lookup_from_map(&map)),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }

    #[test]
    fn defaults_apply() {
        let map = full_env();
        let config = build_app_config(lookup_from_map(&map)).expect("valid config");

        assert_eq!(config.maps_api_key, "test-key");
        assert_eq!(config.maps_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.region.country, "au");
        assert_eq!(config.language, "en");
        assert!((config.avg_speed_kmh - 30.0).abs() < f64::EPSILON);
        assert!((config.road_factor - 1.3).abs() < f64::EPSILON);
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.catalog_path, PathBuf::from("./florists.json"));
        assert!(config.region.south_west.lat() < config.region.north_east.lat());
    }

    #[test]
    fn road_factor_must_exceed_one() {
        let mut map = full_env();
        map.insert("POSY_ROAD_FACTOR", "0.9");
        let result = build_app_config(lookup_from_map(&map));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "POSY_ROAD_FACTOR"
        ));
    }

    #[test]
    fn speed_must_be_a_positive_number() {
        for raw in ["abc", "0", "-5", "NaN"] {
            let mut map = full_env();
            map.insert("POSY_AVG_SPEED_KMH", raw);
            assert!(
                build_app_config(lookup_from_map(&map)).is_err(),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn bounds_are_validated() {
        for raw in ["1,2,3", "-10,112,-44,154", "-44,112,-10,200", "a,b,c,d"] {
            let mut map = full_env();
            map.insert("POSY_REGION_BOUNDS", raw);
            let result = build_app_config(lookup_from_map(&map));
            assert!(
                matches!(
                    result,
                    Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "POSY_REGION_BOUNDS"
                ),
                "{raw:?} should be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn custom_region_is_lowercased() {
        let mut map = full_env();
        map.insert("POSY_REGION_COUNTRY", "NZ");
        map.insert("POSY_REGION_BOUNDS", "-47.5,166.0,-34.0,179.0");
        let config = build_app_config(lookup_from_map(&map)).expect("valid config");
        assert_eq!(config.region.country, "nz");
    }
}
