//! Geocoding gateway backed by the Google Maps places and distance matrix APIs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use posy_core::{
    config::{AppConfig, RegionBias},
    gateway::Gateway,
    model::{AddressCandidate, CandidateId, Coordinate, ResolvedAddress},
    ports::{AddressPort, AddressQuery, GatewayError, RoutingPort, TravelDistance},
};

const USER_AGENT: &str = "posy/0.1";
const DETAIL_FIELDS: &str = "address_component,formatted_address,geometry";

/// Response from /place/autocomplete/json
#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    status: String,
    #[serde(default)]
    predictions: Vec<Prediction>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Single suggestion inside `AutocompleteResponse.predictions`
#[derive(Debug, Deserialize)]
struct Prediction {
    place_id: String,
    description: String,
    #[serde(default)]
    structured_formatting: Option<StructuredFormatting>,
}

#[derive(Debug, Deserialize)]
struct StructuredFormatting {
    main_text: String,
    #[serde(default)]
    secondary_text: Option<String>,
}

/// Response from /place/details/json
#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    result: Option<PlaceDetails>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceDetails {
    #[serde(default)]
    formatted_address: String,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
    geometry: Geometry,
}

/// One entry of the provider's address component list, e.g. `route` or `postal_code`
#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Response from /distancematrix/json
#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    rows: Vec<MatrixRow>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<MatrixValue>,
    duration: Option<MatrixValue>,
}

/// Metres for distances, seconds for durations.
#[derive(Debug, Deserialize)]
struct MatrixValue {
    value: f64,
}

#[derive(Debug, Clone)]
/// Connection settings for the Google Maps web services.
pub struct GoogleMapsSettings {
    /// API key sent with every request.
    pub api_key: String,
    /// API root, e.g. `https://maps.googleapis.com/maps/api`.
    pub base_url: String,
    /// Country restriction and bias rectangle for autocomplete.
    pub region: RegionBias,
    /// Response language.
    pub language: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl From<&AppConfig> for GoogleMapsSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            api_key: config.maps_api_key.clone(),
            base_url: config.maps_base_url.clone(),
            region: config.region.clone(),
            language: config.language.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

/// HTTP client and normalised base URL, built on first use.
struct MapsClient {
    http: Client,
    base_url: String,
}

/// Address and routing ports for Google Maps.
///
/// The HTTP client is built lazily on the first request and shared afterwards;
/// concurrent first requests wait for a single initialisation.
pub struct GoogleMapsGateway {
    settings: GoogleMapsSettings,
    client: OnceCell<MapsClient>,
}

impl GoogleMapsGateway {
    /// Create a gateway. No network activity happens until the first request.
    #[must_use]
    pub fn new(settings: GoogleMapsSettings) -> Self {
        Self {
            settings,
            client: OnceCell::new(),
        }
    }

    /// Whether the HTTP client has been built yet.
    #[must_use]
    pub fn is_initialised(&self) -> bool {
        self.client.initialized()
    }

    async fn client(&self) -> Result<&MapsClient, GatewayError> {
        self.client
            .get_or_try_init(|| async {
                if self.settings.api_key.trim().is_empty() {
                    return Err(GatewayError::Init("API key is empty".to_owned()));
                }

                let http = Client::builder()
                    .user_agent(USER_AGENT)
                    .timeout(self.settings.timeout)
                    .connect_timeout(self.settings.timeout)
                    .build()
                    .map_err(|error| GatewayError::Init(error.to_string()))?;

                info!(base_url = %self.settings.base_url, "maps client initialised");
                Ok(MapsClient {
                    http,
                    base_url: self.settings.base_url.trim_end_matches('/').to_owned(),
                })
            })
            .await
    }

    fn location_bias(&self) -> String {
        let RegionBias {
            south_west,
            north_east,
            ..
        } = &self.settings.region;
        format!(
            "rectangle:{},{}|{},{}",
            south_west.lat(),
            south_west.lng(),
            north_east.lat(),
            north_east.lng()
        )
    }
}

#[async_trait]
impl AddressPort for GoogleMapsGateway {
    async fn search_address(
        &self,
        query: &AddressQuery,
    ) -> Result<Vec<AddressCandidate>, GatewayError> {
        if query.limit == 0 || query.is_empty() {
            return Ok(Vec::new());
        }

        let client = self.client().await?;
        let components = format!("country:{}", self.settings.region.country);
        let bias = self.location_bias();

        let req = client
            .http
            .get(format!("{}/place/autocomplete/json", client.base_url))
            .query(&[
                ("input", query.text.trim()),
                ("components", components.as_str()),
                ("locationbias", bias.as_str()),
                ("language", self.settings.language.as_str()),
                ("key", self.settings.api_key.as_str()),
            ]);

        let resp = fetch_json::<AutocompleteResponse>(req).await?;
        if resp.status == "ZERO_RESULTS" {
            return Ok(Vec::new());
        }
        check_status(&resp.status, resp.error_message)?;

        let candidates: Vec<AddressCandidate> = resp
            .predictions
            .into_iter()
            .take(query.limit)
            .map(|prediction| {
                let (main_text, secondary_text) = match prediction.structured_formatting {
                    Some(formatting) => (formatting.main_text, formatting.secondary_text),
                    None => (prediction.description.clone(), None),
                };
                AddressCandidate {
                    id: CandidateId(prediction.place_id),
                    description: prediction.description,
                    main_text,
                    secondary_text,
                }
            })
            .collect();

        debug!(count = candidates.len(), "autocomplete candidates");
        Ok(candidates)
    }

    async fn resolve_candidate(&self, id: &CandidateId) -> Result<ResolvedAddress, GatewayError> {
        let client = self.client().await?;

        let req = client
            .http
            .get(format!("{}/place/details/json", client.base_url))
            .query(&[
                ("place_id", id.0.as_str()),
                ("fields", DETAIL_FIELDS),
                ("language", self.settings.language.as_str()),
                ("key", self.settings.api_key.as_str()),
            ]);

        let resp = fetch_json::<DetailsResponse>(req).await?;
        if resp.status == "NOT_FOUND" || resp.status == "ZERO_RESULTS" {
            return Err(GatewayError::NotFound);
        }
        check_status(&resp.status, resp.error_message)?;

        let details = resp
            .result
            .ok_or_else(|| GatewayError::Malformed("place details without result".into()))?;

        let location = details.geometry.location;
        let coordinate = Coordinate::new(location.lat, location.lng)
            .map_err(|error| GatewayError::Malformed(error.to_string()))?;

        let components = &details.address_components;
        let locality = component(components, "locality")
            .or_else(|| component(components, "sublocality"))
            .or_else(|| component(components, "postal_town"));

        Ok(ResolvedAddress {
            candidate_id: id.clone(),
            formatted: details.formatted_address,
            coordinate,
            street_number: component(components, "street_number"),
            street_name: component(components, "route"),
            locality,
            region: component(components, "administrative_area_level_1"),
            postal_code: component(components, "postal_code"),
            country: component(components, "country"),
        })
    }
}

#[async_trait]
impl RoutingPort for GoogleMapsGateway {
    async fn travel_distance(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<TravelDistance, GatewayError> {
        let client = self.client().await?;

        let origins = origin.to_string();
        let destinations = destination.to_string();
        let req = client
            .http
            .get(format!("{}/distancematrix/json", client.base_url))
            .query(&[
                ("origins", origins.as_str()),
                ("destinations", destinations.as_str()),
                ("mode", "driving"),
                ("units", "metric"),
                ("key", self.settings.api_key.as_str()),
            ]);

        let resp = fetch_json::<MatrixResponse>(req).await?;
        check_status(&resp.status, resp.error_message)?;

        let element = resp
            .rows
            .into_iter()
            .next()
            .and_then(|row| row.elements.into_iter().next())
            .ok_or_else(|| GatewayError::Malformed("distance matrix without elements".into()))?;

        if element.status != "OK" {
            debug!(%origin, %destination, status = %element.status, "no route");
            return Err(GatewayError::NotFound);
        }

        let (Some(distance), Some(duration)) = (element.distance, element.duration) else {
            return Err(GatewayError::Malformed(
                "route without distance or duration".into(),
            ));
        };

        Ok(TravelDistance {
            distance_km: distance.value / 1000.0,
            duration_min: seconds_to_minutes(duration.value),
        })
    }
}

/// Build the gateway bundle for Google Maps.
#[must_use]
pub fn gateway(settings: GoogleMapsSettings) -> Gateway {
    let maps = Arc::new(GoogleMapsGateway::new(settings));
    let address_port: Arc<dyn AddressPort> = Arc::<GoogleMapsGateway>::clone(&maps);

    Gateway::new("google", address_port, maps)
}

/// First component tagged with `kind`, if the provider sent one.
fn component(components: &[AddressComponent], kind: &str) -> Option<String> {
    components
        .iter()
        .find(|component| component.types.iter().any(|tag| tag == kind))
        .map(|component| component.long_name.clone())
}

fn check_status(status: &str, error_message: Option<String>) -> Result<(), GatewayError> {
    if status == "OK" {
        return Ok(());
    }
    Err(GatewayError::Status {
        status: status.to_owned(),
        message: error_message.unwrap_or_default(),
    })
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "route durations are non-negative and far below u32::MAX minutes"
)]
fn seconds_to_minutes(seconds: f64) -> u32 {
    (seconds / 60.0).ceil() as u32
}

// Small helper to fetch and decode JSON with status handling.
async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, GatewayError> {
    req.send()
        .await
        .map_err(GatewayError::from)?
        .error_for_status()
        .map_err(GatewayError::from)?
        .json()
        .await
        .map_err(GatewayError::from)
}
