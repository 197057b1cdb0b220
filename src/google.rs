//! Google Distance Matrix HTTP adapter.

use serde::Deserialize;

use crate::error::ProviderError;
use crate::traits::{DistanceMatrix, DistanceMatrixProvider};

/// Distance assigned when the API has no route between two addresses.
pub const NO_ROUTE_METERS: u64 = 999_999;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

#[derive(Debug, Clone)]
pub struct GoogleMapsConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GoogleMapsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com/maps/api/distancematrix/json".to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl GoogleMapsConfig {
    /// Read the API key from `GOOGLE_MAPS_API_KEY`.
    ///
    /// Returns `None` when the key is absent or blank; callers then use
    /// [`crate::synthetic::SyntheticMatrix`].
    pub fn from_env() -> Option<Self> {
        let key = std::env::var(API_KEY_ENV).ok()?;
        Self::with_key(key)
    }

    /// Default configuration with the given key, or `None` if it is blank.
    pub fn with_key(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return None;
        }
        Some(Self {
            api_key: Some(key),
            ..Self::default()
        })
    }
}

#[derive(Debug, Clone)]
pub struct GoogleMapsClient {
    config: GoogleMapsConfig,
    client: reqwest::blocking::Client,
}

impl GoogleMapsClient {
    pub fn new(config: GoogleMapsConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn fetch_row(&self, origin: &str, destinations: &str) -> Result<Vec<u64>, ProviderError> {
        let mut query = vec![
            ("origins", origin),
            ("destinations", destinations),
            ("mode", "driving"),
            ("units", "metric"),
        ];
        if let Some(key) = self.config.api_key.as_deref() {
            query.push(("key", key));
        }

        let body = self
            .client
            .get(&self.config.base_url)
            .query(&query)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<DistanceMatrixResponse>())?;

        if body.status != "OK" {
            return Err(ProviderError::Status {
                status: body.status,
            });
        }

        Ok(body
            .rows
            .into_iter()
            .next()
            .map(|row| row.elements.into_iter().map(element_meters).collect())
            .unwrap_or_default())
    }
}

impl DistanceMatrixProvider for GoogleMapsClient {
    fn matrix_for(&self, addresses: &[String]) -> Result<DistanceMatrix, ProviderError> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }

        let destinations = addresses.join("|");
        let mut matrix = Vec::with_capacity(addresses.len());
        for (i, origin) in addresses.iter().enumerate() {
            let mut row = self.fetch_row(origin, &destinations)?;
            if row.len() != addresses.len() {
                return Err(ProviderError::MalformedMatrix {
                    expected: addresses.len(),
                    rows: i,
                });
            }
            if let Some(diagonal) = row.get_mut(i) {
                *diagonal = 0;
            }
            matrix.push(row);
        }

        Ok(matrix)
    }
}

fn element_meters(element: Element) -> u64 {
    match (element.status.as_str(), element.distance) {
        ("OK", Some(distance)) => distance.value,
        _ => NO_ROUTE_METERS,
    }
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixResponse {
    status: String,
    #[serde(default)]
    rows: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct Row {
    elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
struct Element {
    status: String,
    distance: Option<Distance>,
}

#[derive(Debug, Deserialize)]
struct Distance {
    value: u64,
}
