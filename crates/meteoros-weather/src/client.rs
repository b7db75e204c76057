//! HTTP client for the provider's `/weather` and `/forecast` endpoints.
//!
//! Every call is a fresh round trip: no retries, no caching, and no timeout
//! beyond the transport default.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use meteoros_core::{ReqwestErrorExt, WeatherError};

use crate::types::{Coordinates, ForecastSeries, TemperatureUnit, WeatherObservation};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const USER_AGENT: &str = concat!("Meteoros/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    /// Client against the public provider endpoint.
    pub fn new(api_key: &str) -> Result<Self, WeatherError> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// Client against a custom base URL (proxies, tests).
    pub fn with_base_url(base_url: &str, api_key: &str) -> Result<Self, WeatherError> {
        Url::parse(base_url)
            .map_err(|e| WeatherError::InvalidRequest(format!("bad base URL {base_url}: {e}")))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(ReqwestErrorExt::into_network_error)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Current conditions at the given coordinates.
    #[instrument(skip(self), level = "debug")]
    pub async fn current_by_coordinates(
        &self,
        coord: Coordinates,
        unit: TemperatureUnit,
    ) -> Result<WeatherObservation, WeatherError> {
        let url = self.endpoint("weather", &coordinate_params(coord)?, unit)?;
        self.get_json(url).await
    }

    /// Five-day, three-hour forecast at the given coordinates.
    #[instrument(skip(self), level = "debug")]
    pub async fn forecast_by_coordinates(
        &self,
        coord: Coordinates,
        unit: TemperatureUnit,
    ) -> Result<ForecastSeries, WeatherError> {
        let url = self.endpoint("forecast", &coordinate_params(coord)?, unit)?;
        self.get_json(url).await
    }

    /// Current conditions for a city name; the name is URL-encoded.
    #[instrument(skip(self), level = "debug")]
    pub async fn current_by_city(
        &self,
        city_name: &str,
        unit: TemperatureUnit,
    ) -> Result<WeatherObservation, WeatherError> {
        let city_name = city_name.trim();
        if city_name.is_empty() {
            return Err(WeatherError::InvalidRequest("empty city name".to_string()));
        }

        let url = self.endpoint("weather", &[("q", city_name.to_string())], unit)?;
        self.get_json(url).await
    }

    fn endpoint(
        &self,
        path: &str,
        params: &[(&str, String)],
        unit: TemperatureUnit,
    ) -> Result<Url, WeatherError> {
        let raw = format!("{}/{}", self.base_url, path);
        let mut url = Url::parse(&raw)
            .map_err(|e| WeatherError::InvalidRequest(format!("{raw}: {e}")))?;

        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
            .append_pair("appid", &self.api_key)
            .append_pair("units", unit.units_param());

        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, WeatherError> {
        let path = url.path().to_string();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ReqwestErrorExt::into_network_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!("{} returned status {}", path, status);
            return Err(WeatherError::ServerError {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(ReqwestErrorExt::into_network_error)?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::debug!("{} body did not match schema: {}", path, e);
            WeatherError::DecodeError(e.to_string())
        })
    }
}

fn coordinate_params(coord: Coordinates) -> Result<[(&'static str, String); 2], WeatherError> {
    if !coord.is_finite() {
        return Err(WeatherError::InvalidRequest(format!(
            "non-finite coordinates: {}, {}",
            coord.lat, coord.lon
        )));
    }
    Ok([("lat", coord.lat.to_string()), ("lon", coord.lon.to_string())])
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn test_endpoint_encodes_city_and_units() {
        let client = WeatherClient::with_base_url("https://example.com/data/2.5/", "k").unwrap();
        let url = client
            .endpoint("weather", &[("q", "São Paulo".to_string())], TemperatureUnit::Fahrenheit)
            .unwrap();

        assert_eq!(url.path(), "/data/2.5/weather");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("q".to_string(), "São Paulo".to_string())));
        assert!(pairs.contains(&("appid".to_string(), "k".to_string())));
        assert!(pairs.contains(&("units".to_string(), "imperial".to_string())));
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn test_bad_base_url_is_invalid_request() {
        let result = WeatherClient::with_base_url("not a url", "k");
        assert!(matches!(result, Err(WeatherError::InvalidRequest(_))));
    }

    #[test]
    fn test_non_finite_coordinates_rejected() {
        let result = coordinate_params(Coordinates::new(f64::NAN, 0.0));
        assert!(matches!(result, Err(WeatherError::InvalidRequest(_))));

        let ok = coordinate_params(Coordinates::new(51.5, -0.12)).unwrap();
        assert_eq!(ok[0], ("lat", "51.5".to_string()));
        assert_eq!(ok[1], ("lon", "-0.12".to_string()));
    }

    #[tokio::test]
    async fn test_empty_city_is_invalid_request() {
        let client = WeatherClient::new("k").unwrap();
        let result = client.current_by_city("   ", TemperatureUnit::Celsius).await;
        assert!(matches!(result, Err(WeatherError::InvalidRequest(_))));
    }
}
