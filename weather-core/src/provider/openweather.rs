use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    config::ApiConfig,
    error::ClientError,
    model::{CitySuggestion, Coordinates, WeatherSnapshot},
};

use super::WeatherClient;

/// OpenWeather current-weather and direct-geocoding client.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    api: ApiConfig,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String, api: ApiConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(api.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { api_key, api, http })
    }

    fn weather_url(&self) -> String {
        format!("{}/weather", self.api.base_url.trim_end_matches('/'))
    }

    fn geocoding_url(&self) -> String {
        format!("{}/direct", self.api.geo_url.trim_end_matches('/'))
    }

    /// Parameters every `/weather` request carries besides the location.
    fn weather_params(&self) -> [(&'static str, &str); 3] {
        [
            ("appid", self.api_key.as_str()),
            ("units", self.api.units.as_str()),
            ("lang", self.api.lang.as_str()),
        ]
    }

    async fn get_text(
        &self,
        url: &str,
        location: &[(&str, String)],
        extra: &[(&str, &str)],
    ) -> Result<String, ClientError> {
        let res = self.http.get(url).query(location).query(extra).send().await?;

        let status = res.status();
        if !status.is_success() {
            debug!(%url, status = status.as_u16(), "OpenWeather request rejected");
            // Keep the status even if the body cannot be read.
            let body = res.text().await.unwrap_or_default();
            return Err(ClientError::Status { code: status.as_u16(), body: truncate_body(&body) });
        }

        Ok(res.text().await?)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: Option<i64>,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: String,
    #[serde(default)]
    country: String,
    lat: f64,
    lon: f64,
}

impl From<OwCurrentResponse> for WeatherSnapshot {
    fn from(parsed: OwCurrentResponse) -> Self {
        let (condition_description, condition_icon_id) = parsed
            .weather
            .into_iter()
            .next()
            .map(|w| (w.description, w.icon))
            .unwrap_or_default();

        WeatherSnapshot {
            location_name: parsed.name,
            temperature_c: parsed.main.temp,
            feels_like_c: parsed.main.feels_like,
            humidity_pct: parsed.main.humidity,
            wind_speed_mps: parsed.wind.speed,
            condition_description,
            condition_icon_id,
            observed_at: parsed.dt.and_then(unix_to_utc),
        }
    }
}

impl From<OwGeoEntry> for CitySuggestion {
    fn from(entry: OwGeoEntry) -> Self {
        CitySuggestion {
            name: entry.name,
            country: entry.country,
            latitude: entry.lat,
            longitude: entry.lon,
        }
    }
}

pub(crate) fn parse_snapshot(body: &str) -> Result<WeatherSnapshot, ClientError> {
    let parsed: OwCurrentResponse =
        serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))?;
    Ok(parsed.into())
}

/// Keeps the service's ordering.
pub(crate) fn parse_suggestions(body: &str) -> Result<Vec<CitySuggestion>, ClientError> {
    let parsed: Vec<OwGeoEntry> =
        serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))?;
    Ok(parsed.into_iter().map(CitySuggestion::from).collect())
}

#[async_trait]
impl WeatherClient for OpenWeatherClient {
    async fn fetch_by_city(&self, city: &str) -> Result<WeatherSnapshot, ClientError> {
        let url = self.weather_url();
        debug!(%city, "fetching current weather by city");

        let body = self.get_text(&url, &[("q", city.to_string())], &self.weather_params()).await?;
        parse_snapshot(&body)
    }

    async fn fetch_by_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<WeatherSnapshot, ClientError> {
        let url = self.weather_url();
        debug!(%coordinates, "fetching current weather by coordinates");

        let location = [
            ("lat", coordinates.latitude.to_string()),
            ("lon", coordinates.longitude.to_string()),
        ];
        let body = self.get_text(&url, &location, &self.weather_params()).await?;
        parse_snapshot(&body)
    }

    async fn search_cities(
        &self,
        query: &str,
        limit: u8,
    ) -> Result<Vec<CitySuggestion>, ClientError> {
        let url = self.geocoding_url();
        debug!(%query, limit, "searching cities");

        let location = [("q", query.to_string()), ("limit", limit.to_string())];
        let body = self.get_text(&url, &location, &[("appid", self.api_key.as_str())]).await?;
        parse_suggestions(&body)
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
