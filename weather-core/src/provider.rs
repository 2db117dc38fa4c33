use crate::{
    Config,
    error::ClientError,
    model::{CitySuggestion, Coordinates, WeatherSnapshot},
    provider::openweather::OpenWeatherClient,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

#[cfg(test)]
pub(crate) mod scripted;

/// Read-only operations against the remote weather/geocoding service.
///
/// Implementations must not retry: every non-2xx status is reported as
/// `ClientError::Status` and every send/receive failure as
/// `ClientError::Transport`.
#[async_trait]
pub trait WeatherClient: Send + Sync + Debug {
    async fn fetch_by_city(&self, city: &str) -> Result<WeatherSnapshot, ClientError>;

    async fn fetch_by_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<WeatherSnapshot, ClientError>;

    async fn search_cities(
        &self,
        query: &str,
        limit: u8,
    ) -> Result<Vec<CitySuggestion>, ClientError>;
}

/// Construct the HTTP client from config.
pub fn client_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherClient>> {
    let api_key = config.api_key()?;
    let client = OpenWeatherClient::new(api_key.to_owned(), config.api.clone())?;
    Ok(Arc::new(client))
}
