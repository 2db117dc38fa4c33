//! In-memory `WeatherClient` for controller tests.

use async_trait::async_trait;
use std::{collections::HashMap, sync::Mutex, time::Duration};

use crate::{
    error::ClientError,
    model::{CitySuggestion, Coordinates, WeatherSnapshot},
};

use super::WeatherClient;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    City(String),
    Coordinates(Coordinates),
    Search { query: String, limit: u8 },
}

#[derive(Debug, Clone)]
struct Scripted<T> {
    delay: Duration,
    reply: Result<T, ClientError>,
}

#[derive(Debug, Default)]
pub struct ScriptedClient {
    cities: Mutex<HashMap<String, Scripted<WeatherSnapshot>>>,
    coordinates: Mutex<Option<Scripted<WeatherSnapshot>>>,
    searches: Mutex<HashMap<String, Scripted<Vec<CitySuggestion>>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn city(
        self,
        city: &str,
        delay: Duration,
        reply: Result<WeatherSnapshot, ClientError>,
    ) -> Self {
        self.cities.lock().unwrap().insert(city.to_string(), Scripted { delay, reply });
        self
    }

    pub fn coordinates(self, delay: Duration, reply: Result<WeatherSnapshot, ClientError>) -> Self {
        *self.coordinates.lock().unwrap() = Some(Scripted { delay, reply });
        self
    }

    pub fn search(
        self,
        query: &str,
        delay: Duration,
        reply: Result<Vec<CitySuggestion>, ClientError>,
    ) -> Self {
        self.searches.lock().unwrap().insert(query.to_string(), Scripted { delay, reply });
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Search { query, .. } => Some(query),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

async fn play<T>(scripted: Option<Scripted<T>>, missing: ClientError) -> Result<T, ClientError> {
    match scripted {
        Some(s) => {
            if !s.delay.is_zero() {
                tokio::time::sleep(s.delay).await;
            }
            s.reply
        }
        None => Err(missing),
    }
}

fn not_found() -> ClientError {
    ClientError::Status {
        code: 404,
        body: r#"{"cod":"404","message":"city not found"}"#.into(),
    }
}

#[async_trait]
impl WeatherClient for ScriptedClient {
    async fn fetch_by_city(&self, city: &str) -> Result<WeatherSnapshot, ClientError> {
        self.record(Call::City(city.to_string()));
        let scripted = self.cities.lock().unwrap().get(city).cloned();
        play(scripted, not_found()).await
    }

    async fn fetch_by_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<WeatherSnapshot, ClientError> {
        self.record(Call::Coordinates(coordinates));
        let scripted = self.coordinates.lock().unwrap().clone();
        play(scripted, not_found()).await
    }

    async fn search_cities(
        &self,
        query: &str,
        limit: u8,
    ) -> Result<Vec<CitySuggestion>, ClientError> {
        self.record(Call::Search { query: query.to_string(), limit });
        let scripted = self.searches.lock().unwrap().get(query).cloned();
        play(scripted, ClientError::Transport("no script for query".into())).await
    }
}

pub fn snapshot(name: &str, temperature_c: f64) -> WeatherSnapshot {
    WeatherSnapshot {
        location_name: name.to_string(),
        temperature_c,
        feels_like_c: temperature_c - 1.0,
        humidity_pct: 40,
        wind_speed_mps: 2.5,
        condition_description: "açık".to_string(),
        condition_icon_id: "01d".to_string(),
        observed_at: None,
    }
}

pub fn suggestion(name: &str, latitude: f64, longitude: f64) -> CitySuggestion {
    CitySuggestion { name: name.to_string(), country: "TR".to_string(), latitude, longitude }
}

pub fn status(code: u16) -> ClientError {
    ClientError::Status { code, body: String::new() }
}
