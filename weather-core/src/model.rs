use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// A point-in-time weather reading for one location, built from a single
/// API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    /// Empty when the response carried no condition entry.
    pub condition_description: String,
    pub condition_icon_id: String,
    pub observed_at: Option<DateTime<Utc>>,
}

impl WeatherSnapshot {
    pub fn wind_speed_kmh(&self) -> f64 {
        self.wind_speed_mps * 3.6
    }

    /// Condition description with its first character upper-cased.
    pub fn headline(&self) -> String {
        let mut chars = self.condition_description.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => "no information".to_string(),
        }
    }

    pub fn icon_url(&self) -> Option<String> {
        if self.condition_icon_id.is_empty() {
            return None;
        }
        Some(format!("{ICON_BASE_URL}/{}@2x.png", self.condition_icon_id))
    }
}

/// One geocoded city match from the autocomplete endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySuggestion {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl CitySuggestion {
    pub fn label(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}
