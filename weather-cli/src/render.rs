use chrono::Local;
use std::fmt::Write;
use weather_core::{CitySuggestion, WeatherSnapshot};

/// Multi-line summary of a snapshot.
pub fn snapshot(s: &WeatherSnapshot) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", s.location_name);
    if let Some(url) = s.icon_url() {
        let _ = writeln!(out, "  icon:       {url}");
    }
    let _ = writeln!(out, "  {:.1}°C  {}", s.temperature_c, s.headline());
    let _ = writeln!(out, "  feels like: {:.1}°C", s.feels_like_c);
    let _ = writeln!(out, "  humidity:   %{}", s.humidity_pct);
    let _ = writeln!(out, "  wind:       {:.1} km/h", s.wind_speed_kmh());
    if let Some(at) = s.observed_at {
        let _ = writeln!(out, "  updated:    {}", at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    }

    out
}

pub fn suggestion_labels(suggestions: &[CitySuggestion]) -> Vec<String> {
    suggestions
        .iter()
        .map(|s| format!("{}  ({:.2}, {:.2})", s.label(), s.latitude, s.longitude))
        .collect()
}
