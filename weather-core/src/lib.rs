//! Core library for the `weather` front-end.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The `WeatherClient` seam and its OpenWeather implementation
//! - Shared domain models (snapshots, city suggestions)
//! - The debounced suggestion search and the weather request state machine
//!
//! It is used by `weather-cli`, but any front-end can drive the controllers
//! and observe their state.

pub mod config;
pub mod controller;
pub mod error;
pub mod location;
pub mod model;
pub mod provider;
pub mod search;
pub mod state;

pub use config::{ApiConfig, Config, SearchConfig};
pub use controller::{LocationOutcome, WeatherController};
pub use error::{ClientError, WeatherError};
pub use location::{FixedLocation, LocationError, LocationPermission, LocationProvider, NoLocation};
pub use model::{CitySuggestion, Coordinates, WeatherSnapshot};
pub use provider::{WeatherClient, client_from_config};
pub use search::{QueryDispatch, SearchController};
pub use state::{ResultState, StateCell, SuggestionList};
