use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Select, Text};
use std::{sync::Arc, time::Duration};
use tracing::debug;
use weather_core::{
    Config, Coordinates, FixedLocation, LocationOutcome, LocationPermission, LocationProvider,
    NoLocation, ResultState, SearchController, WeatherController, client_from_config,
};

use crate::render;

/// Pause between simulated keystrokes in `search`.
const KEYSTROKE_INTERVAL: Duration = Duration::from_millis(80);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather for a city, coordinates or your location")]
pub struct Cli {
    /// Log pipeline activity to stderr (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key and an optional default location.
    Configure,

    /// Show weather for a city name.
    Show {
        /// City name as typed, e.g. "Ankara".
        city: String,
    },

    /// Show weather for a latitude/longitude pair.
    Coords {
        #[arg(allow_hyphen_values = true)]
        latitude: f64,
        #[arg(allow_hyphen_values = true)]
        longitude: f64,
    },

    /// Show weather for the configured device location.
    Here {
        /// Behave as if location permission was refused.
        #[arg(long)]
        deny: bool,
    },

    /// Search cities as you would type them, then pick one.
    Search {
        /// Text typed into the search box.
        query: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city } => {
                if city.trim().is_empty() {
                    bail!("City name must not be empty.");
                }
                let weather = controller(&Config::load()?)?;
                weather.fetch_by_city(&city);
                report(weather.settled().await)
            }
            Command::Coords { latitude, longitude } => {
                let weather = controller(&Config::load()?)?;
                weather.fetch_by_location(Coordinates::new(latitude, longitude));
                report(weather.settled().await)
            }
            Command::Here { deny } => here(deny).await,
            Command::Search { query } => search(&query).await,
        }
    }
}

fn controller(cfg: &Config) -> anyhow::Result<WeatherController> {
    let client = client_from_config(cfg)?;
    let search = Arc::new(SearchController::new(client.clone(), cfg.search.clone()));
    Ok(WeatherController::new(client, search))
}

fn report(state: ResultState) -> anyhow::Result<()> {
    match state {
        ResultState::Success(snapshot) => {
            print!("{}", render::snapshot(&snapshot));
            Ok(())
        }
        ResultState::Error(message) => bail!(message),
        other => bail!("Request did not complete (state: {other:?})"),
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Text::new("OpenWeather API key:")
        .prompt()
        .context("Failed to read API key")?;
    cfg.set_api_key(api_key.trim().to_string());

    let store_location = Confirm::new("Store a default location for `weather here`?")
        .with_default(cfg.location.is_some())
        .prompt()
        .context("Failed to read answer")?;

    if store_location {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a decimal number")
            .prompt()
            .context("Failed to read latitude")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a decimal number")
            .prompt()
            .context("Failed to read longitude")?;
        cfg.set_default_location(Coordinates::new(latitude, longitude));
    }

    cfg.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());

    Ok(())
}

async fn here(deny: bool) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let weather = controller(&cfg)?;

    let provider: Box<dyn LocationProvider> = match cfg.default_location() {
        Some(coordinates) => Box::new(FixedLocation(coordinates)),
        None => Box::new(NoLocation),
    };
    let permission = if deny { LocationPermission::Denied } else { LocationPermission::Granted };

    match weather.fetch_current_location(permission, provider.as_ref()).await {
        LocationOutcome::Fetched(coordinates) => {
            debug!(%coordinates, "using device location");
            report(weather.settled().await)
        }
        LocationOutcome::PermissionRequired => {
            println!("Location permission is required for this feature.");
            Ok(())
        }
        LocationOutcome::Unavailable => {
            println!(
                "Current location is unavailable.\n\
                 Hint: run `weather configure` and store a default location."
            );
            Ok(())
        }
    }
}

async fn search(query: &str) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let weather = controller(&cfg)?;
    let search = Arc::clone(weather.search());
    let mut suggestions = search.subscribe();

    let mut typed = String::new();
    for ch in query.chars() {
        if !typed.is_empty() {
            tokio::time::sleep(KEYSTROKE_INTERVAL).await;
        }
        typed.push(ch);
        search.on_query_changed(&typed);
        // Only a reply for the latest input counts.
        suggestions.borrow_and_update();
    }

    if !search.is_searchable(&typed) {
        bail!(
            "Type at least {} characters to get suggestions.",
            cfg.search.min_query_chars
        );
    }

    tokio::time::timeout(suggestion_wait(&cfg), suggestions.changed())
        .await
        .context("Timed out waiting for city suggestions")?
        .context("Suggestion search stopped")?;

    let found = search.suggestions();
    if found.is_empty() {
        println!("No cities match '{typed}'.");
        return Ok(());
    }

    let picked = Select::new("Pick a city:", render::suggestion_labels(&found))
        .raw_prompt()
        .context("Failed to read selection")?;

    weather.select_suggestion(&found[picked.index]);
    report(weather.settled().await)
}

/// Upper bound on how long a search may take to publish its result.
fn suggestion_wait(cfg: &Config) -> Duration {
    cfg.search
        .debounce()
        .saturating_add(cfg.api.timeout())
        .saturating_add(Duration::from_secs(1))
}
