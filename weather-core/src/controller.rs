//! Weather request orchestration.
//!
//! Each entry point clears the suggestion list, moves the result state to
//! `Loading` and spawns the request; the reply moves it to `Success` or
//! `Error`. Requests in flight are not cancelled when a newer one starts,
//! so whichever reply arrives last is what the state shows.

use std::sync::Arc;

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    error::WeatherError,
    location::{LocationPermission, LocationProvider},
    model::{CitySuggestion, Coordinates},
    provider::WeatherClient,
    search::SearchController,
    state::{ResultState, StateCell},
};

/// Result of asking for weather at the device position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationOutcome {
    /// A request for these coordinates was started.
    Fetched(Coordinates),
    /// The front-end has to ask the user for permission first.
    PermissionRequired,
    /// Permission was granted but the device had no position to offer.
    Unavailable,
}

/// Owner and sole writer of `ResultState`.
///
/// Must be driven from within a Tokio runtime.
#[derive(Debug)]
pub struct WeatherController {
    client: Arc<dyn WeatherClient>,
    search: Arc<SearchController>,
    state: Arc<StateCell<ResultState>>,
}

impl WeatherController {
    pub fn new(client: Arc<dyn WeatherClient>, search: Arc<SearchController>) -> Self {
        Self { client, search, state: Arc::new(StateCell::default()) }
    }

    pub fn search(&self) -> &Arc<SearchController> {
        &self.search
    }

    pub fn state(&self) -> ResultState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResultState> {
        self.state.subscribe()
    }

    pub fn fetch_by_city(&self, city: &str) -> JoinHandle<()> {
        self.begin();

        let client = Arc::clone(&self.client);
        let state = Arc::clone(&self.state);
        let city = city.to_string();

        info!(%city, "fetching weather by city");
        tokio::spawn(async move {
            let next = match client.fetch_by_city(&city).await {
                Ok(snapshot) => ResultState::Success(snapshot),
                Err(err) => failed(WeatherError::for_city(&city, err)),
            };
            state.set(next);
        })
    }

    pub fn fetch_by_location(&self, coordinates: Coordinates) -> JoinHandle<()> {
        self.begin();

        let client = Arc::clone(&self.client);
        let state = Arc::clone(&self.state);

        info!(%coordinates, "fetching weather by location");
        tokio::spawn(async move {
            let next = match client.fetch_by_coordinates(coordinates).await {
                Ok(snapshot) => ResultState::Success(snapshot),
                Err(err) => failed(WeatherError::for_location(err)),
            };
            state.set(next);
        })
    }

    pub fn select_suggestion(&self, suggestion: &CitySuggestion) -> JoinHandle<()> {
        debug!(city = %suggestion.label(), "suggestion selected");
        self.fetch_by_location(suggestion.coordinates())
    }

    /// Fetch weather at the device position if permission allows it. A
    /// missing position leaves the current state untouched.
    pub async fn fetch_current_location(
        &self,
        permission: LocationPermission,
        provider: &dyn LocationProvider,
    ) -> LocationOutcome {
        if permission == LocationPermission::Denied {
            debug!("location permission denied");
            return LocationOutcome::PermissionRequired;
        }

        match provider.last_known_location().await {
            Ok(coordinates) => {
                self.fetch_by_location(coordinates);
                LocationOutcome::Fetched(coordinates)
            }
            Err(err) => {
                warn!(error = %err, "device location unavailable");
                LocationOutcome::Unavailable
            }
        }
    }

    /// Wait until the current request has finished and return its outcome.
    /// Never returns while the state is still `Idle`.
    pub async fn settled(&self) -> ResultState {
        let mut rx = self.state.subscribe();
        match rx.wait_for(ResultState::is_settled).await {
            Ok(state) => state.clone(),
            Err(_) => self.state.get(),
        }
    }

    fn begin(&self) {
        self.search.clear_suggestions();
        self.state.set(ResultState::Loading);
    }
}

fn failed(err: WeatherError) -> ResultState {
    warn!(error = %err, "weather request failed");
    ResultState::Error(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::SearchConfig,
        location::{FixedLocation, NoLocation},
        provider::scripted::{Call, ScriptedClient, snapshot, status, suggestion},
    };
    use std::time::Duration;
    use tokio::time::advance;

    fn controller(client: &Arc<ScriptedClient>) -> WeatherController {
        let search = Arc::new(SearchController::new(client.clone(), SearchConfig::default()));
        WeatherController::new(client.clone(), search)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn city_success_reports_snapshot() {
        let client = Arc::new(ScriptedClient::new().city(
            "Ankara",
            Duration::ZERO,
            Ok(snapshot("Ankara", 21.4)),
        ));
        let weather = controller(&client);
        assert_eq!(weather.state(), ResultState::Idle);

        weather.fetch_by_city("Ankara").await.expect("task completes");

        match weather.state() {
            ResultState::Success(s) => {
                assert_eq!(s.location_name, "Ankara");
                assert_eq!(s.temperature_c, 21.4);
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_city_names_the_city() {
        let client = Arc::new(ScriptedClient::new());
        let weather = controller(&client);

        weather.fetch_by_city("Qwxyzzy").await.expect("task completes");

        assert_eq!(weather.state(), ResultState::Error("city 'Qwxyzzy' not found".into()));
    }

    #[tokio::test]
    async fn bad_credential_ignores_city() {
        let client = Arc::new(
            ScriptedClient::new()
                .city("Ankara", Duration::ZERO, Err(status(401)))
                .city("Izmir", Duration::ZERO, Err(status(401))),
        );
        let weather = controller(&client);

        for city in ["Ankara", "Izmir"] {
            weather.fetch_by_city(city).await.expect("task completes");
            assert_eq!(weather.state(), ResultState::Error("invalid API credential".into()));
        }
    }

    #[tokio::test]
    async fn other_status_reports_code() {
        let client =
            Arc::new(ScriptedClient::new().city("Ankara", Duration::ZERO, Err(status(429))));
        let weather = controller(&client);

        weather.fetch_by_city("Ankara").await.expect("task completes");

        assert_eq!(weather.state(), ResultState::Error("request failed: code 429".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn loading_is_visible_while_request_is_in_flight() {
        let client = Arc::new(ScriptedClient::new().city(
            "Ankara",
            Duration::from_secs(2),
            Ok(snapshot("Ankara", 21.4)),
        ));
        let weather = controller(&client);
        let mut rx = weather.subscribe();

        weather.fetch_by_city("Ankara");
        assert_eq!(*rx.borrow_and_update(), ResultState::Loading);

        let settled = weather.settled().await;
        assert_eq!(settled, ResultState::Success(snapshot("Ankara", 21.4)));
    }

    #[tokio::test(start_paused = true)]
    async fn location_transport_failure_clears_suggestions() {
        let client = Arc::new(
            ScriptedClient::new()
                .search("Ank", Duration::ZERO, Ok(vec![suggestion("Ankara", 39.9, 32.8)]))
                .coordinates(
                    Duration::ZERO,
                    Err(crate::error::ClientError::Transport("connection reset".into())),
                ),
        );
        let weather = controller(&client);
        let suggestions = weather.search().subscribe();

        weather.search().on_query_changed("Ank");
        advance(Duration::from_millis(500)).await;
        settle().await;
        assert_eq!(suggestions.borrow().len(), 1);

        weather.fetch_by_location(Coordinates::new(39.9, 32.8)).await.expect("task completes");

        assert_eq!(weather.state(), ResultState::Error("network error: connection reset".into()));
        assert!(suggestions.borrow().is_empty());
        assert!(weather.search().suggestions().is_empty());
    }

    #[tokio::test]
    async fn location_status_uses_location_message() {
        let client = Arc::new(ScriptedClient::new().coordinates(Duration::ZERO, Err(status(404))));
        let weather = controller(&client);

        weather.fetch_by_location(Coordinates::new(0.0, 0.0)).await.expect("task completes");

        assert_eq!(
            weather.state(),
            ResultState::Error("could not retrieve weather for location: code 404".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_suggestion_clears_list_and_fetches_its_coordinates() {
        let ankara = suggestion("Ankara", 39.93, 32.86);
        let client = Arc::new(
            ScriptedClient::new()
                .search("Ank", Duration::ZERO, Ok(vec![ankara.clone()]))
                .coordinates(Duration::from_millis(200), Ok(snapshot("Ankara", 19.0))),
        );
        let weather = controller(&client);

        weather.search().on_query_changed("Ank");
        advance(Duration::from_millis(500)).await;
        settle().await;
        assert_eq!(weather.search().suggestions(), vec![ankara.clone()]);

        weather.select_suggestion(&ankara);
        assert!(weather.search().suggestions().is_empty());
        assert_eq!(weather.state(), ResultState::Loading);

        assert_eq!(weather.settled().await, ResultState::Success(snapshot("Ankara", 19.0)));
        assert_eq!(
            client.calls().last(),
            Some(&Call::Coordinates(Coordinates::new(39.93, 32.86)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_cancels_pending_suggestion_search() {
        let client = Arc::new(
            ScriptedClient::new()
                .search("Ank", Duration::ZERO, Ok(vec![suggestion("Ankara", 39.9, 32.8)]))
                .city("Ankara", Duration::ZERO, Ok(snapshot("Ankara", 20.0))),
        );
        let weather = controller(&client);

        weather.search().on_query_changed("Ank");
        weather.fetch_by_city("Ankara");

        advance(Duration::from_secs(1)).await;
        settle().await;

        assert!(weather.search().suggestions().is_empty());
        assert_eq!(client.calls(), vec![Call::City("Ankara".into())]);
    }

    #[tokio::test(start_paused = true)]
    async fn last_reply_wins_between_overlapping_requests() {
        let client = Arc::new(
            ScriptedClient::new()
                .city("Ankara", Duration::from_secs(3), Ok(snapshot("Ankara", 20.0)))
                .city("Izmir", Duration::from_secs(1), Ok(snapshot("Izmir", 27.0))),
        );
        let weather = controller(&client);

        let slow = weather.fetch_by_city("Ankara");
        let fast = weather.fetch_by_city("Izmir");

        fast.await.expect("task completes");
        assert_eq!(weather.state(), ResultState::Success(snapshot("Izmir", 27.0)));

        slow.await.expect("task completes");
        assert_eq!(weather.state(), ResultState::Success(snapshot("Ankara", 20.0)));
    }

    #[tokio::test]
    async fn denied_permission_does_not_touch_state() {
        let client = Arc::new(ScriptedClient::new());
        let weather = controller(&client);

        let outcome = weather
            .fetch_current_location(
                LocationPermission::Denied,
                &FixedLocation(Coordinates::new(1.0, 2.0)),
            )
            .await;

        assert_eq!(outcome, LocationOutcome::PermissionRequired);
        assert_eq!(weather.state(), ResultState::Idle);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_position_is_silent() {
        let client = Arc::new(ScriptedClient::new());
        let weather = controller(&client);

        let outcome = weather.fetch_current_location(LocationPermission::Granted, &NoLocation).await;

        assert_eq!(outcome, LocationOutcome::Unavailable);
        assert_eq!(weather.state(), ResultState::Idle);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn granted_permission_fetches_device_position() {
        let here = Coordinates::new(41.01, 28.97);
        let client = Arc::new(
            ScriptedClient::new().coordinates(Duration::ZERO, Ok(snapshot("Istanbul", 18.0))),
        );
        let weather = controller(&client);

        let outcome =
            weather.fetch_current_location(LocationPermission::Granted, &FixedLocation(here)).await;

        assert_eq!(outcome, LocationOutcome::Fetched(here));
        assert_eq!(weather.settled().await, ResultState::Success(snapshot("Istanbul", 18.0)));
        assert_eq!(client.calls(), vec![Call::Coordinates(here)]);
    }
}
