//! Debounced, cancellable city-suggestion search.
//!
//! Every keystroke supersedes the previous one: the pending task is aborted
//! and its `CancelToken` revoked, so a late reply for an old query can
//! never overwrite the suggestions of a newer one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::{sync::watch, task::JoinHandle, time::Instant};
use tracing::{debug, warn};

use crate::{
    config::SearchConfig,
    provider::WeatherClient,
    state::{StateCell, SuggestionList},
};

/// What `on_query_changed` did with the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryDispatch {
    /// Below the minimum length: suggestions were cleared, nothing was sent.
    TooShort,
    /// A debounced lookup was scheduled.
    Scheduled,
}

#[derive(Debug, Default)]
struct Gate {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

#[derive(Debug)]
struct Shared {
    suggestions: StateCell<SuggestionList>,
    gate: Mutex<Gate>,
}

impl Shared {
    fn gate(&self) -> MutexGuard<'_, Gate> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Ticket held by one scheduled lookup. Valid until the next call to
/// `on_query_changed` or `clear_suggestions`.
#[derive(Debug, Clone)]
pub(crate) struct CancelToken {
    generation: u64,
    shared: Arc<Shared>,
}

impl CancelToken {
    fn is_cancelled(&self) -> bool {
        self.shared.gate().generation != self.generation
    }

    /// Publish `list` unless the token was revoked. The check and the write
    /// happen under the same lock that revocation takes.
    fn commit(&self, list: SuggestionList) -> bool {
        let gate = self.shared.gate();
        if gate.generation != self.generation {
            return false;
        }
        self.shared.suggestions.set(list);
        true
    }
}

/// Owner and sole writer of the suggestion list.
///
/// Must be driven from within a Tokio runtime.
#[derive(Debug)]
pub struct SearchController {
    client: Arc<dyn WeatherClient>,
    config: SearchConfig,
    shared: Arc<Shared>,
}

impl SearchController {
    pub fn new(client: Arc<dyn WeatherClient>, config: SearchConfig) -> Self {
        Self {
            client,
            config,
            shared: Arc::new(Shared {
                suggestions: StateCell::default(),
                gate: Mutex::new(Gate::default()),
            }),
        }
    }

    pub fn suggestions(&self) -> SuggestionList {
        self.shared.suggestions.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<SuggestionList> {
        self.shared.suggestions.subscribe()
    }

    /// Length is counted in characters, not bytes.
    pub fn is_searchable(&self, query: &str) -> bool {
        query.chars().count() >= self.config.min_query_chars
    }

    pub fn on_query_changed(&self, query: &str) -> QueryDispatch {
        let mut gate = self.revoke();

        if !self.is_searchable(query) {
            debug!(%query, "query too short, clearing suggestions");
            self.shared.suggestions.set(Vec::new());
            return QueryDispatch::TooShort;
        }

        let token = CancelToken { generation: gate.generation, shared: Arc::clone(&self.shared) };
        let client = Arc::clone(&self.client);
        // The quiet period starts at the keystroke, not when the task is first polled.
        let deadline = Instant::now() + self.config.debounce();
        let limit = self.config.limit;
        let query = query.to_string();

        debug!(%query, generation = token.generation, "scheduling city search");
        gate.task = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;

            if token.is_cancelled() {
                debug!(%query, "search superseded during debounce");
                return;
            }

            debug!(%query, "debounce elapsed, searching cities");
            let list = match client.search_cities(&query, limit).await {
                Ok(list) => list,
                Err(err) => {
                    warn!(%query, error = %err, "city search failed, showing no suggestions");
                    Vec::new()
                }
            };

            let count = list.len();
            if token.commit(list) {
                debug!(%query, count, "suggestions updated");
            } else {
                debug!(%query, "discarding stale suggestions");
            }
        }));

        QueryDispatch::Scheduled
    }

    /// Empty the list and cancel any pending lookup.
    pub fn clear_suggestions(&self) {
        let _gate = self.revoke();
        self.shared.suggestions.set(Vec::new());
    }

    /// Invalidate the outstanding token and abort its task. The returned
    /// guard keeps the gate closed until the caller has finished updating.
    fn revoke(&self) -> MutexGuard<'_, Gate> {
        let mut gate = self.shared.gate();
        gate.generation = gate.generation.wrapping_add(1);
        if let Some(task) = gate.task.take() {
            task.abort();
        }
        gate
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        if let Some(task) = self.shared.gate().task.take() {
            task.abort();
        }
    }
}
