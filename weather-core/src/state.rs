use tokio::sync::watch;

use crate::model::{CitySuggestion, WeatherSnapshot};

/// Outcome of the latest weather request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResultState {
    #[default]
    Idle,
    Loading,
    Success(WeatherSnapshot),
    Error(String),
}

impl ResultState {
    /// `Success` and `Error` end a request lifecycle.
    pub fn is_settled(&self) -> bool {
        matches!(self, ResultState::Success(_) | ResultState::Error(_))
    }
}

pub type SuggestionList = Vec<CitySuggestion>;

/// Observable value with a single writer.
///
/// The owner replaces the value wholesale through `set`; any number of
/// readers can poll it with `get` or follow changes through `subscribe`.
#[derive(Debug)]
pub struct StateCell<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> StateCell<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    pub(crate) fn set(&self, value: T) {
        // `send_replace` succeeds even while nobody is subscribed.
        self.tx.send_replace(value);
    }
}

impl<T: Clone + Default> Default for StateCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
