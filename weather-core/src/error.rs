use thiserror::Error;

/// Failure of a single `WeatherClient` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("unexpected status {code}: {body}")]
    Status { code: u16, body: String },
    #[error("{0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

/// User-facing weather lookup failures. The `Display` text is exactly what
/// ends up in `ResultState::Error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    #[error("invalid API credential")]
    InvalidCredential,
    #[error("city '{city}' not found")]
    CityNotFound { city: String },
    #[error("request failed: code {0}")]
    HttpStatus(u16),
    #[error("could not retrieve weather for location: code {0}")]
    LocationHttpStatus(u16),
    #[error("network error: {0}")]
    Network(String),
}

impl WeatherError {
    /// Classify a failed fetch-by-city call.
    pub fn for_city(city: &str, err: ClientError) -> Self {
        match err {
            ClientError::Status { code: 401, .. } => WeatherError::InvalidCredential,
            ClientError::Status { code: 404, .. } => {
                WeatherError::CityNotFound { city: city.to_string() }
            }
            ClientError::Status { code, .. } => WeatherError::HttpStatus(code),
            ClientError::Transport(detail) | ClientError::Decode(detail) => {
                WeatherError::Network(detail)
            }
        }
    }

    /// Classify a failed fetch-by-coordinates call. Every status collapses to
    /// the location message.
    pub fn for_location(err: ClientError) -> Self {
        match err {
            ClientError::Status { code, .. } => WeatherError::LocationHttpStatus(code),
            ClientError::Transport(detail) | ClientError::Decode(detail) => {
                WeatherError::Network(detail)
            }
        }
    }
}
