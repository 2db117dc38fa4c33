use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

use crate::model::Coordinates;

/// Whether the platform allowed access to the device position. Asking for
/// permission is the front-end's business; the core only consumes the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationPermission {
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("no last known location")]
    Unavailable,
}

/// Source of a single best-effort device position.
#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    async fn last_known_location(&self) -> Result<Coordinates, LocationError>;
}

/// Always reports the same position, e.g. one stored in the config file.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn last_known_location(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// A device that never has a fix.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

#[async_trait]
impl LocationProvider for NoLocation {
    async fn last_known_location(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unavailable)
    }
}
