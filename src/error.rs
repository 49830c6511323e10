use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by [RouteManager](crate::RouteManager).
///
/// External failures are wrapped and passed to the tick caller as-is. The manager
/// never retries on its own.
#[derive(Debug, Error)]
pub enum Error {
    /// The manager configuration was rejected at build time.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The driving agent could not report its remaining waypoints.
    #[error("failed to query remaining waypoint count")]
    Query(#[source] BoxError),

    /// The driving agent could not compute a route.
    #[error("{}", planning_message(.destination))]
    Planning {
        destination: Option<String>,
        #[source]
        source: BoxError,
    },

    /// The driving agent could not synthesize a control command.
    #[error("failed to compute control command")]
    Control(#[source] BoxError),

    /// The control command could not be applied to the vehicle.
    #[error("failed to apply control to vehicle")]
    Actuation(#[source] BoxError),
}

fn planning_message(destination: &Option<String>) -> String {
    match destination {
        Some(dest) => format!("route planning to {dest} failed"),
        None => "automatic route planning failed".to_string(),
    }
}

impl Error {
    pub fn is_planning_failure(&self) -> bool {
        matches!(self, Self::Planning { .. })
    }

    pub fn is_actuation_failure(&self) -> bool {
        matches!(self, Self::Actuation(_))
    }
}
