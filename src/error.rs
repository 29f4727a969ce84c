use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(
        "Player is not at the base location: {distance_meters:.1} m away, capture radius is {radius_meters} m"
    )]
    GeofenceViolation {
        distance_meters: f64,
        radius_meters: i32,
    },

    #[error("Invalid game state: {0}")]
    State(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
