//! Error types for the onboarding console core.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Client service error: {0}")]
    ClientService(#[from] ClientServiceError),

    #[error("Staged context store error: {0}")]
    Store(#[from] StoreError),

    #[error("Onboarding error: {0}")]
    Onboarding(#[from] OnboardingError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors talking to the remote client-data service.
#[derive(Debug, thiserror::Error)]
pub enum ClientServiceError {
    #[error("Request to client service failed: {0}")]
    Transport(String),

    #[error("Client service rejected credentials (HTTP {status})")]
    AuthFailed { status: u16 },

    #[error("Client service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Client service returned an unreadable body: {0}")]
    InvalidBody(String),
}

/// Staged-context store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to open store: {0}")]
    Open(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Failures of a single fetch → resolve → map → stage cycle.
///
/// None of these ever carries a `Stage`: a failed decision is reported as
/// such and never coerced into a route.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("Failed to fetch client: {0}")]
    FetchFailed(#[from] ClientServiceError),

    #[error("No client found for {lookup}")]
    NoClientFound { lookup: String },

    #[error("Client record is malformed: {0}")]
    MalformedFlags(String),

    #[error("Failed to stage context: {0}")]
    Store(#[from] StoreError),

    #[error("Decision cancelled before completion")]
    Cancelled,
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
