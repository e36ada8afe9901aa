use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("Invalid timestamp {value:?}")]
    Timestamp { value: String },

    #[error("Client setup error: {0}")]
    Client(String),
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("Client setup error: {0}")]
    Client(String),
}

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Rate limit exceeded: 0 of {limit} requests remaining, resets at {reset}")]
    RateLimitExceeded { limit: u64, reset: String },

    #[error("Hosting platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

pub type PlatformResult<T> = std::result::Result<T, PlatformError>;
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
pub type Result<T> = std::result::Result<T, StatsError>;
