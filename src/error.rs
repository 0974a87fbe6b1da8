use thiserror::Error;

/// Rejected run parameters. Raised before any unit is dispatched.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("target url must not be empty")]
    EmptyUrl,

    #[error("request count must be at least 1, got {0}")]
    NoRequests(i64),

    #[error("total time must be a non-negative number of seconds that fits a duration, got {0}")]
    InvalidTime(f64),

    #[error("invalid pacing {0}")]
    InvalidCurve(String),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}
