//! Yahoo Weather error types.

use skycast_fetch::FetchError;
use thiserror::Error;

/// Errors reported by the YQL endpoint.
#[derive(Debug, Error)]
pub enum YahooError {
    /// The query matched nothing (`query.count == 0`).
    #[error("No results for {0}")]
    NoResults(String),

    /// A channel came back without an `item`.
    #[error("Weather channel for {0} has no forecast item")]
    MissingItem(String),

    /// Top-level `error` object.
    #[error("YQL error: {0}")]
    Yql(String),
}

impl From<YahooError> for FetchError {
    fn from(e: YahooError) -> Self {
        match e {
            YahooError::NoResults(_) | YahooError::MissingItem(_) => {
                FetchError::NoData(e.to_string())
            }
            YahooError::Yql(_) => FetchError::InvalidResponse(e.to_string()),
        }
    }
}
