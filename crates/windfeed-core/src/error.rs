//! Feed errors

use thiserror::Error;

/// Errors that can occur while consuming the realtime feed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    /// The subscription reported an error
    #[error("Feed unavailable: {0}")]
    Unavailable(String),

    /// A record could not be decoded
    #[error("Malformed reading '{key}': {reason}")]
    MalformedReading {
        /// Key of the offending record
        key: String,
        /// What was wrong with it
        reason: String,
    },

    /// The snapshot is neither empty nor a collection of records
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// The path is empty after normalization
    #[error("Invalid feed path: '{0}'")]
    InvalidPath(String),

    /// The feed dropped the subscription
    #[error("Subscription closed by the feed")]
    Closed,
}
