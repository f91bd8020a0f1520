//! Error raised while building a backoff strategy.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackoffError {
    /// The schedule has no entries, so no idle pause can ever be chosen.
    #[error("invalid backoff configuration: {0}")]
    InvalidConfiguration(String),
}
