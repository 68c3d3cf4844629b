//! Platform error types

use thiserror::Error;

/// Platform-related errors
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The registry's `subsets`/`superset` relations loop back on themselves
    #[error("Cyclic platform configuration: {}", .cycle.join(" -> "))]
    CyclicConfiguration {
        /// Platform names along the cycle, first name repeated at the end
        cycle: Vec<String>,
    },

    /// A user-agent or version pattern failed to compile
    #[error("Invalid pattern for platform '{platform}': {source}")]
    InvalidPattern {
        platform: String,
        #[source]
        source: regex::Error,
    },

    /// Platform configuration could not be read or parsed
    #[error("Platform configuration error: {0}")]
    Config(String),

    /// The ready signal was dropped before it settled
    #[error("Platform ready signal dropped before resolution")]
    ReadyAbandoned,
}

impl From<toml::de::Error> for PlatformError {
    fn from(err: toml::de::Error) -> Self {
        PlatformError::Config(err.to_string())
    }
}

/// Result type for platform operations
pub type Result<T> = std::result::Result<T, PlatformError>;
