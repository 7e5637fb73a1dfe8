use snowbridge_core::err;
use thiserror::Error;

/// Errors raised while mapping a client configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid JDBC URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid Auth Type: {0}")]
    InvalidAuthType(String),

    /// More than one property matched the connection timeout pattern
    /// while only a single match is allowed.
    #[error("Multiple connection timeout properties supplied: {}", .0.join(", "))]
    AmbiguousConnectTimeout(Vec<String>),

    #[error("Failed to parse client configuration: {0}")]
    Parse(String),
}

/// Errors raised while creating a client
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Failure surfaced by the datasource, passed through unchanged
    #[error(transparent)]
    Sql(#[from] err::Error),
}
