//! Error taxonomy shared by every `DataKit` operation.

use std::fmt;

use thiserror::Error;

/// Which side of a migration an endpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSide {
    Source,
    Target,
}

impl fmt::Display for EndpointSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Target => f.write_str("target"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DataKitError {
    /// The service could not be reached at the connection level.
    #[error("unable to connect to the DataKit service at {url}; check that the service is running")]
    ServiceUnreachable {
        url: String,
        #[source]
        source: Box<reqwest::Error>,
    },
    /// Any other transport failure.
    #[error("request to {url} failed: {source}")]
    Gateway {
        url: String,
        #[source]
        source: Box<reqwest::Error>,
    },
    #[error("unreadable response from {endpoint} (HTTP {status}): {message}")]
    MalformedResponse {
        endpoint: String,
        status: u16,
        message: String,
    },
    #[error("failed to encrypt the DataKit password: {0}")]
    Encryption(String),
    #[error("unable to log in to DataKit; check the password of user {username}")]
    AuthenticationFailed { username: String },
    #[error("the DataKit session is no longer accepted ({reason}); restart the server to log in again")]
    SessionExpired { reason: String },
    #[error("no {side} database is registered at {ip}:{port}; make sure the database exists")]
    EndpointNotFound {
        side: EndpointSide,
        ip: String,
        port: String,
    },
    #[error("{side} database {database} at {ip}:{port} does not exist; make sure the database exists")]
    InvalidEndpointReference {
        side: EndpointSide,
        ip: String,
        port: String,
        database: String,
    },
    #[error("DataKit rejected {endpoint} (code {code}): {reason}")]
    UpstreamRejected {
        endpoint: String,
        code: i64,
        reason: String,
    },
    #[error("failed to create migration task {task_name}, reason: {reason}")]
    TaskCreationRejected { task_name: String, reason: String },
    #[error("failed to start migration task {task_name}, reason: {reason}")]
    TaskStartRejected { task_name: String, reason: String },
    #[error("no migration execution host is ready; make sure DataKit has an installed execution host")]
    NoEligibleHosts,
    #[error("migration task {task_name} does not exist; make sure the task has been created")]
    TaskNotFound { task_name: String },
}

impl DataKitError {
    /// True for failures where the service was never reached.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::ServiceUnreachable { .. } | Self::Gateway { .. })
    }
}

pub type DataKitResult<T> = Result<T, DataKitError>;
