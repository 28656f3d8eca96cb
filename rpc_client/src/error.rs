use std::{
    fmt::{self, Display, Formatter},
    time::Duration,
};

use thiserror::Error;
use tracing::field;

use casper_deploy_types::{DeployHash, SigningError, ValidationError};

use crate::{
    rpcs::DeployStatus,
    transport::{RpcErrorObject, TransportError},
};

/// Errors returned by the client.
///
/// Entities the node reports as unknown are not errors at the typed level: the typed calls turn
/// them into `None` or [`DeployStatus::NotFound`].
#[derive(Debug, Error)]
pub enum Error {
    /// Every attempt failed before a JSON-RPC response could be decoded.
    #[error("{method} request (id {id}) failed after {attempts} attempt(s)")]
    NetworkFailure {
        method: String,
        id: u64,
        attempts: usize,
        #[source]
        source: TransportError,
    },
    /// The node answered with a JSON-RPC error object.
    #[error("{method} request (id {id}) was rejected by the node: {error}")]
    Rpc {
        method: String,
        id: u64,
        error: RpcErrorObject,
    },
    /// The caller gave up on the request before it completed.
    #[error("{method} request (id {id}) was cancelled")]
    Cancelled { method: String, id: u64 },
    #[error("failed to serialize {method} params")]
    Serialization {
        method: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to deserialize {method} result")]
    Deserialization {
        method: String,
        #[source]
        source: serde_json::Error,
    },
    /// The deploy did not reach a final status in time.
    #[error("deploy {deploy_hash} still {last_status} after {waited:?}")]
    Timeout {
        deploy_hash: DeployHash,
        waited: Duration,
        last_status: DeployStatus,
    },
    #[error("request error: {0}")]
    RequestFailed(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Signing(#[from] SigningError),
}

/// Classification of an [`Error`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Signing,
    Transport,
    Protocol,
    /// A raw call failed with one of the node's "no such entity" codes.
    NotFound,
    Cancelled,
    Serialization,
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Signing => "signing",
            ErrorKind::Transport => "transport",
            ErrorKind::Protocol => "protocol",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Timeout => "timeout",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NetworkFailure { .. } | Error::RequestFailed(_) => ErrorKind::Transport,
            Error::Rpc { .. } if self.is_not_found() => ErrorKind::NotFound,
            Error::Rpc { .. } => ErrorKind::Protocol,
            Error::Cancelled { .. } => ErrorKind::Cancelled,
            Error::Serialization { .. } | Error::Deserialization { .. } => {
                ErrorKind::Serialization
            }
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Signing(_) => ErrorKind::Signing,
        }
    }

    /// Whether the node reported the requested entity as unknown.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Rpc { error, .. } => error
                .error_code()
                .map_or(false, |code| code.is_not_found()),
            _ => false,
        }
    }
}

/// Wraps an error to ensure it gets properly captured by tracing.
pub(crate) fn display_error<'a, T>(err: &'a T) -> field::DisplayValue<ErrFormatter<'a, T>>
where
    T: std::error::Error + 'a,
{
    field::display(ErrFormatter(err))
}

/// Renders an error followed by its chain of sources.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ErrFormatter<'a, T>(pub &'a T);

impl<'a, T> Display for ErrFormatter<'a, T>
where
    T: std::error::Error,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut opt_source: Option<&(dyn std::error::Error)> = Some(self.0);

        while let Some(source) = opt_source {
            write!(f, "{}", source)?;
            opt_source = source.source();

            if opt_source.is_some() {
                f.write_str(": ")?;
            }
        }

        Ok(())
    }
}
