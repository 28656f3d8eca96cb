use thiserror::Error;

use crate::{bytesrepr, cl_value::CLValueError, crypto::KeyError, TimeDiff};

/// Error returned when deploy inputs are rejected, always before anything is hashed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No sender account was set.
    #[error("deploy has no sender account")]
    MissingSender,

    /// No payment code was set.
    #[error("deploy has no payment code")]
    MissingPayment,

    /// No session code was set.
    #[error("deploy has no session code")]
    MissingSession,

    /// The chain name is empty.
    #[error("chain name must not be empty")]
    EmptyChainName,

    /// The gas price is zero.
    #[error("gas price must be greater than zero")]
    InvalidGasPrice,

    /// The time-to-live is zero.
    #[error("time-to-live must be greater than zero")]
    InvalidTtl,

    /// Excessive time-to-live.
    #[error("time-to-live of {got} exceeds limit of {max_ttl}")]
    ExcessiveTimeToLive {
        /// The time-to-live limit.
        max_ttl: TimeDiff,
        /// The received time-to-live.
        got: TimeDiff,
    },

    /// Too many dependencies.
    #[error("{got} dependencies exceeds limit of {max_dependencies}")]
    ExcessiveDependencies {
        /// The dependencies limit.
        max_dependencies: u8,
        /// The actual number of dependencies provided.
        got: usize,
    },

    /// Payment and session together are larger than a deploy may be.
    #[error("deploy body of {got} bytes exceeds limit of {max_size}")]
    ExcessiveSize {
        /// The maximum permitted serialized size, in bytes.
        max_size: u32,
        /// The serialized size of payment plus session.
        got: usize,
    },

    /// An amount string is not a non-negative decimal integer.
    #[error("malformed amount '{0}'")]
    MalformedAmount(String),

    /// A key or signature failed to parse.
    #[error(transparent)]
    InvalidKey(#[from] KeyError),

    /// A runtime argument could not be encoded.
    #[error("invalid runtime argument '{name}': {error}")]
    InvalidArgument {
        /// The argument name.
        name: String,
        /// The encoding failure.
        error: CLValueError,
    },

    /// Serialization failed.
    #[error("failed to serialize deploy: {0}")]
    Serialization(#[from] bytesrepr::Error),
}
