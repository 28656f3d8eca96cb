//! A JSON-RPC 2.0 client for Casper nodes.
//!
//! Requests that fail before the node answers are retried with exponential backoff; requests
//! the node rejects are not. Entities the node does not know are returned as values rather than
//! errors.

mod config;
mod error;
mod node_client;
mod retry;
pub mod rpcs;
#[cfg(test)]
mod testing;
mod transport;

pub use config::{ExponentialBackoffConfig, FieldParseError, RpcClientConfig, RpcClientConfigTarget};
pub use error::{Error, ErrorKind};
pub use node_client::{JsonRpcNodeClient, NodeClient};
pub use retry::{AttemptOutcome, RetryPolicy, RetryState};
pub use rpcs::{BlockIdentifier, DeployStatus, ErrorCode, GlobalStateIdentifier};
pub use tokio_util::sync::CancellationToken;
pub use transport::{
    HttpTransport, JsonRpcRequest, JsonRpcResponse, RpcErrorObject, Transport, TransportError,
};
