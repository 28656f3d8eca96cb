//! The node's JSON-RPC methods as typed request/response pairs.

pub mod account;
pub mod chain;
pub mod info;
pub mod state;

use std::fmt::{self, Display, Formatter};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use casper_deploy_types::{Digest, U512};

use crate::{Error, NodeClient};

/// Error codes the node attaches to JSON-RPC error objects.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum ErrorCode {
    /// The requested deploy was not found.
    NoSuchDeploy = -32000,
    /// The requested block was not found.
    NoSuchBlock = -32001,
    /// Parsing the key for a query failed.
    FailedToParseQueryKey = -32002,
    /// The query against global state failed.
    QueryFailed = -32003,
    /// Executing the query failed.
    QueryFailedToExecute = -32004,
    /// Parsing the purse URef for a balance query failed.
    FailedToParseGetBalanceURef = -32005,
    /// Retrieving the balance failed.
    FailedToGetBalance = -32006,
    /// Executing the balance query failed.
    GetBalanceFailedToExecute = -32007,
    /// The submitted deploy was rejected as invalid.
    InvalidDeploy = -32008,
    /// The requested account was not found.
    NoSuchAccount = -32009,
    /// Looking up the dictionary URef failed.
    FailedToGetDictionaryURef = -32010,
    /// Retrieving the trie failed.
    FailedToGetTrie = -32011,
    /// The requested state root hash was not found.
    NoSuchStateRoot = -32012,
}

impl ErrorCode {
    pub fn from_code(code: i64) -> Option<Self> {
        let error_code = match code {
            -32000 => ErrorCode::NoSuchDeploy,
            -32001 => ErrorCode::NoSuchBlock,
            -32002 => ErrorCode::FailedToParseQueryKey,
            -32003 => ErrorCode::QueryFailed,
            -32004 => ErrorCode::QueryFailedToExecute,
            -32005 => ErrorCode::FailedToParseGetBalanceURef,
            -32006 => ErrorCode::FailedToGetBalance,
            -32007 => ErrorCode::GetBalanceFailedToExecute,
            -32008 => ErrorCode::InvalidDeploy,
            -32009 => ErrorCode::NoSuchAccount,
            -32010 => ErrorCode::FailedToGetDictionaryURef,
            -32011 => ErrorCode::FailedToGetTrie,
            -32012 => ErrorCode::NoSuchStateRoot,
            _ => return None,
        };
        Some(error_code)
    }

    /// Codes meaning "the node does not know this entity (yet)".
    pub fn is_not_found(self) -> bool {
        matches!(
            self,
            ErrorCode::NoSuchDeploy | ErrorCode::NoSuchBlock | ErrorCode::NoSuchAccount
        )
    }
}

/// A JSON-RPC method which takes parameters.
pub trait RpcWithParams {
    const METHOD: &'static str;
    type RequestParams: Serialize + Send + Sync + 'static;
    type ResponseResult: DeserializeOwned + Send + 'static;
}

/// A JSON-RPC method which takes no parameters.
pub trait RpcWithoutParams {
    const METHOD: &'static str;
    type ResponseResult: DeserializeOwned + Send + 'static;
}

/// A JSON-RPC method whose parameters may be left out.
pub trait RpcWithOptionalParams {
    const METHOD: &'static str;
    type OptionalRequestParams: Serialize + Send + Sync + 'static;
    type ResponseResult: DeserializeOwned + Send + 'static;
}

pub(crate) async fn call_with_params<R, C>(
    client: &C,
    params: R::RequestParams,
) -> Result<R::ResponseResult, Error>
where
    R: RpcWithParams,
    C: NodeClient + ?Sized,
{
    let params = encode_params(R::METHOD, &params)?;
    let result = client.send_request(R::METHOD, Some(params)).await?;
    decode_result(R::METHOD, result)
}

pub(crate) async fn call_without_params<R, C>(client: &C) -> Result<R::ResponseResult, Error>
where
    R: RpcWithoutParams,
    C: NodeClient + ?Sized,
{
    let result = client.send_request(R::METHOD, None).await?;
    decode_result(R::METHOD, result)
}

pub(crate) async fn call_with_optional_params<R, C>(
    client: &C,
    maybe_params: Option<R::OptionalRequestParams>,
) -> Result<R::ResponseResult, Error>
where
    R: RpcWithOptionalParams,
    C: NodeClient + ?Sized,
{
    let params = match &maybe_params {
        Some(params) => Some(encode_params(R::METHOD, params)?),
        None => None,
    };
    let result = client.send_request(R::METHOD, params).await?;
    decode_result(R::METHOD, result)
}

fn encode_params<T: Serialize>(method: &str, params: &T) -> Result<Value, Error> {
    serde_json::to_value(params).map_err(|source| Error::Serialization {
        method: method.to_string(),
        source,
    })
}

fn decode_result<T: DeserializeOwned>(method: &str, result: Value) -> Result<T, Error> {
    serde_json::from_value(result).map_err(|source| Error::Deserialization {
        method: method.to_string(),
        source,
    })
}

/// Turns the node's "no such entity" errors into `None`.
pub(crate) fn not_found_as_none<T>(result: Result<T, Error>) -> Result<Option<T>, Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(error) if error.is_not_found() => Ok(None),
        Err(error) => Err(error),
    }
}

/// Identifier of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum BlockIdentifier {
    /// Identify and retrieve the block with its hash.
    Hash(Digest),
    /// Identify and retrieve the block with its height.
    Height(u64),
}

/// Identifier of the global state a query runs against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum GlobalStateIdentifier {
    /// Query the state as of the block with this hash.
    BlockHash(Digest),
    /// Query the state as of the block at this height.
    BlockHeight(u64),
    /// Query the state under this state root hash.
    StateRootHash(Digest),
}

/// The outcome of executing a deploy in a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionResult {
    Success {
        cost: U512,
        #[serde(default)]
        transfers: Vec<String>,
    },
    Failure {
        cost: U512,
        error_message: String,
        #[serde(default)]
        transfers: Vec<String>,
    },
}

/// An [`ExecutionResult`] with the hash of the block it happened in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonExecutionResult {
    pub block_hash: Digest,
    pub result: ExecutionResult,
}

/// Where a submitted deploy stands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeployStatus {
    /// The node has never heard of the deploy.
    NotFound,
    /// The node holds the deploy but has not executed it yet.
    Pending,
    Success {
        block_hash: Digest,
        cost: U512,
    },
    Failed {
        block_hash: Digest,
        cost: U512,
        error_message: String,
    },
}

impl DeployStatus {
    /// Status implied by the execution results the node reports for a known deploy.
    ///
    /// The first result decides; a deploy is executed in at most one block of the canonical
    /// chain.
    pub fn from_execution_results(execution_results: &[JsonExecutionResult]) -> Self {
        match execution_results.first() {
            None => DeployStatus::Pending,
            Some(JsonExecutionResult {
                block_hash,
                result: ExecutionResult::Success { cost, .. },
            }) => DeployStatus::Success {
                block_hash: *block_hash,
                cost: *cost,
            },
            Some(JsonExecutionResult {
                block_hash,
                result:
                    ExecutionResult::Failure {
                        cost,
                        error_message,
                        ..
                    },
            }) => DeployStatus::Failed {
                block_hash: *block_hash,
                cost: *cost,
                error_message: error_message.clone(),
            },
        }
    }

    /// Whether the status can no longer change.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            DeployStatus::Success { .. } | DeployStatus::Failed { .. }
        )
    }
}

impl Display for DeployStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DeployStatus::NotFound => write!(f, "not found"),
            DeployStatus::Pending => write!(f, "pending"),
            DeployStatus::Success { block_hash, cost } => {
                write!(f, "executed in block {} at cost {}", block_hash, cost)
            }
            DeployStatus::Failed {
                block_hash,
                cost,
                error_message,
            } => write!(
                f,
                "failed in block {} at cost {}: {}",
                block_hash, cost, error_message
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn error_codes_should_round_trip() {
        for code in -32012..=-32000 {
            let error_code = ErrorCode::from_code(code).unwrap();
            assert_eq!(error_code as i64, code);
        }
        assert_eq!(ErrorCode::from_code(-32602), None);
        assert!(ErrorCode::NoSuchAccount.is_not_found());
        assert!(!ErrorCode::QueryFailed.is_not_found());
    }

    #[test]
    fn identifiers_should_use_external_tags() {
        assert_eq!(
            serde_json::to_value(BlockIdentifier::Height(12)).unwrap(),
            json!({"Height": 12})
        );
        let digest = Digest::hash([1u8]);
        assert_eq!(
            serde_json::to_value(GlobalStateIdentifier::StateRootHash(digest)).unwrap(),
            json!({"StateRootHash": digest.to_hex()})
        );
    }

    #[test]
    fn status_should_follow_execution_results() {
        let block_hash = Digest::hash([7u8]);
        assert_eq!(DeployStatus::from_execution_results(&[]), DeployStatus::Pending);

        let results: Vec<JsonExecutionResult> = serde_json::from_value(json!([{
            "block_hash": block_hash.to_hex(),
            "result": {"Success": {"effect": {}, "transfers": [], "cost": "100000000"}}
        }]))
        .unwrap();
        let status = DeployStatus::from_execution_results(&results);
        assert_eq!(
            status,
            DeployStatus::Success {
                block_hash,
                cost: U512::from(100_000_000u64)
            }
        );
        assert!(status.is_final());

        let results: Vec<JsonExecutionResult> = serde_json::from_value(json!([{
            "block_hash": block_hash.to_hex(),
            "result": {"Failure": {"cost": "5", "error_message": "Out of gas error"}}
        }]))
        .unwrap();
        assert_eq!(
            DeployStatus::from_execution_results(&results),
            DeployStatus::Failed {
                block_hash,
                cost: U512::from(5u64),
                error_message: "Out of gas error".to_string(),
            }
        );
        assert!(!DeployStatus::Pending.is_final());
        assert!(!DeployStatus::NotFound.is_final());
    }
}
