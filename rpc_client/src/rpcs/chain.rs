//! RPCs related to the block chain.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use casper_deploy_types::Digest;

use super::{BlockIdentifier, RpcWithOptionalParams};

/// Params for "chain_get_block" RPC request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GetBlockParams {
    /// The block identifier.
    pub block_identifier: BlockIdentifier,
}

/// Result for "chain_get_block" RPC response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GetBlockResult {
    /// The RPC API version.
    pub api_version: String,
    /// The block, if found. Kept as raw JSON; its layout varies between node versions.
    #[serde(default)]
    pub block: Option<Value>,
}

/// "chain_get_block" RPC.
pub struct GetBlock {}

impl RpcWithOptionalParams for GetBlock {
    const METHOD: &'static str = "chain_get_block";
    type OptionalRequestParams = GetBlockParams;
    type ResponseResult = GetBlockResult;
}

/// Params for "chain_get_state_root_hash" RPC request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GetStateRootHashParams {
    /// The block identifier.
    pub block_identifier: BlockIdentifier,
}

/// Result for "chain_get_state_root_hash" RPC response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GetStateRootHashResult {
    /// The RPC API version.
    pub api_version: String,
    /// Hex-encoded hash of the state root.
    pub state_root_hash: Option<Digest>,
}

/// "chain_get_state_root_hash" RPC.
pub struct GetStateRootHash {}

impl RpcWithOptionalParams for GetStateRootHash {
    const METHOD: &'static str = "chain_get_state_root_hash";
    type OptionalRequestParams = GetStateRootHashParams;
    type ResponseResult = GetStateRootHashResult;
}
