//! RPCs returning ancillary information.

use serde::{Deserialize, Serialize};

use casper_deploy_types::{bytesrepr::Bytes, Deploy, DeployHash, Digest, PublicKey, Timestamp};

use super::{JsonExecutionResult, RpcWithParams, RpcWithoutParams};

/// Params for "info_get_deploy" RPC request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GetDeployParams {
    /// The deploy hash.
    pub deploy_hash: DeployHash,
    /// Whether to return the deploy with the finalized approvals substituted.
    #[serde(default)]
    pub finalized_approvals: bool,
}

impl GetDeployParams {
    pub fn new(deploy_hash: DeployHash) -> Self {
        GetDeployParams {
            deploy_hash,
            finalized_approvals: false,
        }
    }
}

/// Result for "info_get_deploy" RPC response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GetDeployResult {
    /// The RPC API version.
    pub api_version: String,
    /// The deploy.
    pub deploy: Deploy,
    /// The map of block hash to execution result.
    #[serde(default)]
    pub execution_results: Vec<JsonExecutionResult>,
}

/// "info_get_deploy" RPC.
pub struct GetDeploy {}

impl RpcWithParams for GetDeploy {
    const METHOD: &'static str = "info_get_deploy";
    type RequestParams = GetDeployParams;
    type ResponseResult = GetDeployResult;
}

/// A peer of the queried node.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PeerEntry {
    /// Node id.
    pub node_id: String,
    /// Node address.
    pub address: String,
}

/// Result for "info_get_peers" RPC response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GetPeersResult {
    /// The RPC API version.
    pub api_version: String,
    /// The node ID and network address of each connected peer.
    pub peers: Vec<PeerEntry>,
}

/// "info_get_peers" RPC.
pub struct GetPeers {}

impl RpcWithoutParams for GetPeers {
    const METHOD: &'static str = "info_get_peers";
    type ResponseResult = GetPeersResult;
}

/// Minimal info about a block needed to satisfy the node status request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MinimalBlockInfo {
    pub hash: Digest,
    pub timestamp: Timestamp,
    pub era_id: u64,
    pub height: u64,
    pub state_root_hash: Digest,
    pub creator: PublicKey,
}

/// Result for "info_get_status" RPC response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GetStatusResult {
    /// The RPC API version.
    pub api_version: String,
    /// The chainspec name.
    pub chainspec_name: String,
    /// The node ID and network address of each connected peer.
    #[serde(default)]
    pub peers: Vec<PeerEntry>,
    /// The minimal info of the last block from the linear chain.
    #[serde(default)]
    pub last_added_block_info: Option<MinimalBlockInfo>,
    /// The compiled node version.
    pub build_version: String,
    /// Time that passed since the node has started.
    #[serde(default)]
    pub uptime: Option<String>,
}

/// "info_get_status" RPC.
pub struct GetStatus {}

impl RpcWithoutParams for GetStatus {
    const METHOD: &'static str = "info_get_status";
    type ResponseResult = GetStatusResult;
}

/// The raw bytes of the chainspec.toml, genesis accounts.toml, and global_state.toml files.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChainspecRawBytes {
    pub chainspec_bytes: Bytes,
    #[serde(default)]
    pub maybe_genesis_accounts_bytes: Option<Bytes>,
    #[serde(default)]
    pub maybe_global_state_bytes: Option<Bytes>,
}

/// Result for "info_get_chainspec" RPC response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GetChainspecResult {
    /// The RPC API version.
    pub api_version: String,
    /// The chainspec file bytes.
    pub chainspec_bytes: ChainspecRawBytes,
}

/// "info_get_chainspec" RPC.
pub struct GetChainspec {}

impl RpcWithoutParams for GetChainspec {
    const METHOD: &'static str = "info_get_chainspec";
    type ResponseResult = GetChainspecResult;
}
