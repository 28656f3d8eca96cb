//! RPCs related to the state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use casper_deploy_types::{AccountHash, Digest, PublicKey, U512};

use super::{BlockIdentifier, GlobalStateIdentifier, RpcWithOptionalParams, RpcWithParams};

/// Identifier of an account.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum AccountIdentifier {
    /// The public key of an account
    PublicKey(PublicKey),
    /// The account hash of an account
    AccountHash(AccountHash),
}

impl From<PublicKey> for AccountIdentifier {
    fn from(public_key: PublicKey) -> Self {
        AccountIdentifier::PublicKey(public_key)
    }
}

impl From<AccountHash> for AccountIdentifier {
    fn from(account_hash: AccountHash) -> Self {
        AccountIdentifier::AccountHash(account_hash)
    }
}

/// Params for "state_get_account_info" RPC request
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GetAccountInfoParams {
    /// The public key of the Account.
    pub account_identifier: AccountIdentifier,
    /// The block identifier.
    pub block_identifier: Option<BlockIdentifier>,
}

/// A named key of an account.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NamedKey {
    pub name: String,
    /// The formatted key, e.g. `uref-…` or `hash-…`.
    pub key: String,
}

/// A key allowed to sign for an account, with its weight.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AssociatedKey {
    pub account_hash: AccountHash,
    pub weight: u8,
}

/// Weights an account's approvals must reach for the given action.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ActionThresholds {
    pub deployment: u8,
    pub key_management: u8,
}

/// An account as stored in global state.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub account_hash: AccountHash,
    /// The formatted URef of the account's main purse.
    pub main_purse: String,
    #[serde(default)]
    pub named_keys: Vec<NamedKey>,
    #[serde(default)]
    pub associated_keys: Vec<AssociatedKey>,
    #[serde(default)]
    pub action_thresholds: Option<ActionThresholds>,
}

/// Result for "state_get_account_info" RPC response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GetAccountInfoResult {
    /// The RPC API version.
    pub api_version: String,
    /// The account.
    pub account: Account,
    /// The Merkle proof.
    pub merkle_proof: String,
}

/// "state_get_account_info" RPC.
pub struct GetAccountInfo {}

impl RpcWithParams for GetAccountInfo {
    const METHOD: &'static str = "state_get_account_info";
    type RequestParams = GetAccountInfoParams;
    type ResponseResult = GetAccountInfoResult;
}

/// Params for "state_get_balance" RPC request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GetBalanceParams {
    /// The hash of state root.
    pub state_root_hash: Digest,
    /// Formatted URef.
    pub purse_uref: String,
}

/// Result for "state_get_balance" RPC response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GetBalanceResult {
    /// The RPC API version.
    pub api_version: String,
    /// The balance value.
    pub balance_value: U512,
    /// The Merkle proof.
    pub merkle_proof: String,
}

/// "state_get_balance" RPC.
pub struct GetBalance {}

impl RpcWithParams for GetBalance {
    const METHOD: &'static str = "state_get_balance";
    type RequestParams = GetBalanceParams;
    type ResponseResult = GetBalanceResult;
}

/// Params for "query_global_state" RPC
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct QueryGlobalStateParams {
    /// The identifier used for the query. If not provided, the tip of the chain will be used.
    pub state_identifier: Option<GlobalStateIdentifier>,
    /// The key under which to query.
    pub key: String,
    /// The path components starting from the key as base.
    #[serde(default)]
    pub path: Vec<String>,
}

/// Result for "query_global_state" RPC response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct QueryGlobalStateResult {
    /// The RPC API version.
    pub api_version: String,
    /// The block header if a Block hash was provided.
    #[serde(default)]
    pub block_header: Option<Value>,
    /// The stored value.
    pub stored_value: Value,
    /// The Merkle proof.
    pub merkle_proof: String,
}

/// "query_global_state" RPC
pub struct QueryGlobalState {}

impl RpcWithParams for QueryGlobalState {
    const METHOD: &'static str = "query_global_state";
    type RequestParams = QueryGlobalStateParams;
    type ResponseResult = QueryGlobalStateResult;
}

/// Options for dictionary item lookups.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub enum DictionaryIdentifier {
    /// Lookup a dictionary item via an Account's named keys.
    AccountNamedKey {
        /// The account key as a formatted string whose named keys contains dictionary_name.
        key: String,
        /// The named key under which the dictionary seed URef is stored.
        dictionary_name: String,
        /// The dictionary item key formatted as a string.
        dictionary_item_key: String,
    },
    /// Lookup a dictionary item via a Contract's named keys.
    ContractNamedKey {
        /// The contract key as a formatted string whose named keys contains dictionary_name.
        key: String,
        /// The named key under which the dictionary seed URef is stored.
        dictionary_name: String,
        /// The dictionary item key formatted as a string.
        dictionary_item_key: String,
    },
    /// Lookup a dictionary item via its seed URef.
    URef {
        /// The dictionary's seed URef.
        seed_uref: String,
        /// The dictionary item key formatted as a string.
        dictionary_item_key: String,
    },
    /// Lookup a dictionary item via its unique key.
    Dictionary(String),
}

/// Params for "state_get_dictionary_item" RPC request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GetDictionaryItemParams {
    /// Hash of the state root
    pub state_root_hash: Digest,
    /// The Dictionary query identifier.
    pub dictionary_identifier: DictionaryIdentifier,
}

/// Result for "state_get_dictionary_item" RPC response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GetDictionaryItemResult {
    /// The RPC API version.
    pub api_version: String,
    /// The key under which the value is stored.
    pub dictionary_key: String,
    /// The stored value.
    pub stored_value: Value,
    /// The Merkle proof.
    pub merkle_proof: String,
}

/// "state_get_dictionary_item" RPC.
pub struct GetDictionaryItem {}

impl RpcWithParams for GetDictionaryItem {
    const METHOD: &'static str = "state_get_dictionary_item";
    type RequestParams = GetDictionaryItemParams;
    type ResponseResult = GetDictionaryItemResult;
}

/// Params for "state_get_auction_info" RPC request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GetAuctionInfoParams {
    /// The block identifier.
    pub block_identifier: BlockIdentifier,
}

/// Result for "state_get_auction_info" RPC response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GetAuctionInfoResult {
    /// The RPC API version.
    pub api_version: String,
    /// The auction state.
    pub auction_state: Value,
}

/// "state_get_auction_info" RPC.
pub struct GetAuctionInfo {}

impl RpcWithOptionalParams for GetAuctionInfo {
    const METHOD: &'static str = "state_get_auction_info";
    type OptionalRequestParams = GetAuctionInfoParams;
    type ResponseResult = GetAuctionInfoResult;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn account_identifier_should_accept_both_forms() {
        let public_key = PublicKey::Ed25519([4; 32]);
        let by_key: AccountIdentifier = serde_json::from_value(json!(public_key.to_hex())).unwrap();
        assert_eq!(by_key, AccountIdentifier::PublicKey(public_key));

        let account_hash = public_key.to_account_hash();
        let by_hash: AccountIdentifier =
            serde_json::from_value(json!(account_hash.to_formatted_string())).unwrap();
        assert_eq!(by_hash, AccountIdentifier::AccountHash(account_hash));
    }

    #[test]
    fn dictionary_identifier_should_use_external_tags() {
        let identifier = DictionaryIdentifier::URef {
            seed_uref: "uref-0101010101010101010101010101010101010101010101010101010101010101-007"
                .to_string(),
            dictionary_item_key: "alice".to_string(),
        };
        let value = serde_json::to_value(identifier).unwrap();
        assert_eq!(value["URef"]["dictionary_item_key"], "alice");
    }

    #[test]
    fn account_should_decode_from_node_json() {
        let account_hash = PublicKey::Ed25519([4; 32]).to_account_hash();
        let account: Account = serde_json::from_value(json!({
            "account_hash": account_hash.to_formatted_string(),
            "named_keys": [{"name": "counter", "key": "hash-0202020202020202020202020202020202020202020202020202020202020202"}],
            "main_purse": "uref-0303030303030303030303030303030303030303030303030303030303030303-007",
            "associated_keys": [{"account_hash": account_hash.to_formatted_string(), "weight": 1}],
            "action_thresholds": {"deployment": 1, "key_management": 1}
        }))
        .unwrap();
        assert_eq!(account.account_hash, account_hash);
        assert_eq!(account.named_keys[0].name, "counter");
        assert_eq!(account.associated_keys[0].weight, 1);
    }
}
