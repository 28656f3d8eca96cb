//! RPCs related to accounts.

use serde::{Deserialize, Serialize};

use casper_deploy_types::{Deploy, DeployHash};

use super::RpcWithParams;

/// Params for "account_put_deploy" RPC request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PutDeployParams {
    /// The `Deploy`.
    pub deploy: Deploy,
}

/// Result for "account_put_deploy" RPC response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PutDeployResult {
    /// The RPC API version.
    pub api_version: String,
    /// The deploy hash.
    pub deploy_hash: DeployHash,
}

/// "account_put_deploy" RPC.
pub struct PutDeploy {}

impl RpcWithParams for PutDeploy {
    const METHOD: &'static str = "account_put_deploy";
    type RequestParams = PutDeployParams;
    type ResponseResult = PutDeployResult;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use casper_deploy_types::{signer::SigningProvider, testing, DeploySigner, Ed25519KeyPair};

    use super::*;

    #[test]
    fn params_should_carry_the_deploy_in_wire_form() {
        let key_pair = Ed25519KeyPair::from_secret_bytes([3; 32]);
        let deploy = DeploySigner::default()
            .sign(&testing::unsigned_deploy(&key_pair), &key_pair)
            .unwrap();
        let params = serde_json::to_value(PutDeployParams {
            deploy: deploy.clone(),
        })
        .unwrap();

        let wire = &params["deploy"];
        assert_eq!(wire["hash"], deploy.hash().to_string());
        assert_eq!(wire["header"]["account"], key_pair.public_key().to_hex());
        assert_eq!(wire["header"]["chain_name"], "casper-test");
        assert_eq!(wire["header"]["timestamp"], "2020-11-17T00:39:24.072Z");
        assert_eq!(wire["header"]["ttl"], "30m");
        assert_eq!(wire["approvals"][0]["signer"], key_pair.public_key().to_hex());
        assert!(wire["session"]["Transfer"]["args"].is_array());
    }
}
