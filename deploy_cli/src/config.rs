use std::{convert::TryInto, time::Duration};

use anyhow::{Context, Error};
use serde::Deserialize;

use casper_deploy_types::{DeployConfig, SignerConfig};
use casper_rpc_client::{RpcClientConfig, RpcClientConfigTarget};

const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;
const DEFAULT_WAIT_TIMEOUT_MS: u64 = 300_000;

pub fn read_config(config_path: &str) -> Result<Config, Error> {
    let toml_content =
        std::fs::read_to_string(config_path).context("Error reading config file contents")?;
    toml::from_str(&toml_content).context("Error parsing config into TOML format")
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
// Disallow unknown fields to ensure config files and command-line overrides contain valid keys.
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub rpc: RpcClientConfigTarget,
    #[serde(default)]
    pub deploy: DeployConfig,
    #[serde(default)]
    pub signer: SignerConfig,
    #[serde(default)]
    pub wait: WaitConfig,
}

impl Config {
    /// The RPC section, with an endpoint given on the command line taking precedence.
    pub fn rpc_client_config(&self, endpoint: Option<&str>) -> Result<RpcClientConfig, Error> {
        let mut target = self.rpc.clone();
        if let Some(endpoint) = endpoint {
            target.endpoint = endpoint.to_string();
        }
        target.try_into().context("Error in [rpc] config section")
    }
}

/// How `--wait` polls for execution results.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct WaitConfig {
    pub poll_interval_ms: u64,
    pub timeout_ms: u64,
}

impl WaitConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        WaitConfig {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
        }
    }
}
