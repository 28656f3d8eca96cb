use std::{convert::TryFrom, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Default JSON-RPC endpoint of a locally running node.
const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:7777/rpc";
/// Default timeout of a single HTTP attempt.
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
/// Default number of retries after the first attempt fails at the transport level.
const DEFAULT_MAX_RETRIES: usize = 3;
/// Default maximum number of requests in flight per client.
const DEFAULT_REQUEST_LIMIT: u16 = 32;
/// Default initial backoff unit. Together with the default coefficient this yields a delay of
/// `2^n` seconds before retry attempt `n`.
const DEFAULT_EXPONENTIAL_BACKOFF_BASE_MS: u64 = 1000;
/// Default maximum backoff delay.
const DEFAULT_EXPONENTIAL_BACKOFF_MAX_MS: u64 = 64_000;
/// Default exponential backoff coefficient.
const DEFAULT_EXPONENTIAL_BACKOFF_COEFFICIENT: u64 = 2;

#[derive(Error, Debug)]
pub enum FieldParseError {
    #[error("failed to parse field {} with error: {}", .field_name, .error)]
    ParseError {
        field_name: &'static str,
        error: String,
    },
}

/// Settings of a [`JsonRpcNodeClient`](crate::JsonRpcNodeClient).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RpcClientConfig {
    /// URL requests are POSTed to.
    pub endpoint: Url,
    /// Timeout of a single HTTP attempt.
    pub request_timeout_ms: u64,
    /// How many times a call is re-sent after a transport failure.
    pub max_retries: usize,
    /// Maximum number of calls in flight at once.
    pub request_limit: u16,
    /// Delays between retries.
    pub exponential_backoff: ExponentialBackoffConfig,
}

impl RpcClientConfig {
    /// Default settings pointed at `endpoint`.
    pub fn new(endpoint: Url) -> Self {
        RpcClientConfig {
            endpoint,
            ..Default::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    #[cfg(test)]
    pub(crate) fn new_with_retries(endpoint: Url, max_retries: usize) -> Self {
        RpcClientConfig {
            endpoint,
            request_timeout_ms: 1_000,
            max_retries,
            request_limit: DEFAULT_REQUEST_LIMIT,
            exponential_backoff: ExponentialBackoffConfig::default(),
        }
    }
}

impl Default for RpcClientConfig {
    fn default() -> Self {
        RpcClientConfig {
            endpoint: default_endpoint(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            request_limit: DEFAULT_REQUEST_LIMIT,
            exponential_backoff: ExponentialBackoffConfig::default(),
        }
    }
}

fn default_endpoint() -> Url {
    match Url::parse(DEFAULT_ENDPOINT) {
        Ok(url) => url,
        Err(error) => unreachable!("default endpoint {DEFAULT_ENDPOINT} is valid: {error}"),
    }
}

/// Serialized form of [`RpcClientConfig`] as it appears in config files.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
// Disallow unknown fields to ensure config files and command-line overrides contain valid keys.
#[serde(deny_unknown_fields)]
pub struct RpcClientConfigTarget {
    #[serde(default = "default_endpoint_string")]
    pub endpoint: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    #[serde(default = "default_request_limit")]
    pub request_limit: u16,
    #[serde(default)]
    pub exponential_backoff: ExponentialBackoffConfig,
}

fn default_endpoint_string() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_max_retries() -> usize {
    DEFAULT_MAX_RETRIES
}

fn default_request_limit() -> u16 {
    DEFAULT_REQUEST_LIMIT
}

impl Default for RpcClientConfigTarget {
    fn default() -> Self {
        RpcClientConfigTarget {
            endpoint: default_endpoint_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            request_limit: DEFAULT_REQUEST_LIMIT,
            exponential_backoff: ExponentialBackoffConfig::default(),
        }
    }
}

impl TryFrom<RpcClientConfigTarget> for RpcClientConfig {
    type Error = FieldParseError;
    fn try_from(value: RpcClientConfigTarget) -> Result<Self, Self::Error> {
        let endpoint = Url::parse(&value.endpoint).map_err(|e| FieldParseError::ParseError {
            field_name: "endpoint",
            error: e.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(FieldParseError::ParseError {
                field_name: "endpoint",
                error: format!("unsupported scheme '{}'", endpoint.scheme()),
            });
        }
        if value.request_limit == 0 {
            return Err(FieldParseError::ParseError {
                field_name: "request_limit",
                error: "must be greater than 0".to_string(),
            });
        }
        let exponential_backoff =
            value
                .exponential_backoff
                .validate()
                .map_err(|e| FieldParseError::ParseError {
                    field_name: "exponential_backoff",
                    error: e.to_string(),
                })?;
        Ok(RpcClientConfig {
            endpoint,
            request_timeout_ms: value.request_timeout_ms,
            max_retries: value.max_retries,
            request_limit: value.request_limit,
            exponential_backoff,
        })
    }
}

/// Exponential backoff configuration for retries.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
// Disallow unknown fields to ensure config files and command-line overrides contain valid keys.
#[serde(deny_unknown_fields)]
pub struct ExponentialBackoffConfig {
    /// Delay unit; the wait before retry `n` is this value times `coefficient^n`.
    pub initial_delay_ms: u64,
    /// Maximum wait time between attempts.
    pub max_delay_ms: u64,
    /// The multiplier to apply to the previous delay to get the next delay.
    pub coefficient: u64,
}

impl Default for ExponentialBackoffConfig {
    fn default() -> Self {
        ExponentialBackoffConfig {
            initial_delay_ms: DEFAULT_EXPONENTIAL_BACKOFF_BASE_MS,
            max_delay_ms: DEFAULT_EXPONENTIAL_BACKOFF_MAX_MS,
            coefficient: DEFAULT_EXPONENTIAL_BACKOFF_COEFFICIENT,
        }
    }
}

impl ExponentialBackoffConfig {
    fn validate(self) -> Result<Self, FieldParseError> {
        if self.coefficient == 0 {
            return Err(FieldParseError::ParseError {
                field_name: "coefficient",
                error: "must be greater than 0".to_string(),
            });
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(FieldParseError::ParseError {
                field_name: "max_delay_ms",
                error: format!(
                    "{} is less than initial_delay_ms {}",
                    self.max_delay_ms, self.initial_delay_ms
                ),
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryInto;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_should_fill_in_defaults() {
        let target: RpcClientConfigTarget =
            serde_json::from_str(r#"{"endpoint": "http://node:7777/rpc"}"#).unwrap();
        let config: RpcClientConfig = target.try_into().unwrap();
        assert_eq!(config.endpoint.as_str(), "http://node:7777/rpc");
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.request_limit, DEFAULT_REQUEST_LIMIT);
        assert_eq!(config.exponential_backoff, ExponentialBackoffConfig::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_should_reject_unknown_fields() {
        let result = serde_json::from_str::<RpcClientConfigTarget>(r#"{"retries": 3}"#);
        assert!(result.is_err());
        let result = serde_json::from_str::<ExponentialBackoffConfig>(
            r#"{"initial_delay_ms": 1, "max_delay_ms": 2, "coefficient": 2, "jitter": true}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_should_reject_bad_endpoint() {
        let target = RpcClientConfigTarget {
            endpoint: "not a url".to_string(),
            ..Default::default()
        };
        let error = RpcClientConfig::try_from(target).unwrap_err();
        assert!(error.to_string().contains("endpoint"));

        let target = RpcClientConfigTarget {
            endpoint: "ftp://node/rpc".to_string(),
            ..Default::default()
        };
        assert!(RpcClientConfig::try_from(target).is_err());
    }

    #[test]
    fn test_should_reject_inverted_backoff_bounds() {
        let target = RpcClientConfigTarget {
            exponential_backoff: ExponentialBackoffConfig {
                initial_delay_ms: 5_000,
                max_delay_ms: 1_000,
                coefficient: 2,
            },
            ..Default::default()
        };
        let error = RpcClientConfig::try_from(target).unwrap_err();
        assert!(error.to_string().contains("max_delay_ms"));
    }

    #[test]
    fn test_default_target_matches_default_config() {
        let config: RpcClientConfig = RpcClientConfigTarget::default().try_into().unwrap();
        assert_eq!(config, RpcClientConfig::default());
    }
}
