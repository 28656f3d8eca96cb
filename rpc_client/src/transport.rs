//! The JSON-RPC 2.0 envelope and the transports that carry it.

use std::{
    fmt::{self, Display, Formatter},
    time::Duration,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::{error::ErrFormatter, rpcs::ErrorCode};

const JSON_RPC_VERSION: &str = "2.0";

/// A JSON-RPC 2.0 request. `params` is always sent, as an empty object when there are none.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: &str, params: Option<Value>) -> Self {
        JsonRpcRequest {
            jsonrpc: JSON_RPC_VERSION.to_string(),
            id,
            method: method.to_string(),
            params: params.unwrap_or_else(|| Value::Object(Map::new())),
        }
    }
}

/// The `error` member of a JSON-RPC response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcErrorObject {
    /// The node-specific meaning of `code`, if it has one.
    pub fn error_code(&self) -> Option<ErrorCode> {
        ErrorCode::from_code(self.code)
    }
}

impl Display for RpcErrorObject {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)?;
        if let Some(data) = &self.data {
            write!(f, ": {}", data)?;
        }
        Ok(())
    }
}

/// A decoded JSON-RPC response: the echoed id and either a result or an error object.
#[derive(Clone, Debug, PartialEq)]
pub struct JsonRpcResponse {
    pub id: u64,
    pub outcome: Result<Value, RpcErrorObject>,
}

impl JsonRpcResponse {
    pub fn success(id: u64, result: Value) -> Self {
        JsonRpcResponse {
            id,
            outcome: Ok(result),
        }
    }

    pub fn failure(id: u64, error: RpcErrorObject) -> Self {
        JsonRpcResponse {
            id,
            outcome: Err(error),
        }
    }

    /// Decodes a response envelope. A `null` result is a valid result; a response with neither
    /// `result` nor `error` is malformed.
    pub fn from_value(value: Value) -> Result<Self, TransportError> {
        let Value::Object(mut envelope) = value else {
            return Err(TransportError::MalformedResponse(
                "response is not a JSON object".to_string(),
            ));
        };
        if envelope.get("jsonrpc").and_then(Value::as_str) != Some(JSON_RPC_VERSION) {
            return Err(TransportError::MalformedResponse(
                "missing or unsupported 'jsonrpc' version".to_string(),
            ));
        }
        let id = envelope
            .get("id")
            .and_then(Value::as_u64)
            .ok_or_else(|| TransportError::MalformedResponse("missing numeric 'id'".to_string()))?;
        if let Some(error) = envelope.remove("error") {
            let error = serde_json::from_value(error).map_err(|err| {
                TransportError::MalformedResponse(format!("invalid error object: {}", err))
            })?;
            return Ok(JsonRpcResponse::failure(id, error));
        }
        match envelope.remove("result") {
            Some(result) => Ok(JsonRpcResponse::success(id, result)),
            None => Err(TransportError::MalformedResponse(
                "response has neither 'result' nor 'error'".to_string(),
            )),
        }
    }
}

/// Failures that happen before a JSON-RPC response is decoded. These are worth retrying.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("no response within {0:?}")]
    Timeout(Duration),
    #[error("http status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("response id {got} does not match request id {expected}")]
    IdMismatch { expected: u64, got: u64 },
}

/// Carries a single request to the node and brings back its response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse, TransportError>;
}

/// Posts requests to an HTTP(S) endpoint.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| TransportError::Connection(ErrFormatter(&err).to_string()))?;
        Ok(HttpTransport {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Connection(ErrFormatter(&err).to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|err| self.classify(err))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|err| self.classify(err))?;

        let decoded = serde_json::from_slice::<Value>(&body)
            .map_err(|err| TransportError::MalformedResponse(err.to_string()))
            .and_then(JsonRpcResponse::from_value);
        match decoded {
            Ok(response) => Ok(response),
            Err(_) if !status.is_success() => Err(TransportError::HttpStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            }),
            Err(err) => Err(err),
        }
    }
}
