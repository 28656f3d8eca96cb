use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::transport::{JsonRpcRequest, JsonRpcResponse, RpcErrorObject, Transport, TransportError};

/// What a [`MockTransport`] does with the next request it receives.
#[derive(Clone, Debug)]
pub(crate) enum ScriptedResponse {
    /// Answers with a result.
    Result(Value),
    /// Answers with a JSON-RPC error object.
    RpcError(i64, String),
    /// Fails without a response.
    TransportError(TransportError),
    /// Answers with a result under an id that does not match the request.
    WrongId(Value),
    /// Never answers.
    Hang,
}

/// An in-process [`Transport`] that replays a script and records every request it is given.
pub(crate) struct MockTransport {
    script: Mutex<VecDeque<ScriptedResponse>>,
    fallback: Option<ScriptedResponse>,
    requests: Mutex<Vec<JsonRpcRequest>>,
}

impl MockTransport {
    /// Replays `script` in order; requests beyond its end fail at the transport level.
    pub(crate) fn new(script: Vec<ScriptedResponse>) -> Self {
        MockTransport {
            script: Mutex::new(script.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers every request with `result`.
    pub(crate) fn echoing(result: Value) -> Self {
        MockTransport {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(ScriptedResponse::Result(result)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<JsonRpcRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_step(&self) -> Option<ScriptedResponse> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.next_step() {
            Some(ScriptedResponse::Result(result)) => {
                Ok(JsonRpcResponse::success(request.id, result))
            }
            Some(ScriptedResponse::RpcError(code, message)) => Ok(JsonRpcResponse::failure(
                request.id,
                RpcErrorObject {
                    code,
                    message,
                    data: None,
                },
            )),
            Some(ScriptedResponse::TransportError(error)) => Err(error),
            Some(ScriptedResponse::WrongId(result)) => {
                Ok(JsonRpcResponse::success(request.id + 1_000_000, result))
            }
            Some(ScriptedResponse::Hang) => futures::future::pending().await,
            None => Err(TransportError::Connection("mock script exhausted".to_string())),
        }
    }
}

/// Returns a port nothing is listening on.
pub(crate) fn get_port() -> u16 {
    portpicker::pick_unused_port().unwrap()
}
