use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use casper_deploy_types::{AccountHash, Deploy, DeployHash, Digest, PublicKey};
use metrics::rpc::{inc_method_call, inc_retry, inc_transport_failure, observe_response_time};

use crate::{
    error::display_error,
    retry::{AttemptOutcome, RetryPolicy, RetryState},
    rpcs::{
        self,
        account::{PutDeploy, PutDeployParams},
        chain::{
            GetBlock, GetBlockParams, GetBlockResult, GetStateRootHash, GetStateRootHashParams,
        },
        info::{
            GetChainspec, GetChainspecResult, GetDeploy, GetDeployParams, GetDeployResult,
            GetPeers, GetPeersResult, GetStatus, GetStatusResult,
        },
        state::{
            AccountIdentifier, DictionaryIdentifier, GetAccountInfo, GetAccountInfoParams,
            GetAccountInfoResult, GetAuctionInfo, GetAuctionInfoParams, GetAuctionInfoResult,
            GetBalance, GetBalanceParams, GetBalanceResult, GetDictionaryItem,
            GetDictionaryItemParams, GetDictionaryItemResult, QueryGlobalState,
            QueryGlobalStateParams, QueryGlobalStateResult,
        },
        BlockIdentifier, DeployStatus, GlobalStateIdentifier,
    },
    transport::{HttpTransport, JsonRpcRequest, JsonRpcResponse, Transport, TransportError},
    Error, RpcClientConfig,
};

/// A client of a node's JSON-RPC API.
///
/// Implementors only provide [`NodeClient::send_request`]; every typed call is built on it.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Sends `method` with `params` (an empty object when `None`) and returns the raw result.
    async fn send_request(&self, method: &str, params: Option<Value>) -> Result<Value, Error>;

    async fn get_block(
        &self,
        block_identifier: Option<BlockIdentifier>,
    ) -> Result<Option<GetBlockResult>, Error> {
        let params = block_identifier.map(|block_identifier| GetBlockParams { block_identifier });
        let result = rpcs::call_with_optional_params::<GetBlock, _>(self, params).await;
        Ok(rpcs::not_found_as_none(result)?.filter(|result| result.block.is_some()))
    }

    async fn get_state_root_hash(
        &self,
        block_identifier: Option<BlockIdentifier>,
    ) -> Result<Option<Digest>, Error> {
        let params =
            block_identifier.map(|block_identifier| GetStateRootHashParams { block_identifier });
        let result = rpcs::call_with_optional_params::<GetStateRootHash, _>(self, params).await;
        Ok(rpcs::not_found_as_none(result)?.and_then(|result| result.state_root_hash))
    }

    async fn get_status(&self) -> Result<GetStatusResult, Error> {
        rpcs::call_without_params::<GetStatus, _>(self).await
    }

    async fn get_peers(&self) -> Result<GetPeersResult, Error> {
        rpcs::call_without_params::<GetPeers, _>(self).await
    }

    async fn get_chainspec(&self) -> Result<GetChainspecResult, Error> {
        rpcs::call_without_params::<GetChainspec, _>(self).await
    }

    async fn get_deploy(&self, deploy_hash: DeployHash) -> Result<Option<GetDeployResult>, Error> {
        let params = GetDeployParams::new(deploy_hash);
        rpcs::not_found_as_none(rpcs::call_with_params::<GetDeploy, _>(self, params).await)
    }

    /// Submits `deploy`, returning the hash the node accepted it under.
    async fn put_deploy(&self, deploy: Deploy) -> Result<DeployHash, Error> {
        let params = PutDeployParams { deploy };
        let result = rpcs::call_with_params::<PutDeploy, _>(self, params).await?;
        Ok(result.deploy_hash)
    }

    async fn get_account_info(
        &self,
        account_identifier: AccountIdentifier,
        block_identifier: Option<BlockIdentifier>,
    ) -> Result<Option<GetAccountInfoResult>, Error> {
        let params = GetAccountInfoParams {
            account_identifier,
            block_identifier,
        };
        rpcs::not_found_as_none(rpcs::call_with_params::<GetAccountInfo, _>(self, params).await)
    }

    async fn get_account_info_by_public_key(
        &self,
        public_key: PublicKey,
    ) -> Result<Option<GetAccountInfoResult>, Error> {
        self.get_account_info(AccountIdentifier::PublicKey(public_key), None)
            .await
    }

    async fn get_account_info_by_hash(
        &self,
        account_hash: AccountHash,
    ) -> Result<Option<GetAccountInfoResult>, Error> {
        self.get_account_info(AccountIdentifier::AccountHash(account_hash), None)
            .await
    }

    async fn get_balance(
        &self,
        state_root_hash: Digest,
        purse_uref: String,
    ) -> Result<GetBalanceResult, Error> {
        let params = GetBalanceParams {
            state_root_hash,
            purse_uref,
        };
        rpcs::call_with_params::<GetBalance, _>(self, params).await
    }

    async fn query_global_state(
        &self,
        state_identifier: Option<GlobalStateIdentifier>,
        key: String,
        path: Vec<String>,
    ) -> Result<QueryGlobalStateResult, Error> {
        let params = QueryGlobalStateParams {
            state_identifier,
            key,
            path,
        };
        rpcs::call_with_params::<QueryGlobalState, _>(self, params).await
    }

    async fn get_dictionary_item(
        &self,
        state_root_hash: Digest,
        dictionary_identifier: DictionaryIdentifier,
    ) -> Result<GetDictionaryItemResult, Error> {
        let params = GetDictionaryItemParams {
            state_root_hash,
            dictionary_identifier,
        };
        rpcs::call_with_params::<GetDictionaryItem, _>(self, params).await
    }

    async fn get_auction_info(
        &self,
        block_identifier: Option<BlockIdentifier>,
    ) -> Result<GetAuctionInfoResult, Error> {
        let params =
            block_identifier.map(|block_identifier| GetAuctionInfoParams { block_identifier });
        rpcs::call_with_optional_params::<GetAuctionInfo, _>(self, params).await
    }

    /// Where `deploy_hash` stands, with unknown deploys reported as [`DeployStatus::NotFound`].
    async fn get_deploy_status(&self, deploy_hash: DeployHash) -> Result<DeployStatus, Error> {
        Ok(match self.get_deploy(deploy_hash).await? {
            None => DeployStatus::NotFound,
            Some(result) => DeployStatus::from_execution_results(&result.execution_results),
        })
    }

    /// Polls every `poll_interval` until the deploy is executed, or fails with
    /// [`Error::Timeout`] once `timeout` has passed.
    async fn wait_for_deploy(
        &self,
        deploy_hash: DeployHash,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<DeployStatus, Error> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let status = self.get_deploy_status(deploy_hash).await?;
            if status.is_final() {
                return Ok(status);
            }
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Err(Error::Timeout {
                    deploy_hash,
                    waited: timeout,
                    last_status: status,
                });
            }
            debug!(%deploy_hash, %status, "deploy not executed yet");
            tokio::time::sleep(poll_interval.min(deadline - now)).await;
        }
    }

    /// Whether the node answers a status query.
    async fn is_reachable(&self) -> bool {
        match self.get_status().await {
            Ok(_) => true,
            Err(err) => {
                warn!(err = display_error(&err), "node is not reachable");
                false
            }
        }
    }
}

/// A [`NodeClient`] speaking JSON-RPC over a [`Transport`], with retries and a cap on the
/// number of requests in flight.
pub struct JsonRpcNodeClient<T = HttpTransport> {
    transport: T,
    retry_policy: RetryPolicy,
    next_id: AtomicU64,
    request_limit: Semaphore,
}

impl JsonRpcNodeClient<HttpTransport> {
    /// A client POSTing to `config.endpoint`.
    pub fn new(config: RpcClientConfig) -> Result<Self, Error> {
        let transport = HttpTransport::new(config.endpoint.clone(), config.request_timeout())
            .map_err(|err| Error::RequestFailed(err.to_string()))?;
        Ok(Self::with_transport(transport, &config))
    }
}

impl<T: Transport> JsonRpcNodeClient<T> {
    /// A client sending through `transport`.
    ///
    /// A `request_limit` of 0 would never admit a request, so it is raised to 1.
    pub fn with_transport(transport: T, config: &RpcClientConfig) -> Self {
        if config.request_limit == 0 {
            warn!("request_limit of 0 raised to 1");
        }
        JsonRpcNodeClient {
            transport,
            retry_policy: RetryPolicy::new(
                config.max_retries,
                config.exponential_backoff.clone(),
            ),
            next_id: AtomicU64::new(1),
            request_limit: Semaphore::new(usize::from(config.request_limit.max(1))),
        }
    }

    /// The transport requests go through.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Like [`NodeClient::send_request`], but gives up with [`Error::Cancelled`] as soon as
    /// `cancellation_token` is cancelled. The attempt in flight is dropped, closing its
    /// connection.
    pub async fn send_request_with_cancellation(
        &self,
        method: &str,
        params: Option<Value>,
        cancellation_token: CancellationToken,
    ) -> Result<Value, Error> {
        let id = self.next_id();
        tokio::select! {
            biased;
            _ = cancellation_token.cancelled() => {
                info!(method, id, "request cancelled");
                metrics::observe_error("cancelled", method);
                Err(Error::Cancelled {
                    method: method.to_string(),
                    id,
                })
            }
            result = self.send_with_id(id, method, params) => result,
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn send_with_id(
        &self,
        id: u64,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, Error> {
        inc_method_call(method);
        let start = Instant::now();
        let result = self.drive(JsonRpcRequest::new(id, method, params)).await;
        let status = match &result {
            Ok(_) => "success",
            Err(err) => {
                metrics::observe_error(err.kind().as_str(), method);
                err.kind().as_str()
            }
        };
        observe_response_time(method, status, start.elapsed());
        result
    }

    async fn drive(&self, request: JsonRpcRequest) -> Result<Value, Error> {
        let method = request.method.as_str();
        let id = request.id;
        let mut state = RetryState::Pending;
        loop {
            state = match state {
                RetryState::Pending | RetryState::TransportFailed { .. } => {
                    if matches!(state, RetryState::TransportFailed { .. }) {
                        inc_retry(method);
                    }
                    let delay = state
                        .delay_before_next(&self.retry_policy)
                        .unwrap_or_default();
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    state.send()
                }
                RetryState::Sent { attempt } => {
                    // Only attempts in flight count against the limit, not backoff sleeps.
                    let permit = self
                        .request_limit
                        .acquire()
                        .await
                        .map_err(|err| Error::RequestFailed(err.to_string()))?;
                    debug!(method, id, attempt, "sending request");
                    let outcome = self.attempt(&request).await;
                    drop(permit);
                    if let AttemptOutcome::TransportFailed(err) = &outcome {
                        inc_transport_failure();
                        warn!(
                            method,
                            id,
                            attempt,
                            max_retries = self.retry_policy.max_retries(),
                            err = display_error(err),
                            "request attempt failed"
                        );
                    }
                    RetryState::Sent { attempt }.record(outcome, &self.retry_policy)
                }
                RetryState::Succeeded { result, .. } => return Ok(result),
                RetryState::ProtocolFailed { attempts, error } => {
                    debug!(method, id, attempts, %error, "node rejected request");
                    return Err(Error::Rpc {
                        method: method.to_string(),
                        id,
                        error,
                    });
                }
                RetryState::Exhausted { attempts, error } => {
                    return Err(Error::NetworkFailure {
                        method: method.to_string(),
                        id,
                        attempts,
                        source: error,
                    });
                }
            };
        }
    }

    async fn attempt(&self, request: &JsonRpcRequest) -> AttemptOutcome {
        match self.transport.send(request).await {
            Ok(JsonRpcResponse { id, .. }) if id != request.id => {
                AttemptOutcome::TransportFailed(TransportError::IdMismatch {
                    expected: request.id,
                    got: id,
                })
            }
            Ok(JsonRpcResponse {
                outcome: Ok(result),
                ..
            }) => AttemptOutcome::Succeeded(result),
            Ok(JsonRpcResponse {
                outcome: Err(error),
                ..
            }) => AttemptOutcome::ProtocolFailed(error),
            Err(err) => AttemptOutcome::TransportFailed(err),
        }
    }
}

#[async_trait]
impl<T: Transport> NodeClient for JsonRpcNodeClient<T> {
    async fn send_request(&self, method: &str, params: Option<Value>) -> Result<Value, Error> {
        let id = self.next_id();
        self.send_with_id(id, method, params).await
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Arc};

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use url::Url;

    use casper_deploy_types::{testing, DeploySigner, Ed25519KeyPair};

    use super::*;
    use crate::{
        rpcs::ErrorCode,
        testing::{get_port, MockTransport, ScriptedResponse},
        ErrorKind, ExponentialBackoffConfig,
    };

    fn client_with(transport: MockTransport, max_retries: usize) -> JsonRpcNodeClient<MockTransport> {
        let config = RpcClientConfig::new_with_retries(
            Url::parse("http://127.0.0.1:7777/rpc").unwrap(),
            max_retries,
        );
        JsonRpcNodeClient::with_transport(transport, &config)
    }

    fn refused() -> ScriptedResponse {
        ScriptedResponse::TransportError(TransportError::Connection("refused".to_string()))
    }

    fn status_json() -> Value {
        json!({
            "api_version": "1.5.6",
            "chainspec_name": "casper-test",
            "peers": [],
            "last_added_block_info": null,
            "build_version": "1.5.6-a1b2c3d",
            "uptime": "2days 3h"
        })
    }

    fn signed_deploy() -> Deploy {
        let key_pair = Ed25519KeyPair::from_secret_bytes([9; 32]);
        DeploySigner::default()
            .sign(&testing::unsigned_deploy(&key_pair), &key_pair)
            .unwrap()
    }

    fn deploy_json(deploy: &Deploy, execution_results: Value) -> Value {
        json!({
            "api_version": "1.5.6",
            "deploy": deploy,
            "execution_results": execution_results,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn should_retry_transport_failures_with_backoff() {
        let transport = MockTransport::new(vec![
            refused(),
            refused(),
            refused(),
            refused(),
        ]);
        let client = client_with(transport, 3);

        let started = tokio::time::Instant::now();
        let error = client.send_request("info_get_status", None).await.unwrap_err();

        match &error {
            Error::NetworkFailure {
                method,
                attempts,
                source,
                ..
            } => {
                assert_eq!(method, "info_get_status");
                assert_eq!(*attempts, 4);
                assert_eq!(*source, TransportError::Connection("refused".to_string()));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(error.kind(), ErrorKind::Transport);
        assert_eq!(client.transport().requests().len(), 4);
        // 2s + 4s + 8s
        assert_eq!(started.elapsed(), Duration::from_secs(14));
    }

    #[tokio::test(start_paused = true)]
    async fn should_reuse_the_id_across_retries() {
        let transport = MockTransport::new(vec![
            refused(),
            ScriptedResponse::Result(json!("pong")),
        ]);
        let client = client_with(transport, 1);

        let result = client.send_request("info_get_status", None).await.unwrap();

        assert_eq!(result, json!("pong"));
        let ids: Vec<u64> = client
            .transport()
            .requests()
            .iter()
            .map(|request| request.id)
            .collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], ids[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_retry_protocol_failures() {
        let transport = MockTransport::new(vec![
            ScriptedResponse::RpcError(ErrorCode::InvalidDeploy as i64, "invalid deploy".into()),
            ScriptedResponse::Result(json!("never sent")),
        ]);
        let client = client_with(transport, 5);

        let started = tokio::time::Instant::now();
        let error = client
            .send_request("account_put_deploy", Some(json!({})))
            .await
            .unwrap_err();

        assert!(matches!(
            &error,
            Error::Rpc { method, error, .. }
                if method == "account_put_deploy" && error.code == ErrorCode::InvalidDeploy as i64
        ));
        assert_eq!(error.kind(), ErrorKind::Protocol);
        assert_eq!(client.transport().requests().len(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn should_treat_mismatched_ids_as_transport_failures() {
        let transport = MockTransport::new(vec![
            ScriptedResponse::WrongId(json!("stale")),
            ScriptedResponse::Result(json!("fresh")),
        ]);
        let client = client_with(transport, 1);
        let result = client.send_request("info_get_peers", None).await.unwrap();
        assert_eq!(result, json!("fresh"));
    }

    #[tokio::test]
    async fn should_send_empty_params_object() {
        let transport = MockTransport::new(vec![ScriptedResponse::Result(status_json())]);
        let client = client_with(transport, 0);

        let status = client.get_status().await.unwrap();

        assert_eq!(status.chainspec_name, "casper-test");
        let request = &client.transport().requests()[0];
        assert_eq!(request.method, "info_get_status");
        assert_eq!(request.params, json!({}));
        assert_eq!(request.jsonrpc, "2.0");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_should_get_distinct_ids() {
        let transport = MockTransport::echoing(json!(null));
        let client = Arc::new(client_with(transport, 0));

        let calls = (0..1_000).map(|_| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.send_request("info_get_status", None).await })
        });
        for result in futures::future::join_all(calls).await {
            result.unwrap().unwrap();
        }

        let ids: HashSet<u64> = client
            .transport()
            .requests()
            .iter()
            .map(|request| request.id)
            .collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_should_be_reported_distinctly() {
        let transport = MockTransport::new(vec![ScriptedResponse::Hang]);
        let client = client_with(transport, 3);
        let token = CancellationToken::new();

        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });
        let error = client
            .send_request_with_cancellation("info_get_status", None, token)
            .await
            .unwrap_err();

        assert!(matches!(error, Error::Cancelled { ref method, .. } if method == "info_get_status"));
        assert_eq!(error.kind(), ErrorKind::Cancelled);
        assert_eq!(client.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn already_cancelled_token_should_not_send() {
        let transport = MockTransport::new(vec![ScriptedResponse::Result(json!(1))]);
        let client = client_with(transport, 0);
        let token = CancellationToken::new();
        token.cancel();

        let error = client
            .send_request_with_cancellation("info_get_peers", None, token)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Cancelled);
        assert!(client.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn unknown_entities_should_not_be_errors() {
        let transport = MockTransport::new(vec![
            ScriptedResponse::RpcError(ErrorCode::NoSuchDeploy as i64, "no such deploy".into()),
            ScriptedResponse::RpcError(ErrorCode::NoSuchBlock as i64, "no such block".into()),
            ScriptedResponse::RpcError(ErrorCode::NoSuchAccount as i64, "no such account".into()),
            ScriptedResponse::RpcError(ErrorCode::NoSuchDeploy as i64, "no such deploy".into()),
        ]);
        let client = client_with(transport, 0);
        let deploy_hash = DeployHash::new(Digest::hash([1u8]));

        assert_eq!(client.get_deploy(deploy_hash).await.unwrap(), None);
        assert_eq!(client.get_block(None).await.unwrap(), None);
        assert_eq!(
            client
                .get_account_info_by_public_key(PublicKey::Ed25519([1; 32]))
                .await
                .unwrap(),
            None
        );
        assert_eq!(
            client.get_deploy_status(deploy_hash).await.unwrap(),
            DeployStatus::NotFound
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_follow_a_deploy_from_submission_to_execution() {
        let deploy = signed_deploy();
        let block_hash = Digest::hash([42u8]);
        let transport = MockTransport::new(vec![
            ScriptedResponse::Result(json!({
                "api_version": "1.5.6",
                "deploy_hash": deploy.hash(),
            })),
            ScriptedResponse::RpcError(ErrorCode::NoSuchDeploy as i64, "no such deploy".into()),
            ScriptedResponse::Result(deploy_json(&deploy, json!([]))),
            ScriptedResponse::Result(deploy_json(
                &deploy,
                json!([{
                    "block_hash": block_hash,
                    "result": {"Success": {"effect": {}, "transfers": [], "cost": "100000"}}
                }]),
            )),
        ]);
        let client = client_with(transport, 0);

        let deploy_hash = client.put_deploy(deploy.clone()).await.unwrap();
        assert_eq!(deploy_hash, *deploy.hash());

        let status = client
            .wait_for_deploy(
                deploy_hash,
                Duration::from_secs(1),
                Duration::from_secs(60),
            )
            .await
            .unwrap();
        assert_eq!(
            status,
            DeployStatus::Success {
                block_hash,
                cost: 100_000u64.into(),
            }
        );

        let requests = client.transport().requests();
        assert_eq!(requests[0].method, "account_put_deploy");
        assert_eq!(requests[0].params["deploy"]["hash"], json!(deploy.hash()));
        assert_eq!(requests.len(), 4);
        assert!(requests[1..]
            .iter()
            .all(|request| request.method == "info_get_deploy"));
    }

    #[tokio::test(start_paused = true)]
    async fn should_report_failed_execution() {
        let deploy = signed_deploy();
        let transport = MockTransport::new(vec![
            ScriptedResponse::Result(deploy_json(&deploy, json!([]))),
            ScriptedResponse::Result(deploy_json(
                &deploy,
                json!([{
                    "block_hash": Digest::hash([1u8]),
                    "result": {"Failure": {"cost": "7", "error_message": "User error: 1"}}
                }]),
            )),
        ]);
        let client = client_with(transport, 0);

        let status = client
            .wait_for_deploy(*deploy.hash(), Duration::from_secs(5), Duration::from_secs(60))
            .await
            .unwrap();
        assert!(matches!(
            status,
            DeployStatus::Failed { ref error_message, .. } if error_message == "User error: 1"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_should_time_out_while_pending() {
        let deploy = signed_deploy();
        let transport = MockTransport::echoing(deploy_json(&deploy, json!([])));
        let client = client_with(transport, 0);

        let error = client
            .wait_for_deploy(*deploy.hash(), Duration::from_secs(2), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            Error::Timeout {
                last_status: DeployStatus::Pending,
                ..
            }
        ));
        assert_eq!(error.kind(), ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn probe_should_reduce_failures_to_false() {
        let transport = MockTransport::new(vec![
            ScriptedResponse::Result(status_json()),
            refused(),
        ]);
        let client = client_with(transport, 0);
        assert!(client.is_reachable().await);
        assert!(!client.is_reachable().await);
    }

    #[tokio::test]
    async fn should_decode_typed_results() {
        let root = Digest::hash([5u8]);
        let transport = MockTransport::new(vec![
            ScriptedResponse::Result(json!({
                "api_version": "1.5.6",
                "state_root_hash": root,
            })),
            ScriptedResponse::Result(json!({
                "api_version": "1.5.6",
                "balance_value": "123456789000",
                "merkle_proof": "01000000",
            })),
            ScriptedResponse::Result(json!({"api_version": "1.5.6", "balance_value": 5})),
        ]);
        let client = client_with(transport, 0);

        assert_eq!(
            client
                .get_state_root_hash(Some(BlockIdentifier::Height(10)))
                .await
                .unwrap(),
            Some(root)
        );
        let balance = client
            .get_balance(root, "uref-00-007".to_string())
            .await
            .unwrap();
        assert_eq!(balance.balance_value, 123_456_789_000u64.into());

        let error = client
            .get_balance(root, "uref-00-007".to_string())
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Deserialization { ref method, .. } if method == "state_get_balance"));

        let requests = client.transport().requests();
        assert_eq!(requests[0].params, json!({"block_identifier": {"Height": 10}}));
        assert_eq!(
            requests[1].params,
            json!({"state_root_hash": root, "purse_uref": "uref-00-007"})
        );
    }

    #[tokio::test]
    async fn should_talk_to_an_http_node() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rpc")
            .match_body(mockito::Matcher::PartialJson(
                json!({"jsonrpc": "2.0", "id": 1, "method": "info_get_peers", "params": {}}),
            ))
            .with_status(200)
            .with_body(
                json!({"jsonrpc": "2.0", "id": 1, "result": {
                    "api_version": "1.5.6",
                    "peers": [{"node_id": "tls:0101..0101", "address": "127.0.0.1:35000"}]
                }})
                .to_string(),
            )
            .create_async()
            .await;

        let config = RpcClientConfig::new(Url::parse(&format!("{}/rpc", server.url())).unwrap());
        let client = JsonRpcNodeClient::new(config).unwrap();
        let peers = client.get_peers().await.unwrap();
        mock.assert_async().await;
        assert_eq!(peers.peers[0].address, "127.0.0.1:35000");
    }

    #[tokio::test]
    async fn should_give_up_on_a_closed_port() {
        let port = get_port();
        let config = RpcClientConfig {
            exponential_backoff: ExponentialBackoffConfig {
                initial_delay_ms: 5,
                max_delay_ms: 50,
                coefficient: 2,
            },
            ..RpcClientConfig::new_with_retries(
                Url::parse(&format!("http://127.0.0.1:{}/rpc", port)).unwrap(),
                2,
            )
        };
        let client = JsonRpcNodeClient::new(config).unwrap();

        let error = client.send_request("info_get_status", None).await.unwrap_err();
        assert!(matches!(
            error,
            Error::NetworkFailure {
                attempts: 3,
                source: TransportError::Connection(_),
                ..
            }
        ));
        assert!(!client.is_reachable().await);
    }

    #[tokio::test]
    async fn zero_request_limit_should_still_admit_requests() {
        let config = RpcClientConfig {
            request_limit: 0,
            ..RpcClientConfig::new_with_retries(
                Url::parse("http://127.0.0.1:7777/rpc").unwrap(),
                0,
            )
        };
        let client =
            JsonRpcNodeClient::with_transport(MockTransport::echoing(json!("ok")), &config);

        let result = tokio::time::timeout(
            Duration::from_secs(2),
            client.send_request("info_get_status", None),
        )
        .await
        .expect("request should not wait for a permit forever");
        assert_eq!(result.unwrap(), json!("ok"));
    }

    #[tokio::test(start_paused = true)]
    async fn backing_off_requests_should_not_hold_the_request_limit() {
        let config = RpcClientConfig {
            request_limit: 1,
            ..RpcClientConfig::new_with_retries(
                Url::parse("http://127.0.0.1:7777/rpc").unwrap(),
                1,
            )
        };
        let transport = MockTransport::new(vec![
            refused(),
            ScriptedResponse::Result(json!("second")),
            ScriptedResponse::Result(json!("first")),
        ]);
        let client = JsonRpcNodeClient::with_transport(transport, &config);

        let started = tokio::time::Instant::now();
        let (first, (second, second_elapsed)) = tokio::join!(
            client.send_request("info_get_status", None),
            async {
                let result = client.send_request("info_get_peers", None).await;
                (result, started.elapsed())
            },
        );

        assert_eq!(second.unwrap(), json!("second"));
        assert_eq!(second_elapsed, Duration::ZERO);
        assert_eq!(first.unwrap(), json!("first"));
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }
}
