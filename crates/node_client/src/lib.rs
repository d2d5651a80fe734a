use std::error::Error as StdError;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    domain::NodePort,
    error::{ErrorPayload, NodeFailure},
    protocol::{
        ChainResponse, MessageResponse, MineResponse, NewTransactionRequest,
        RegisterNodesRequest, RegisterNodesResponse, ResolveResponse,
    },
};
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_NODE_HOST: &str = "localhost";

const REGISTER_ENDPOINT: &str = "/nodes/register";
const NEW_TRANSACTION_ENDPOINT: &str = "/transactions/new";
const MINE_ENDPOINT: &str = "/mine";
const RESOLVE_ENDPOINT: &str = "/nodes/resolve";
const CHAIN_ENDPOINT: &str = "/chain";

/// Outcome of one node round trip. Node operations never return `Err`.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeReply<T> {
    Success(T),
    Failure(NodeFailure),
}

impl<T> NodeReply<T> {
    pub fn into_result(self) -> Result<T, NodeFailure> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(failure) => Err(failure),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> NodeReply<U> {
        match self {
            Self::Success(value) => NodeReply::Success(f(value)),
            Self::Failure(failure) => NodeReply::Failure(failure),
        }
    }
}

#[async_trait]
pub trait NodeApi: Send + Sync {
    async fn register_peers(
        &self,
        nodes: &[String],
        port: NodePort,
    ) -> NodeReply<RegisterNodesResponse>;
    async fn submit_transaction(
        &self,
        sender: &str,
        recipient: &str,
        amount: &str,
        port: NodePort,
    ) -> NodeReply<MessageResponse>;
    async fn mine(&self, port: NodePort) -> NodeReply<MineResponse>;
    async fn resolve_conflicts(&self, port: NodePort) -> NodeReply<ResolveResponse>;
    async fn fetch_chain(&self, port: NodePort) -> NodeReply<ChainResponse>;
    /// Base URL peers use to reach the node on `port`.
    fn node_url(&self, port: NodePort) -> String;
}

pub struct HttpNodeClient {
    http: Client,
    host: String,
}

impl HttpNodeClient {
    pub fn new(host: impl Into<String>) -> Self {
        Self::with_client(Client::new(), host)
    }

    pub fn with_client(http: Client, host: impl Into<String>) -> Self {
        Self {
            http,
            host: host.into(),
        }
    }

    pub fn endpoint(&self, port: NodePort, path: &str) -> Result<Url, NodeFailure> {
        Url::parse(&self.node_url(port))
            .and_then(|base| base.join(path))
            .map_err(|err| {
                NodeFailure::Transport(format!(
                    "invalid node address {}:{port}: {err}",
                    self.host
                ))
            })
    }

    async fn get<T: DeserializeOwned>(&self, port: NodePort, path: &'static str) -> NodeReply<T> {
        let url = match self.endpoint(port, path) {
            Ok(url) => url,
            Err(failure) => return NodeReply::Failure(failure),
        };
        self.round_trip(self.http.get(url), port, path).await
    }

    async fn post<B, T>(&self, port: NodePort, path: &'static str, body: &B) -> NodeReply<T>
    where
        B: serde::Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = match self.endpoint(port, path) {
            Ok(url) => url,
            Err(failure) => return NodeReply::Failure(failure),
        };
        self.round_trip(self.http.post(url).json(body), port, path).await
    }

    async fn round_trip<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        port: NodePort,
        endpoint: &'static str,
    ) -> NodeReply<T> {
        debug!(%port, endpoint, "sending node request");
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                let detail = describe_transport_error(&err);
                warn!(%port, endpoint, error = %detail, "node request failed");
                return NodeReply::Failure(NodeFailure::Transport(detail));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                let detail = describe_transport_error(&err);
                warn!(%port, endpoint, %status, error = %detail, "failed to read node response");
                return NodeReply::Failure(NodeFailure::Transport(detail));
            }
        };

        if !status.is_success() {
            let payload = ErrorPayload::from_body(&body);
            warn!(%port, endpoint, %status, "node rejected request");
            return NodeReply::Failure(NodeFailure::Application {
                status: status.as_u16(),
                payload,
            });
        }

        match serde_json::from_str::<T>(&body) {
            Ok(decoded) => {
                debug!(%port, endpoint, %status, "node request succeeded");
                NodeReply::Success(decoded)
            }
            Err(err) => {
                warn!(%port, endpoint, error = %err, "node response did not match expected shape");
                NodeReply::Failure(NodeFailure::Decode(err.to_string()))
            }
        }
    }
}

/// reqwest's top-level message hides the cause; append the source chain.
fn describe_transport_error(err: &reqwest::Error) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !detail.contains(&cause_text) {
            detail.push_str(": ");
            detail.push_str(&cause_text);
        }
        source = cause.source();
    }
    detail
}

#[async_trait]
impl NodeApi for HttpNodeClient {
    async fn register_peers(
        &self,
        nodes: &[String],
        port: NodePort,
    ) -> NodeReply<RegisterNodesResponse> {
        let body = RegisterNodesRequest {
            nodes: nodes.to_vec(),
        };
        self.post(port, REGISTER_ENDPOINT, &body).await
    }

    async fn submit_transaction(
        &self,
        sender: &str,
        recipient: &str,
        amount: &str,
        port: NodePort,
    ) -> NodeReply<MessageResponse> {
        let body = NewTransactionRequest {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            amount: amount.to_string(),
        };
        self.post(port, NEW_TRANSACTION_ENDPOINT, &body).await
    }

    async fn mine(&self, port: NodePort) -> NodeReply<MineResponse> {
        self.get(port, MINE_ENDPOINT).await
    }

    async fn resolve_conflicts(&self, port: NodePort) -> NodeReply<ResolveResponse> {
        self.get(port, RESOLVE_ENDPOINT).await
    }

    async fn fetch_chain(&self, port: NodePort) -> NodeReply<ChainResponse> {
        self.get(port, CHAIN_ENDPOINT).await
    }

    fn node_url(&self, port: NodePort) -> String {
        format!("http://{}:{port}", self.host)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
