use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tokio::time::timeout;
use tracing::debug;

use super::{
    RemoteAction, RemoteReply, RemoteStore,
    bridge::CallbackRegistry,
    config::{RemoteConfig, TransportStrategy},
    error::{TransportError, TransportResult},
    models::RowStoreEnvelope,
};

const PROBE: &str = "ping";

/// Row-store client speaking the query-string/JSON contract over HTTP.
#[derive(Clone)]
pub struct HttpRemoteStore {
    client: Client,
    endpoint: Arc<str>,
    strategy: TransportStrategy,
    bridge_timeout: Duration,
    callbacks: Arc<CallbackRegistry>,
}

impl HttpRemoteStore {
    /// Build a client for the configured endpoint.
    pub fn new(config: &RemoteConfig) -> TransportResult<Self> {
        let endpoint = config.endpoint().ok_or(TransportError::NotConfigured)?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| TransportError::ClientBuilder { source })?;

        Ok(Self {
            client,
            endpoint: Arc::from(endpoint),
            strategy: config.transport,
            bridge_timeout: config.bridge_timeout,
            callbacks: CallbackRegistry::new(),
        })
    }

    /// Strategy used for every request.
    pub fn strategy(&self) -> TransportStrategy {
        self.strategy
    }

    /// Registry of in-flight bridged callbacks.
    pub fn callbacks(&self) -> &Arc<CallbackRegistry> {
        &self.callbacks
    }

    async fn send(
        &self,
        name: &'static str,
        query: Vec<(&'static str, String)>,
        body: Option<&RemoteAction>,
    ) -> TransportResult<Value> {
        match (self.strategy, body) {
            (TransportStrategy::Post, Some(action)) => {
                let request = self.client.post(self.endpoint.as_ref()).json(action);
                self.fetch_json(name, request).await
            }
            (TransportStrategy::Bridged, _) => self.bridged(name, query).await,
            (TransportStrategy::Direct, _) | (TransportStrategy::Post, None) => {
                let request = self.client.get(self.endpoint.as_ref()).query(&query);
                self.fetch_json(name, request).await
            }
        }
    }

    async fn bridged(
        &self,
        name: &'static str,
        mut query: Vec<(&'static str, String)>,
    ) -> TransportResult<Value> {
        let (pending, receiver) = self.callbacks.register();
        query.push(("callback", pending.token().to_string()));

        let exchange = async {
            let request = self.client.get(self.endpoint.as_ref()).query(&query);
            let script = self.fetch_text(name, request).await?;
            self.callbacks.dispatch(name, &script)?;
            receiver
                .await
                .map_err(|_| TransportError::CallbackDropped { action: name })
        };

        let outcome = match timeout(self.bridge_timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout {
                action: name,
                after: self.bridge_timeout,
            }),
        };
        drop(pending);
        outcome
    }

    async fn fetch_json(&self, name: &'static str, request: RequestBuilder) -> TransportResult<Value> {
        let body = self.fetch_text(name, request).await?;
        serde_json::from_str(&body).map_err(|source| TransportError::DecodeResponse {
            action: name,
            source,
        })
    }

    async fn fetch_text(&self, name: &'static str, request: RequestBuilder) -> TransportResult<String> {
        let response = request
            .send()
            .await
            .map_err(|source| TransportError::RequestSend {
                action: name,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::RequestStatus {
                action: name,
                status,
            });
        }

        response
            .text()
            .await
            .map_err(|source| TransportError::ReadBody {
                action: name,
                source,
            })
    }
}

fn decode_envelope(name: &'static str, value: Value) -> TransportResult<RowStoreEnvelope> {
    serde_json::from_value(value).map_err(|source| TransportError::DecodeResponse {
        action: name,
        source,
    })
}

impl RemoteStore for HttpRemoteStore {
    fn call(&self, action: RemoteAction) -> BoxFuture<'static, TransportResult<RemoteReply>> {
        let store = self.clone();
        Box::pin(async move {
            let name = action.name();
            debug!(action = name, strategy = ?store.strategy, "calling remote store");
            let value = store.send(name, action.query_pairs(), Some(&action)).await?;
            decode_envelope(name, value)?.into_reply(&action)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, TransportResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let value = store.send(PROBE, Vec::new(), None).await?;
            decode_envelope(PROBE, value)?.ensure_success(PROBE)
        })
    }
}
