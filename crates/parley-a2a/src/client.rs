//! A2A client: fetches agent cards and talks JSON-RPC to agents

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::card::candidate_card_urls;
use crate::error::{A2aError, Result};
use crate::poll::TaskSource;
use crate::protocol::*;

/// A card document as fetched, before validation
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub url: String,
    pub status: u16,
    pub content_length: usize,
    pub body: Value,
}

/// How an [`AgentConnection`] exchanges messages
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// MIME types the client is willing to receive
    pub accepted_output_modes: Vec<String>,
    /// When true the agent is asked not to block on `message/send` and the
    /// caller polls the task instead
    pub polling: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            accepted_output_modes: vec!["text/plain".to_string(), "application/json".to_string()],
            polling: true,
        }
    }
}

/// HTTP client for agent discovery
#[derive(Clone)]
pub struct A2aClient {
    http: Client,
}

impl A2aClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(A2aError::ClientBuild)?;
        Ok(Self { http })
    }

    /// Fetch a single document and parse it as JSON
    pub async fn fetch_card_document(&self, url: &str) -> Result<FetchedDocument> {
        debug!("Fetching agent card from {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| A2aError::from_reqwest(url, e))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| A2aError::from_reqwest(url, e))?;

        if !status.is_success() {
            return Err(A2aError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        let body: Value = serde_json::from_str(&text).map_err(|source| A2aError::InvalidJson {
            url: url.to_string(),
            source,
        })?;

        Ok(FetchedDocument {
            url: url.to_string(),
            status: status.as_u16(),
            content_length: text.len(),
            body,
        })
    }

    /// Try each conventional card location for an agent endpoint and return
    /// the first document served with HTTP 200
    pub async fn discover_card<F>(&self, agent_url: &str, mut on_attempt: F) -> Result<FetchedDocument>
    where
        F: FnMut(&str),
    {
        let candidates = candidate_card_urls(agent_url);

        for url in &candidates {
            on_attempt(url);
            match self.fetch_card_document(url).await {
                Ok(doc) if doc.status == 200 => {
                    info!("Found agent card at {}", url);
                    return Ok(doc);
                }
                Ok(doc) => debug!("Skipping {}: HTTP {}", url, doc.status),
                Err(e) => debug!("Skipping {}: {}", url, e),
            }
        }

        Err(A2aError::CardNotFound { tried: candidates })
    }

    /// Pick an endpoint from the card and open a JSON-RPC connection to it
    ///
    /// The agent's own ordering is honoured: the preferred transport at the
    /// card's main URL first, then each additional interface.
    pub fn connect(&self, card: &AgentCard, config: ConnectionConfig) -> Result<AgentConnection> {
        let offers = std::iter::once((card.preferred_transport.as_str(), card.url.as_str())).chain(
            card.additional_interfaces
                .iter()
                .flatten()
                .map(|i| (i.transport.as_str(), i.url.as_str())),
        );

        let endpoint = offers
            .filter(|(transport, _)| TransportProtocol::parse(transport) == Some(TransportProtocol::JsonRpc))
            .map(|(_, url)| url.to_string())
            .next()
            .ok_or(A2aError::NoCompatibleTransport)?;

        info!("Using JSONRPC transport at {}", endpoint);

        Ok(AgentConnection {
            http: self.http.clone(),
            endpoint,
            config,
            next_id: AtomicU64::new(1),
        })
    }
}

/// A negotiated JSON-RPC connection to one agent endpoint
pub struct AgentConnection {
    http: Client,
    endpoint: String,
    config: ConnectionConfig,
    next_id: AtomicU64,
}

impl AgentConnection {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// `message/send`
    pub async fn send_message(&self, message: Message) -> Result<SendMessageResponse> {
        let params = MessageSendParams {
            message,
            configuration: Some(MessageSendConfiguration {
                accepted_output_modes: self.config.accepted_output_modes.clone(),
                blocking: !self.config.polling,
            }),
        };
        self.call(methods::MESSAGE_SEND, params).await
    }

    /// `tasks/get`
    pub async fn get_task(&self, task_id: &str, history_length: Option<u32>) -> Result<Task> {
        let params = TaskQueryParams {
            id: task_id.to_string(),
            history_length,
        };
        self.call(methods::TASKS_GET, params).await
    }

    /// `tasks/cancel`
    pub async fn cancel_task(&self, task_id: &str) -> Result<Task> {
        let task: Task = self
            .call(
                methods::TASKS_CANCEL,
                TaskIdParams {
                    id: task_id.to_string(),
                },
            )
            .await?;
        info!("Task {} cancelled (state: {})", task_id, task.status.state);
        Ok(task)
    }

    async fn call<P, R>(&self, method: &'static str, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);
        debug!("Calling {} (id {}) at {}", method, id, self.endpoint);

        let resp = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| A2aError::from_reqwest(&self.endpoint, e))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| A2aError::from_reqwest(&self.endpoint, e))?;

        if !status.is_success() {
            return Err(A2aError::Http {
                url: self.endpoint.clone(),
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: JsonRpcResponse =
            serde_json::from_str(&text).map_err(|source| A2aError::InvalidJson {
                url: self.endpoint.clone(),
                source,
            })?;

        if let Some(err) = envelope.error {
            return Err(A2aError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        let result = envelope.result.ok_or_else(|| {
            A2aError::UnexpectedResponse(format!("{} response has neither result nor error", method))
        })?;

        serde_json::from_value(result)
            .map_err(|e| A2aError::UnexpectedResponse(format!("{} result: {}", method, e)))
    }
}

#[async_trait]
impl TaskSource for AgentConnection {
    async fn get_task(&self, task_id: &str, history_length: Option<u32>) -> Result<Task> {
        AgentConnection::get_task(self, task_id, history_length).await
    }
}
