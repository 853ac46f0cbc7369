//! Request/response boundary to the execution engine.
//!
//! The engine exposes two HTTP endpoints to this client: the snapshot fetch
//! and the per-node control command. Both sit behind [`EngineTransport`] so
//! tests can substitute fakes and the rest of the crate never touches HTTP
//! directly.

use async_trait::async_trait;
use thiserror::Error;

use crate::dispatch::ControlAction;
use crate::workflow::Workflow;

#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, protocol, or body-decode failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The engine answered with a non-success status.
    #[error("engine returned {status} for {url}")]
    Status { status: u16, url: String },
}

/// The engine's request/response surface as this client sees it.
#[async_trait]
pub trait EngineTransport: Send + Sync {
    /// Fetch the full workflow snapshot for `name`.
    async fn fetch_workflow(&self, name: &str) -> Result<Workflow, TransportError>;

    /// Issue a control command. Fire-and-forget: the response body is ignored
    /// beyond generic success/error handling.
    async fn control_node(
        &self,
        workflow: &str,
        node: &str,
        action: ControlAction,
    ) -> Result<(), TransportError>;
}

/// HTTP transport over reqwest.
pub struct HttpEngineTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEngineTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Use a preconfigured client (timeouts, TLS, proxies).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_checked(&self, url: String) -> Result<reqwest::Response, TransportError> {
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl EngineTransport for HttpEngineTransport {
    async fn fetch_workflow(&self, name: &str) -> Result<Workflow, TransportError> {
        let url = self.url(&format!("/api/workflows/{name}"));
        let response = self.get_checked(url).await?;
        let mut workflow: Workflow = response.json().await?;
        // The body carries no name; the path is authoritative.
        workflow.name = name.to_string();
        Ok(workflow)
    }

    async fn control_node(
        &self,
        workflow: &str,
        node: &str,
        action: ControlAction,
    ) -> Result<(), TransportError> {
        let url = self.url(&format!("/api/workflows/{workflow}/nodes/{node}/{action}"));
        self.get_checked(url).await?;
        Ok(())
    }
}
