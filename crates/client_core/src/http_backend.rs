//! HTTP implementation of the scan, flip, and label backends.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::SessionId,
    error::{ApiError, ErrorCode},
    protocol::{
        FlipAck, FlipRequest, LabelBatchRequest, PortInfo, StartScanRequest, StartScanResponse,
        StopScanRequest,
    },
};

use crate::{
    FlipBackend, FlipCommitError, LabelBackend, ScanBackend, StartScanError, StopScanError,
};

pub struct HttpBackend {
    http: Client,
    server_url: String,
}

impl HttpBackend {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.server_url)
    }
}

async fn api_error_from(response: reqwest::Response) -> ApiError {
    let status = response.status();
    match response.json::<ApiError>().await {
        Ok(err) => err,
        Err(_) => ApiError::new(ErrorCode::Internal, format!("backend returned {status}")),
    }
}

#[async_trait]
impl ScanBackend for HttpBackend {
    async fn list_ports(&self) -> Result<Vec<PortInfo>> {
        let response = self
            .http
            .get(self.url("/ports"))
            .send()
            .await
            .context("failed to fetch available ports")?
            .error_for_status()
            .context("port listing rejected")?;
        response
            .json()
            .await
            .context("invalid port listing response")
    }

    async fn start_scan(&self, port_index: usize) -> Result<SessionId, StartScanError> {
        let response = self
            .http
            .post(self.url("/scan/start"))
            .json(&StartScanRequest { port_index })
            .send()
            .await
            .map_err(|err| StartScanError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            let err = api_error_from(response).await;
            return Err(match err.code {
                ErrorCode::PortUnavailable => StartScanError::PortUnavailable(err.message),
                _ => StartScanError::Transport(err.message),
            });
        }

        let body: StartScanResponse = response
            .json()
            .await
            .map_err(|err| StartScanError::Transport(err.to_string()))?;
        Ok(body.session_id)
    }

    async fn stop_scan(&self, session_id: SessionId) -> Result<(), StopScanError> {
        // Fire-and-forget: delivery failure is the only reportable outcome,
        // a non-success ack is not.
        self.http
            .post(self.url("/scan/stop"))
            .json(&StopScanRequest { session_id })
            .send()
            .await
            .map_err(|err| StopScanError::Transport(err.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl FlipBackend for HttpBackend {
    async fn commit_flip(&self, request: &FlipRequest) -> Result<FlipAck, FlipCommitError> {
        let response = self
            .http
            .post(self.url("/flip"))
            .json(request)
            .send()
            .await
            .map_err(|err| FlipCommitError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            let err = api_error_from(response).await;
            return Err(FlipCommitError::Rejected(err.message));
        }

        response
            .json()
            .await
            .map_err(|err| FlipCommitError::Transport(err.to_string()))
    }
}

#[async_trait]
impl LabelBackend for HttpBackend {
    async fn generate_labels(&self, request: &LabelBatchRequest) -> Result<Vec<u8>> {
        let response = self
            .http
            .post(self.url("/labels/batch"))
            .json(request)
            .send()
            .await
            .context("failed to submit label batch")?
            .error_for_status()
            .context("label batch rejected")?;
        let bytes = response
            .bytes()
            .await
            .context("failed to read label document")?;
        Ok(bytes.to_vec())
    }
}
