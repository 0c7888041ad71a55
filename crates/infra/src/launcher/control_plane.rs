//! Managed training/serving control plane clients.

use std::sync::Mutex;

use thiserror::Error;
use tracing::info;

use super::types::{EndpointConfigRequest, EndpointRequest, TrainingJobRequest};

#[derive(Debug, Error)]
pub enum ControlPlaneError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("control plane rejected {operation} with status {status}: {body}")]
    Rejected {
        operation: &'static str,
        status: u16,
        body: String,
    },
}

/// Job-creation and endpoint-creation calls. Each call only *requests* the
/// resource; none of them wait for it to become ready.
#[async_trait::async_trait]
pub trait ControlPlane: Send + Sync {
    async fn create_training_job(
        &self,
        request: &TrainingJobRequest,
    ) -> Result<(), ControlPlaneError>;

    async fn create_endpoint_config(
        &self,
        request: &EndpointConfigRequest,
    ) -> Result<(), ControlPlaneError>;

    async fn create_endpoint(&self, request: &EndpointRequest) -> Result<(), ControlPlaneError>;
}

/// JSON-over-HTTP control plane.
///
/// `POST {base}/training-jobs`, `POST {base}/endpoint-configs`,
/// `POST {base}/endpoints`, each with the request as the body.
#[derive(Debug, Clone)]
pub struct HttpControlPlane {
    client: reqwest::Client,
    base_url: String,
}

impl HttpControlPlane {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    async fn post<B: serde::Serialize + Sync>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
    ) -> Result<(), ControlPlaneError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ControlPlaneError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ControlPlaneError::Rejected {
                operation,
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ControlPlane for HttpControlPlane {
    async fn create_training_job(
        &self,
        request: &TrainingJobRequest,
    ) -> Result<(), ControlPlaneError> {
        self.post("create_training_job", "training-jobs", request).await
    }

    async fn create_endpoint_config(
        &self,
        request: &EndpointConfigRequest,
    ) -> Result<(), ControlPlaneError> {
        self.post("create_endpoint_config", "endpoint-configs", request).await
    }

    async fn create_endpoint(&self, request: &EndpointRequest) -> Result<(), ControlPlaneError> {
        self.post("create_endpoint", "endpoints", request).await
    }
}

/// A request seen by [`RecordingControlPlane`], in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPlaneCall {
    TrainingJob(TrainingJobRequest),
    EndpointConfig(EndpointConfigRequest),
    Endpoint(EndpointRequest),
}

/// Dry-run control plane: logs and remembers every request, creates nothing.
#[derive(Debug, Default)]
pub struct RecordingControlPlane {
    calls: Mutex<Vec<ControlPlaneCall>>,
    fail_training: bool,
}

impl RecordingControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every training-job request (for exercising error paths).
    pub fn failing_training() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_training: true,
        }
    }

    pub fn calls(&self) -> Vec<ControlPlaneCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: ControlPlaneCall) -> Result<(), ControlPlaneError> {
        let mut calls = self
            .calls
            .lock()
            .map_err(|_| ControlPlaneError::Request("recording lock poisoned".into()))?;
        calls.push(call);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ControlPlane for RecordingControlPlane {
    async fn create_training_job(
        &self,
        request: &TrainingJobRequest,
    ) -> Result<(), ControlPlaneError> {
        if self.fail_training {
            return Err(ControlPlaneError::Rejected {
                operation: "create_training_job",
                status: 400,
                body: "training disabled".into(),
            });
        }
        info!(job = %request.training_job_name, "dry run: create training job");
        self.record(ControlPlaneCall::TrainingJob(request.clone()))
    }

    async fn create_endpoint_config(
        &self,
        request: &EndpointConfigRequest,
    ) -> Result<(), ControlPlaneError> {
        info!(config = %request.endpoint_config_name, "dry run: create endpoint config");
        self.record(ControlPlaneCall::EndpointConfig(request.clone()))
    }

    async fn create_endpoint(&self, request: &EndpointRequest) -> Result<(), ControlPlaneError> {
        info!(endpoint = %request.endpoint_name, "dry run: create endpoint");
        self.record(ControlPlaneCall::Endpoint(request.clone()))
    }
}
