//! Training and serving launcher.
//!
//! A fixed three-step sequence against a managed control plane:
//!
//! 1. request a training job with fixed resources,
//! 2. wait a constant settle delay (no status polling),
//! 3. request a serverless endpoint configuration and endpoint for an
//!    already-registered model.
//!
//! A failing step stops the sequence; nothing is retried or rolled back.

pub mod control_plane;
pub mod types;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use crate::config::LauncherConfig;

pub use control_plane::{
    ControlPlane, ControlPlaneCall, ControlPlaneError, HttpControlPlane, RecordingControlPlane,
};
pub use types::{EndpointConfigRequest, EndpointRequest, TrainingJobRequest};

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("{step} failed: {source}")]
    ControlPlane {
        step: &'static str,
        #[source]
        source: ControlPlaneError,
    },
}

/// Names of everything a launch requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReport {
    pub training_job: String,
    pub endpoint_config: String,
    pub endpoint: String,
}

pub struct JobLauncher<C> {
    control_plane: C,
    config: LauncherConfig,
}

impl<C: ControlPlane> JobLauncher<C> {
    pub fn new(control_plane: C, config: LauncherConfig) -> Self {
        Self { control_plane, config }
    }

    pub fn control_plane(&self) -> &C {
        &self.control_plane
    }

    /// Request a training job named after `now`; returns the job name.
    pub async fn start_training_job(&self, now: DateTime<Utc>) -> Result<String, LaunchError> {
        let request = TrainingJobRequest::for_config(&self.config, now.timestamp());
        self.control_plane
            .create_training_job(&request)
            .await
            .map_err(|source| LaunchError::ControlPlane {
                step: "start_training_job",
                source,
            })?;

        info!(job = %request.training_job_name, "training job started");
        Ok(request.training_job_name)
    }

    /// Request endpoint config + endpoint for `model_name`; returns
    /// `(endpoint_config_name, endpoint_name)`.
    pub async fn deploy_model(&self, model_name: &str) -> Result<(String, String), LaunchError> {
        let config = EndpointConfigRequest::serverless(model_name);
        self.control_plane
            .create_endpoint_config(&config)
            .await
            .map_err(|source| LaunchError::ControlPlane {
                step: "create_endpoint_config",
                source,
            })?;

        let endpoint = EndpointRequest::for_model(model_name, config.endpoint_config_name.clone());
        self.control_plane
            .create_endpoint(&endpoint)
            .await
            .map_err(|source| LaunchError::ControlPlane {
                step: "create_endpoint",
                source,
            })?;

        info!(endpoint = %endpoint.endpoint_name, "endpoint deployment initiated");
        Ok((config.endpoint_config_name, endpoint.endpoint_name))
    }

    /// Run the whole sequence for the configured model.
    pub async fn run(&self) -> Result<LaunchReport, LaunchError> {
        let training_job = self.start_training_job(Utc::now()).await?;

        if !self.config.settle_delay.is_zero() {
            info!(delay_secs = self.config.settle_delay.as_secs(), "waiting before deployment");
            tokio::time::sleep(self.config.settle_delay).await;
        }

        let (endpoint_config, endpoint) = self.deploy_model(&self.config.model_name).await?;

        Ok(LaunchReport {
            training_job,
            endpoint_config,
            endpoint,
        })
    }
}
