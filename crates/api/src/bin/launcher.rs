//! Start a training job, wait, then deploy the serving endpoint.
//!
//! Without `CONTROL_PLANE_URL` this is a dry run that only logs the requests.

use anyhow::Context;
use tracing::{info, warn};

use fleetguard_infra::LauncherConfig;
use fleetguard_infra::launcher::{
    HttpControlPlane, JobLauncher, LaunchReport, RecordingControlPlane,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fleetguard_observability::init();

    let config = LauncherConfig::from_env().context("loading launcher configuration")?;
    info!(region = %config.region, model = %config.model_name, "launching");

    let report: LaunchReport = match config.control_plane_url.clone() {
        Some(url) => JobLauncher::new(HttpControlPlane::new(url), config).run().await?,
        None => {
            warn!("CONTROL_PLANE_URL not set; dry run");
            JobLauncher::new(RecordingControlPlane::new(), config).run().await?
        }
    };

    info!(
        training_job = %report.training_job,
        endpoint_config = %report.endpoint_config,
        endpoint = %report.endpoint,
        "launch requested"
    );
    Ok(())
}
