//! Configuration loading and representation.
//!
//! Everything is read from the environment once, at process start. Each
//! loader also has a `from_lookup` form that takes a closure so tests do not
//! have to touch the real process environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable `{0}` is not set")]
    Missing(&'static str),

    #[error("invalid value for `{var}`: {message}")]
    Invalid { var: &'static str, message: String },
}

/// What the ingestion handler does when one record's store or publish call
/// fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failing record and fail the whole invocation.
    #[default]
    FailFast,
    /// Log the failure, keep going, and still report the batch as processed.
    Isolate,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail_fast" | "fail-fast" | "failfast" => Ok(Self::FailFast),
            "isolate" => Ok(Self::Isolate),
            other => Err(format!("expected `fail_fast` or `isolate`, got `{other}`")),
        }
    }
}

impl core::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::FailFast => f.write_str("fail_fast"),
            Self::Isolate => f.write_str("isolate"),
        }
    }
}

/// Settings for the ingestion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// `AWS_DEFAULT_REGION`, default `us-east-1`.
    pub region: String,
    /// `VEHICLE_TABLE`.
    pub vehicle_table: String,
    /// `ALERT_TOPIC`.
    pub alert_topic: String,
    /// `INGEST_FAILURE_POLICY`, default fail-fast.
    pub failure_policy: FailurePolicy,
    /// `BIND_ADDR`, default `0.0.0.0:8080`.
    pub bind_addr: SocketAddr,
    /// `DATABASE_URL`; only consulted by persistent wiring.
    pub database_url: Option<String>,
    /// `REDIS_URL`; only consulted by persistent wiring.
    pub redis_url: Option<String>,
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let region = non_empty(&lookup, "AWS_DEFAULT_REGION")
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let vehicle_table = required(&lookup, "VEHICLE_TABLE")?;
        let alert_topic = required(&lookup, "ALERT_TOPIC")?;

        let failure_policy = match non_empty(&lookup, "INGEST_FAILURE_POLICY") {
            Some(raw) => raw.parse::<FailurePolicy>().map_err(|message| ConfigError::Invalid {
                var: "INGEST_FAILURE_POLICY",
                message,
            })?,
            None => FailurePolicy::default(),
        };

        let bind_raw = non_empty(&lookup, "BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                var: "BIND_ADDR",
                message: e.to_string(),
            })?;

        Ok(Self {
            region,
            vehicle_table,
            alert_topic,
            failure_policy,
            bind_addr,
            database_url: non_empty(&lookup, "DATABASE_URL"),
            redis_url: non_empty(&lookup, "REDIS_URL"),
        })
    }
}

/// Settings for the training/deployment launcher.
#[derive(Debug, Clone, PartialEq)]
pub struct LauncherConfig {
    pub region: String,
    pub training_data_uri: String,
    pub model_artifacts_uri: String,
    pub training_image: String,
    pub execution_role: String,
    /// Base URL of the control plane; `None` means dry run.
    pub control_plane_url: Option<String>,
    pub model_name: String,
    /// Fixed pause between starting training and deploying.
    pub settle_delay: Duration,
}

impl LauncherConfig {
    pub const DEFAULT_TRAINING_DATA_URI: &'static str = "s3://path-to-the-training-data/";
    pub const DEFAULT_MODEL_ARTIFACTS_URI: &'static str = "s3://path-to-the-model-artifacts/";
    pub const DEFAULT_TRAINING_IMAGE: &'static str =
        "123456789012.dkr.ecr.us-east-1.amazonaws.com/vit-base:latest";
    pub const DEFAULT_EXECUTION_ROLE: &'static str =
        "arn:aws:iam::<account-id>:role/<SageMakerExecutionRole>";
    pub const DEFAULT_MODEL_NAME: &'static str = "VehicleTheftDetectionModel";
    pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or = |key: &str, default: &str| {
            non_empty(&lookup, key).unwrap_or_else(|| default.to_string())
        };

        let settle_delay = match non_empty(&lookup, "LAUNCH_SETTLE_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e: std::num::ParseIntError| {
                    ConfigError::Invalid {
                        var: "LAUNCH_SETTLE_SECS",
                        message: e.to_string(),
                    }
                })?;
                Duration::from_secs(secs)
            }
            None => Self::DEFAULT_SETTLE_DELAY,
        };

        Ok(Self {
            region: or("AWS_DEFAULT_REGION", DEFAULT_REGION),
            training_data_uri: or("TRAINING_DATA_URI", Self::DEFAULT_TRAINING_DATA_URI),
            model_artifacts_uri: or("MODEL_ARTIFACTS_URI", Self::DEFAULT_MODEL_ARTIFACTS_URI),
            training_image: or("TRAINING_IMAGE", Self::DEFAULT_TRAINING_IMAGE),
            execution_role: or("SAGEMAKER_ROLE", Self::DEFAULT_EXECUTION_ROLE),
            control_plane_url: non_empty(&lookup, "CONTROL_PLANE_URL"),
            model_name: or("MODEL_NAME", Self::DEFAULT_MODEL_NAME),
            settle_delay,
        })
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, key).ok_or(ConfigError::Missing(key))
}
