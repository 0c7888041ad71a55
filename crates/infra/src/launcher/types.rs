//! Control-plane request shapes for training and serving.
//!
//! Field names follow the managed control plane's wire format (PascalCase).

use serde::{Deserialize, Serialize};

use crate::config::LauncherConfig;

pub const TRAINING_JOB_PREFIX: &str = "VehicleTheftTrainingJob-";
pub const TRAINING_INSTANCE_TYPE: &str = "ml.m5.xlarge";
pub const TRAINING_INSTANCE_COUNT: u32 = 1;
pub const TRAINING_VOLUME_GB: u32 = 20;
pub const TRAINING_MAX_RUNTIME_SECS: u64 = 3600;
pub const SERVERLESS_MEMORY_MB: u32 = 1024;
pub const SERVERLESS_MAX_CONCURRENCY: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AlgorithmSpecification {
    pub training_image: String,
    pub training_input_mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct S3DataSource {
    pub s3_data_type: String,
    pub s3_uri: String,
    pub s3_data_distribution_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataSource {
    pub s3_data_source: S3DataSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InputChannel {
    pub channel_name: String,
    pub data_source: DataSource,
    pub content_type: String,
    pub compression_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutputDataConfig {
    pub s3_output_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceConfig {
    pub instance_type: String,
    pub instance_count: u32,
    #[serde(rename = "VolumeSizeInGB")]
    pub volume_size_in_gb: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StoppingCondition {
    pub max_runtime_in_seconds: u64,
}

/// Request to start one training job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrainingJobRequest {
    pub training_job_name: String,
    pub algorithm_specification: AlgorithmSpecification,
    pub role_arn: String,
    pub input_data_config: Vec<InputChannel>,
    pub output_data_config: OutputDataConfig,
    pub resource_config: ResourceConfig,
    pub stopping_condition: StoppingCondition,
}

impl TrainingJobRequest {
    /// Fixed-resource training request named after `unix_secs`.
    pub fn for_config(config: &LauncherConfig, unix_secs: i64) -> Self {
        Self {
            training_job_name: format!("{TRAINING_JOB_PREFIX}{unix_secs}"),
            algorithm_specification: AlgorithmSpecification {
                training_image: config.training_image.clone(),
                training_input_mode: "File".to_string(),
            },
            role_arn: config.execution_role.clone(),
            input_data_config: vec![InputChannel {
                channel_name: "training".to_string(),
                data_source: DataSource {
                    s3_data_source: S3DataSource {
                        s3_data_type: "S3Prefix".to_string(),
                        s3_uri: config.training_data_uri.clone(),
                        s3_data_distribution_type: "FullyReplicated".to_string(),
                    },
                },
                content_type: "application/x-image".to_string(),
                compression_type: "None".to_string(),
            }],
            output_data_config: OutputDataConfig {
                s3_output_path: config.model_artifacts_uri.clone(),
            },
            resource_config: ResourceConfig {
                instance_type: TRAINING_INSTANCE_TYPE.to_string(),
                instance_count: TRAINING_INSTANCE_COUNT,
                volume_size_in_gb: TRAINING_VOLUME_GB,
            },
            stopping_condition: StoppingCondition {
                max_runtime_in_seconds: TRAINING_MAX_RUNTIME_SECS,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerlessConfig {
    #[serde(rename = "MemorySizeInMB")]
    pub memory_size_in_mb: u32,
    pub max_concurrency: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductionVariant {
    pub variant_name: String,
    pub model_name: String,
    pub initial_variant_weight: f64,
    pub serverless_config: ServerlessConfig,
}

/// Request to create a serverless endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndpointConfigRequest {
    pub endpoint_config_name: String,
    pub production_variants: Vec<ProductionVariant>,
}

impl EndpointConfigRequest {
    pub fn serverless(model_name: &str) -> Self {
        Self {
            endpoint_config_name: format!("{model_name}-endpoint-config"),
            production_variants: vec![ProductionVariant {
                variant_name: "AllTraffic".to_string(),
                model_name: model_name.to_string(),
                initial_variant_weight: 1.0,
                serverless_config: ServerlessConfig {
                    memory_size_in_mb: SERVERLESS_MEMORY_MB,
                    max_concurrency: SERVERLESS_MAX_CONCURRENCY,
                },
            }],
        }
    }
}

/// Request to create an endpoint from an existing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndpointRequest {
    pub endpoint_name: String,
    pub endpoint_config_name: String,
}

impl EndpointRequest {
    pub fn for_model(model_name: &str, endpoint_config_name: impl Into<String>) -> Self {
        Self {
            endpoint_name: format!("{model_name}-endpoint"),
            endpoint_config_name: endpoint_config_name.into(),
        }
    }
}
