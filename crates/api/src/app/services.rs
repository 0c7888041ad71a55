//! Backend wiring for the ingestion handler.
//!
//! The host owns one-time initialisation: stores, topics, and pools are built
//! here once and injected into a single `IngestionHandler` shared by every
//! invocation.

use std::sync::Arc;

use tracing::{info, warn};

use fleetguard_core::AlertNotification;
use fleetguard_events::InMemoryTopic;
use fleetguard_infra::{EventHandler, InMemoryItemStore, IngestConfig, IngestionHandler};

#[cfg(feature = "redis")]
use fleetguard_infra::{item_store::PostgresItemStore, topic::RedisTopic};

/// Services shared by all routes.
#[derive(Clone)]
pub struct AppServices {
    handler: Arc<dyn EventHandler>,
}

impl AppServices {
    pub fn new(handler: Arc<dyn EventHandler>) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> Arc<dyn EventHandler> {
        self.handler.clone()
    }
}

/// In-memory wiring plus handles to its backends (dev/test).
pub struct InMemoryServices {
    pub services: AppServices,
    pub store: Arc<InMemoryItemStore>,
    pub topic: Arc<InMemoryTopic<AlertNotification>>,
}

pub fn build_in_memory_services(config: &IngestConfig) -> InMemoryServices {
    let store = Arc::new(InMemoryItemStore::new(config.vehicle_table.clone()));
    let topic: Arc<InMemoryTopic<AlertNotification>> =
        Arc::new(InMemoryTopic::new(config.alert_topic.clone()));

    let handler =
        IngestionHandler::new(store.clone(), topic.clone()).with_policy(config.failure_policy);

    InMemoryServices {
        services: AppServices::new(Arc::new(handler)),
        store,
        topic,
    }
}

/// Postgres table + Redis topic wiring.
#[cfg(feature = "redis")]
pub async fn build_persistent_services(
    config: &IngestConfig,
    database_url: &str,
    redis_url: &str,
) -> anyhow::Result<AppServices> {
    let store = PostgresItemStore::connect(database_url, config.vehicle_table.clone()).await?;
    store.ensure_table().await?;
    let topic = RedisTopic::new(redis_url, config.alert_topic.clone(), config.region.clone())?;

    let handler = IngestionHandler::new(Arc::new(store), topic).with_policy(config.failure_policy);
    Ok(AppServices::new(Arc::new(handler)))
}

/// Pick persistent backends when configured, in-memory otherwise.
pub async fn build_services(config: &IngestConfig) -> anyhow::Result<AppServices> {
    if let Some(services) = try_persistent(config).await? {
        return Ok(services);
    }

    info!(table = %config.vehicle_table, topic = %config.alert_topic, "using in-memory backends");
    Ok(build_in_memory_services(config).services)
}

#[cfg(feature = "redis")]
async fn try_persistent(config: &IngestConfig) -> anyhow::Result<Option<AppServices>> {
    match (config.database_url.as_deref(), config.redis_url.as_deref()) {
        (Some(db), Some(redis)) => {
            info!(
                table = %config.vehicle_table,
                topic = %config.alert_topic,
                "using postgres + redis backends"
            );
            Ok(Some(build_persistent_services(config, db, redis).await?))
        }
        (None, None) => Ok(None),
        _ => {
            warn!("persistent backends need both DATABASE_URL and REDIS_URL");
            Ok(None)
        }
    }
}

#[cfg(not(feature = "redis"))]
async fn try_persistent(config: &IngestConfig) -> anyhow::Result<Option<AppServices>> {
    if config.database_url.is_some() || config.redis_url.is_some() {
        warn!("DATABASE_URL/REDIS_URL ignored: built without the `redis` feature");
    }
    Ok(None)
}
