use std::sync::Arc;
use std::time::Duration;

use admitdesk_config::{CorsConfig, StoreBackend, StoreConfig, UploadConfig};
use admitdesk_core::file_storage::{FileStorage, LocalFileStorage};
use admitdesk_observability::{MetricsTelemetry, PrometheusHandle, Telemetry, init_metrics};
use admitdesk_store::{MemoryStore, PgStore, RecordStore};
use anyhow::Context;
use tracing::{info, warn};

use crate::modules::{AdmissionRepository, FeedService, RollNumberAllocator};

#[derive(Clone)]
pub struct AppState {
    pub admissions: AdmissionRepository,
    pub roll_numbers: RollNumberAllocator,
    pub feeds: FeedService,
    pub files: Arc<dyn FileStorage>,
    pub cors_config: CorsConfig,
    pub upload_config: UploadConfig,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wires the services around one shared store. Configs start at their
    /// defaults and metrics are off.
    pub fn new(
        store: Arc<dyn RecordStore>,
        telemetry: Arc<dyn Telemetry>,
        files: Arc<dyn FileStorage>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            admissions: AdmissionRepository::new(store.clone(), telemetry, store_timeout),
            roll_numbers: RollNumberAllocator::new(store.clone(), store_timeout),
            feeds: FeedService::new(store, store_timeout),
            files,
            cors_config: CorsConfig::default(),
            upload_config: UploadConfig::default(),
            metrics: None,
        }
    }
}

/// Builds the state from environment configuration.
pub async fn init_app_state() -> anyhow::Result<AppState> {
    let store_config = StoreConfig::from_env();
    let upload_config = UploadConfig::from_env();

    let store = connect_store(&store_config).await?;
    let files = Arc::new(LocalFileStorage::with_max_size(
        upload_config.dir.clone(),
        upload_config.base_url.clone(),
        upload_config.max_bytes,
    ));

    let mut state = AppState::new(
        store,
        Arc::new(MetricsTelemetry),
        files,
        store_config.timeout,
    );
    state.cors_config = CorsConfig::from_env();
    state.upload_config = upload_config;
    state.metrics = init_metrics();

    Ok(state)
}

pub async fn connect_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn RecordStore>> {
    info!(backend = %config.backend, "Connecting record store");

    match config.backend {
        StoreBackend::Memory => {
            warn!("In-memory record store: data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set when STORE_BACKEND=postgres")?;
            let store = PgStore::connect(url, config.max_connections, config.timeout)
                .await
                .context("Failed to connect to PostgreSQL")?;
            Ok(Arc::new(store))
        }
    }
}
