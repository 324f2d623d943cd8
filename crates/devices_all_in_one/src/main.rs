mod config;

use common::domain::DeviceRepository;
use common::memory::InMemoryDeviceRepository;
use common::postgres::{MigrationRunner, PostgresClient, PostgresDeviceRepository};
use common::telemetry::{init_telemetry, shutdown_telemetry};
use crate::config::{ServiceConfig, StorageBackend};
use devices_api::{DeviceService, DevicesApi};
use devices_runner::Runner;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let telemetry_providers = match init_telemetry(&config.telemetry_config()) {
        Ok(providers) => providers,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        storage_backend = ?config.storage_backend,
        otel_enabled = config.otel_enabled,
        "Starting devices service"
    );
    debug!("Configuration: {:?}", config);

    let device_repository = match initialize_repository(&config).await {
        Ok(repository) => repository,
        Err(e) => {
            error!("Failed to initialize device storage: {:#}", e);
            shutdown_telemetry(telemetry_providers);
            std::process::exit(1);
        }
    };

    let device_service = Arc::new(DeviceService::new(device_repository));
    let devices_api = DevicesApi::new(device_service, config.http_server_config());

    let runner = Runner::new()
        .with_named_process("devices_api", devices_api.into_runner_process())
        .with_closer(move || async move {
            info!("Flushing telemetry");
            shutdown_telemetry(telemetry_providers);
            Ok(())
        })
        .with_closer_timeout(Duration::from_secs(10));

    if let Err(e) = runner.run().await {
        error!("Devices service exiting with error: {:#}", e);
        std::process::exit(1);
    }
    info!("Devices service stopped");
}

async fn initialize_repository(config: &ServiceConfig) -> anyhow::Result<Arc<dyn DeviceRepository>> {
    match config.storage_backend {
        StorageBackend::Memory => {
            info!("Using in-memory device storage");
            Ok(Arc::new(InMemoryDeviceRepository::new()))
        }
        StorageBackend::Postgres => {
            info!("Initializing PostgreSQL...");
            let postgres_config = config.postgres_config();
            MigrationRunner::from_config(&postgres_config)
                .run_migrations()
                .await?;

            let client = PostgresClient::new(&postgres_config)?;
            client.ping().await?;
            Ok(Arc::new(PostgresDeviceRepository::new(client)))
        }
    }
}
