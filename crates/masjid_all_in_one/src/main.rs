mod config;

use access_gate::{AccessGateApi, AccessGateServices};
use common::domain::{InMemoryUserRoleRepository, UserRoleRepository};
use common::postgres::{run_migrations, PostgresUserRoleRepository, SharedPostgresClient};
use common::telemetry::{init_telemetry, shutdown_telemetry, TelemetryProviders};
use crate::config::{RoleStore, ServiceConfig};
use masjid_runner::Runner;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let telemetry_providers: Option<TelemetryProviders> =
        match init_telemetry(&config.telemetry_config()) {
            Ok(providers) => providers,
            Err(e) => {
                eprintln!("Failed to initialize telemetry: {}", e);
                std::process::exit(1);
            }
        };

    info!(
        otel_enabled = config.otel_enabled,
        role_store = ?config.role_store,
        "Starting masjid-all-in-one service"
    );
    debug!(
        http_host = %config.http_host,
        http_port = config.http_port,
        postgres_host = %config.postgres_host,
        postgres_database = %config.postgres_database,
        "Loaded configuration"
    );

    let repository = match initialize_role_store(&config).await {
        Ok(repository) => repository,
        Err(e) => {
            error!("Failed to initialize role store: {:#}", e);
            std::process::exit(1);
        }
    };

    let services = AccessGateServices::new(config.access_gate_config(), repository);
    let access_gate_api = AccessGateApi::new(services, config.http_server_config());

    Runner::new()
        .with_app_process(access_gate_api.into_runner_process())
        .with_closer(move || async move {
            info!("Running cleanup tasks...");
            shutdown_telemetry(telemetry_providers);
            Ok(())
        })
        .with_closer_timeout(Duration::from_secs(10))
        .run()
        .await;
}

async fn initialize_role_store(config: &ServiceConfig) -> anyhow::Result<Arc<dyn UserRoleRepository>> {
    match config.role_store {
        RoleStore::Postgres => {
            let shared = Arc::new(SharedPostgresClient::new(config.postgres_config()));
            if config.postgres_run_migrations {
                info!("Running PostgreSQL migrations...");
                run_migrations(shared.get().await?).await?;
            }
            Ok(Arc::new(PostgresUserRoleRepository::new(shared)))
        }
        RoleStore::Memory => {
            warn!("Using in-memory role store; roles are lost on restart");
            Ok(Arc::new(InMemoryUserRoleRepository::new()))
        }
    }
}
