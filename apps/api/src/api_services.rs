use std::sync::Arc;

use lakegrant_application::{
    ExpirySweeper, ExternalCallPolicy, GrantLifecycleService, GrantRecordStore, PermissionService,
    SweepOptions,
};
use lakegrant_core::{AppError, AppResult};
use lakegrant_infrastructure::{
    HttpPermissionService, InMemoryGrantRecordStore, InMemoryPermissionService, MIGRATOR,
    PostgresGrantRecordStore,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::warn;

use crate::api_config::ApiConfig;
use crate::state::AppState;

pub async fn connect_and_migrate(database_url: &str) -> AppResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    MIGRATOR
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    Ok(pool)
}

pub async fn build_app_state(config: &ApiConfig) -> AppResult<AppState> {
    let record_store: Arc<dyn GrantRecordStore> = match config.database_url.as_deref() {
        Some(database_url) => Arc::new(PostgresGrantRecordStore::new(
            connect_and_migrate(database_url).await?,
        )),
        None => {
            warn!("DATABASE_URL is not set, grant records are kept in memory");
            Arc::new(InMemoryGrantRecordStore::new())
        }
    };

    let permission_service: Arc<dyn PermissionService> =
        match config.permission_service_url.as_deref() {
            Some(base_url) => {
                let http_client = reqwest::Client::builder()
                    .timeout(config.external_call_timeout)
                    .build()
                    .map_err(|error| {
                        AppError::Internal(format!("failed to build HTTP client: {error}"))
                    })?;
                Arc::new(HttpPermissionService::new(
                    http_client,
                    base_url,
                    config.permission_service_token.clone(),
                ))
            }
            None => {
                warn!("PERMISSION_SERVICE_URL is not set, permissions are kept in memory");
                Arc::new(InMemoryPermissionService::new())
            }
        };

    Ok(assemble_state(permission_service, record_store, config))
}

pub fn assemble_state(
    permission_service: Arc<dyn PermissionService>,
    record_store: Arc<dyn GrantRecordStore>,
    config: &ApiConfig,
) -> AppState {
    let lifecycle_service = GrantLifecycleService::new(
        permission_service,
        record_store.clone(),
        ExternalCallPolicy::new(config.external_call_timeout),
    );
    let expiry_sweeper = ExpirySweeper::new(
        lifecycle_service.clone(),
        record_store,
        SweepOptions {
            max_concurrency: config.sweep_max_concurrency,
        },
    );

    AppState {
        lifecycle_service,
        expiry_sweeper,
        default_grant_duration_hours: config.default_grant_duration_hours,
    }
}
