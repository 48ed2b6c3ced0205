//! Lakegrant expiry sweep worker runtime.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use lakegrant_application::{
    ExpirySweeper, ExternalCallPolicy, GrantLifecycleService, GrantRecordStore, PermissionService,
    SweepOptions, SweepReport, SweepStatus,
};
use lakegrant_core::{AppError, AppResult};
use lakegrant_infrastructure::{
    HttpPermissionService, InMemoryGrantRecordStore, InMemoryPermissionService,
    PostgresGrantRecordStore,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct WorkerConfig {
    run_once: bool,
    database_url: Option<String>,
    permission_service_url: Option<String>,
    permission_service_token: Option<String>,
    external_call_timeout_ms: u64,
    sweep_max_concurrency: usize,
    sweep_interval_seconds: u64,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let sweeper = build_sweeper(&config).await?;

    info!(
        run_once = config.run_once,
        sweep_interval_seconds = config.sweep_interval_seconds,
        sweep_max_concurrency = config.sweep_max_concurrency,
        external_call_timeout_ms = config.external_call_timeout_ms,
        "lakegrant-worker started"
    );

    if config.run_once {
        let report = sweeper.sweep().await;
        log_report(&report);
        if report.status == SweepStatus::Aborted {
            return Err(AppError::Internal(report.message));
        }
        return Ok(());
    }

    let mut interval = tokio::time::interval(Duration::from_secs(config.sweep_interval_seconds));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let report = sweeper.sweep().await;
        log_report(&report);
    }
}

async fn build_sweeper(config: &WorkerConfig) -> AppResult<ExpirySweeper> {
    let record_store: Arc<dyn GrantRecordStore> = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = connect_pool(database_url).await?;
            Arc::new(PostgresGrantRecordStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL is not set, grant records are kept in memory");
            Arc::new(InMemoryGrantRecordStore::new())
        }
    };

    let permission_service: Arc<dyn PermissionService> =
        match config.permission_service_url.as_deref() {
            Some(base_url) => {
                let http_client = reqwest::Client::builder()
                    .timeout(Duration::from_millis(config.external_call_timeout_ms))
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

    let lifecycle_service = GrantLifecycleService::new(
        permission_service,
        record_store.clone(),
        ExternalCallPolicy::new(Duration::from_millis(config.external_call_timeout_ms)),
    );

    Ok(ExpirySweeper::new(
        lifecycle_service,
        record_store,
        SweepOptions {
            max_concurrency: config.sweep_max_concurrency,
        },
    ))
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

fn log_report(report: &SweepReport) {
    match report.status {
        SweepStatus::Completed => info!(
            status = report.status.as_str(),
            eligible = report.eligible,
            succeeded = report.succeeded,
            "expiry sweep completed"
        ),
        SweepStatus::PartialFailure => warn!(
            status = report.status.as_str(),
            eligible = report.eligible,
            succeeded = report.succeeded,
            failed = report.failed,
            "expiry sweep finished with failed revocations"
        ),
        SweepStatus::Aborted => warn!(
            status = report.status.as_str(),
            message = %report.message,
            "expiry sweep aborted"
        ),
    }
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        let run_once = env::args().nth(1).as_deref() == Some("once");
        let sweep_interval_seconds = parse_env_u64("SWEEP_INTERVAL_SECONDS", 3_600)?;
        if sweep_interval_seconds == 0 {
            return Err(AppError::Validation(
                "SWEEP_INTERVAL_SECONDS must be greater than zero".to_owned(),
            ));
        }

        let sweep_max_concurrency = parse_env_usize("SWEEP_MAX_CONCURRENCY", 1)?;
        if sweep_max_concurrency == 0 {
            return Err(AppError::Validation(
                "SWEEP_MAX_CONCURRENCY must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            run_once,
            database_url: optional_env("DATABASE_URL"),
            permission_service_url: optional_env("PERMISSION_SERVICE_URL"),
            permission_service_token: optional_env("PERMISSION_SERVICE_TOKEN"),
            external_call_timeout_ms: parse_env_u64("EXTERNAL_CALL_TIMEOUT_MS", 10_000)?,
            sweep_max_concurrency,
            sweep_interval_seconds,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn parse_env_usize(name: &str, default: usize) -> AppResult<usize> {
    match env::var(name) {
        Ok(value) => value.parse::<usize>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
