use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use lakegrant_core::{AppError, AppResult};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: Option<String>,
    pub permission_service_url: Option<String>,
    pub permission_service_token: Option<String>,
    pub external_call_timeout: Duration,
    pub sweep_max_concurrency: usize,
    pub default_grant_duration_hours: u32,
    pub api_host: String,
    pub api_port: u16,
}

impl ApiConfig {
    pub fn load() -> AppResult<Self> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        let database_url = optional_env("DATABASE_URL");
        if migrate_only && database_url.is_none() {
            return Err(AppError::Validation(
                "DATABASE_URL is required to run migrations".to_owned(),
            ));
        }

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let sweep_max_concurrency = parse_env("SWEEP_MAX_CONCURRENCY", 1_usize)?;
        if sweep_max_concurrency == 0 {
            return Err(AppError::Validation(
                "SWEEP_MAX_CONCURRENCY must be greater than zero".to_owned(),
            ));
        }

        let default_grant_duration_hours = parse_env("DEFAULT_GRANT_DURATION_HOURS", 24_u32)?;
        if default_grant_duration_hours == 0 {
            return Err(AppError::Validation(
                "DEFAULT_GRANT_DURATION_HOURS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            migrate_only,
            database_url,
            permission_service_url: optional_env("PERMISSION_SERVICE_URL"),
            permission_service_token: optional_env("PERMISSION_SERVICE_TOKEN"),
            external_call_timeout: Duration::from_millis(parse_env(
                "EXTERNAL_CALL_TIMEOUT_MS",
                10_000_u64,
            )?),
            sweep_max_concurrency,
            default_grant_duration_hours,
            api_host,
            api_port,
        })
    }

    pub fn socket_address(&self) -> AppResult<SocketAddr> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
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

fn parse_env<T>(name: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value.parse::<T>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
