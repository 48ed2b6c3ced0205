//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_permission_service;
mod in_memory_grant_record_store;
mod in_memory_permission_service;
mod postgres_grant_record_store;

pub use http_permission_service::HttpPermissionService;
pub use in_memory_grant_record_store::InMemoryGrantRecordStore;
pub use in_memory_permission_service::InMemoryPermissionService;
pub use postgres_grant_record_store::PostgresGrantRecordStore;

/// Embedded SQL migrations for the PostgreSQL grant record store.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
