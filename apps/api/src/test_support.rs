use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lakegrant_application::GrantRecordStore;
use lakegrant_core::{AppError, AppResult, NonEmptyString};
use lakegrant_domain::{
    AccessId, DurationHours, GrantRecord, Permission, PermissionSet, ResourceDescriptor,
};
use lakegrant_infrastructure::{InMemoryGrantRecordStore, InMemoryPermissionService};

use crate::api_config::ApiConfig;
use crate::api_services::assemble_state;
use crate::state::AppState;

pub fn test_config() -> ApiConfig {
    ApiConfig {
        migrate_only: false,
        database_url: None,
        permission_service_url: None,
        permission_service_token: None,
        external_call_timeout: Duration::from_secs(5),
        sweep_max_concurrency: 2,
        default_grant_duration_hours: 24,
        api_host: "127.0.0.1".to_owned(),
        api_port: 3001,
    }
}

pub fn in_memory_state() -> (
    AppState,
    Arc<InMemoryPermissionService>,
    Arc<InMemoryGrantRecordStore>,
) {
    let permission_service = Arc::new(InMemoryPermissionService::new());
    let record_store = Arc::new(InMemoryGrantRecordStore::new());
    let state = assemble_state(
        permission_service.clone(),
        record_store.clone(),
        &test_config(),
    );
    (state, permission_service, record_store)
}

pub fn expired_grant(principal: &str) -> GrantRecord {
    let (Ok(principal), Ok(resource_info), Ok(permissions), Ok(duration_hours)) = (
        NonEmptyString::new(principal),
        ResourceDescriptor::table("sales", "orders")
            .and_then(|resource| resource.to_resource_info()),
        PermissionSet::new([Permission::Select]),
        DurationHours::new(1),
    ) else {
        panic!("fixture values should be valid");
    };

    GrantRecord::issue(
        AccessId::new(),
        principal,
        resource_info,
        permissions,
        duration_hours,
        0,
    )
}

/// Record store whose reads always fail.
pub struct UnreadableGrantRecordStore;

#[async_trait]
impl GrantRecordStore for UnreadableGrantRecordStore {
    async fn insert_grant(&self, _record: GrantRecord) -> AppResult<()> {
        Ok(())
    }

    async fn mark_grant_inactive(&self, _access_id: AccessId) -> AppResult<()> {
        Ok(())
    }

    async fn scan_grants(&self) -> AppResult<Vec<GrantRecord>> {
        Err(AppError::Internal("grant table unavailable".to_owned()))
    }
}
