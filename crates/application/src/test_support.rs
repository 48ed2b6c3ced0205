use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use lakegrant_core::{AppError, AppResult, NonEmptyString};
use lakegrant_domain::{
    AccessId, DurationHours, GrantRecord, Permission, PermissionSet, ResourceDescriptor,
};

use crate::{
    ExternalCallPolicy, GrantLifecycleService, GrantRecordStore, PermissionService,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PermissionCallKind {
    Apply,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PermissionCall {
    pub kind: PermissionCallKind,
    pub principal: String,
    pub resource: ResourceDescriptor,
    pub permissions: PermissionSet,
}

#[derive(Default)]
pub(crate) struct FakePermissionService {
    pub calls: Mutex<Vec<PermissionCall>>,
    pub fail_apply: Mutex<bool>,
    pub remove_failures_remaining: Mutex<usize>,
    pub failing_principals: Mutex<Vec<String>>,
    pub apply_delay: Mutex<Option<Duration>>,
    pub remove_delay: Mutex<Option<Duration>>,
}

impl FakePermissionService {
    pub async fn calls_of(&self, kind: PermissionCallKind) -> Vec<PermissionCall> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| call.kind == kind)
            .cloned()
            .collect()
    }

    async fn record(
        &self,
        kind: PermissionCallKind,
        principal: &NonEmptyString,
        resource: &ResourceDescriptor,
        permissions: &PermissionSet,
    ) {
        self.calls.lock().await.push(PermissionCall {
            kind,
            principal: principal.as_str().to_owned(),
            resource: resource.clone(),
            permissions: permissions.clone(),
        });
    }
}

#[async_trait]
impl PermissionService for FakePermissionService {
    async fn apply_permissions(
        &self,
        principal: &NonEmptyString,
        resource: &ResourceDescriptor,
        permissions: &PermissionSet,
    ) -> AppResult<()> {
        let delay = *self.apply_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.record(PermissionCallKind::Apply, principal, resource, permissions)
            .await;

        if *self.fail_apply.lock().await {
            return Err(AppError::Internal("catalog rejected grant".to_owned()));
        }

        Ok(())
    }

    async fn remove_permissions(
        &self,
        principal: &NonEmptyString,
        resource: &ResourceDescriptor,
        permissions: &PermissionSet,
    ) -> AppResult<()> {
        let delay = *self.remove_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.record(PermissionCallKind::Remove, principal, resource, permissions)
            .await;

        if self
            .failing_principals
            .lock()
            .await
            .iter()
            .any(|failing| failing == principal.as_str())
        {
            return Err(AppError::Internal("catalog unavailable".to_owned()));
        }

        let mut remaining = self.remove_failures_remaining.lock().await;
        if *remaining > 0 {
            *remaining -= 1;
            return Err(AppError::Internal("catalog throttled request".to_owned()));
        }

        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeGrantRecordStore {
    pub records: Mutex<HashMap<AccessId, GrantRecord>>,
    pub insert_calls: Mutex<usize>,
    pub update_calls: Mutex<usize>,
    pub fail_insert: Mutex<bool>,
    pub fail_update: Mutex<bool>,
    pub fail_scan: Mutex<bool>,
    pub scan_delay: Mutex<Option<Duration>>,
}

impl FakeGrantRecordStore {
    pub async fn seed(&self, record: GrantRecord) {
        self.records.lock().await.insert(record.access_id(), record);
    }

    pub async fn get(&self, access_id: AccessId) -> Option<GrantRecord> {
        self.records.lock().await.get(&access_id).cloned()
    }
}

#[async_trait]
impl GrantRecordStore for FakeGrantRecordStore {
    async fn insert_grant(&self, record: GrantRecord) -> AppResult<()> {
        *self.insert_calls.lock().await += 1;
        if *self.fail_insert.lock().await {
            return Err(AppError::Internal("table unavailable".to_owned()));
        }

        let mut records = self.records.lock().await;
        if records.contains_key(&record.access_id()) {
            return Err(AppError::Conflict(format!(
                "grant '{}' already exists",
                record.access_id()
            )));
        }
        records.insert(record.access_id(), record);
        Ok(())
    }

    async fn mark_grant_inactive(&self, access_id: AccessId) -> AppResult<()> {
        *self.update_calls.lock().await += 1;
        if *self.fail_update.lock().await {
            return Err(AppError::Internal("table unavailable".to_owned()));
        }

        self.records
            .lock()
            .await
            .get_mut(&access_id)
            .map(GrantRecord::deactivate)
            .ok_or_else(|| AppError::NotFound(format!("grant '{access_id}' was not found")))
    }

    async fn scan_grants(&self) -> AppResult<Vec<GrantRecord>> {
        let delay = *self.scan_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if *self.fail_scan.lock().await {
            return Err(AppError::Internal("scan throttled".to_owned()));
        }

        Ok(self.records.lock().await.values().cloned().collect())
    }
}

pub(crate) fn table(database_name: &str, name: &str) -> ResourceDescriptor {
    match ResourceDescriptor::table(database_name, name) {
        Ok(resource) => resource,
        Err(error) => panic!("fixture resource should be valid: {error}"),
    }
}

pub(crate) fn stored_grant(
    principal: &str,
    resource: &ResourceDescriptor,
    permissions: &[Permission],
    duration_hours: u32,
    granted_at: i64,
) -> GrantRecord {
    let (Ok(principal), Ok(resource_info), Ok(permissions), Ok(duration_hours)) = (
        NonEmptyString::new(principal),
        resource.to_resource_info(),
        PermissionSet::new(permissions.iter().copied()),
        DurationHours::new(duration_hours),
    ) else {
        panic!("fixture grant values should be valid");
    };

    GrantRecord::issue(
        AccessId::new(),
        principal,
        resource_info,
        permissions,
        duration_hours,
        granted_at,
    )
}

pub(crate) fn lifecycle_service() -> (
    GrantLifecycleService,
    Arc<FakePermissionService>,
    Arc<FakeGrantRecordStore>,
) {
    let permission_service = Arc::new(FakePermissionService::default());
    let record_store = Arc::new(FakeGrantRecordStore::default());
    let service = GrantLifecycleService::new(
        permission_service.clone(),
        record_store.clone(),
        ExternalCallPolicy::new(Duration::from_secs(5)),
    );

    (service, permission_service, record_store)
}
