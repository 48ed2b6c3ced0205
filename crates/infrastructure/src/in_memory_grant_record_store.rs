use std::collections::HashMap;

use async_trait::async_trait;
use lakegrant_application::GrantRecordStore;
use lakegrant_core::{AppError, AppResult};
use lakegrant_domain::{AccessId, GrantRecord};
use tokio::sync::RwLock;

/// In-memory grant record store.
#[derive(Debug, Default)]
pub struct InMemoryGrantRecordStore {
    records: RwLock<HashMap<AccessId, GrantRecord>>,
}

impl InMemoryGrantRecordStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GrantRecordStore for InMemoryGrantRecordStore {
    async fn insert_grant(&self, record: GrantRecord) -> AppResult<()> {
        let mut records = self.records.write().await;

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
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&access_id)
            .ok_or_else(|| AppError::NotFound(format!("grant '{access_id}' was not found")))?;

        record.deactivate();
        Ok(())
    }

    async fn scan_grants(&self) -> AppResult<Vec<GrantRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use lakegrant_application::GrantRecordStore;
    use lakegrant_core::{AppError, NonEmptyString};
    use lakegrant_domain::{
        AccessId, DurationHours, GrantRecord, Permission, PermissionSet, ResourceDescriptor,
    };

    use super::InMemoryGrantRecordStore;

    fn grant(granted_at: i64) -> GrantRecord {
        let (Ok(principal), Ok(resource_info), Ok(permissions), Ok(duration_hours)) = (
            NonEmptyString::new("role:analyst"),
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
            granted_at,
        )
    }

    #[tokio::test]
    async fn duplicate_access_id_is_rejected() {
        let store = InMemoryGrantRecordStore::new();
        let record = grant(0);

        assert!(store.insert_grant(record.clone()).await.is_ok());
        let duplicate = store.insert_grant(record).await;

        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn marking_unknown_grant_fails() {
        let store = InMemoryGrantRecordStore::new();

        let result = store.mark_grant_inactive(AccessId::new()).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn mark_inactive_is_repeatable_and_retains_record() {
        let store = InMemoryGrantRecordStore::new();
        let record = grant(0);
        assert!(store.insert_grant(record.clone()).await.is_ok());

        assert!(store.mark_grant_inactive(record.access_id()).await.is_ok());
        assert!(store.mark_grant_inactive(record.access_id()).await.is_ok());

        let scanned = store.scan_grants().await.unwrap_or_default();
        assert_eq!(scanned.len(), 1);
        assert!(!scanned[0].is_active());
        assert_eq!(scanned[0].grant_timestamp(), record.grant_timestamp());
    }

    #[tokio::test]
    async fn default_eligible_scan_uses_strict_expiry() {
        let store = InMemoryGrantRecordStore::new();
        let record = grant(1_000);
        assert!(store.insert_grant(record).await.is_ok());

        let at_boundary = store.scan_eligible_grants(1_000 + 3_600).await;
        let after_boundary = store.scan_eligible_grants(1_000 + 3_601).await;

        assert_eq!(at_boundary.map(|records| records.len()).ok(), Some(0));
        assert_eq!(after_boundary.map(|records| records.len()).ok(), Some(1));
    }
}
