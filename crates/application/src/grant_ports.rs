use async_trait::async_trait;

use lakegrant_core::{AppResult, NonEmptyString};
use lakegrant_domain::{AccessId, GrantRecord, PermissionSet, ResourceDescriptor};

/// Port for the external system that enforces data permissions.
#[async_trait]
pub trait PermissionService: Send + Sync {
    /// Grants the permission set to the principal on the resource.
    async fn apply_permissions(
        &self,
        principal: &NonEmptyString,
        resource: &ResourceDescriptor,
        permissions: &PermissionSet,
    ) -> AppResult<()>;

    /// Removes the permission set from the principal on the resource.
    ///
    /// Implementations must succeed when the permissions are already
    /// absent, so repeated revocations of one grant never fail here.
    async fn remove_permissions(
        &self,
        principal: &NonEmptyString,
        resource: &ResourceDescriptor,
        permissions: &PermissionSet,
    ) -> AppResult<()>;
}

/// Repository port for durable grant records.
#[async_trait]
pub trait GrantRecordStore: Send + Sync {
    /// Inserts a new record. Fails with `Conflict` on a duplicate access id.
    async fn insert_grant(&self, record: GrantRecord) -> AppResult<()>;

    /// Sets `is_active = false` on one record. Fails with `NotFound` when
    /// the access id is unknown.
    async fn mark_grant_inactive(&self, access_id: AccessId) -> AppResult<()>;

    /// Returns every stored record in no particular order.
    async fn scan_grants(&self) -> AppResult<Vec<GrantRecord>>;

    /// Returns records that are active and past their window at `now`.
    ///
    /// Stores with an expiry index should override this; the default
    /// filters a full scan.
    async fn scan_eligible_grants(&self, now: i64) -> AppResult<Vec<GrantRecord>> {
        Ok(self
            .scan_grants()
            .await?
            .into_iter()
            .filter(|record| record.is_eligible_for_revocation(now))
            .collect())
    }
}
