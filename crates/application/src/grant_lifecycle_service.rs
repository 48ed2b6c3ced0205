//! Grant creation and revocation.
//!
//! The lifecycle service is the only component that talks to both the
//! permission service and the record store, and it decides what each
//! partial failure means for the stored grant state.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use lakegrant_core::{AppError, AppResult, NonEmptyString};
use lakegrant_domain::{
    AccessId, DurationHours, GrantRecord, Permission, PermissionSet, ResourceDescriptor,
};

use crate::grant_ports::{GrantRecordStore, PermissionService};


/// Upper bound applied to every call into the permission service or the
/// record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalCallPolicy {
    /// Maximum time one external call may take.
    pub timeout: Duration,
}

impl ExternalCallPolicy {
    /// Creates a policy with the given per-call timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Runs one external call, reporting a timeout as an internal error.
    pub async fn run<T, F>(&self, operation: &str, call: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Internal(format!(
                "{operation} timed out after {} ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

impl Default for ExternalCallPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

/// Input payload for grant creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGrantInput {
    /// Principal receiving access.
    pub principal: String,
    /// Resource the permissions apply to.
    pub resource: ResourceDescriptor,
    /// Requested permissions.
    pub permissions: Vec<Permission>,
    /// Validity window in hours.
    pub duration_hours: u32,
}

/// Everything needed to take one grant's permissions away again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokeGrantInput {
    /// Grant identifier.
    pub access_id: AccessId,
    /// Principal holding the grant.
    pub principal: NonEmptyString,
    /// Resource the grant applies to.
    pub resource: ResourceDescriptor,
    /// Permissions originally granted.
    pub permissions: PermissionSet,
}

impl RevokeGrantInput {
    /// Builds revoke input from a stored record, parsing its resource.
    pub fn from_record(record: &GrantRecord) -> AppResult<Self> {
        Ok(Self {
            access_id: record.access_id(),
            principal: record.principal().clone(),
            resource: record.resource_info().parse()?,
            permissions: record.permissions().clone(),
        })
    }
}

/// Query parameters for grant listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GrantListQuery {
    /// Whether to return only grants still marked active.
    pub active_only: bool,
}

/// Application service owning the grant lifecycle.
#[derive(Clone)]
pub struct GrantLifecycleService {
    permission_service: Arc<dyn PermissionService>,
    record_store: Arc<dyn GrantRecordStore>,
    call_policy: ExternalCallPolicy,
}

impl GrantLifecycleService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        permission_service: Arc<dyn PermissionService>,
        record_store: Arc<dyn GrantRecordStore>,
        call_policy: ExternalCallPolicy,
    ) -> Self {
        Self {
            permission_service,
            record_store,
            call_policy,
        }
    }

    /// Returns the timeout policy applied to external calls.
    #[must_use]
    pub fn call_policy(&self) -> ExternalCallPolicy {
        self.call_policy
    }

    /// Applies the requested permissions and records an active grant.
    ///
    /// Nothing is recorded when applying fails. When applying succeeds but
    /// recording fails the permission stays applied and the condition is
    /// logged as an inconsistency for reconciliation.
    pub async fn create_grant(&self, input: CreateGrantInput) -> AppResult<GrantRecord> {
        let principal = NonEmptyString::new(input.principal).map_err(|_| {
            AppError::Validation("principal must not be empty or whitespace".to_owned())
        })?;
        let permissions = PermissionSet::new(input.permissions)?;
        let duration_hours = DurationHours::new(input.duration_hours)?;
        let resource_info = input.resource.to_resource_info()?;
        let access_id = AccessId::new();

        self.call_policy
            .run(
                "permission apply",
                self.permission_service.apply_permissions(
                    &principal,
                    &input.resource,
                    &permissions,
                ),
            )
            .await
            .map_err(|error| {
                warn!(
                    access_id = %access_id,
                    principal = %principal,
                    resource = %input.resource,
                    error = %error,
                    "failed to apply grant permissions"
                );
                AppError::PermissionApplyFailed(error.to_string())
            })?;

        let record = GrantRecord::issue(
            access_id,
            principal,
            resource_info,
            permissions,
            duration_hours,
            Utc::now().timestamp(),
        );

        self.call_policy
            .run(
                "grant record insert",
                self.record_store.insert_grant(record.clone()),
            )
            .await
            .map_err(|error| {
                warn!(
                    access_id = %access_id,
                    principal = %record.principal(),
                    resource = %input.resource,
                    permissions = %record.permissions(),
                    error = %error,
                    "permissions applied but grant record was not persisted"
                );
                AppError::RecordInsertFailed(error.to_string())
            })?;

        info!(
            access_id = %access_id,
            principal = %record.principal(),
            resource = %input.resource,
            permissions = %record.permissions(),
            duration_hours = duration_hours.get(),
            "grant created"
        );

        Ok(record)
    }

    /// Removes the granted permissions and marks the record inactive.
    ///
    /// The record is left active when removal fails so the next sweep
    /// retries it.
    pub async fn revoke_grant(&self, input: &RevokeGrantInput) -> AppResult<()> {
        self.call_policy
            .run(
                "permission remove",
                self.permission_service.remove_permissions(
                    &input.principal,
                    &input.resource,
                    &input.permissions,
                ),
            )
            .await
            .map_err(|error| {
                warn!(
                    access_id = %input.access_id,
                    principal = %input.principal,
                    resource = %input.resource,
                    error = %error,
                    "failed to remove grant permissions"
                );
                AppError::PermissionRemoveFailed(error.to_string())
            })?;

        self.call_policy
            .run(
                "grant record update",
                self.record_store.mark_grant_inactive(input.access_id),
            )
            .await
            .map_err(|error| {
                warn!(
                    access_id = %input.access_id,
                    principal = %input.principal,
                    resource = %input.resource,
                    error = %error,
                    "permissions removed but grant record is still marked active"
                );
                AppError::RecordUpdateFailed(error.to_string())
            })?;

        info!(
            access_id = %input.access_id,
            principal = %input.principal,
            resource = %input.resource,
            permissions = %input.permissions,
            "grant revoked"
        );

        Ok(())
    }

    /// Lists stored grants, newest first.
    pub async fn list_grants(&self, query: GrantListQuery) -> AppResult<Vec<GrantRecord>> {
        let mut records = self
            .call_policy
            .run("grant record scan", self.record_store.scan_grants())
            .await
            .map_err(|error| AppError::RecordScanFailed(error.to_string()))?;

        if query.active_only {
            records.retain(GrantRecord::is_active);
        }
        records.sort_by(|left, right| {
            right
                .grant_timestamp()
                .cmp(&left.grant_timestamp())
                .then_with(|| left.access_id().cmp(&right.access_id()))
        });

        Ok(records)
    }
}
