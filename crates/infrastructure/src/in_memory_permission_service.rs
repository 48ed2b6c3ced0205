use std::collections::HashSet;

use async_trait::async_trait;
use lakegrant_application::PermissionService;
use lakegrant_core::{AppResult, NonEmptyString};
use lakegrant_domain::{Permission, PermissionSet, ResourceDescriptor};
use tokio::sync::RwLock;
use tracing::debug;

type PermissionKey = (String, String, Permission);

/// Permission service that keeps grants in process memory.
///
/// Used for local runs without a catalog endpoint and for tests.
#[derive(Debug, Default)]
pub struct InMemoryPermissionService {
    granted: RwLock<HashSet<PermissionKey>>,
}

impl InMemoryPermissionService {
    /// Creates a service with nothing granted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the principal currently holds the permission.
    pub async fn has_permission(
        &self,
        principal: &str,
        resource: &ResourceDescriptor,
        permission: Permission,
    ) -> bool {
        self.granted
            .read()
            .await
            .contains(&(principal.to_owned(), resource.to_string(), permission))
    }

    /// Number of (principal, resource, permission) entries in force.
    pub async fn granted_count(&self) -> usize {
        self.granted.read().await.len()
    }
}

fn keys(
    principal: &NonEmptyString,
    resource: &ResourceDescriptor,
    permissions: &PermissionSet,
) -> Vec<PermissionKey> {
    let resource = resource.to_string();
    permissions
        .iter()
        .map(|permission| (principal.as_str().to_owned(), resource.clone(), permission))
        .collect()
}

#[async_trait]
impl PermissionService for InMemoryPermissionService {
    async fn apply_permissions(
        &self,
        principal: &NonEmptyString,
        resource: &ResourceDescriptor,
        permissions: &PermissionSet,
    ) -> AppResult<()> {
        self.granted
            .write()
            .await
            .extend(keys(principal, resource, permissions));
        debug!(principal = %principal, resource = %resource, permissions = %permissions, "permissions applied in memory");
        Ok(())
    }

    async fn remove_permissions(
        &self,
        principal: &NonEmptyString,
        resource: &ResourceDescriptor,
        permissions: &PermissionSet,
    ) -> AppResult<()> {
        let mut granted = self.granted.write().await;
        for key in keys(principal, resource, permissions) {
            granted.remove(&key);
        }
        debug!(principal = %principal, resource = %resource, permissions = %permissions, "permissions removed in memory");
        Ok(())
    }
}
