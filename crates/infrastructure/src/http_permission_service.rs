use async_trait::async_trait;
use lakegrant_application::PermissionService;
use lakegrant_core::{AppError, AppResult, NonEmptyString};
use lakegrant_domain::{Permission, PermissionSet, ResourceDescriptor};
use reqwest::StatusCode;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct DataLakePrincipal<'a> {
    #[serde(rename = "DataLakePrincipalIdentifier")]
    identifier: &'a str,
}

#[derive(Debug, Serialize)]
struct PermissionChangeRequest<'a> {
    #[serde(rename = "Principal")]
    principal: DataLakePrincipal<'a>,
    #[serde(rename = "Resource")]
    resource: &'a ResourceDescriptor,
    #[serde(rename = "Permissions")]
    permissions: Vec<Permission>,
}

/// Permission service client for an HTTP data-catalog permission gateway.
///
/// Sends `POST {base_url}/permissions/grant` and
/// `POST {base_url}/permissions/revoke`. A `404` on revoke means the
/// permissions are already gone and is reported as success.
pub struct HttpPermissionService {
    http_client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HttpPermissionService {
    /// Creates a client for the gateway rooted at `base_url`.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        bearer_token: Option<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            bearer_token,
        }
    }

    async fn send_change(
        &self,
        action: &str,
        principal: &NonEmptyString,
        resource: &ResourceDescriptor,
        permissions: &PermissionSet,
    ) -> AppResult<StatusCode> {
        let endpoint = format!("{}/permissions/{action}", self.base_url);
        let mut request = self
            .http_client
            .post(endpoint)
            .json(&PermissionChangeRequest {
                principal: DataLakePrincipal {
                    identifier: principal.as_str(),
                },
                resource,
                permissions: permissions.iter().collect(),
            });
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|error| {
            AppError::Internal(format!("failed to call permission {action} endpoint: {error}"))
        })?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(status);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_owned());
        Err(AppError::Internal(format!(
            "permission {action} endpoint returned status {}: {body}",
            status.as_u16()
        )))
    }
}

#[async_trait]
impl PermissionService for HttpPermissionService {
    async fn apply_permissions(
        &self,
        principal: &NonEmptyString,
        resource: &ResourceDescriptor,
        permissions: &PermissionSet,
    ) -> AppResult<()> {
        let status = self
            .send_change("grant", principal, resource, permissions)
            .await?;

        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!(
                "permission gateway does not know resource '{resource}'"
            )));
        }

        Ok(())
    }

    async fn remove_permissions(
        &self,
        principal: &NonEmptyString,
        resource: &ResourceDescriptor,
        permissions: &PermissionSet,
    ) -> AppResult<()> {
        self.send_change("revoke", principal, resource, permissions)
            .await
            .map(|_| ())
    }
}
