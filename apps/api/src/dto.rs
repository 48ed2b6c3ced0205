use lakegrant_application::{ActivationStatus, SweepReport};
use lakegrant_domain::{GrantRecord, ResourceDescriptor};
use serde::{Deserialize, Serialize};

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Success flag plus message returned by every activation.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ActivationStatusResponse {
    pub success: bool,
    pub message: String,
}

impl From<ActivationStatus> for ActivationStatusResponse {
    fn from(value: ActivationStatus) -> Self {
        Self {
            success: value.success,
            message: value.message,
        }
    }
}

/// Incoming payload for grant creation.
#[derive(Debug, Deserialize)]
pub struct CreateGrantRequest {
    pub principal: String,
    pub resource: ResourceDescriptor,
    pub permissions: Vec<String>,
    pub duration_hours: Option<u32>,
}

/// API representation of a grant record.
#[derive(Debug, Serialize)]
pub struct GrantResponse {
    pub access_id: String,
    pub principal_id: String,
    pub resource_info: String,
    pub permissions: Vec<String>,
    pub grant_timestamp: i64,
    pub duration_hours: u32,
    pub expires_at: i64,
    pub is_active: bool,
}

impl From<GrantRecord> for GrantResponse {
    fn from(value: GrantRecord) -> Self {
        Self {
            access_id: value.access_id().to_string(),
            principal_id: value.principal().as_str().to_owned(),
            resource_info: value.resource_info().as_str().to_owned(),
            permissions: value.permissions().to_storage_values(),
            grant_timestamp: value.grant_timestamp(),
            duration_hours: value.duration_hours().get(),
            expires_at: value.expires_at(),
            is_active: value.is_active(),
        }
    }
}

/// Response for a successful grant creation.
#[derive(Debug, Serialize)]
pub struct CreateGrantResponse {
    pub success: bool,
    pub message: String,
    pub grant: GrantResponse,
}

/// Query parameters for grant listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListGrantsQuery {
    pub active_only: Option<bool>,
}

/// Terminal status of one sweep activation.
#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub success: bool,
    pub message: String,
    pub status: &'static str,
    pub eligible: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl From<SweepReport> for SweepResponse {
    fn from(value: SweepReport) -> Self {
        let activation = value.to_activation_status();
        Self {
            success: activation.success,
            message: activation.message,
            status: value.status.as_str(),
            eligible: value.eligible,
            attempted: value.attempted,
            succeeded: value.succeeded,
            failed: value.failed,
        }
    }
}
