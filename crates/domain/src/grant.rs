use std::fmt::{Display, Formatter};

use lakegrant_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{PermissionSet, ResourceInfo};

/// Seconds in one hour of grant duration.
pub const SECONDS_PER_HOUR: i64 = 3_600;

/// Unique grant identifier, generated once at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessId(Uuid);

impl AccessId {
    /// Creates a random access identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an access identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a transport value into an access identifier.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| AppError::Validation(format!("invalid access_id '{value}'")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AccessId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for AccessId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Longest accepted grant window, bounded by the record store's signed
/// 32-bit `duration_hours` column.
pub const MAX_DURATION_HOURS: u32 = i32::MAX.unsigned_abs();

/// Positive grant validity window in hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct DurationHours(u32);

impl DurationHours {
    /// Creates a validated duration.
    pub fn new(hours: u32) -> AppResult<Self> {
        if hours == 0 {
            return Err(AppError::Validation(
                "duration_hours must be greater than zero".to_owned(),
            ));
        }
        if hours > MAX_DURATION_HOURS {
            return Err(AppError::Validation(format!(
                "duration_hours must not exceed {MAX_DURATION_HOURS}"
            )));
        }

        Ok(Self(hours))
    }

    /// Returns the duration in hours.
    #[must_use]
    pub fn get(&self) -> u32 {
        self.0
    }

    /// Returns the duration in seconds.
    #[must_use]
    pub fn as_seconds(&self) -> i64 {
        i64::from(self.0) * SECONDS_PER_HOUR
    }
}

impl TryFrom<u32> for DurationHours {
    type Error = AppError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DurationHours> for u32 {
    fn from(value: DurationHours) -> Self {
        value.0
    }
}

/// Field values used to rebuild a grant record loaded from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantRecordParts {
    /// Primary key.
    pub access_id: AccessId,
    /// Principal granted access.
    pub principal: NonEmptyString,
    /// Persisted resource descriptor.
    pub resource_info: ResourceInfo,
    /// Granted permissions.
    pub permissions: PermissionSet,
    /// Creation time in seconds since the Unix epoch.
    pub grant_timestamp: i64,
    /// Requested validity window.
    pub duration_hours: DurationHours,
    /// Whether the grant is still in force.
    pub is_active: bool,
}

/// Durable record of one time-bounded grant.
///
/// Creation-time fields have no setters. The only mutation is
/// [`GrantRecord::deactivate`], which never re-activates a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRecord {
    access_id: AccessId,
    principal: NonEmptyString,
    resource_info: ResourceInfo,
    permissions: PermissionSet,
    grant_timestamp: i64,
    duration_hours: DurationHours,
    is_active: bool,
}

impl GrantRecord {
    /// Creates an active record for a grant applied at `granted_at`.
    #[must_use]
    pub fn issue(
        access_id: AccessId,
        principal: NonEmptyString,
        resource_info: ResourceInfo,
        permissions: PermissionSet,
        duration_hours: DurationHours,
        granted_at: i64,
    ) -> Self {
        Self {
            access_id,
            principal,
            resource_info,
            permissions,
            grant_timestamp: granted_at,
            duration_hours,
            is_active: true,
        }
    }

    /// Rebuilds a record from persisted fields.
    #[must_use]
    pub fn from_parts(parts: GrantRecordParts) -> Self {
        Self {
            access_id: parts.access_id,
            principal: parts.principal,
            resource_info: parts.resource_info,
            permissions: parts.permissions,
            grant_timestamp: parts.grant_timestamp,
            duration_hours: parts.duration_hours,
            is_active: parts.is_active,
        }
    }

    /// Returns the grant identifier.
    #[must_use]
    pub fn access_id(&self) -> AccessId {
        self.access_id
    }

    /// Returns the principal granted access.
    #[must_use]
    pub fn principal(&self) -> &NonEmptyString {
        &self.principal
    }

    /// Returns the persisted resource descriptor.
    #[must_use]
    pub fn resource_info(&self) -> &ResourceInfo {
        &self.resource_info
    }

    /// Returns the granted permission set.
    #[must_use]
    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    /// Returns the creation time in seconds since the Unix epoch.
    #[must_use]
    pub fn grant_timestamp(&self) -> i64 {
        self.grant_timestamp
    }

    /// Returns the requested validity window.
    #[must_use]
    pub fn duration_hours(&self) -> DurationHours {
        self.duration_hours
    }

    /// Returns whether the grant is still in force.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Last second at which the grant is still inside its window.
    #[must_use]
    pub fn expires_at(&self) -> i64 {
        self.grant_timestamp
            .saturating_add(self.duration_hours.as_seconds())
    }

    /// Returns true when the grant is active and its window has strictly
    /// elapsed at `now`.
    ///
    /// A grant is still valid at exactly `duration_hours * 3600` seconds
    /// after creation and becomes eligible one second later.
    #[must_use]
    pub fn is_eligible_for_revocation(&self, now: i64) -> bool {
        self.is_active
            && now.saturating_sub(self.grant_timestamp) > self.duration_hours.as_seconds()
    }

    /// Marks the grant revoked.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}
