use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::warn;

use lakegrant_application::GrantRecordStore;
use lakegrant_core::{AppError, AppResult, NonEmptyString};
use lakegrant_domain::{
    AccessId, DurationHours, GrantRecord, GrantRecordParts, Permission, PermissionSet,
    ResourceInfo,
};


/// PostgreSQL-backed grant record store using the `lake_access_grants` table.
#[derive(Clone)]
pub struct PostgresGrantRecordStore {
    pool: PgPool,
}

impl PostgresGrantRecordStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct GrantRow {
    access_id: uuid::Uuid,
    principal_id: String,
    resource_info: String,
    permissions: Vec<String>,
    grant_timestamp: i64,
    duration_hours: i32,
    is_active: bool,
}

impl GrantRow {
    fn into_record(self) -> AppResult<GrantRecord> {
        let permissions = self
            .permissions
            .iter()
            .map(|value| Permission::from_str(value))
            .collect::<AppResult<Vec<_>>>()?;
        let duration_hours = u32::try_from(self.duration_hours).map_err(|_| {
            AppError::Internal(format!(
                "grant '{}' has negative duration_hours {}",
                self.access_id, self.duration_hours
            ))
        })?;

        Ok(GrantRecord::from_parts(GrantRecordParts {
            access_id: AccessId::from_uuid(self.access_id),
            principal: NonEmptyString::new(self.principal_id)?,
            resource_info: ResourceInfo::from_stored(self.resource_info),
            permissions: PermissionSet::new(permissions)?,
            grant_timestamp: self.grant_timestamp,
            duration_hours: DurationHours::new(duration_hours)?,
            is_active: self.is_active,
        }))
    }
}

/// Decodes scanned rows, skipping rows this build cannot read so one bad
/// row never blocks the remaining grants.
fn rows_into_records(rows: Vec<GrantRow>) -> Vec<GrantRecord> {
    rows.into_iter()
        .filter_map(|row| {
            let access_id = row.access_id;
            match row.into_record() {
                Ok(record) => Some(record),
                Err(error) => {
                    warn!(
                        access_id = %access_id,
                        error = %error,
                        "skipping undecodable grant record"
                    );
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl GrantRecordStore for PostgresGrantRecordStore {
    async fn insert_grant(&self, record: GrantRecord) -> AppResult<()> {
        let duration_hours = i32::try_from(record.duration_hours().get()).map_err(|_| {
            AppError::Validation("duration_hours exceeds supported range".to_owned())
        })?;

        let result = sqlx::query(
            r#"
            INSERT INTO lake_access_grants (
                access_id,
                principal_id,
                resource_info,
                permissions,
                grant_timestamp,
                duration_hours,
                is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.access_id().as_uuid())
        .bind(record.principal().as_str())
        .bind(record.resource_info().as_str())
        .bind(record.permissions().to_storage_values())
        .bind(record.grant_timestamp())
        .bind(duration_hours)
        .bind(record.is_active())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(error) => {
                if let sqlx::Error::Database(database_error) = &error
                    && database_error.code().as_deref() == Some("23505")
                {
                    return Err(AppError::Conflict(format!(
                        "grant '{}' already exists",
                        record.access_id()
                    )));
                }

                Err(AppError::Internal(format!(
                    "failed to insert grant record: {error}"
                )))
            }
        }
    }

    async fn mark_grant_inactive(&self, access_id: AccessId) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE lake_access_grants
            SET is_active = false
            WHERE access_id = $1
            "#,
        )
        .bind(access_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update grant record: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "grant '{access_id}' was not found"
            )));
        }

        Ok(())
    }

    async fn scan_grants(&self) -> AppResult<Vec<GrantRecord>> {
        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT
                access_id,
                principal_id,
                resource_info,
                permissions,
                grant_timestamp,
                duration_hours,
                is_active
            FROM lake_access_grants
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to scan grant records: {error}")))?;

        Ok(rows_into_records(rows))
    }

    async fn scan_eligible_grants(&self, now: i64) -> AppResult<Vec<GrantRecord>> {
        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT
                access_id,
                principal_id,
                resource_info,
                permissions,
                grant_timestamp,
                duration_hours,
                is_active
            FROM lake_access_grants
            WHERE is_active
              AND expires_at < $1
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to scan eligible grant records: {error}"))
        })?;

        Ok(rows_into_records(rows))
    }
}
