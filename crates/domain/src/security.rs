use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use lakegrant_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Permission kinds a grant can carry on a data resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    /// Every permission on the resource.
    All,
    /// Allows reading rows.
    Select,
    /// Allows inserting rows.
    Insert,
    /// Allows deleting rows.
    Delete,
    /// Allows reading resource metadata.
    Describe,
    /// Allows altering resource definitions.
    Alter,
    /// Allows dropping the resource.
    Drop,
    /// Allows creating databases.
    CreateDatabase,
    /// Allows creating tables.
    CreateTable,
    /// Allows registering data locations.
    DataLocationAccess,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Delete => "DELETE",
            Self::Describe => "DESCRIBE",
            Self::Alter => "ALTER",
            Self::Drop => "DROP",
            Self::CreateDatabase => "CREATE_DATABASE",
            Self::CreateTable => "CREATE_TABLE",
            Self::DataLocationAccess => "DATA_LOCATION_ACCESS",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::All,
            Permission::Select,
            Permission::Insert,
            Permission::Delete,
            Permission::Describe,
            Permission::Alter,
            Permission::Drop,
            Permission::CreateDatabase,
            Permission::CreateTable,
            Permission::DataLocationAccess,
        ];

        ALL
    }

    /// Parses a transport value into a permission.
    pub fn from_transport(value: &str) -> AppResult<Self> {
        Self::from_str(value)
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|permission| permission.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown permission value '{value}'")))
    }
}

impl Display for Permission {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Non-empty, duplicate-free set of granted permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Permission>", into = "Vec<Permission>")]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    /// Creates a permission set, rejecting an empty input.
    pub fn new(permissions: impl IntoIterator<Item = Permission>) -> AppResult<Self> {
        let permissions: BTreeSet<Permission> = permissions.into_iter().collect();
        if permissions.is_empty() {
            return Err(AppError::Validation(
                "at least one permission must be granted".to_owned(),
            ));
        }

        Ok(Self(permissions))
    }

    /// Parses transport values into a permission set.
    pub fn from_transport<S: AsRef<str>>(values: &[S]) -> AppResult<Self> {
        let permissions = values
            .iter()
            .map(|value| Permission::from_transport(value.as_ref()))
            .collect::<AppResult<Vec<_>>>()?;
        Self::new(permissions)
    }

    /// Returns true when the set carries the permission.
    #[must_use]
    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    /// Iterates permissions in stable order.
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }

    /// Returns stable storage values in order.
    #[must_use]
    pub fn to_storage_values(&self) -> Vec<String> {
        self.iter().map(|permission| permission.as_str().to_owned()).collect()
    }

    /// Number of distinct permissions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed set; present for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<Permission>> for PermissionSet {
    type Error = AppError;

    fn try_from(value: Vec<Permission>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PermissionSet> for Vec<Permission> {
    fn from(value: PermissionSet) -> Self {
        value.0.into_iter().collect()
    }
}

impl Display for PermissionSet {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.to_storage_values().join(","))
    }
}
