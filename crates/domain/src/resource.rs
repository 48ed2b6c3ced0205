use std::fmt::{Display, Formatter};

use lakegrant_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Protected data-catalog resource a grant applies to.
///
/// Serializes to the catalog's own resource layout, e.g.
/// `{"Table":{"DatabaseName":"sales","Name":"orders"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceDescriptor {
    /// A whole catalog database.
    Database {
        /// Database name.
        #[serde(rename = "Name")]
        name: NonEmptyString,
    },
    /// One table in a catalog database.
    Table {
        /// Database containing the table.
        #[serde(rename = "DatabaseName")]
        database_name: NonEmptyString,
        /// Table name.
        #[serde(rename = "Name")]
        name: NonEmptyString,
    },
    /// A column subset of one table.
    TableWithColumns {
        /// Database containing the table.
        #[serde(rename = "DatabaseName")]
        database_name: NonEmptyString,
        /// Table name.
        #[serde(rename = "Name")]
        name: NonEmptyString,
        /// Columns covered by the grant.
        #[serde(rename = "ColumnNames")]
        column_names: Vec<NonEmptyString>,
    },
}

impl ResourceDescriptor {
    /// Creates a database resource descriptor.
    pub fn database(name: impl Into<String>) -> AppResult<Self> {
        Ok(Self::Database {
            name: NonEmptyString::new(name)?,
        })
    }

    /// Creates a table resource descriptor.
    pub fn table(database_name: impl Into<String>, name: impl Into<String>) -> AppResult<Self> {
        Ok(Self::Table {
            database_name: NonEmptyString::new(database_name)?,
            name: NonEmptyString::new(name)?,
        })
    }

    /// Creates a column-scoped table resource descriptor.
    pub fn table_with_columns(
        database_name: impl Into<String>,
        name: impl Into<String>,
        column_names: impl IntoIterator<Item = String>,
    ) -> AppResult<Self> {
        let descriptor = Self::TableWithColumns {
            database_name: NonEmptyString::new(database_name)?,
            name: NonEmptyString::new(name)?,
            column_names: column_names
                .into_iter()
                .map(NonEmptyString::new)
                .collect::<AppResult<Vec<_>>>()?,
        };
        descriptor.validate()?;

        Ok(descriptor)
    }

    /// Returns the stable resource kind label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Database { .. } => "database",
            Self::Table { .. } => "table",
            Self::TableWithColumns { .. } => "table_with_columns",
        }
    }

    /// Serializes the descriptor into its persisted form.
    pub fn to_resource_info(&self) -> AppResult<ResourceInfo> {
        serde_json::to_string(self)
            .map(ResourceInfo)
            .map_err(|error| {
                AppError::Internal(format!("failed to serialize resource descriptor: {error}"))
            })
    }

    fn validate(&self) -> AppResult<()> {
        if let Self::TableWithColumns { column_names, .. } = self
            && column_names.is_empty()
        {
            return Err(AppError::Validation(
                "column-scoped resources require at least one column".to_owned(),
            ));
        }

        Ok(())
    }
}

impl Display for ResourceDescriptor {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Database { name } => write!(formatter, "database:{name}"),
            Self::Table {
                database_name,
                name,
            } => write!(formatter, "table:{database_name}.{name}"),
            Self::TableWithColumns {
                database_name,
                name,
                column_names,
            } => write!(
                formatter,
                "columns:{database_name}.{name}({})",
                column_names
                    .iter()
                    .map(NonEmptyString::as_str)
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        }
    }
}

/// Serialized resource descriptor as persisted by grant record stores.
///
/// Stores treat the value as opaque text; only [`ResourceInfo::parse`]
/// interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceInfo(String);

impl ResourceInfo {
    /// Wraps persisted text without interpreting it.
    #[must_use]
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the persisted text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Deserializes the persisted text into a validated descriptor.
    pub fn parse(&self) -> AppResult<ResourceDescriptor> {
        let descriptor =
            serde_json::from_str::<ResourceDescriptor>(self.0.as_str()).map_err(|error| {
                AppError::Validation(format!("invalid stored resource descriptor: {error}"))
            })?;
        descriptor.validate()?;

        Ok(descriptor)
    }
}
