//! Static table metadata that drives statement generation.
//!
//! A `TableSchema` is built once per table (usually from a concrete record
//! type) and validated up front: names must be plain identifiers, columns
//! must be unique, and every primary-key and auto column must exist.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use super::errors::RecordError;

lazy_static! {
    // Table and column names are written into SQL text, so only bare identifiers are allowed
    static ref IDENTIFIER_REGEX: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Semantic type of a column.
///
/// Values are always held as text in a record; the type decides how the
/// Postgres handle binds and decodes them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Integer,
    BigInt,
    Numeric,
    Boolean,
    Timestamp,
    Uuid,
}

impl ColumnType {
    /// Empty strings in non-text columns are stored as NULL.
    pub fn is_text(&self) -> bool {
        matches!(self, ColumnType::Text)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Text => write!(f, "text"),
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::BigInt => write!(f, "bigint"),
            ColumnType::Numeric => write!(f, "numeric"),
            ColumnType::Boolean => write!(f, "boolean"),
            ColumnType::Timestamp => write!(f, "timestamp"),
            ColumnType::Uuid => write!(f, "uuid"),
        }
    }
}

impl FromStr for ColumnType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "text" => Ok(ColumnType::Text),
            "integer" => Ok(ColumnType::Integer),
            "bigint" => Ok(ColumnType::BigInt),
            "numeric" => Ok(ColumnType::Numeric),
            "boolean" => Ok(ColumnType::Boolean),
            "timestamp" => Ok(ColumnType::Timestamp),
            "uuid" => Ok(ColumnType::Uuid),
            _ => Err(anyhow::anyhow!("Invalid column type: {}", s)),
        }
    }
}

/// One column of a table: name, type and the value a fresh record starts with.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub ty: ColumnType,
    pub default: String,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: String::new(),
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TableSchema {
    table: String,
    columns: Vec<ColumnDef>,
    primary_key: Vec<String>,
    auto: Vec<String>,
}

impl TableSchema {
    /// Build and validate a schema.
    pub fn new(
        table: impl Into<String>,
        columns: Vec<ColumnDef>,
        primary_key: &[&str],
        auto: &[&str],
    ) -> Result<Self, RecordError> {
        let table = table.into();
        let invalid = |reason: String| RecordError::InvalidSchema {
            table: table.clone(),
            reason,
        };

        if !IDENTIFIER_REGEX.is_match(&table) {
            return Err(invalid(format!("'{}' is not a valid table name", table)));
        }
        if columns.is_empty() {
            return Err(invalid("no columns defined".to_string()));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !IDENTIFIER_REGEX.is_match(&column.name) {
                return Err(invalid(format!(
                    "'{}' is not a valid column name",
                    column.name
                )));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(invalid(format!("duplicate column '{}'", column.name)));
            }
        }

        if primary_key.is_empty() {
            return Err(invalid("primary key is empty".to_string()));
        }
        for name in primary_key.iter().chain(auto.iter()) {
            if !seen.contains(name) {
                return Err(invalid(format!(
                    "key or auto column '{}' is not a column",
                    name
                )));
            }
        }

        Ok(Self {
            table,
            columns,
            primary_key: primary_key.iter().map(|s| s.to_string()).collect(),
            auto: auto.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    pub fn auto_columns(&self) -> &[String] {
        &self.auto
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn is_auto(&self, name: &str) -> bool {
        self.auto.iter().any(|a| a == name)
    }

    /// Columns written by INSERT and UPDATE, in declaration order.
    pub fn writable_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(move |c| !self.is_auto(&c.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items_columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", ColumnType::BigInt),
            ColumnDef::new("name", ColumnType::Text),
            ColumnDef::new("price", ColumnType::Numeric),
        ]
    }

    #[test]
    fn test_valid_schema() {
        let schema = TableSchema::new("items", items_columns(), &["id"], &["id"]).unwrap();
        assert_eq!(schema.table(), "items");
        assert_eq!(schema.primary_key(), ["id".to_string()]);
        assert!(schema.is_auto("id"));
        assert!(!schema.is_auto("name"));

        let writable: Vec<&str> = schema.writable_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(writable, vec!["name", "price"]);
    }

    #[test]
    fn test_primary_key_must_be_a_column() {
        let err = TableSchema::new("items", items_columns(), &["sku"], &[]).unwrap_err();
        assert!(matches!(err, RecordError::InvalidSchema { .. }));
    }

    #[test]
    fn test_auto_column_must_be_a_column() {
        let err = TableSchema::new("items", items_columns(), &["id"], &["created_at"]).unwrap_err();
        assert!(matches!(err, RecordError::InvalidSchema { .. }));
    }

    #[test]
    fn test_empty_primary_key_rejected() {
        let err = TableSchema::new("items", items_columns(), &[], &[]).unwrap_err();
        assert!(matches!(err, RecordError::InvalidSchema { .. }));
    }

    #[test]
    fn test_identifiers_validated() {
        assert!(TableSchema::new("items; DROP TABLE x", items_columns(), &["id"], &[]).is_err());

        let columns = vec![ColumnDef::new("na me", ColumnType::Text)];
        assert!(TableSchema::new("items", columns, &["na me"], &[]).is_err());
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let columns = vec![
            ColumnDef::new("id", ColumnType::BigInt),
            ColumnDef::new("id", ColumnType::Text),
        ];
        assert!(TableSchema::new("items", columns, &["id"], &[]).is_err());
    }

    #[test]
    fn test_column_type_round_trips_through_text() {
        for ty in [
            ColumnType::Text,
            ColumnType::Integer,
            ColumnType::BigInt,
            ColumnType::Numeric,
            ColumnType::Boolean,
            ColumnType::Timestamp,
            ColumnType::Uuid,
        ] {
            assert_eq!(ty.to_string().parse::<ColumnType>().unwrap(), ty);
        }
        assert!("varchar".parse::<ColumnType>().is_err());
    }
}
