// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only. Records build statements and decide
// what a result means; a database handle only runs them.

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::common::{ColumnDef, RecordError, Statement};

/// A fetched row, decoded to text and keyed by column name.
pub type Row = IndexMap<String, String>;

// =============================================================================
// Database Trait (Infrastructure - statement execution)
// =============================================================================

#[async_trait]
pub trait BaseDatabase: Send + Sync {
    /// Run a query and return its first row, if any.
    ///
    /// Only `columns` are decoded; anything else the query returns is dropped.
    async fn fetch_optional(
        &self,
        statement: &Statement,
        columns: &[ColumnDef],
    ) -> Result<Option<Row>, RecordError>;

    /// Run a statement and return the number of affected rows.
    async fn execute(&self, statement: &Statement) -> Result<u64, RecordError>;
}
