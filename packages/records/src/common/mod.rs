// Common types shared by records, statements and database handles

pub mod errors;
pub mod schema;
pub mod statement;

pub use errors::RecordError;
pub use schema::{ColumnDef, ColumnType, TableSchema};
pub use statement::{quote_literal, SqlParam, Statement};
