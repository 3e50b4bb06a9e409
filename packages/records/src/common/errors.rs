use thiserror::Error;

/// Errors raised by records, statements and database handles.
///
/// `UnknownField` and `FieldRemoval` are programming errors. Everything else
/// is a data-layer failure and is also recorded as the record's last error.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Unknown field '{field}' on table '{table}'")]
    UnknownField { table: String, field: String },

    #[error("Field '{0}' cannot be removed from a record")]
    FieldRemoval(String),

    #[error("No row found in '{0}' for the given primary key")]
    NotFound(String),

    #[error("No rows affected in '{0}'")]
    NoRowsAffected(String),

    #[error("Nothing to update in '{0}': every column is auto-generated")]
    EmptyUpdate(String),

    #[error("Invalid value for column '{column}' ({ty}): {reason}")]
    InvalidValue {
        column: String,
        ty: String,
        reason: String,
    },

    #[error("Invalid schema for '{table}': {reason}")]
    InvalidSchema { table: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RecordError {
    /// True for failures that come from the data layer rather than from
    /// misuse of the record API.
    pub fn is_data_error(&self) -> bool {
        !matches!(
            self,
            RecordError::UnknownField { .. } | RecordError::FieldRemoval(_)
        )
    }
}
