use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::common::{statement, RecordError, Statement, TableSchema};
use crate::kernel::BaseDatabase;

/// Active record over one table row.
///
/// Field values are text, keyed by column name in schema order. Statements
/// are generated from the schema and run through the injected handle.
/// Data-layer failures are returned as `Err` and also kept as the record's
/// last error message until the next operation.
#[derive(Clone)]
pub struct Record {
    schema: Arc<TableSchema>,
    fields: IndexMap<String, String>,
    defaults: IndexMap<String, String>,
    last_error: Option<String>,
    db: Arc<dyn BaseDatabase>,
}

impl Record {
    pub fn new(schema: Arc<TableSchema>, db: Arc<dyn BaseDatabase>) -> Self {
        let defaults: IndexMap<String, String> = schema
            .columns()
            .iter()
            .map(|c| (c.name.clone(), c.default.clone()))
            .collect();

        Self {
            schema,
            fields: defaults.clone(),
            defaults,
            last_error: None,
            db,
        }
    }

    pub fn table(&self) -> &str {
        self.schema.table()
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Message of the last failed data operation, cleared when the next one starts.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // =========================================================================
    // Field access
    // =========================================================================

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&str, RecordError> {
        self.fields
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| self.unknown_field(name))
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), RecordError> {
        let table = self.schema.table();
        match self.fields.get_mut(name) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(RecordError::UnknownField {
                table: table.to_string(),
                field: name.to_string(),
            }),
        }
    }

    /// Parse a field into a typed value. Empty text reads as `None`.
    pub fn get_as<T>(&self, name: &str) -> Result<Option<T>, RecordError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.get(name)?.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<T>()
            .map(Some)
            .map_err(|e| RecordError::InvalidValue {
                column: name.to_string(),
                ty: self
                    .schema
                    .column(name)
                    .map(|c| c.ty.to_string())
                    .unwrap_or_default(),
                reason: e.to_string(),
            })
    }

    /// Fields are fixed by the schema, so removal always fails.
    pub fn unset(&mut self, name: &str) -> Result<(), RecordError> {
        Err(RecordError::FieldRemoval(name.to_string()))
    }

    /// Copy recognised fields from an external key/value source. Unknown keys are ignored.
    pub fn populate<I, K, V>(&mut self, source: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in source {
            if let Some(slot) = self.fields.get_mut(key.as_ref()) {
                *slot = value.into();
            }
        }
    }

    /// Populate from a JSON object. Scalars are copied as text, `null` as the
    /// empty string; arrays and objects are skipped.
    pub fn populate_json(&mut self, source: &Map<String, Value>) {
        let scalars: Vec<(&str, String)> = source
            .iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Null => String::new(),
                    Value::Array(_) | Value::Object(_) => return None,
                };
                Some((key.as_str(), text))
            })
            .collect();
        self.populate(scalars);
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }

    /// Restore construction-time values and forget the last error.
    pub fn clear(&mut self) {
        self.fields = self.defaults.clone();
        self.last_error = None;
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Load the row identified by the current primary-key values.
    pub async fn read_record(&mut self) -> Result<(), RecordError> {
        self.last_error = None;
        let stmt = statement::select_by_key(&self.schema, &self.fields);
        self.log_statement("read", &stmt);

        let fetched = self.db.fetch_optional(&stmt, self.schema.columns()).await;
        let result = match fetched {
            Ok(Some(row)) => {
                self.populate(row);
                Ok(())
            }
            Ok(None) => Err(RecordError::NotFound(self.table().to_string())),
            Err(e) => Err(e),
        };
        self.record_outcome("read", result)
    }

    /// Update the row identified by the primary key with every non-auto field.
    pub async fn write_record(&mut self) -> Result<(), RecordError> {
        self.last_error = None;
        let stmt = match statement::update_by_key(&self.schema, &self.fields) {
            Ok(stmt) => stmt,
            Err(e) => return self.record_outcome("write", Err(e)),
        };
        self.log_statement("write", &stmt);

        let result = self.execute_expecting_rows(&stmt).await;
        self.record_outcome("write", result)
    }

    /// Insert a new row from every non-auto field.
    pub async fn create_record(&mut self) -> Result<(), RecordError> {
        self.last_error = None;
        let stmt = statement::insert(&self.schema, &self.fields);
        self.log_statement("create", &stmt);

        let result = self.execute_expecting_rows(&stmt).await;
        self.record_outcome("create", result)
    }

    /// Delete the row identified by the primary key.
    pub async fn delete_record(&mut self) -> Result<(), RecordError> {
        self.last_error = None;
        let stmt = statement::delete_by_key(&self.schema, &self.fields);
        self.log_statement("delete", &stmt);

        let result = self.execute_expecting_rows(&stmt).await;
        self.record_outcome("delete", result)
    }

    /// Primary-key predicate for the current values, placeholders from `$1`.
    pub fn key_predicate(&self) -> Statement {
        let (sql, params) = statement::key_predicate(&self.schema, &self.fields, 1);
        Statement { sql, params }
    }

    async fn execute_expecting_rows(&self, stmt: &Statement) -> Result<(), RecordError> {
        let affected = self.db.execute(stmt).await?;
        if affected == 0 {
            return Err(RecordError::NoRowsAffected(self.table().to_string()));
        }
        Ok(())
    }

    fn log_statement(&self, operation: &str, stmt: &Statement) {
        debug!(
            table = self.table(),
            operation,
            sql = %stmt.sql,
            params = stmt.params.len(),
            "Executing record statement"
        );
    }

    fn record_outcome(
        &mut self,
        operation: &str,
        result: Result<(), RecordError>,
    ) -> Result<(), RecordError> {
        if let Err(e) = &result {
            warn!(table = self.table(), operation, error = %e, "Record operation failed");
            self.last_error = Some(e.to_string());
        }
        result
    }

    fn unknown_field(&self, name: &str) -> RecordError {
        RecordError::UnknownField {
            table: self.table().to_string(),
            field: name.to_string(),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.table())?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {}: {:?}", name, value)?;
        }
        write!(f, " }}")
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("table", &self.table())
            .field("fields", &self.fields)
            .field("last_error", &self.last_error)
            .finish()
    }
}
