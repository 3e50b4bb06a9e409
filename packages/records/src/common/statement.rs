//! SQL statement generation from table metadata.
//!
//! Values never enter the SQL text: each one becomes a positional `$n`
//! parameter that remembers its column and type. `Statement::inline` renders
//! an escaped, human-readable form for logs and dry runs.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

use super::errors::RecordError;
use super::schema::{ColumnType, TableSchema};

/// A positional parameter bound to a column.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SqlParam {
    pub column: String,
    pub ty: ColumnType,
    pub value: String,
}

impl SqlParam {
    /// SQL literal for this value. Empty text in a typed column is bound as NULL.
    pub fn literal(&self) -> String {
        if !self.ty.is_text() && self.value.trim().is_empty() {
            "NULL".to_string()
        } else {
            quote_literal(&self.value)
        }
    }
}

/// One generated statement, ready to hand to a database handle.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl Statement {
    /// Render with every placeholder replaced by a quoted SQL literal.
    pub fn inline(&self) -> String {
        let mut out = String::with_capacity(self.sql.len());
        let mut chars = self.sql.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }

            let mut digits = String::new();
            while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                digits.push(*d);
                chars.next();
            }

            let param = digits
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| self.params.get(i));
            match param {
                Some(param) => out.push_str(&param.literal()),
                None => {
                    out.push('$');
                    out.push_str(&digits);
                }
            }
        }

        out
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inline())
    }
}

/// Quote a value as a SQL string literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn param(schema: &TableSchema, values: &IndexMap<String, String>, column: &str) -> SqlParam {
    let ty = schema
        .column(column)
        .map(|c| c.ty)
        .unwrap_or(ColumnType::Text);
    SqlParam {
        column: column.to_string(),
        ty,
        value: values.get(column).cloned().unwrap_or_default(),
    }
}

/// Primary-key predicate: `a = $n AND b = $n+1 ...`, numbered from `first_index`.
pub fn key_predicate(
    schema: &TableSchema,
    values: &IndexMap<String, String>,
    first_index: usize,
) -> (String, Vec<SqlParam>) {
    let mut clauses = Vec::with_capacity(schema.primary_key().len());
    let mut params = Vec::with_capacity(schema.primary_key().len());

    for (offset, column) in schema.primary_key().iter().enumerate() {
        clauses.push(format!("{} = ${}", column, first_index + offset));
        params.push(param(schema, values, column));
    }

    (clauses.join(" AND "), params)
}

pub fn select_by_key(schema: &TableSchema, values: &IndexMap<String, String>) -> Statement {
    let (predicate, params) = key_predicate(schema, values, 1);
    Statement {
        sql: format!("SELECT * FROM {} WHERE {}", schema.table(), predicate),
        params,
    }
}

pub fn insert(schema: &TableSchema, values: &IndexMap<String, String>) -> Statement {
    let params: Vec<SqlParam> = schema
        .writable_columns()
        .map(|c| param(schema, values, &c.name))
        .collect();

    if params.is_empty() {
        return Statement {
            sql: format!("INSERT INTO {} DEFAULT VALUES", schema.table()),
            params,
        };
    }

    let columns: Vec<&str> = params.iter().map(|p| p.column.as_str()).collect();
    let placeholders: Vec<String> = (1..=params.len()).map(|i| format!("${}", i)).collect();

    Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            schema.table(),
            columns.join(", "),
            placeholders.join(", ")
        ),
        params,
    }
}

pub fn update_by_key(
    schema: &TableSchema,
    values: &IndexMap<String, String>,
) -> Result<Statement, RecordError> {
    let mut params: Vec<SqlParam> = schema
        .writable_columns()
        .map(|c| param(schema, values, &c.name))
        .collect();

    if params.is_empty() {
        return Err(RecordError::EmptyUpdate(schema.table().to_string()));
    }

    let assignments: Vec<String> = params
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{} = ${}", p.column, i + 1))
        .collect();
    let (predicate, key_params) = key_predicate(schema, values, params.len() + 1);
    params.extend(key_params);

    Ok(Statement {
        sql: format!(
            "UPDATE {} SET {} WHERE {}",
            schema.table(),
            assignments.join(", "),
            predicate
        ),
        params,
    })
}

pub fn delete_by_key(schema: &TableSchema, values: &IndexMap<String, String>) -> Statement {
    let (predicate, params) = key_predicate(schema, values, 1);
    Statement {
        sql: format!("DELETE FROM {} WHERE {}", schema.table(), predicate),
        params,
    }
}
