//! Postgres implementation of `BaseDatabase` on top of a sqlx pool.
//!
//! Record values are text; this is the one place where they are converted
//! to and from the column's real type.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, PgPool, Postgres, Row as _};
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

use super::traits::{BaseDatabase, Row};
use crate::common::{ColumnDef, ColumnType, RecordError, SqlParam, Statement};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BaseDatabase for PgDatabase {
    async fn fetch_optional(
        &self,
        statement: &Statement,
        columns: &[ColumnDef],
    ) -> Result<Option<Row>, RecordError> {
        let query = bind_params(sqlx::query(&statement.sql), &statement.params)?;
        let row = query.fetch_optional(&self.pool).await?;

        row.map(|row| decode_row(&row, columns)).transpose()
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, RecordError> {
        let query = bind_params(sqlx::query(&statement.sql), &statement.params)?;
        let result = query.execute(&self.pool).await?;

        Ok(result.rows_affected())
    }
}

fn bind_params<'q>(mut query: PgQuery<'q>, params: &[SqlParam]) -> Result<PgQuery<'q>, RecordError> {
    for param in params {
        query = bind_param(query, param)?;
    }
    Ok(query)
}

fn bind_param<'q>(query: PgQuery<'q>, param: &SqlParam) -> Result<PgQuery<'q>, RecordError> {
    Ok(match param.ty {
        ColumnType::Text => query.bind(param.value.clone()),
        ColumnType::Integer => query.bind(parse_value::<i32>(param)?),
        ColumnType::BigInt => query.bind(parse_value::<i64>(param)?),
        ColumnType::Numeric => query.bind(parse_value::<Decimal>(param)?),
        ColumnType::Boolean => query.bind(parse_bool(param)?),
        ColumnType::Timestamp => query.bind(parse_timestamp(param)?),
        ColumnType::Uuid => query.bind(parse_value::<Uuid>(param)?),
    })
}

fn invalid(param: &SqlParam, reason: impl Display) -> RecordError {
    RecordError::InvalidValue {
        column: param.column.clone(),
        ty: param.ty.to_string(),
        reason: reason.to_string(),
    }
}

/// Empty text in a typed column binds as NULL.
fn parse_value<T>(param: &SqlParam) -> Result<Option<T>, RecordError>
where
    T: FromStr,
    T::Err: Display,
{
    let value = param.value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value.parse::<T>().map(Some).map_err(|e| invalid(param, e))
}

fn parse_bool(param: &SqlParam) -> Result<Option<bool>, RecordError> {
    match param.value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "true" | "t" | "1" | "yes" => Ok(Some(true)),
        "false" | "f" | "0" | "no" => Ok(Some(false)),
        other => Err(invalid(param, format!("'{}' is not a boolean", other))),
    }
}

fn parse_timestamp(param: &SqlParam) -> Result<Option<DateTime<Utc>>, RecordError> {
    let value = param.value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(|e| invalid(param, e))
}

/// Decode the schema's columns from a row. NULL becomes the empty string.
fn decode_row(row: &PgRow, columns: &[ColumnDef]) -> Result<Row, RecordError> {
    let mut decoded = Row::new();

    for column in columns {
        let name = column.name.as_str();
        if !row.columns().iter().any(|c| c.name() == name) {
            continue;
        }

        let value = match column.ty {
            ColumnType::Text => row.try_get::<Option<String>, _>(name)?,
            ColumnType::Integer => row.try_get::<Option<i32>, _>(name)?.map(|v| v.to_string()),
            ColumnType::BigInt => row.try_get::<Option<i64>, _>(name)?.map(|v| v.to_string()),
            ColumnType::Numeric => row
                .try_get::<Option<Decimal>, _>(name)?
                .map(|v| v.to_string()),
            ColumnType::Boolean => row.try_get::<Option<bool>, _>(name)?.map(|v| v.to_string()),
            ColumnType::Timestamp => row
                .try_get::<Option<DateTime<Utc>>, _>(name)?
                .map(|v| v.to_rfc3339()),
            ColumnType::Uuid => row.try_get::<Option<Uuid>, _>(name)?.map(|v| v.to_string()),
        };

        decoded.insert(column.name.clone(), value.unwrap_or_default());
    }

    Ok(decoded)
}
