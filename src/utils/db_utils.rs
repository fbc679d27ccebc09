use chrono::NaiveDate;
use serde_json::{Map, Value};
use sqlx::MySqlPool;

use crate::error::ApiError;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    Bool(bool),
    Date(NaiveDate),
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Column an update may touch and the JSON shape it accepts.
#[derive(Debug, Clone, Copy)]
pub enum ColumnKind {
    Text,
    UInt,
    Bool,
    Date,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// Only columns listed in `allowed` are written; anything else is a 400.
/// Column order follows `allowed`, so the SQL is deterministic.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[(&str, ColumnKind)],
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, ApiError> {
    let obj: &Map<String, Value> = payload
        .as_object()
        .ok_or_else(|| ApiError::bad_request("Payload must be a JSON object"))?;

    if obj.is_empty() {
        return Err(ApiError::bad_request("No fields provided for update"));
    }

    if let Some(unknown) = obj
        .keys()
        .find(|k| !allowed.iter().any(|(col, _)| *col == k.as_str()))
    {
        return Err(ApiError::bad_request(format!("Field cannot be updated: {unknown}")));
    }

    let mut columns = Vec::with_capacity(obj.len());
    let mut values = Vec::with_capacity(obj.len() + 1);

    for (column, kind) in allowed {
        let Some(value) = obj.get(*column) else {
            continue;
        };
        values.push(convert(column, *kind, value)?);
        columns.push(format!("{} = ?", column));
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        table,
        columns.join(", "),
        id_column
    );

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate { sql, values })
}

fn convert(column: &str, kind: ColumnKind, value: &Value) -> Result<SqlValue, ApiError> {
    let mismatch = || ApiError::bad_request(format!("Invalid value for {column}"));
    match (kind, value) {
        (ColumnKind::Text, Value::String(s)) => Ok(SqlValue::String(s.trim().to_string())),
        (ColumnKind::UInt, Value::Number(n)) => n.as_u64().map(SqlValue::U64).ok_or_else(mismatch),
        (ColumnKind::Bool, Value::Bool(b)) => Ok(SqlValue::Bool(*b)),
        (ColumnKind::Date, Value::String(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(SqlValue::Date)
            .map_err(|_| mismatch()),
        _ => Err(mismatch()),
    }
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}
