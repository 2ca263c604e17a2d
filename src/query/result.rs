use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rusqlite::types::ValueRef;
use serde::Serialize;
use serde_json::{Map, Number, Value};

pub type Row = Map<String, Value>;

/// Rows for SELECT statements, a status record for anything else.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Rows(Vec<Row>),
    Status { message: String },
}

impl QueryResult {
    pub fn executed() -> Self {
        QueryResult::Status {
            message: "Query executed successfully".to_string(),
        }
    }

    pub fn row_count(&self) -> usize {
        match self {
            QueryResult::Rows(rows) => rows.len(),
            QueryResult::Status { .. } => 0,
        }
    }
}

/// Converts one SQLite cell into JSON. Blobs become base64 strings.
pub fn sql_value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(STANDARD.encode(bytes)),
    }
}
