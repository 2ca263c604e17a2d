use std::collections::BTreeMap;
use std::fmt;

use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, ValueRef};
use serde::Deserialize;
use serde_json::Value;

/// A scalar query parameter as received in a JSON request body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum ParamValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl TryFrom<Value> for ParamValue {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(ParamValue::Null),
            Value::Bool(b) => Ok(ParamValue::Bool(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(ParamValue::Integer(i)),
                None => n
                    .as_f64()
                    .map(ParamValue::Float)
                    .ok_or_else(|| format!("number {n} is out of range")),
            },
            Value::String(s) => Ok(ParamValue::Text(s)),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|b| u8::try_from(b).ok())
                        .ok_or_else(|| {
                            format!("array parameters must be byte arrays, found element {item}")
                        })
                })
                .collect::<Result<Vec<u8>, _>>()
                .map(ParamValue::Bytes),
            Value::Object(_) => Err("object parameters are not supported".to_string()),
        }
    }
}

impl ParamValue {
    pub fn category(&self) -> Option<ValueCategory> {
        match self {
            ParamValue::Null => None,
            ParamValue::Bool(_) => Some(ValueCategory::Boolean),
            ParamValue::Integer(_) => Some(ValueCategory::Integer),
            ParamValue::Float(_) => Some(ValueCategory::Float),
            ParamValue::Text(_) => Some(ValueCategory::String),
            ParamValue::Bytes(_) => Some(ValueCategory::Bytes),
        }
    }
}

impl ToSql for ParamValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            ParamValue::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            ParamValue::Bool(b) => ToSqlOutput::Borrowed(ValueRef::Integer(i64::from(*b))),
            ParamValue::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            ParamValue::Float(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            ParamValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            ParamValue::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

/// Query parameters: a JSON object binds by placeholder name, a JSON array by position.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum Params {
    Named(BTreeMap<String, ParamValue>),
    Positional(Vec<ParamValue>),
}

impl TryFrom<Value> for Params {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, String> {
        match value {
            Value::Object(map) => map
                .into_iter()
                .map(|(name, v)| {
                    ParamValue::try_from(v)
                        .map(|p| (name.clone(), p))
                        .map_err(|e| format!("parameter '{name}': {e}"))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(Params::Named),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, v)| {
                    ParamValue::try_from(v).map_err(|e| format!("parameter {}: {e}", i + 1))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Params::Positional),
            other => Err(format!("params must be an object or an array, found {other}")),
        }
    }
}

impl Params {
    pub fn is_empty(&self) -> bool {
        match self {
            Params::Named(map) => map.is_empty(),
            Params::Positional(values) => values.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Params::Named(map) => map.len(),
            Params::Positional(values) => values.len(),
        }
    }
}

/// Coarse class of values a column accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCategory {
    Integer,
    String,
    Float,
    Boolean,
    Bytes,
    Any,
}

// Checked in order against the lowercased driver type name; first substring hit wins.
const SQL_TYPE_CATEGORIES: &[(&str, ValueCategory)] = &[
    ("int", ValueCategory::Integer),
    ("smallint", ValueCategory::Integer),
    ("tinyint", ValueCategory::Integer),
    ("bigint", ValueCategory::Integer),
    ("varchar", ValueCategory::String),
    ("nvarchar", ValueCategory::String),
    ("char", ValueCategory::String),
    ("nchar", ValueCategory::String),
    ("text", ValueCategory::String),
    ("ntext", ValueCategory::String),
    ("date", ValueCategory::String),
    ("datetime", ValueCategory::String),
    ("smalldatetime", ValueCategory::String),
    ("datetime2", ValueCategory::String),
    ("time", ValueCategory::String),
    ("float", ValueCategory::Float),
    ("real", ValueCategory::Float),
    ("decimal", ValueCategory::Float),
    ("numeric", ValueCategory::Float),
    ("money", ValueCategory::Float),
    ("smallmoney", ValueCategory::Float),
    ("bit", ValueCategory::Boolean),
    ("binary", ValueCategory::Bytes),
    ("varbinary", ValueCategory::Bytes),
    ("image", ValueCategory::Bytes),
    // SQLite affinity spellings
    ("bool", ValueCategory::Boolean),
    ("blob", ValueCategory::Bytes),
    ("double", ValueCategory::Float),
];

impl ValueCategory {
    pub fn for_sql_type(sql_type: &str) -> ValueCategory {
        let lowered = sql_type.to_lowercase();
        SQL_TYPE_CATEGORIES
            .iter()
            .find(|(key, _)| lowered.contains(key))
            .map(|(_, category)| *category)
            .unwrap_or(ValueCategory::Any)
    }

    pub fn accepts(&self, value: &ParamValue, nullable: bool) -> bool {
        match (self, value.category()) {
            (ValueCategory::Any, _) => true,
            (_, None) => nullable,
            (expected, Some(actual)) => *expected == actual,
        }
    }
}

impl fmt::Display for ValueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueCategory::Integer => "integer",
            ValueCategory::String => "string",
            ValueCategory::Float => "float",
            ValueCategory::Boolean => "boolean",
            ValueCategory::Bytes => "bytes",
            ValueCategory::Any => "any",
        };
        f.write_str(name)
    }
}
