use serde::Deserialize;

use super::value::Params;

/// Request body for `POST /query`, before validation. Extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryBody {
    pub sql: String,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub params: Option<Params>,
}

/// A query that passed validation. Only `QueryValidator` constructs these.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    sql: String,
    table: Option<String>,
    params: Option<Params>,
}

impl QueryRequest {
    pub(super) fn new(body: QueryBody) -> Self {
        Self {
            sql: body.sql,
            table: body.table,
            params: body.params,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn params(&self) -> Option<&Params> {
        self.params.as_ref()
    }

    pub fn into_parts(self) -> (String, Option<Params>) {
        (self.sql, self.params)
    }
}
