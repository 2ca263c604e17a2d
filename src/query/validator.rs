use std::sync::Arc;

use log::debug;

use crate::core::GatewayError;
use crate::schema::MetadataSource;

use super::normalize_sql;
use super::request::{QueryBody, QueryRequest};
use super::value::{Params, ValueCategory};

const FORBIDDEN_KEYWORDS: [&str; 5] = ["INSERT", "UPDATE", "DELETE", "DROP", "ALTER"];

/// Lexical read-only screen.
///
/// This is a substring check on the normalized text, not a parser: it also
/// rejects those keywords inside string literals and identifiers (a column
/// named `updated_at`, for instance).
pub fn check_shape(sql: &str) -> Result<(), GatewayError> {
    let cleaned = normalize_sql(sql);

    if !cleaned.starts_with("SELECT") {
        return Err(GatewayError::validation("sql", "Only SELECT queries allowed"));
    }
    if FORBIDDEN_KEYWORDS.iter().any(|kw| cleaned.contains(kw)) {
        return Err(GatewayError::validation(
            "sql",
            "Modification commands prohibited",
        ));
    }
    Ok(())
}

pub struct QueryValidator {
    metadata: Arc<dyn MetadataSource>,
}

impl QueryValidator {
    pub fn new(metadata: Arc<dyn MetadataSource>) -> Self {
        Self { metadata }
    }

    pub async fn validate(&self, body: QueryBody) -> Result<QueryRequest, GatewayError> {
        check_shape(&body.sql)?;

        if let (Some(table), Some(params)) = (&body.table, &body.params) {
            if !params.is_empty() {
                self.check_params(table, params).await?;
            }
        }

        Ok(QueryRequest::new(body))
    }

    async fn check_params(&self, table: &str, params: &Params) -> Result<(), GatewayError> {
        let named = match params {
            Params::Named(named) => named,
            Params::Positional(_) => {
                return Err(GatewayError::validation(
                    "params",
                    "params must be an object keyed by column name when table is given",
                ));
            }
        };

        let metadata = self.metadata.table_metadata(table).await?;
        for (name, value) in named {
            let column = metadata
                .column(name)
                .ok_or_else(|| GatewayError::validation(name, format!("Invalid parameter: {name}")))?;

            let expected = ValueCategory::for_sql_type(&column.sql_type);
            if !expected.accepts(value, column.nullable) {
                return Err(GatewayError::validation(
                    name,
                    format!("{name} must be {expected}"),
                ));
            }
        }
        debug!("{} parameters checked against '{}'", named.len(), table);
        Ok(())
    }
}
