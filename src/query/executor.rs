use std::collections::HashSet;

use log::{debug, warn};
use rusqlite::{Connection, Statement};

use crate::core::GatewayError;
use crate::db::{SqlitePool, is_fatal};

use super::normalize_sql;
use super::result::{QueryResult, Row, sql_value_to_json};
use super::value::Params;

const PLACEHOLDER_PREFIXES: [char; 3] = [':', '@', '$'];

/// Runs statements on pooled SQLite connections and loads full result sets.
pub struct QueryExecutor {
    pool: SqlitePool,
}

enum Failure {
    Bind(GatewayError),
    Driver(rusqlite::Error),
}

impl From<rusqlite::Error> for Failure {
    fn from(err: rusqlite::Error) -> Self {
        Failure::Driver(err)
    }
}

impl QueryExecutor {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn execute(
        &self,
        sql: &str,
        params: Option<Params>,
    ) -> Result<QueryResult, GatewayError> {
        let conn = self.pool.acquire().await?;
        let sql = sql.to_string();

        // The connection moves into the blocking task and is released there,
        // whichever way the statement ends.
        tokio::task::spawn_blocking(move || match run_statement(&conn, &sql, params.as_ref()) {
            Ok(result) => {
                debug!("statement returned {} rows", result.row_count());
                Ok(result)
            }
            Err(Failure::Bind(err)) => Err(err),
            Err(Failure::Driver(err)) => {
                if is_fatal(&err) {
                    warn!("fatal driver error, dropping connection: {err}");
                    conn.discard();
                }
                Err(GatewayError::QueryExecutionError(err.to_string()))
            }
        })
        .await?
    }
}

fn run_statement(
    conn: &Connection,
    sql: &str,
    params: Option<&Params>,
) -> Result<QueryResult, Failure> {
    let mut stmt = conn.prepare(sql)?;
    bind_params(&mut stmt, params)?;

    if !normalize_sql(sql).starts_with("SELECT") {
        stmt.raw_execute()?;
        return Ok(QueryResult::executed());
    }

    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.raw_query();
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Row::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            record.insert(name.clone(), sql_value_to_json(row.get_ref(i)?));
        }
        records.push(record);
    }
    Ok(QueryResult::Rows(records))
}

fn bind_params(stmt: &mut Statement<'_>, params: Option<&Params>) -> Result<(), Failure> {
    let expected = stmt.parameter_count();

    match params {
        None => {
            if expected > 0 {
                return Err(bind_error(format!(
                    "statement expects {expected} parameters, got none"
                )));
            }
        }
        Some(Params::Positional(values)) => {
            if values.len() != expected {
                return Err(bind_error(format!(
                    "statement expects {expected} parameters, got {}",
                    values.len()
                )));
            }
            for (i, value) in values.iter().enumerate() {
                stmt.raw_bind_parameter(i + 1, value)?;
            }
        }
        Some(Params::Named(values)) => {
            let mut bound = HashSet::with_capacity(values.len());
            for (name, value) in values {
                let index = placeholder_index(stmt, name)?.ok_or_else(|| {
                    Failure::Bind(GatewayError::validation(
                        name,
                        format!("no placeholder named '{name}' in statement"),
                    ))
                })?;
                stmt.raw_bind_parameter(index, value)?;
                bound.insert(index);
            }
            if bound.len() != expected {
                return Err(bind_error(format!(
                    "statement expects {expected} parameters, {} were bound by name",
                    bound.len()
                )));
            }
        }
    }
    Ok(())
}

/// Accepts `age` for `:age`, `@age` or `$age`, and also the prefixed name itself.
fn placeholder_index(stmt: &Statement<'_>, name: &str) -> rusqlite::Result<Option<usize>> {
    if name.starts_with(PLACEHOLDER_PREFIXES) {
        return stmt.parameter_index(name);
    }
    for prefix in PLACEHOLDER_PREFIXES {
        if let Some(index) = stmt.parameter_index(&format!("{prefix}{name}"))? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

fn bind_error(reason: String) -> Failure {
    Failure::Bind(GatewayError::validation("params", reason))
}
