mod executor;
mod request;
mod result;
mod validator;
mod value;

pub use executor::QueryExecutor;
pub use request::{QueryBody, QueryRequest};
pub use result::{QueryResult, Row, sql_value_to_json};
pub use validator::{QueryValidator, check_shape};
pub use value::{ParamValue, Params, ValueCategory};

/// Collapses whitespace runs to single spaces, trims, and uppercases.
pub fn normalize_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase()
}
