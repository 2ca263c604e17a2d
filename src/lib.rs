pub mod api;
pub mod conf;
pub mod core;
pub mod db;
pub mod query;
pub mod schema;
pub mod service;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;
