// Connector for Snowflake, built on its JDBC-style driver.
// Client configuration is mapped onto datasource parameters for the
// generic sql runtime, which owns pooling and query execution.

mod conf;
pub use conf::*;
mod error;
pub use error::*;
mod params;
pub use params::*;
mod client;
pub use client::*;
mod query;
pub use query::*;

pub use snowbridge_sql::{
    ConnectionPool, ConnectionPoolOptions, ExecutionResult, ParameterizedQuery, QueryStream, Row,
    RowShape,
};
