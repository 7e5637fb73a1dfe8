use snowbridge_core::err::Result;
use snowbridge_sql::{
    native_execute, native_query, native_query_row, DefaultResultParameterProcessor,
    DefaultStatementParameterProcessor, ExecutionResult, ParameterizedQuery, QueryStream, Row,
    RowShape,
};

use crate::SnowflakeClient;

/// Runs the query, streaming rows in the requested shape
pub fn query(
    client: &SnowflakeClient,
    statement: &ParameterizedQuery,
    shape: RowShape,
) -> Result<QueryStream<'static>> {
    native_query(
        client.sql_client(),
        statement,
        shape,
        DefaultStatementParameterProcessor::instance(),
        DefaultResultParameterProcessor::instance(),
    )
}

/// Runs the query, returning only its first row
pub fn query_row(
    client: &SnowflakeClient,
    statement: &ParameterizedQuery,
    shape: RowShape,
) -> Result<Row> {
    native_query_row(
        client.sql_client(),
        statement,
        shape,
        DefaultStatementParameterProcessor::instance(),
        DefaultResultParameterProcessor::instance(),
    )
}

/// Runs a modifying statement
pub fn execute(
    client: &SnowflakeClient,
    statement: &ParameterizedQuery,
) -> Result<ExecutionResult> {
    native_execute(
        client.sql_client(),
        statement,
        DefaultStatementParameterProcessor::instance(),
    )
}

impl SnowflakeClient {
    pub fn query(
        &self,
        statement: &ParameterizedQuery,
        shape: RowShape,
    ) -> Result<QueryStream<'static>> {
        query(self, statement, shape)
    }

    pub fn query_row(&self, statement: &ParameterizedQuery, shape: RowShape) -> Result<Row> {
        query_row(self, statement, shape)
    }

    pub fn execute(&self, statement: &ParameterizedQuery) -> Result<ExecutionResult> {
        execute(self, statement)
    }
}
