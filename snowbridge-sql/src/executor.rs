use r2d2::PooledConnection;
use snowbridge_core::err::{bail, Context, Result};
use snowbridge_logging::debug;

use crate::{
    DriverConnectionManager, DriverResultSet, ExecutionResult, ParameterizedQuery,
    ResultParameterProcessor, Row, RowShape, SqlClient, StatementParameterProcessor,
};

/// A lazily evaluated stream of rows.
///
/// The connection the query ran on is held until the stream is dropped.
pub struct QueryStream<'a> {
    results: Box<dyn DriverResultSet>,
    _con: PooledConnection<DriverConnectionManager>,
    shape: RowShape,
    processor: &'a dyn ResultParameterProcessor,
    done: bool,
}

impl<'a> Iterator for QueryStream<'a> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let row = match self.results.next_row() {
            Ok(Some(values)) => {
                self.processor
                    .create_row(self.results.structure(), values, &self.shape)
            }
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(err) => Err(err.context("Failed to read the next row")),
        };

        if row.is_err() {
            self.done = true;
        }

        Some(row)
    }
}

/// Runs the query, returning its rows in the requested shape
pub fn native_query<'a>(
    client: &SqlClient,
    query: &ParameterizedQuery,
    shape: RowShape,
    statement_processor: &dyn StatementParameterProcessor,
    result_processor: &'a dyn ResultParameterProcessor,
) -> Result<QueryStream<'a>> {
    let statement = statement_processor.bind(query)?;
    let mut con = client.connection()?;

    debug!("Executing query: {}", statement.sql);
    let results = con
        .query(&statement.sql, statement.params)
        .context("Error while executing SQL query")?;

    Ok(QueryStream {
        results,
        _con: con,
        shape,
        processor: result_processor,
        done: false,
    })
}

/// Runs the query, returning its first row
pub fn native_query_row(
    client: &SqlClient,
    query: &ParameterizedQuery,
    shape: RowShape,
    statement_processor: &dyn StatementParameterProcessor,
    result_processor: &dyn ResultParameterProcessor,
) -> Result<Row> {
    let mut stream = native_query(client, query, shape, statement_processor, result_processor)?;

    match stream.next() {
        Some(row) => row,
        None => bail!("Query did not retrieve any rows."),
    }
}

/// Runs a modifying statement
pub fn native_execute(
    client: &SqlClient,
    query: &ParameterizedQuery,
    statement_processor: &dyn StatementParameterProcessor,
) -> Result<ExecutionResult> {
    let statement = statement_processor.bind(query)?;
    let mut con = client.connection()?;

    debug!("Executing statement: {}", statement.sql);
    let mut result = con
        .execute(&statement.sql, statement.params, client.execute_gk_flag())
        .context("Error while executing SQL query")?;

    if !client.execute_gk_flag() {
        result.last_insert_id = None;
    }

    Ok(result)
}
