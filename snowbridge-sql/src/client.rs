use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use r2d2::PooledConnection;
use snowbridge_core::err::{bail, Result};
use snowbridge_logging::{debug, warn};

use crate::{ConnectionPool, DriverConnectionManager, PoolKey, SqlDatasource, SqlDatasourceParams};

/// A client over a pooled datasource
pub struct SqlClient {
    datasource: Arc<SqlDatasource>,
    pool: ConnectionPool,
    key: PoolKey,
    execute_gk_flag: bool,
    batch_execute_gk_flag: bool,
    closed: AtomicBool,
}

/// Opens (or reuses) the datasource described by the params and returns a client over it.
///
/// The flags control whether generated keys are requested from the driver
/// for single and batched executions.
pub fn create_client(
    params: SqlDatasourceParams,
    execute_gk_flag: bool,
    batch_execute_gk_flag: bool,
) -> Result<SqlClient> {
    let pool = params.connection_pool.clone();
    let (key, datasource) = pool.acquire(&params)?;

    Ok(SqlClient {
        datasource,
        pool,
        key,
        execute_gk_flag,
        batch_execute_gk_flag,
        closed: AtomicBool::new(false),
    })
}

impl SqlClient {
    pub fn datasource(&self) -> &SqlDatasource {
        &self.datasource
    }

    /// Whether generated keys are requested for single executions
    pub fn execute_gk_flag(&self) -> bool {
        self.execute_gk_flag
    }

    /// Whether generated keys are requested for batched executions
    pub fn batch_execute_gk_flag(&self) -> bool {
        self.batch_execute_gk_flag
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Closes the client, releasing its hold on the datasource.
    /// Closing an already closed client has no effect.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        debug!("Closing client for {}", self.datasource.url());
        self.pool.release(&self.key);
        Ok(())
    }

    /// Checks out a connection for running a statement
    pub(crate) fn connection(&self) -> Result<PooledConnection<DriverConnectionManager>> {
        if self.is_closed() {
            bail!("SQL Client is already closed, hence further operations are not allowed");
        }

        self.datasource.connection()
    }
}

impl Drop for SqlClient {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!("Failed to close sql client: {:?}", err);
        }
    }
}
