use snowbridge_core::err::Result;
use snowbridge_logging::info;
use snowbridge_sql::{ConnectionPool, SqlClient};

use crate::{build_parameters, ClientConfig, ClientError, ResolvedParameters};

/// Generated keys are not supported by the connector
const EXECUTE_GK_FLAG: bool = false;
const BATCH_EXECUTE_GK_FLAG: bool = false;

/// A client connected to Snowflake
pub struct SnowflakeClient {
    inner: SqlClient,
}

impl SnowflakeClient {
    /// Creates a client, sharing the global pool unless the config supplies its own
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::with_pool(config, &ConnectionPool::global())
    }

    /// Creates a client, using `global_pool` unless the config supplies its own
    pub fn with_pool(
        config: &ClientConfig,
        global_pool: &ConnectionPool,
    ) -> Result<Self, ClientError> {
        let params = build_parameters(config, global_pool)?;

        Ok(create_client(params)?)
    }

    pub fn close(&self) -> Result<()> {
        close_client(self)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    pub fn sql_client(&self) -> &SqlClient {
        &self.inner
    }
}

/// Opens a client over the datasource described by the resolved parameters
pub fn create_client(params: ResolvedParameters) -> Result<SnowflakeClient> {
    let url = params.url.clone();
    let inner =
        snowbridge_sql::create_client(params.into(), EXECUTE_GK_FLAG, BATCH_EXECUTE_GK_FLAG)?;
    info!("Created snowflake client for {}", url);

    Ok(SnowflakeClient { inner })
}

/// Closes the client
pub fn close_client(client: &SnowflakeClient) -> Result<()> {
    client.inner.close()
}
