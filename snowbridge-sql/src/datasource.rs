use std::{collections::BTreeMap, fmt::Display, sync::Arc, time::Duration};

use r2d2::{ManageConnection, PooledConnection};
use snowbridge_core::err::{bail, ensure, Context, Error, Result};
use snowbridge_logging::warn;

use crate::{
    driver_for_url, ConnectionPool, ConnectionPoolOptions, ConnectionProperties, Driver,
    DriverConnection, PROPERTY_PASSWORD, PROPERTY_USER,
};

/// Pool property overriding how long to wait for a connection, in milliseconds
pub const POOL_CONNECTION_TIMEOUT: &str = "ConnectionTimeout";

const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);
const MIN_CONNECTION_TIMEOUT: Duration = Duration::from_millis(250);

/// Everything required to open a datasource
#[derive(Clone, PartialEq)]
pub struct SqlDatasourceParams {
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub datasource_name: Option<String>,
    /// Driver connection properties
    pub options: BTreeMap<String, String>,
    /// Properties interpreted by the pool rather than the driver
    pub pool_properties: Option<BTreeMap<String, String>>,
    /// The pool the datasource is opened in
    pub connection_pool: ConnectionPool,
}

impl SqlDatasourceParams {
    pub fn new(url: impl Into<String>, connection_pool: ConnectionPool) -> Self {
        Self {
            url: url.into(),
            user: None,
            password: None,
            datasource_name: None,
            options: BTreeMap::new(),
            pool_properties: None,
            connection_pool,
        }
    }

    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user;
        self
    }

    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    pub fn with_datasource_name(mut self, datasource_name: Option<String>) -> Self {
        self.datasource_name = datasource_name;
        self
    }

    pub fn with_options(mut self, options: BTreeMap<String, String>) -> Self {
        self.options = options;
        self
    }

    pub fn with_pool_properties(
        mut self,
        pool_properties: Option<BTreeMap<String, String>>,
    ) -> Self {
        self.pool_properties = pool_properties;
        self
    }

    /// The properties handed to the driver for each new connection
    fn connection_properties(&self) -> ConnectionProperties {
        let mut props = self.options.clone();

        if let Some(user) = &self.user {
            props.insert(PROPERTY_USER.into(), user.clone());
        }

        if let Some(password) = &self.password {
            props.insert(PROPERTY_PASSWORD.into(), password.clone());
        }

        props
    }
}

impl std::fmt::Debug for SqlDatasourceParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlDatasourceParams")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("datasource_name", &self.datasource_name)
            .field("options", &RedactedProperties(&self.options))
            .field("pool_properties", &self.pool_properties)
            .field("connection_pool", &self.connection_pool)
            .finish()
    }
}

pub(crate) const REDACTED: &str = "***";

/// Formats connection properties with secret values masked
pub(crate) struct RedactedProperties<'a>(pub &'a BTreeMap<String, String>);

impl<'a> std::fmt::Debug for RedactedProperties<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.0.iter().map(|(k, v)| {
                if is_secret_property(k) {
                    (k, REDACTED)
                } else {
                    (k, v.as_str())
                }
            }))
            .finish()
    }
}

fn is_secret_property(key: &str) -> bool {
    let key = key.to_lowercase();

    ["password", "pwd", "passphrase"]
        .iter()
        .any(|s| key.contains(s))
}

/// A pooled set of connections to a single database
pub struct SqlDatasource {
    url: String,
    name: Option<String>,
    pool: r2d2::Pool<DriverConnectionManager>,
}

impl SqlDatasource {
    pub fn new(params: &SqlDatasourceParams, options: &ConnectionPoolOptions) -> Result<Self> {
        ensure!(
            options.max_open_connections > 0,
            "Connection pool must allow at least one open connection"
        );

        let manager = DriverConnectionManager {
            driver: driver_for_url(&params.url)?,
            url: params.url.clone(),
            props: params.connection_properties(),
        };

        let pool = r2d2::Builder::new()
            .max_size(options.max_open_connections)
            .min_idle(Some(
                options
                    .min_idle_connections
                    .min(options.max_open_connections),
            ))
            .max_lifetime(options.max_lifetime())
            .connection_timeout(connection_timeout(params.pool_properties.as_ref())?)
            .build(manager)
            .with_context(|| format!("Failed to initialize pool for {}", params.url))?;

        Ok(Self {
            url: params.url.clone(),
            name: params.datasource_name.clone(),
            pool,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Checks out a connection from the pool
    pub fn connection(&self) -> Result<PooledConnection<DriverConnectionManager>> {
        self.pool
            .get()
            .with_context(|| format!("Failed to get connection to {}", self.url))
    }

    /// Number of connections currently open, idle or in use
    pub fn open_connections(&self) -> u32 {
        self.pool.state().connections
    }

    /// Number of open connections not checked out
    pub fn idle_connections(&self) -> u32 {
        self.pool.state().idle_connections
    }
}

impl std::fmt::Debug for SqlDatasource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlDatasource")
            .field("url", &self.url)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Resolves the pool connection timeout from the pool properties
fn connection_timeout(pool_properties: Option<&BTreeMap<String, String>>) -> Result<Duration> {
    let value = match pool_properties.and_then(|p| p.get(POOL_CONNECTION_TIMEOUT)) {
        Some(value) => value,
        None => return Ok(DEFAULT_CONNECTION_TIMEOUT),
    };

    let millis = match value.trim().parse::<u64>() {
        Ok(millis) => millis,
        Err(_) => bail!("Invalid connection timeout '{}', expected milliseconds", value),
    };

    let timeout = Duration::from_millis(millis);
    if timeout < MIN_CONNECTION_TIMEOUT {
        warn!(
            "Connection timeout of {}ms is below the minimum of {}ms, using the default of {}s",
            millis,
            MIN_CONNECTION_TIMEOUT.as_millis(),
            DEFAULT_CONNECTION_TIMEOUT.as_secs()
        );
        return Ok(DEFAULT_CONNECTION_TIMEOUT);
    }

    Ok(timeout)
}

/// Opens driver connections on behalf of the pool
pub struct DriverConnectionManager {
    driver: Arc<dyn Driver>,
    url: String,
    props: ConnectionProperties,
}

/// r2d2 requires its error type to implement `std::error::Error`
#[derive(Debug)]
pub struct DriverError(Error);

impl Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl ManageConnection for DriverConnectionManager {
    type Connection = Box<dyn DriverConnection>;
    type Error = DriverError;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        self.driver.connect(&self.url, &self.props).map_err(DriverError)
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        conn.is_valid().map_err(DriverError)
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        conn.is_closed()
    }
}
