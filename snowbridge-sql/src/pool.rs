use std::{
    collections::{BTreeMap, HashMap},
    fmt::Debug,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use snowbridge_core::err::Result;
use snowbridge_logging::{debug, info};

use crate::{
    datasource::{RedactedProperties, REDACTED},
    SqlDatasource, SqlDatasourceParams,
};

/// Options for pooling connections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionPoolOptions {
    /// Maximum number of open connections
    pub max_open_connections: u32,
    /// Maximum lifetime of a connection in seconds, `0` for no limit
    pub max_connection_life_time: u64,
    /// Minimum number of idle connections kept open
    pub min_idle_connections: u32,
}

impl Default for ConnectionPoolOptions {
    fn default() -> Self {
        Self {
            max_open_connections: 15,
            max_connection_life_time: 1800,
            min_idle_connections: 15,
        }
    }
}

impl ConnectionPoolOptions {
    pub fn max_lifetime(&self) -> Option<Duration> {
        match self.max_connection_life_time {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Identifies a datasource within a pool.
///
/// Clients opened with an identical key share a datasource.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    url: String,
    user: Option<String>,
    password: Option<String>,
    datasource_name: Option<String>,
    options: BTreeMap<String, String>,
    pool_properties: Option<BTreeMap<String, String>>,
}

impl From<&SqlDatasourceParams> for PoolKey {
    fn from(params: &SqlDatasourceParams) -> Self {
        Self {
            url: params.url.clone(),
            user: params.user.clone(),
            password: params.password.clone(),
            datasource_name: params.datasource_name.clone(),
            options: params.options.clone(),
            pool_properties: params.pool_properties.clone(),
        }
    }
}

impl Debug for PoolKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolKey")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("datasource_name", &self.datasource_name)
            .field("options", &RedactedProperties(&self.options))
            .field("pool_properties", &self.pool_properties)
            .finish()
    }
}

struct PoolEntry {
    datasource: Arc<SqlDatasource>,
    clients: usize,
}

struct PoolState {
    options: ConnectionPoolOptions,
    datasources: Mutex<HashMap<PoolKey, PoolEntry>>,
}

/// A handle to a connection pool which may be shared between clients.
///
/// Clones refer to the same pool, equality is by identity.
#[derive(Clone)]
pub struct ConnectionPool {
    state: Arc<PoolState>,
}

lazy_static! {
    static ref GLOBAL_POOL: ConnectionPool = ConnectionPool::new(ConnectionPoolOptions::default());
}

impl ConnectionPool {
    pub fn new(options: ConnectionPoolOptions) -> Self {
        Self {
            state: Arc::new(PoolState {
                options,
                datasources: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The process-wide pool used by clients which do not supply their own
    pub fn global() -> Self {
        GLOBAL_POOL.clone()
    }

    pub fn options(&self) -> &ConnectionPoolOptions {
        &self.state.options
    }

    /// Number of datasources currently held by the pool
    pub fn len(&self) -> usize {
        self.datasources().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gets the datasource for the supplied params, opening it if required.
    ///
    /// The registry is not locked while the datasource connects. If another
    /// client opened the same datasource meanwhile, theirs is shared and the
    /// one opened here is discarded.
    pub(crate) fn acquire(
        &self,
        params: &SqlDatasourceParams,
    ) -> Result<(PoolKey, Arc<SqlDatasource>)> {
        let key = PoolKey::from(params);

        if let Some(datasource) = Self::reuse(&mut self.datasources(), &key) {
            return Ok((key, datasource));
        }

        let opened = Arc::new(SqlDatasource::new(params, &self.state.options)?);
        let mut datasources = self.datasources();

        if let Some(datasource) = Self::reuse(&mut datasources, &key) {
            debug!("Discarding concurrently opened datasource for {}", key.url);
            return Ok((key, datasource));
        }

        info!("Opened datasource for {}", key.url);
        datasources.insert(
            key.clone(),
            PoolEntry {
                datasource: Arc::clone(&opened),
                clients: 1,
            },
        );

        Ok((key, opened))
    }

    fn reuse(
        datasources: &mut HashMap<PoolKey, PoolEntry>,
        key: &PoolKey,
    ) -> Option<Arc<SqlDatasource>> {
        let entry = datasources.get_mut(key)?;
        entry.clients += 1;
        debug!(
            "Reusing datasource for {} ({} clients)",
            key.url, entry.clients
        );

        Some(Arc::clone(&entry.datasource))
    }

    /// Releases a client's hold on a datasource, evicting it once unused
    pub(crate) fn release(&self, key: &PoolKey) {
        let mut datasources = self.datasources();

        let evict = match datasources.get_mut(key) {
            Some(entry) => {
                entry.clients -= 1;
                entry.clients == 0
            }
            None => false,
        };

        if evict {
            datasources.remove(key);
            info!("Closed datasource for {}", key.url);
        }
    }

    fn datasources(&self) -> MutexGuard<'_, HashMap<PoolKey, PoolEntry>> {
        self.state
            .datasources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for ConnectionPool {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("options", &self.state.options)
            .finish_non_exhaustive()
    }
}

impl<'de> Deserialize<'de> for ConnectionPool {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ConnectionPoolOptions::deserialize(deserializer).map(Self::new)
    }
}
