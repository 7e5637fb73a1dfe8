use std::{
    collections::BTreeMap,
    sync::{Arc, PoisonError, RwLock},
};

use lazy_static::lazy_static;
use snowbridge_core::{
    data::DataValue,
    err::{anyhow, Result},
};
use snowbridge_logging::debug;

use crate::{ExecutionResult, RowStructure};

/// Properties passed to the driver when opening a connection
pub type ConnectionProperties = BTreeMap<String, String>;

/// Property key under which the database user is passed to the driver
pub const PROPERTY_USER: &str = "user";
/// Property key under which the password is passed to the driver
pub const PROPERTY_PASSWORD: &str = "password";

/// A vendor driver capable of opening connections for a family of urls
pub trait Driver: Send + Sync + 'static {
    /// Whether the driver can open connections to the supplied url
    fn accepts_url(&self, url: &str) -> bool;

    /// Opens a new physical connection
    fn connect(
        &self,
        url: &str,
        props: &ConnectionProperties,
    ) -> Result<Box<dyn DriverConnection>>;
}

/// A physical connection opened by a driver
pub trait DriverConnection: Send + 'static {
    /// Runs the supplied sql, returning its result set
    fn query(&mut self, sql: &str, params: Vec<DataValue>) -> Result<Box<dyn DriverResultSet>>;

    /// Runs the supplied modifying sql
    fn execute(
        &mut self,
        sql: &str,
        params: Vec<DataValue>,
        return_generated_keys: bool,
    ) -> Result<ExecutionResult>;

    /// Checks whether the connection is still usable
    fn is_valid(&mut self) -> Result<()>;

    /// Quick check whether the connection has been closed
    fn is_closed(&self) -> bool;
}

/// Rows returned by a driver
pub trait DriverResultSet: Send {
    /// Gets the row structure of the result set
    fn structure(&self) -> &RowStructure;

    /// Reads the next row, returning `None` once the results are exhausted
    fn next_row(&mut self) -> Result<Option<Vec<DataValue>>>;
}

lazy_static! {
    static ref DRIVERS: RwLock<Vec<Arc<dyn Driver>>> = RwLock::new(vec![]);
}

/// Registers a driver with the process-wide driver registry
pub fn register_driver(driver: Arc<dyn Driver>) {
    let mut drivers = DRIVERS.write().unwrap_or_else(PoisonError::into_inner);

    if !drivers.iter().any(|d| same_driver(d, &driver)) {
        debug!("Registering sql driver");
        drivers.push(driver);
    }
}

/// Removes a driver from the process-wide driver registry
pub fn deregister_driver(driver: &Arc<dyn Driver>) {
    let mut drivers = DRIVERS.write().unwrap_or_else(PoisonError::into_inner);
    drivers.retain(|d| !same_driver(d, driver));
}

/// Finds the first registered driver which accepts the url
pub fn driver_for_url(url: &str) -> Result<Arc<dyn Driver>> {
    let drivers = DRIVERS.read().unwrap_or_else(PoisonError::into_inner);

    drivers
        .iter()
        .find(|d| d.accepts_url(url))
        .cloned()
        .ok_or_else(|| anyhow!("No suitable driver found for {}", url))
}

fn same_driver(a: &Arc<dyn Driver>, b: &Arc<dyn Driver>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use crate::test::MemoryDriver;

    use super::*;

    #[test]
    #[serial]
    fn test_driver_for_url() {
        let driver: Arc<dyn Driver> = Arc::new(MemoryDriver::new("jdbc:memory://driver-test"));
        register_driver(Arc::clone(&driver));

        assert!(driver_for_url("jdbc:memory://driver-test/db").is_ok());

        deregister_driver(&driver);

        assert!(driver_for_url("jdbc:memory://driver-test/db").is_err());
    }

    #[test]
    #[serial]
    fn test_driver_for_url_no_suitable_driver() {
        let err = driver_for_url("jdbc:unknown://host").err().unwrap();

        assert_eq!(
            err.to_string(),
            "No suitable driver found for jdbc:unknown://host"
        );
    }

    #[test]
    #[serial]
    fn test_register_driver_twice() {
        let driver: Arc<dyn Driver> = Arc::new(MemoryDriver::new("jdbc:memory://twice"));
        register_driver(Arc::clone(&driver));
        register_driver(Arc::clone(&driver));

        let count = DRIVERS
            .read()
            .unwrap()
            .iter()
            .filter(|d| same_driver(*d, &driver))
            .count();
        assert_eq!(count, 1);

        deregister_driver(&driver);
    }
}
