use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use lazy_static::lazy_static;
use snowbridge_connector::{ConnectionPool, ConnectionPoolOptions};
use snowbridge_sql::{register_driver, test::MemoryDriver};

lazy_static! {
    static ref DRIVERS: Mutex<HashMap<String, Arc<MemoryDriver>>> = Mutex::new(HashMap::new());
}

/// Gets the in-memory driver answering for the supplied account url,
/// registering it on first use
pub fn start_snowflake(url: &str) -> Arc<MemoryDriver> {
    snowbridge_logging::init_for_tests();

    let mut drivers = DRIVERS.lock().unwrap();
    let driver = drivers
        .entry(url.to_string())
        .or_insert_with(|| {
            let driver = Arc::new(MemoryDriver::new(url));
            register_driver(driver.clone());
            driver
        })
        .clone();

    driver.fail_connections(false);
    driver
}

/// A pool which keeps a single connection open
#[allow(dead_code)]
pub fn small_pool() -> ConnectionPool {
    ConnectionPool::new(ConnectionPoolOptions {
        max_open_connections: 2,
        max_connection_life_time: 0,
        min_idle_connections: 1,
    })
}
