// Generic SQL client runtime which connectors delegate to.
// Connectors translate their configuration into `SqlDatasourceParams`,
// the vendor driver is plugged in through the `Driver` trait.

mod driver;
pub use driver::*;
mod query;
pub use query::*;
mod processor;
pub use processor::*;
mod pool;
pub use pool::*;
mod datasource;
pub use datasource::*;
mod client;
pub use client::*;
mod executor;
pub use executor::*;
