use snowbridge_core::err::{Context, Result};
pub use env_logger::{init, init_from_env};
pub use log::*;

/// Configures the process-wide logger, defaulting to `info`
/// unless overridden through `RUST_LOG`
pub fn init_logging() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    )
    .try_init()
    .context("Failed to init logging")
}

/// Logging init function for tests
pub fn init_for_tests() {
    let res = env_logger::builder()
        .filter_module("snowbridge", LevelFilter::Trace)
        .is_test(true)
        .try_init();
    if let Err(err) = res {
        eprintln!("Failed to init logging: {}", err);
    }
}
