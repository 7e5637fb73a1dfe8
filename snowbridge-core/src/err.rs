//! Error handling shared across the workspace.
//!
//! Runtime failures are carried as [`anyhow::Error`] with context attached
//! at each layer, structured errors are converted into it where needed.

pub use anyhow::{anyhow, bail, ensure, Context, Error, Result};
