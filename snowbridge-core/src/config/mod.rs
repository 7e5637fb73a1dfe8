//! Configuration primitives.
//!
//! Connector configuration is authored as yaml and parsed into
//! strongly-typed structs by each consumer.

pub use serde_yaml::{from_value, Mapping, Number, Sequence, Value};

mod util;
pub use util::*;
