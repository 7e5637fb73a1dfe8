use anyhow::{Context, Result};
use serde::Deserialize;
use serde_yaml::{Deserializer, Mapping, Value};

/// Parses the supplied string as a config value
pub fn parse_config<'a>(conf_str: impl Into<&'a str>) -> Result<Value> {
    Value::deserialize(Deserializer::from_str(conf_str.into()))
        .context("Failed to parse configuration yaml")
}

/// Reads a string entry from a config mapping, if present
pub fn get_str<'a>(map: &'a Mapping, key: &str) -> Option<&'a str> {
    map.get(&Value::String(key.to_string()))
        .and_then(|v| v.as_str())
}
