use std::collections::BTreeMap;

use serde::{de, Deserialize, Deserializer};
use snowbridge_core::config::{self, Value};
use snowbridge_sql::ConnectionPool;

use crate::ConfigError;

/// Tag of the username/password auth config
pub const BASIC_AUTH_TYPE: &str = "BasicAuth";
/// Tag of the private key auth config
pub const KEY_BASED_AUTH_TYPE: &str = "KeyBasedAuth";

/// The configuration of a Snowflake client
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientConfig {
    /// The JDBC url, eg `jdbc:snowflake://<account>.snowflakecomputing.com`
    pub url: String,
    /// How the client authenticates
    pub auth_config: AuthConfig,
    /// Datasource options
    #[serde(default)]
    pub options: Option<Options>,
    /// A pool for this client, the global pool is used if absent
    #[serde(default)]
    pub connection_pool: Option<ConnectionPool>,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>, auth_config: impl Into<AuthConfig>) -> Self {
        Self {
            url: url.into(),
            auth_config: auth_config.into(),
            options: None,
            connection_pool: None,
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_connection_pool(mut self, pool: ConnectionPool) -> Self {
        self.connection_pool = Some(pool);
        self
    }

    pub fn parse(options: Value) -> Result<Self, ConfigError> {
        config::from_value::<Self>(options).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Authentication of the client
#[derive(Debug, Clone, PartialEq)]
pub enum AuthConfig {
    Basic(BasicAuth),
    KeyBased(KeyBasedAuth),
    /// An auth config whose `type` is not recognised, rejected when the client is created
    Unsupported(String),
}

impl AuthConfig {
    /// The tag identifying the kind of auth
    pub fn r#type(&self) -> &str {
        match self {
            AuthConfig::Basic(_) => BASIC_AUTH_TYPE,
            AuthConfig::KeyBased(_) => KEY_BASED_AUTH_TYPE,
            AuthConfig::Unsupported(t) => t,
        }
    }
}

impl<'de> Deserialize<'de> for AuthConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;

        let r#type = match value.as_mapping().and_then(|m| config::get_str(m, "type")) {
            Some(t) => t.to_string(),
            None => return Err(de::Error::missing_field("type")),
        };

        match r#type.as_str() {
            BASIC_AUTH_TYPE => config::from_value(value)
                .map(AuthConfig::Basic)
                .map_err(de::Error::custom),
            KEY_BASED_AUTH_TYPE => config::from_value(value)
                .map(AuthConfig::KeyBased)
                .map_err(de::Error::custom),
            _ => Ok(AuthConfig::Unsupported(r#type)),
        }
    }
}

/// Username and password auth
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BasicAuth {
    pub user: String,
    /// May be omitted when the server trusts the client
    #[serde(default)]
    pub password: Option<String>,
}

impl BasicAuth {
    pub fn new(user: impl Into<String>, password: Option<String>) -> Self {
        Self {
            user: user.into(),
            password,
        }
    }
}

impl From<BasicAuth> for AuthConfig {
    fn from(auth: BasicAuth) -> Self {
        AuthConfig::Basic(auth)
    }
}

/// Private key auth
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyBasedAuth {
    pub user: String,
    /// Path to the private key file
    pub private_key_path: String,
    /// Passphrase of an encrypted private key
    #[serde(default)]
    pub private_key_passphrase: Option<String>,
}

impl KeyBasedAuth {
    pub fn new(
        user: impl Into<String>,
        private_key_path: impl Into<String>,
        private_key_passphrase: Option<String>,
    ) -> Self {
        Self {
            user: user.into(),
            private_key_path: private_key_path.into(),
            private_key_passphrase,
        }
    }
}

impl From<KeyBasedAuth> for AuthConfig {
    fn from(auth: KeyBasedAuth) -> Self {
        AuthConfig::KeyBased(auth)
    }
}

/// Datasource options
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Options {
    /// Name given to the datasource
    #[serde(default)]
    pub datasource_name: Option<String>,
    /// Driver connection properties
    /// @see https://docs.snowflake.com/en/developer-guide/jdbc/jdbc-parameters
    #[serde(default, deserialize_with = "deserialize_properties")]
    pub properties: Option<BTreeMap<String, String>>,
    /// Which property wins when several look like a connection timeout
    #[serde(default)]
    pub connect_timeout_key: ConnectTimeoutKey,
}

impl Options {
    pub fn new(
        datasource_name: Option<String>,
        properties: Option<BTreeMap<String, String>>,
    ) -> Self {
        Self {
            datasource_name,
            properties,
            connect_timeout_key: ConnectTimeoutKey::default(),
        }
    }

    pub fn with_connect_timeout_key(mut self, connect_timeout_key: ConnectTimeoutKey) -> Self {
        self.connect_timeout_key = connect_timeout_key;
        self
    }
}

/// Selects the connection timeout property when several keys match.
///
/// Properties are enumerated in key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ConnectTimeoutKey {
    /// The first matching key is used
    #[default]
    First,
    /// The last matching key is used
    Last,
    /// More than one matching key is rejected
    Unique,
}

/// Property values are strings for the driver, scalars are accepted in yaml
fn deserialize_properties<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<BTreeMap<String, String>>, D::Error> {
    let raw = match Option::<BTreeMap<String, Value>>::deserialize(deserializer)? {
        Some(raw) => raw,
        None => return Ok(None),
    };

    let mut properties = BTreeMap::new();

    for (key, value) in raw {
        let value = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => {
                return Err(de::Error::custom(format!(
                    "Property '{}' must be a string, number or boolean",
                    key
                )))
            }
        };

        properties.insert(key, value);
    }

    Ok(Some(properties))
}
