use std::{collections::BTreeMap, fmt::Debug};

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use snowbridge_logging::debug;
use snowbridge_sql::{ConnectionPool, SqlDatasourceParams, POOL_CONNECTION_TIMEOUT};

use crate::{AuthConfig, ClientConfig, ConfigError, ConnectTimeoutKey, KeyBasedAuth};

/// Driver property holding the path of the private key file
pub const PROPERTY_PRIVATE_KEY_FILE: &str = "private_key_file";
/// Driver property holding the passphrase of the private key file
pub const PROPERTY_PRIVATE_KEY_FILE_PWD: &str = "private_key_file_pwd";

/// Only the scheme is checked, the remainder of the url is driver-specific
const JDBC_URL_PREFIX: &str = "jdbc:";

lazy_static! {
    /// Matches (lowercased) property keys which configure the connection timeout
    static ref CONNECT_TIMEOUT: Regex = Regex::new(r"^.*connect.*timeout.*$").unwrap();
}

/// Overrides applied to the pool rather than passed to the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOverrides {
    /// How long to wait for a connection, in milliseconds
    pub connection_timeout: String,
}

impl PoolOverrides {
    pub fn pool_properties(&self) -> BTreeMap<String, String> {
        [(
            POOL_CONNECTION_TIMEOUT.to_string(),
            self.connection_timeout.clone(),
        )]
        .into_iter()
        .collect()
    }
}

/// Datasource parameters resolved from a client config
#[derive(Clone, PartialEq)]
pub struct ResolvedParameters {
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub datasource_name: Option<String>,
    /// Driver connection properties
    pub properties: BTreeMap<String, String>,
    pub pool_overrides: Option<PoolOverrides>,
    pub pool: ConnectionPool,
}

impl Debug for ResolvedParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let properties = self
            .properties
            .iter()
            .map(|(k, v)| match k.as_str() {
                PROPERTY_PRIVATE_KEY_FILE_PWD => (k, "***"),
                _ => (k, v.as_str()),
            })
            .collect::<BTreeMap<_, _>>();

        f.debug_struct("ResolvedParameters")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("datasource_name", &self.datasource_name)
            .field("properties", &properties)
            .field("pool_overrides", &self.pool_overrides)
            .field("pool", &self.pool)
            .finish()
    }
}

impl From<ResolvedParameters> for SqlDatasourceParams {
    fn from(params: ResolvedParameters) -> Self {
        SqlDatasourceParams::new(params.url, params.pool)
            .with_user(params.user)
            .with_password(params.password)
            .with_datasource_name(params.datasource_name)
            .with_options(params.properties)
            .with_pool_properties(params.pool_overrides.map(|o| o.pool_properties()))
    }
}

/// Maps the client config onto datasource parameters.
///
/// Clients without their own pool are opened in `global_pool`.
pub fn build_parameters(
    config: &ClientConfig,
    global_pool: &ConnectionPool,
) -> Result<ResolvedParameters, ConfigError> {
    if !is_jdbc_url_valid(&config.url) {
        return Err(ConfigError::InvalidUrl(config.url.clone()));
    }

    let (datasource_name, properties, connect_timeout_key) = match &config.options {
        Some(options) => (
            options.datasource_name.clone(),
            options.properties.clone().unwrap_or_default(),
            options.connect_timeout_key,
        ),
        None => (None, BTreeMap::new(), ConnectTimeoutKey::default()),
    };

    let pool_overrides = connect_timeout_override(&properties, connect_timeout_key)?;

    let (user, password, properties) = match &config.auth_config {
        AuthConfig::Basic(auth) => (Some(auth.user.clone()), auth.password.clone(), properties),
        AuthConfig::KeyBased(auth) => (
            Some(auth.user.clone()),
            None,
            with_private_key(properties, auth),
        ),
        AuthConfig::Unsupported(r#type) => {
            return Err(ConfigError::InvalidAuthType(r#type.clone()))
        }
    };

    let pool = config
        .connection_pool
        .clone()
        .unwrap_or_else(|| global_pool.clone());

    debug!(
        "Resolved {} parameters for {}",
        config.auth_config.r#type(),
        config.url
    );

    Ok(ResolvedParameters {
        url: config.url.clone(),
        user,
        password,
        datasource_name,
        properties,
        pool_overrides,
        pool,
    })
}

fn is_jdbc_url_valid(url: &str) -> bool {
    url.trim().starts_with(JDBC_URL_PREFIX)
}

/// Finds the property configuring the connection timeout, if any
fn connect_timeout_override(
    properties: &BTreeMap<String, String>,
    key: ConnectTimeoutKey,
) -> Result<Option<PoolOverrides>, ConfigError> {
    let matches = properties
        .iter()
        .filter(|(k, _)| CONNECT_TIMEOUT.is_match(&k.to_lowercase()))
        .collect_vec();

    let chosen = match key {
        ConnectTimeoutKey::First => matches.first(),
        ConnectTimeoutKey::Last => matches.last(),
        ConnectTimeoutKey::Unique if matches.len() > 1 => {
            return Err(ConfigError::AmbiguousConnectTimeout(
                matches.iter().map(|(k, _)| k.to_string()).collect(),
            ))
        }
        ConnectTimeoutKey::Unique => matches.first(),
    };

    Ok(chosen.map(|(_, v)| PoolOverrides {
        connection_timeout: v.to_string(),
    }))
}

/// Returns the properties with the private key entries applied
fn with_private_key(
    mut properties: BTreeMap<String, String>,
    auth: &KeyBasedAuth,
) -> BTreeMap<String, String> {
    properties.insert(
        PROPERTY_PRIVATE_KEY_FILE.to_string(),
        auth.private_key_path.clone(),
    );

    match &auth.private_key_passphrase {
        Some(passphrase) => properties.insert(
            PROPERTY_PRIVATE_KEY_FILE_PWD.to_string(),
            passphrase.clone(),
        ),
        None => properties.remove(PROPERTY_PRIVATE_KEY_FILE_PWD),
    };

    properties
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use snowbridge_sql::ConnectionPoolOptions;

    use crate::{BasicAuth, Options};

    use super::*;

    const URL: &str = "jdbc:snowflake://acme.snowflakecomputing.com";

    fn props(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn basic() -> BasicAuth {
        BasicAuth::new("alice", Some("secret".into()))
    }

    #[test]
    fn test_build_parameters_invalid_url() {
        let global = ConnectionPool::global();

        for url in ["", "   ", "snowflake://acme", "JDBC:snowflake://acme", "http://jdbc:"] {
            assert_eq!(
                build_parameters(&ClientConfig::new(url, basic()), &global),
                Err(ConfigError::InvalidUrl(url.to_string()))
            );
        }
    }

    #[test]
    fn test_build_parameters_invalid_url_checked_first() {
        let conf = ClientConfig::new("mysql://host", AuthConfig::Unsupported("OAuth".into()));

        assert_eq!(
            build_parameters(&conf, &ConnectionPool::global()),
            Err(ConfigError::InvalidUrl("mysql://host".into()))
        );
    }

    #[test]
    fn test_build_parameters_url_is_trimmed_for_validation() {
        let url = "  jdbc:snowflake://acme.snowflakecomputing.com ";
        let params =
            build_parameters(&ClientConfig::new(url, basic()), &ConnectionPool::global()).unwrap();

        assert_eq!(params.url, url);
    }

    #[test]
    fn test_build_parameters_invalid_auth_type() {
        let conf = ClientConfig::new(URL, AuthConfig::Unsupported("OAuth".into()));

        assert_eq!(
            build_parameters(&conf, &ConnectionPool::global()),
            Err(ConfigError::InvalidAuthType("OAuth".into()))
        );
    }

    #[test]
    fn test_build_parameters_basic_auth() {
        let global = ConnectionPool::global();
        let conf = ClientConfig::new(URL, basic());

        let params = build_parameters(&conf, &global).unwrap();

        assert_eq!(
            params,
            ResolvedParameters {
                url: URL.into(),
                user: Some("alice".into()),
                password: Some("secret".into()),
                datasource_name: None,
                properties: BTreeMap::new(),
                pool_overrides: None,
                pool: global,
            }
        );
    }

    #[test]
    fn test_build_parameters_basic_auth_without_password() {
        let conf = ClientConfig::new(URL, BasicAuth::new("alice", None));

        let params = build_parameters(&conf, &ConnectionPool::global()).unwrap();

        assert_eq!(params.user, Some("alice".into()));
        assert_eq!(params.password, None);
    }

    #[test]
    fn test_build_parameters_basic_auth_keeps_key_properties() {
        let conf = ClientConfig::new(URL, basic()).with_options(Options::new(
            None,
            Some(props(&[(PROPERTY_PRIVATE_KEY_FILE, "/user.pem")])),
        ));

        let params = build_parameters(&conf, &ConnectionPool::global()).unwrap();

        assert_eq!(
            params.properties,
            props(&[(PROPERTY_PRIVATE_KEY_FILE, "/user.pem")])
        );
    }

    #[test]
    fn test_build_parameters_key_based_auth() {
        let conf = ClientConfig::new(URL, KeyBasedAuth::new("alice", "/k.pem", Some("pw".into())))
            .with_options(Options::new(
                Some("warehouse".into()),
                Some(props(&[
                    (PROPERTY_PRIVATE_KEY_FILE, "/old.pem"),
                    (PROPERTY_PRIVATE_KEY_FILE_PWD, "old"),
                    ("db", "ANALYTICS"),
                ])),
            ));

        let params = build_parameters(&conf, &ConnectionPool::global()).unwrap();

        assert_eq!(params.user, Some("alice".into()));
        assert_eq!(params.password, None);
        assert_eq!(params.datasource_name, Some("warehouse".into()));
        assert_eq!(
            params.properties,
            props(&[
                ("db", "ANALYTICS"),
                (PROPERTY_PRIVATE_KEY_FILE, "/k.pem"),
                (PROPERTY_PRIVATE_KEY_FILE_PWD, "pw"),
            ])
        );
    }

    #[test]
    fn test_build_parameters_key_based_auth_without_passphrase() {
        let conf = ClientConfig::new(URL, KeyBasedAuth::new("alice", "/k.pem", None))
            .with_options(Options::new(
                None,
                Some(props(&[(PROPERTY_PRIVATE_KEY_FILE_PWD, "stale")])),
            ));

        let params = build_parameters(&conf, &ConnectionPool::global()).unwrap();

        assert_eq!(
            params.properties,
            props(&[(PROPERTY_PRIVATE_KEY_FILE, "/k.pem")])
        );
    }

    #[test]
    fn test_build_parameters_connect_timeout() {
        let conf = ClientConfig::new(URL, basic()).with_options(Options::new(
            None,
            Some(props(&[("connect_timeout", "30"), ("other", "x")])),
        ));

        let params = build_parameters(&conf, &ConnectionPool::global()).unwrap();

        assert_eq!(
            params.pool_overrides,
            Some(PoolOverrides {
                connection_timeout: "30".into()
            })
        );
        assert_eq!(
            params.properties,
            props(&[("connect_timeout", "30"), ("other", "x")])
        );
    }

    #[test]
    fn test_build_parameters_connect_timeout_case_insensitive() {
        let conf = ClientConfig::new(URL, basic()).with_options(Options::new(
            None,
            Some(props(&[("ConnectTimeout", "5000")])),
        ));

        let params = build_parameters(&conf, &ConnectionPool::global()).unwrap();

        assert_eq!(
            params.pool_overrides.unwrap().pool_properties(),
            props(&[(POOL_CONNECTION_TIMEOUT, "5000")])
        );
    }

    #[test]
    fn test_build_parameters_no_connect_timeout() {
        let conf = ClientConfig::new(URL, basic()).with_options(Options::new(
            None,
            Some(props(&[("timeout_connect", "1"), ("loginTimeout", "2")])),
        ));

        let params = build_parameters(&conf, &ConnectionPool::global()).unwrap();

        assert_eq!(params.pool_overrides, None);
    }

    fn timeout_props() -> BTreeMap<String, String> {
        props(&[
            ("connect_timeout", "1000"),
            ("connectTimeout", "2000"),
            ("other", "x"),
        ])
    }

    #[test]
    fn test_connect_timeout_override_first() {
        // keys enumerate in order: connectTimeout < connect_timeout
        assert_eq!(
            connect_timeout_override(&timeout_props(), ConnectTimeoutKey::First).unwrap(),
            Some(PoolOverrides {
                connection_timeout: "2000".into()
            })
        );
    }

    #[test]
    fn test_connect_timeout_override_last() {
        assert_eq!(
            connect_timeout_override(&timeout_props(), ConnectTimeoutKey::Last).unwrap(),
            Some(PoolOverrides {
                connection_timeout: "1000".into()
            })
        );
    }

    #[test]
    fn test_connect_timeout_override_unique() {
        assert_eq!(
            connect_timeout_override(&timeout_props(), ConnectTimeoutKey::Unique),
            Err(ConfigError::AmbiguousConnectTimeout(vec![
                "connectTimeout".into(),
                "connect_timeout".into()
            ]))
        );
        assert_eq!(
            connect_timeout_override(
                &props(&[("connect_timeout", "1000")]),
                ConnectTimeoutKey::Unique
            )
            .unwrap(),
            Some(PoolOverrides {
                connection_timeout: "1000".into()
            })
        );
    }

    #[test]
    fn test_build_parameters_dedicated_pool() {
        let pool = ConnectionPool::new(ConnectionPoolOptions::default());
        let conf = ClientConfig::new(URL, basic()).with_connection_pool(pool.clone());

        let params = build_parameters(&conf, &ConnectionPool::global()).unwrap();

        assert_eq!(params.pool, pool);
        assert_ne!(params.pool, ConnectionPool::global());
    }

    #[test]
    fn test_build_parameters_idempotent() {
        let global = ConnectionPool::global();
        let conf = ClientConfig::new(URL, KeyBasedAuth::new("alice", "/k.pem", Some("pw".into())))
            .with_options(Options::new(
                Some("warehouse".into()),
                Some(props(&[("connect_timeout", "30"), ("other", "x")])),
            ))
            .with_connection_pool(ConnectionPool::new(ConnectionPoolOptions::default()));

        assert_eq!(
            build_parameters(&conf, &global).unwrap(),
            build_parameters(&conf, &global).unwrap()
        );
    }

    #[test]
    fn test_resolved_parameters_into_datasource_params() {
        let global = ConnectionPool::global();
        let conf = ClientConfig::new(URL, basic()).with_options(Options::new(
            Some("warehouse".into()),
            Some(props(&[("connect_timeout", "30")])),
        ));

        let params = SqlDatasourceParams::from(build_parameters(&conf, &global).unwrap());

        assert_eq!(
            params,
            SqlDatasourceParams::new(URL, global)
                .with_user(Some("alice".into()))
                .with_password(Some("secret".into()))
                .with_datasource_name(Some("warehouse".into()))
                .with_options(props(&[("connect_timeout", "30")]))
                .with_pool_properties(Some(props(&[(POOL_CONNECTION_TIMEOUT, "30")])))
        );
    }

    #[test]
    fn test_resolved_parameters_debug_hides_secrets() {
        let conf = ClientConfig::new(URL, KeyBasedAuth::new("alice", "/k.pem", Some("pw".into())));

        let debug = format!(
            "{:?}",
            build_parameters(&conf, &ConnectionPool::global()).unwrap()
        );

        assert!(debug.contains("/k.pem"));
        assert!(!debug.contains("\"pw\""));
    }
}
