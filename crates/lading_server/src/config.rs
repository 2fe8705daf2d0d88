//! Layered service configuration.
//!
//! Sources, lowest precedence first:
//! - Bundled defaults (include_str! from lading.toml)
//! - A user file (./lading.toml, or the path given on the command line)
//! - Environment variables prefixed `LADING`, nested with `__`
//!   (e.g. `LADING_WAREHOUSE__SCHEMA=RAW`)

use config::{Config, Environment, File, FileFormat};
use lading_core::{VarcharSizing, WriteOptions};
use lading_database::Dialect;
use lading_error::{ConfigError, LadingResult};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../lading.toml");

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ServerSection {
    /// Socket address to listen on
    bind: String,
    /// Log filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Basic-auth credentials guarding every route but `/`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct AuthSection {
    /// Expected username
    username: String,
    /// Expected password
    password: String,
}

impl std::fmt::Debug for AuthSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSection")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AuthSection {
    /// Credentials pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Target store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct WarehouseSection {
    /// Namespace every target table is created in
    schema: String,
    /// Store backend: `hana` or `postgres`
    #[serde(default)]
    dialect: Dialect,
    /// Connection URL; `DATABASE_URL` is used when unset
    #[serde(default)]
    url: Option<String>,
    /// User-provided VCAP service carrying the connection URL
    #[serde(default)]
    vcap_service: Option<String>,
}

impl WarehouseSection {
    /// Resolve the connection URL.
    ///
    /// An explicit `url` wins. Otherwise the credentials of `vcap_service` are
    /// consulted. `None` means the connector falls back to `DATABASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns an error when `vcap_service` is set but cannot be resolved.
    pub fn resolve_url(&self) -> LadingResult<Option<String>> {
        if let Some(url) = &self.url {
            return Ok(Some(url.clone()));
        }
        let Some(service) = &self.vcap_service else {
            return Ok(None);
        };

        let raw = std::env::var("VCAP_SERVICES")
            .map_err(|_| ConfigError::new("VCAP_SERVICES not found in environment"))?;
        let credentials = vcap_credentials(&raw, service)?;
        let url = ["url", "uri"]
            .iter()
            .find_map(|key| credentials.get(*key).and_then(JsonValue::as_str))
            .ok_or_else(|| {
                ConfigError::new(format!(
                    "Service {} in VCAP_SERVICES has no url or uri credential",
                    service
                ))
            })?;
        Ok(Some(url.to_string()))
    }
}

/// Find the credentials of a user-provided service in a `VCAP_SERVICES` document.
///
/// # Examples
///
/// ```
/// use lading_server::vcap_credentials;
///
/// let vcap = r#"{"user-provided": [{"name": "wh", "credentials": {"url": "postgres://h/db"}}]}"#;
/// let credentials = vcap_credentials(vcap, "wh").unwrap();
/// assert_eq!(credentials["url"], "postgres://h/db");
/// ```
pub fn vcap_credentials(
    vcap_services: &str,
    service_name: &str,
) -> Result<serde_json::Map<String, JsonValue>, ConfigError> {
    let services: JsonValue = serde_json::from_str(vcap_services)
        .map_err(|e| ConfigError::new(format!("VCAP_SERVICES is not valid JSON: {}", e)))?;

    services
        .get("user-provided")
        .and_then(JsonValue::as_array)
        .into_iter()
        .flatten()
        .find(|svc| svc.get("name").and_then(JsonValue::as_str) == Some(service_name))
        .and_then(|svc| svc.get("credentials"))
        .and_then(JsonValue::as_object)
        .cloned()
        .ok_or_else(|| {
            ConfigError::new(format!("Service {} not found in VCAP_SERVICES", service_name))
        })
}

/// Outbound fetch settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct FetchSection {
    /// Deadline for one remote request, in seconds
    timeout_secs: u64,
}

impl FetchSection {
    /// Request deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Sizing and truncation limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, derive_getters::Getters)]
pub struct LimitsSection {
    /// VARCHAR capacity rules used by inference
    #[serde(default)]
    varchar: VarcharSizing,
    /// Serialization options used by the writer
    #[serde(default)]
    write: WriteOptions,
}

/// Default row limits for the read-only routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct PreviewSection {
    /// Records returned by `/preview-data` when no limit is given
    preview_limit: usize,
    /// Records inferred over by `/infer-types` when no limit is given
    infer_limit: usize,
}

/// Complete service configuration.
///
/// # Example
///
/// ```no_run
/// use lading_server::BridgeConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = BridgeConfig::load()?;
/// println!("Writing into schema {}", config.warehouse().schema());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct BridgeConfig {
    /// HTTP listener
    server: ServerSection,
    /// Basic-auth credentials
    auth: AuthSection,
    /// Target store
    warehouse: WarehouseSection,
    /// Outbound fetch
    fetch: FetchSection,
    /// Sizing and truncation limits
    #[serde(default)]
    limits: LimitsSection,
    /// Read-only route limits
    preview: PreviewSection,
}

impl BridgeConfig {
    /// Load configuration with `./lading.toml` as the user file.
    pub fn load() -> LadingResult<Self> {
        Self::load_layers(None)
    }

    /// Load configuration with an explicit user file.
    pub fn from_file(path: impl AsRef<Path>) -> LadingResult<Self> {
        Self::load_layers(Some(path.as_ref()))
    }

    /// Bundled defaults only, ignoring files and environment.
    pub fn bundled() -> LadingResult<Self> {
        let config = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to read bundled configuration: {}", e)))?;
        Self::deserialize_checked(config)
    }

    /// Parse a TOML document layered over the bundled defaults.
    pub fn from_toml_str(toml: &str) -> LadingResult<Self> {
        let config = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;
        Self::deserialize_checked(config)
    }

    #[instrument(name = "config.load")]
    fn load_layers(path: Option<&Path>) -> LadingResult<Self> {
        debug!("Loading configuration with precedence: environment > user file > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("lading").required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix("LADING")
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to load configuration: {}", e)))?;
        Self::deserialize_checked(config)
    }

    fn deserialize_checked(config: Config) -> LadingResult<Self> {
        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Invalid configuration: {}", e)))?;
        parsed.validate()?;
        debug!(
            schema = %parsed.warehouse.schema,
            dialect = %parsed.warehouse.dialect,
            bind = %parsed.server.bind,
            "Configuration loaded"
        );
        Ok(parsed)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.limits.varchar.validate().map_err(ConfigError::new)?;
        if self.warehouse.schema.trim().is_empty() {
            return Err(ConfigError::new("warehouse.schema must not be empty"));
        }
        if *self.limits.write.text_cap() == 0 {
            return Err(ConfigError::new("limits.write.text_cap must be positive"));
        }
        Ok(())
    }

    /// Override the listen address.
    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.server.bind = bind.into();
        self
    }

    /// Override the basic-auth credentials.
    pub fn with_auth(mut self, auth: AuthSection) -> Self {
        self.auth = auth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_defaults() {
        let config = BridgeConfig::bundled().unwrap();
        assert_eq!(config.warehouse().schema(), "MY_SCHEMA");
        assert_eq!(*config.warehouse().dialect(), Dialect::Hana);
        assert_eq!(config.auth().username(), "admin");
        assert_eq!(*config.preview().preview_limit(), 5);
        assert_eq!(*config.preview().infer_limit(), 10);
        assert_eq!(*config.limits().varchar(), VarcharSizing::default());
        assert_eq!(*config.limits().write().text_cap(), 5000);
        assert_eq!(config.fetch().timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_user_values_take_precedence() {
        let config = BridgeConfig::from_toml_str(
            r#"
            [warehouse]
            schema = "RAW"

            [limits.varchar]
            max = 8000
            "#,
        )
        .unwrap();
        assert_eq!(config.warehouse().schema(), "RAW");
        assert_eq!(*config.limits().varchar().max(), 8000);
        assert_eq!(*config.limits().varchar().min(), 200);
        assert_eq!(config.auth().password(), "secret");
    }

    #[test]
    fn test_postgres_dialect_selected() {
        let config = BridgeConfig::from_toml_str(
            r#"
            [warehouse]
            dialect = "postgres"
            "#,
        )
        .unwrap();
        assert_eq!(*config.warehouse().dialect(), Dialect::Postgres);
    }

    #[test]
    fn test_unknown_dialect_rejected() {
        let result = BridgeConfig::from_toml_str(
            r#"
            [warehouse]
            dialect = "oracle"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let result = BridgeConfig::from_toml_str(
            r#"
            [limits.varchar]
            min = 900
            max = 100
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_password_redacted_in_debug() {
        let auth = AuthSection::new("admin", "hunter2");
        assert!(!format!("{:?}", auth).contains("hunter2"));
    }

    #[test]
    fn test_vcap_lookup() {
        let vcap = r#"{"user-provided": [
            {"name": "other", "credentials": {"url": "x"}},
            {"name": "warehouse", "credentials": {"uri": "postgres://db/wh"}}
        ]}"#;
        let credentials = vcap_credentials(vcap, "warehouse").unwrap();
        assert_eq!(credentials["uri"], "postgres://db/wh");
        assert!(vcap_credentials(vcap, "missing").is_err());
        assert!(vcap_credentials("not json", "warehouse").is_err());
    }

    #[test]
    fn test_explicit_url_wins() {
        let config = BridgeConfig::from_toml_str(
            r#"
            [warehouse]
            url = "postgres://localhost/wh"
            vcap_service = "ignored"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.warehouse().resolve_url().unwrap().as_deref(),
            Some("postgres://localhost/wh")
        );
    }
}
