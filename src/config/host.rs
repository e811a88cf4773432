//! Host configuration schema.
//!
//! The host configuration is the lowest layer of the application tree:
//! `hostsettings.json` next to the executable, then environment variables.
//! It also carries the settings the host itself needs before any module
//! is loaded (environment name, logging, metrics).

use std::ffi::OsStr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::loader::{read_json_file, ConfigError};
use crate::config::tree::ConfigTree;

pub const HOST_SETTINGS_FILE: &str = "hostsettings.json";

/// Key holding the environment name.
pub const CONFIGURATION_NAME_KEY: &str = "configuration";

/// Separator environment variables use in place of `:`.
const ENV_KEY_DELIMITER: &str = "__";

/// Build a layer from environment variables. `A__B=v` becomes `A:B = "v"`.
///
/// Variables whose name or value is not valid UTF-8 are skipped.
pub fn environment_layer<I, K, V>(vars: I) -> ConfigTree
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut tree = ConfigTree::new();
    for (key, value) in vars {
        let (key, value) = (key.as_ref(), value.as_ref());
        let (Some(name), Some(value)) = (key.to_str(), value.to_str()) else {
            tracing::debug!(name = %key.to_string_lossy(), "Skipping non UTF-8 environment variable");
            continue;
        };
        tree.set(&name.replace(ENV_KEY_DELIMITER, ":"), Value::String(value.to_string()));
    }
    tree
}

/// Load the host configuration: host settings file, then environment variables.
pub fn load_host_configuration<I, K, V>(settings_dir: &Path, vars: I) -> Result<ConfigTree, ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut tree = read_json_file(&settings_dir.join(HOST_SETTINGS_FILE))?.unwrap_or_default();
    tree.merge(environment_layer(vars));
    Ok(tree)
}

/// Settings the host reads from its own configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostSettings {
    /// Environment name selecting `appsettings.<name>.json`.
    pub configuration: Option<String>,
    pub logging: LoggingSettings,
    pub metrics: MetricsSettings,
}

impl HostSettings {
    pub fn from_tree(tree: &ConfigTree) -> Result<Self, ConfigError> {
        Ok(Self {
            configuration: tree
                .get_str(CONFIGURATION_NAME_KEY)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            logging: tree.section("common:logging").bind_or_default()?,
            metrics: tree.section("common:metrics").bind_or_default()?,
        })
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration (`common:logging`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directives (e.g. `info`, `hostbox=debug,warn`).
    pub level: String,

    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Metrics configuration (`common:metrics`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Expose a Prometheus scrape endpoint.
    #[serde(deserialize_with = "lenient_bool")]
    pub enabled: bool,

    /// Scrape endpoint bind address.
    pub address: String,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Web host configuration (`web` section of the application tree).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WebSettings {
    /// Bind address for the HTTP listener.
    pub bind_address: String,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Environment variables arrive as strings; accept `"true"` as well as `true`.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!("invalid boolean `{}`", other))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_environment_layer_maps_double_underscore() {
        let tree = environment_layer([("Common__Logging__Level", "debug"), ("configuration", "prod")]);
        assert_eq!(
            tree.to_value(),
            json!({"Common": {"Logging": {"Level": "debug"}}, "configuration": "prod"})
        );
        let settings = HostSettings::from_tree(&tree).unwrap();
        assert_eq!(settings.logging.level, "debug");
    }

    #[cfg(unix)]
    #[test]
    fn test_environment_layer_skips_non_utf8_variables() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let tree = environment_layer([
            (OsString::from("Common__Logging__Level"), OsString::from_vec(vec![0xff, 0xfe])),
            (OsString::from_vec(vec![b'B', b'A', b'D', 0xc3]), OsString::from("x")),
            (OsString::from("configuration"), OsString::from("prod")),
        ]);
        assert_eq!(tree.to_value(), json!({"configuration": "prod"}));
    }

    #[test]
    fn test_environment_overrides_host_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(HOST_SETTINGS_FILE),
            r#"{"configuration":"dev","common":{"logging":{"level":"warn","format":"json"}}}"#,
        )
        .unwrap();

        let tree = load_host_configuration(dir.path(), [("CONFIGURATION", "production")]).unwrap();
        let settings = HostSettings::from_tree(&tree).unwrap();
        assert_eq!(settings.configuration.as_deref(), Some("production"));
        assert_eq!(settings.logging.level, "warn");
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_defaults_without_settings() {
        let dir = tempfile::tempdir().unwrap();
        let tree = load_host_configuration(dir.path(), Vec::<(String, String)>::new()).unwrap();
        let settings = HostSettings::from_tree(&tree).unwrap();
        assert_eq!(settings, HostSettings::default());
    }

    #[test]
    fn test_metrics_flag_from_environment_string() {
        let tree = environment_layer([("COMMON__METRICS__ENABLED", "true"), ("COMMON__METRICS__ADDRESS", "127.0.0.1:9191")]);
        let settings = HostSettings::from_tree(&tree).unwrap();
        assert!(settings.metrics.enabled);
        assert_eq!(settings.metrics.address, "127.0.0.1:9191");
    }

    #[test]
    fn test_invalid_log_format_is_a_bind_error() {
        let tree = environment_layer([("common__logging__format", "xml")]);
        let err = HostSettings::from_tree(&tree).unwrap_err();
        assert!(matches!(err, ConfigError::Bind { ref section, .. } if section == "common:logging"));
    }
}
