// Runtime configuration for the log service.
// Read once at startup from defaults, a TOML file and the environment.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::errors::{LogServiceError, LogServiceResult};

pub const DEFAULT_CONFIG_FILE: &str = "log_service.toml";

/// Environment variable naming an alternative TOML file
pub const CONFIG_PATH_ENV: &str = "LOG_SERVICE_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogServiceConfig {
    /// Collection holding the records
    pub table_name: String,
    /// Secondary index used by the read-recent path
    pub index_name: String,
    /// Fixed partition value stamped on every record
    pub partition_key: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Forward raw store error text in 500 responses
    #[serde(default = "default_expose_store_errors")]
    pub expose_store_errors: bool,
}

fn default_data_dir() -> String {
    "data/log_store".to_string()
}

fn default_expose_store_errors() -> bool {
    true
}

#[derive(Serialize)]
struct LogServiceDefaults {
    data_dir: String,
    expose_store_errors: bool,
}

impl LogServiceConfig {
    pub fn from_figment(figment: &Figment) -> LogServiceResult<Self> {
        let config: LogServiceConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects blank required values so a bad deployment fails at startup
    pub fn validate(&self) -> LogServiceResult<()> {
        for (name, value) in [
            ("table_name", &self.table_name),
            ("index_name", &self.index_name),
            ("partition_key", &self.partition_key),
            ("data_dir", &self.data_dir),
        ] {
            if value.trim().is_empty() {
                return Err(LogServiceError::config(format!("{name} cannot be empty")));
            }
        }

        if self.table_name == self.index_name {
            return Err(LogServiceError::config(
                "table_name and index_name must differ",
            ));
        }

        if self.partition_key.contains('\0') {
            return Err(LogServiceError::config(
                "partition_key cannot contain NUL characters",
            ));
        }

        Ok(())
    }
}

/// Name fields taken from the environment verbatim. figment's `Env`
/// provider would type `1` or `true` as a number or bool.
#[derive(Serialize)]
struct NameOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    table_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    partition_key: Option<String>,
}

impl NameOverrides {
    fn from_env(table_var: &str, index_var: &str, partition_var: &str) -> Self {
        Self {
            table_name: std::env::var(table_var).ok(),
            index_name: std::env::var(index_var).ok(),
            partition_key: std::env::var(partition_var).ok(),
        }
    }
}

/// Layered configuration source. Later layers win:
/// defaults, TOML file, deployment env names, `LOG_SERVICE_*` env.
pub fn figment(path: Option<&str>) -> Figment {
    let path = path
        .map(str::to_string)
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

    Figment::from(Serialized::defaults(LogServiceDefaults {
        data_dir: default_data_dir(),
        expose_store_errors: default_expose_store_errors(),
    }))
    .merge(Toml::file(path))
    .merge(Serialized::defaults(NameOverrides::from_env(
        "TABLE_NAME",
        "GSI_NAME",
        "GSI_PARTITION_KEY",
    )))
    .merge(Env::prefixed("LOG_SERVICE_").ignore(&[
        "CONFIG",
        "TABLE_NAME",
        "INDEX_NAME",
        "PARTITION_KEY",
    ]))
    .merge(Serialized::defaults(NameOverrides::from_env(
        "LOG_SERVICE_TABLE_NAME",
        "LOG_SERVICE_INDEX_NAME",
        "LOG_SERVICE_PARTITION_KEY",
    )))
}

pub fn load_config(path: Option<&str>) -> LogServiceResult<LogServiceConfig> {
    LogServiceConfig::from_figment(&figment(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LogServiceConfig {
        LogServiceConfig {
            table_name: "logs".to_string(),
            index_name: "by_partition".to_string(),
            partition_key: "all".to_string(),
            data_dir: default_data_dir(),
            expose_store_errors: true,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn blank_partition_key_fails() {
        let cfg = LogServiceConfig {
            partition_key: "  ".to_string(),
            ..config()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("partition_key cannot be empty"));
    }

    #[test]
    fn table_and_index_must_differ() {
        let cfg = LogServiceConfig {
            index_name: "logs".to_string(),
            ..config()
        };
        assert!(cfg.validate().is_err());
    }
}
