//! Adapter configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AdapterError;

/// Default rule table name
pub const DEFAULT_TABLE_NAME: &str = "casbin_rule";

/// Default SQLite database path
pub const DEFAULT_DATABASE: &str = "casbin.db";

/// Construction-time settings for [`crate::SqliteAdapter`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// SQLite data source: a file path or `:memory:`
    #[serde(default = "default_database")]
    pub database: String,

    /// Rule table name
    #[serde(default = "default_table_name")]
    pub table_name: String,
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            table_name: default_table_name(),
        }
    }
}

impl AdapterConfig {
    /// Parse and validate a TOML config
    pub fn from_toml_str(content: &str) -> Result<Self, AdapterError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AdapterError::Config(format!("invalid adapter TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AdapterError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// The table name is spliced into SQL, so it must be a plain identifier
    pub fn validate(&self) -> Result<(), AdapterError> {
        validate_table_name(&self.table_name)
    }
}

pub(crate) fn validate_table_name(name: &str) -> Result<(), AdapterError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(AdapterError::Config(format!("invalid table name: {:?}", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AdapterConfig::default();
        assert_eq!(config.database, "casbin.db");
        assert_eq!(config.table_name, "casbin_rule");
    }

    #[test]
    fn test_deserialize_toml() {
        let toml = r#"
            database = ":memory:"
            table_name = "policy_rules"
        "#;
        let config = AdapterConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.database, ":memory:");
        assert_eq!(config.table_name, "policy_rules");
    }

    #[test]
    fn test_deserialize_toml_defaults() {
        let config = AdapterConfig::from_toml_str("").unwrap();
        assert_eq!(config, AdapterConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        let err = AdapterConfig::from_toml_str("database = ").unwrap_err();
        assert!(err.to_string().contains("invalid adapter TOML"));
    }

    #[test]
    fn test_table_name_validation() {
        for name in ["casbin_rule", "_rules", "Rules2"] {
            assert!(validate_table_name(name).is_ok(), "{name}");
        }
        for name in ["", "2rules", "rules; DROP TABLE x", "my-rules", "r\u{e9}gles"] {
            assert!(validate_table_name(name).is_err(), "{name}");
        }
    }

    #[test]
    fn test_from_toml_rejects_bad_table_name() {
        let err = AdapterConfig::from_toml_str(r#"table_name = "x y""#).unwrap_err();
        assert!(matches!(err, AdapterError::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "table_name = \"rules\"").unwrap();
        let config = AdapterConfig::from_file(file.path()).unwrap();
        assert_eq!(config.table_name, "rules");
        assert_eq!(config.database, "casbin.db");
    }

    #[test]
    fn test_from_missing_file() {
        let err = AdapterConfig::from_file("/nonexistent/adapter.toml").unwrap_err();
        assert!(matches!(err, AdapterError::Io(_)));
    }
}
