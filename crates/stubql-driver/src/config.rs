//! Driver configuration

use serde::{Deserialize, Serialize};
use stubql_core::{Result, StubqlError};

use crate::DatePolicy;

pub const ENV_DRIVER_NAME: &str = "STUBQL_DRIVER_NAME";
pub const ENV_DELIMITER: &str = "STUBQL_DELIMITER";
pub const ENV_DATE_POLICY: &str = "STUBQL_DATE_POLICY";

/// Settings for a [`crate::StubDriver`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Name the driver registers under
    pub name: String,
    /// Field delimiter for fixtures built through the driver
    pub delimiter: char,
    /// Date policy for fixtures built through the driver; `None` follows
    /// the process-wide policy
    pub date_policy: Option<DatePolicy>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            name: crate::DRIVER_NAME.to_string(),
            delimiter: ',',
            date_policy: None,
        }
    }
}

impl DriverConfig {
    /// Parse a TOML document, e.g.
    ///
    /// ```toml
    /// name = "testdb"
    /// delimiter = "|"
    /// date_policy = "rfc3339"
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DriverConfig = toml::from_str(content)
            .map_err(|e| StubqlError::Configuration(format!("invalid driver config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `STUBQL_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = DriverConfig::default();

        if let Some(name) = lookup(ENV_DRIVER_NAME) {
            config.name = name;
        }
        if let Some(delimiter) = lookup(ENV_DELIMITER) {
            let mut chars = delimiter.chars();
            config.delimiter = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    return Err(StubqlError::Configuration(format!(
                        "{} must be a single character, got '{}'",
                        ENV_DELIMITER, delimiter
                    )));
                }
            };
        }
        if let Some(policy) = lookup(ENV_DATE_POLICY) {
            config.date_policy = Some(policy.parse()?);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StubqlError::Configuration(
                "driver name must not be empty".into(),
            ));
        }
        if !self.delimiter.is_ascii() || self.delimiter == '"' || self.delimiter == '\n' {
            return Err(StubqlError::Configuration(format!(
                "unsupported fixture delimiter {:?}",
                self.delimiter
            )));
        }
        Ok(())
    }

    /// The delimiter as the byte the CSV reader expects
    pub fn delimiter_byte(&self) -> u8 {
        // validate() restricts delimiters to ASCII
        u8::try_from(self.delimiter).unwrap_or(b',')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = DriverConfig::default();
        assert_eq!(config.name, "stubql");
        assert_eq!(config.delimiter_byte(), b',');
        assert_eq!(config.date_policy, None);
        config.validate().unwrap();
    }

    #[test]
    fn test_from_toml() {
        let config = DriverConfig::from_toml_str(
            r#"
            name = "testdb"
            delimiter = "|"
            date_policy = "rfc3339"
            "#,
        )
        .unwrap();
        assert_eq!(config.name, "testdb");
        assert_eq!(config.delimiter_byte(), b'|');
        assert_eq!(config.date_policy, Some(DatePolicy::Rfc3339));

        let partial = DriverConfig::from_toml_str("delimiter = ';'").unwrap();
        assert_eq!(partial.name, "stubql");
    }

    #[test]
    fn test_from_toml_rejects_bad_values() {
        assert!(DriverConfig::from_toml_str(r#"date_policy = "iso""#).is_err());
        assert!(DriverConfig::from_toml_str(r#"name = "  ""#).is_err());
        assert!(DriverConfig::from_toml_str(r#"delimiter = "é""#).is_err());
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ENV_DRIVER_NAME, "fake"),
            (ENV_DELIMITER, ";"),
            (ENV_DATE_POLICY, "pattern"),
        ]
        .into_iter()
        .collect();

        let config = DriverConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.name, "fake");
        assert_eq!(config.delimiter, ';');
        assert_eq!(config.date_policy, Some(DatePolicy::Pattern));

        let err = DriverConfig::from_lookup(|key| (key == ENV_DELIMITER).then(|| "||".to_string()))
            .unwrap_err();
        assert!(matches!(err, StubqlError::Configuration(_)));
    }
}
