use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::location::DEFAULT_GEOLOCATION_TIMEOUT;

const DEFAULT_ADDRESS_FIELD: &str = "address";

#[derive(Debug, Clone, PartialEq)]
pub struct EnvVariables {
    /// JSON file overriding the built-in verification rules.
    pub rules_path: Option<PathBuf>,
    /// Name the backend expects for the optional address field.
    pub address_field_name: String,
    pub geolocation_timeout: Duration,
}

impl EnvVariables {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn get_all() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rules_path = lookup("PROVENANCE_RULES_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        let address_field_name = lookup("ADDRESS_FIELD_NAME")
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_ADDRESS_FIELD.to_string());

        let geolocation_timeout = match lookup("GEOLOCATION_TIMEOUT_SECS") {
            Some(value) => {
                let secs = value.trim().parse::<u64>().unwrap_or(0);
                if secs == 0 {
                    return Err(ConfigError::InvalidVariable {
                        name: "GEOLOCATION_TIMEOUT_SECS",
                        value,
                    });
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_GEOLOCATION_TIMEOUT,
        };

        Ok(Self {
            rules_path,
            address_field_name,
            geolocation_timeout,
        })
    }
}
