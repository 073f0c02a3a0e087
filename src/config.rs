use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::Level;

use crate::error::{Error, Result};

pub const DEFAULT_DB_FILE: &str = "data.json";
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Settings of the daemon, read once from the environment at startup.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Config {
    pub db_file: PathBuf,
    pub sweep_interval: Duration,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_file: PathBuf::from(DEFAULT_DB_FILE),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            debug: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    // Builds the config from any key-value source. Unset keys fall back to the
    // defaults, set but invalid ones are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_file = match lookup("GIVEAWAY_DB_FILE") {
            Some(value) if value.trim().is_empty() => {
                return Err(Error::Configuration(
                    "GIVEAWAY_DB_FILE can't be empty".to_string(),
                ));
            }
            Some(value) => PathBuf::from(value),
            None => PathBuf::from(DEFAULT_DB_FILE),
        };

        let sweep_interval_secs = match lookup("SWEEP_INTERVAL_SECS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(seconds) if seconds >= 1 => seconds,
                _ => {
                    let message = format!(
                        "SWEEP_INTERVAL_SECS must be a whole number of seconds, at least 1 (got `{}`)",
                        value
                    );
                    return Err(Error::Configuration(message));
                }
            },
            None => DEFAULT_SWEEP_INTERVAL_SECS,
        };

        let debug = match lookup("DEBUG").as_deref() {
            Some("true") => true,
            Some("false") | Some("") | None => false,
            Some(other) => {
                let message = format!("DEBUG must be `true` or `false` (got `{}`)", other);
                return Err(Error::Configuration(message));
            }
        };

        Ok(Config {
            db_file,
            sweep_interval: Duration::from_secs(sweep_interval_secs),
            debug,
        })
    }

    pub fn log_level(&self) -> Level {
        match self.debug {
            true => Level::DEBUG,
            false => Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use tracing::Level;

    use crate::config::Config;
    use crate::error::Error;

    fn get_config(pairs: &[(&str, &str)]) -> Result<Config, Error> {
        let vars = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<String, String>>();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = get_config(&[]).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.db_file, PathBuf::from("data.json"));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.log_level(), Level::INFO);
    }

    #[test]
    fn test_read_every_variable() {
        let config = get_config(&[
            ("GIVEAWAY_DB_FILE", "/var/lib/giveaways.json"),
            ("SWEEP_INTERVAL_SECS", "5"),
            ("DEBUG", "true"),
        ])
        .unwrap();

        assert_eq!(config.db_file, PathBuf::from("/var/lib/giveaways.json"));
        assert_eq!(config.sweep_interval, Duration::from_secs(5));
        assert_eq!(config.debug, true);
        assert_eq!(config.log_level(), Level::DEBUG);
    }

    #[test]
    fn test_get_error_for_invalid_interval() {
        for value in ["0", "-5", "soon", ""] {
            let result = get_config(&[("SWEEP_INTERVAL_SECS", value)]);
            assert_eq!(matches!(result, Err(Error::Configuration(_))), true);
        }
    }

    #[test]
    fn test_get_error_for_invalid_debug_flag() {
        let result = get_config(&[("DEBUG", "yes")]);
        assert_eq!(matches!(result, Err(Error::Configuration(_))), true);
    }

    #[test]
    fn test_get_error_for_empty_db_file() {
        let result = get_config(&[("GIVEAWAY_DB_FILE", " ")]);
        assert_eq!(matches!(result, Err(Error::Configuration(_))), true);
    }
}
