//! Configuration management for the intcode virtual machine
//!
//! This crate provides the engine tunables shared by every VM instance and topology,
//! including loading, saving and updating them as a TOML document.

/// Error types for the configuration module
pub mod error;

use std::{fs, path::Path, time::Duration};

use crate::error::Error;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The default number of words a single VM's memory may grow to (128 MiB of `i64`s).
pub const DEFAULT_MEMORY_LIMIT: usize = 1 << 24;

/// The default number of instructions a VM executes before yielding to the scheduler.
pub const DEFAULT_YIELD_INTERVAL: u64 = 1024;

/// The default value written by an Input instruction when a polling source has nothing ready.
pub const DEFAULT_IDLE_INPUT: i64 = -1;

/// The default delay, in milliseconds, a polling source sleeps after reporting nothing ready.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// The [`Configuration`] struct holds the tunables of the intcode engine. Every VM and topology
/// accepts one, and falls back to [`Configuration::default`] otherwise.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Configuration {
    /// The number of words a VM's memory may grow to. Addresses at or beyond this limit fault.
    pub memory_limit: usize,

    /// The number of steps after which a running VM yields to the async scheduler. `0` disables
    /// yielding, so the VM only suspends on input.
    pub yield_interval: u64,

    /// The value handed to a program when its polling input source has nothing ready.
    pub idle_input: i64,

    /// How long a polling input source sleeps after reporting nothing ready.
    pub poll_interval_ms: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            memory_limit: DEFAULT_MEMORY_LIMIT,
            yield_interval: DEFAULT_YIELD_INTERVAL,
            idle_input: DEFAULT_IDLE_INPUT,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Configuration {
    /// Parses a configuration from a TOML document. Missing keys take their default values.
    ///
    /// ```
    /// use intcode_config::Configuration;
    ///
    /// let config = Configuration::from_toml_str("idle_input = -2").expect("invalid config");
    /// assert_eq!(config.idle_input, -2);
    /// assert_eq!(config.poll_interval_ms, 10);
    /// ```
    pub fn from_toml_str(contents: &str) -> Result<Self, Error> {
        toml::from_str(contents)
            .map_err(|e| Error::ParseError(format!("failed to parse config: {e}")))
    }

    /// Serializes the configuration to a TOML document.
    pub fn to_toml(&self) -> Result<String, Error> {
        toml::to_string(self)
            .map_err(|e| Error::ParseError(format!("failed to serialize config: {e}")))
    }

    /// Loads the configuration stored at `path`. If the file doesn't exist, the default
    /// configuration is written there and returned.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();

        // if the config file doesn't exist, create it
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, writing defaults");
            let config = Configuration::default();
            config.save(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Saves the configuration to `path`, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Update a single key/value pair in the configuration. The value is parsed according to the
    /// type of the key.
    ///
    /// ```
    /// use intcode_config::Configuration;
    ///
    /// let mut config = Configuration::default();
    /// config.update("yield_interval", "0").expect("failed to update");
    /// assert_eq!(config.yield_interval, 0);
    /// assert!(config.update("rpc_url", "http://localhost").is_err());
    /// ```
    pub fn update(&mut self, key: &str, value: &str) -> Result<(), Error> {
        match key {
            "memory_limit" => self.memory_limit = parse_value(key, value)?,
            "yield_interval" => self.yield_interval = parse_value(key, value)?,
            "idle_input" => self.idle_input = parse_value(key, value)?,
            "poll_interval_ms" => self.poll_interval_ms = parse_value(key, value)?,
            _ => {
                return Err(Error::Generic(format!(
                    "invalid key: \'{key}\' is not a valid configuration key."
                )))
            }
        }

        debug!(key, value, "updated configuration");
        Ok(())
    }

    /// The poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, Error>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| {
        Error::ParseError(format!("invalid value \'{value}\' for key \'{key}\': {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::path::PathBuf;

    fn config_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push("intcode-config-tests");
        path.push(name);
        path
    }

    #[test]
    fn test_default_roundtrips_through_toml() {
        let config = Configuration::default();
        let contents = config.to_toml().expect("failed to serialize");
        assert!(contents.contains("memory_limit = 16777216"));
        assert_eq!(Configuration::from_toml_str(&contents).expect("failed to parse"), config);
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config = Configuration::from_toml_str("poll_interval_ms = 1\nmemory_limit = 64")
            .expect("failed to parse");
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
        assert_eq!(config.memory_limit, 64);
        assert_eq!(config.idle_input, DEFAULT_IDLE_INPUT);
        assert_eq!(config.yield_interval, DEFAULT_YIELD_INTERVAL);
    }

    #[test]
    fn test_invalid_document() {
        let err = Configuration::from_toml_str("idle_input = \"minus one\"").unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }

    #[test]
    fn test_update_rejects_bad_value() {
        let mut config = Configuration::default();
        let err = config.update("memory_limit", "-5").unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
        assert_eq!(config.memory_limit, DEFAULT_MEMORY_LIMIT);

        config.update("idle_input", " -7 ").expect("failed to update");
        assert_eq!(config.idle_input, -7);
    }

    #[test]
    #[serial]
    fn test_load_creates_missing_file() {
        let path = config_path("missing/config.toml");
        let _ = fs::remove_file(&path);

        let config = Configuration::load(&path).expect("failed to load");
        assert_eq!(config, Configuration::default());
        assert!(path.exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    #[serial]
    fn test_save_then_load() {
        let path = config_path("saved.toml");
        let mut config = Configuration::default();
        config.update("poll_interval_ms", "25").expect("failed to update");
        config.save(&path).expect("failed to save");

        let loaded = Configuration::load(&path).expect("failed to load");
        assert_eq!(loaded.poll_interval_ms, 25);

        let _ = fs::remove_file(&path);
    }
}
