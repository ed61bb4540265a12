use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Settings read from the environment at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub api_token: Option<String>,
    /// SOCKS5 proxy for the Bot API connection.
    pub proxy: Option<String>,
    /// Session directory; sessions live in memory when unset.
    pub store_dir: Option<PathBuf>,
    pub lock_ttl: Duration,
    pub allow_self_play: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_token: None,
            proxy: None,
            store_dir: None,
            lock_ttl: Duration::from_secs(10),
            allow_self_play: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let lock_ttl = match lookup("LOCK_TTL_SECS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::Invalid { name: "LOCK_TTL_SECS", value }),
            },
            None => defaults.lock_ttl,
        };
        let allow_self_play = match lookup("ALLOW_SELF_PLAY") {
            Some(value) => match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(ConfigError::Invalid { name: "ALLOW_SELF_PLAY", value }),
            },
            None => defaults.allow_self_play,
        };

        Ok(Self {
            api_token: lookup("API_TOKEN"),
            proxy: lookup("PROXY"),
            store_dir: lookup("STORE_DIR").map(PathBuf::from),
            lock_ttl,
            allow_self_play,
        })
    }

    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.api_token.as_deref().ok_or(ConfigError::Missing("API_TOKEN"))
    }
}
