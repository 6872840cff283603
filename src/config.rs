use std::env;
use std::time::Duration;

use uuid::Uuid;

use crate::blockchain::DEFAULT_REWARD;
use crate::error::ConfigError;

/// Node settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Recipient of mining rewards.
    pub node_id: String,
    pub mining_workers: usize,
    pub mining_reward: u64,
    /// Abandon a `/mine/` request after this long; `None` searches forever.
    pub mine_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source (lets tests avoid touching the process env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let node_id = lookup("NODE_ID")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_var(&lookup, "PORT")?.unwrap_or(5000),
            node_id,
            mining_workers: parse_var(&lookup, "MINING_WORKERS")?.unwrap_or(1),
            mining_reward: parse_var(&lookup, "MINING_REWARD")?.unwrap_or(DEFAULT_REWARD),
            mine_timeout: parse_var::<u64, _>(&lookup, "MINE_TIMEOUT_SECS")?
                .map(Duration::from_secs),
        })
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar { name, value }),
    }
}
