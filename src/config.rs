use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub redis_url: String,
    pub namespace: String,
    pub connect_timeout_ms: u64,
}

impl Config {
    pub fn load() -> Self {
        Self {
            redis_url: try_load("REDIS_URL", "redis://127.0.0.1:6379"),
            namespace: try_load("LEADERBOARD_NAMESPACE", "leaderboard"),
            connect_timeout_ms: try_load("LEADERBOARD_CONNECT_TIMEOUT_MS", "100"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::load();

        assert_eq!(config.namespace, "leaderboard");
        assert_eq!(config.connect_timeout_ms, 100);
    }
}
