use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_PATH: &str = "data/farm.json";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub dashboard_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: try_load("PORT", DEFAULT_PORT),
            data_path: env::var("APP_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    info!("APP_DATA_PATH not set, using default: {DEFAULT_DATA_PATH}");
                    PathBuf::from(DEFAULT_DATA_PATH)
                }),
            dashboard_ttl: Duration::from_secs(try_load(
                "DASHBOARD_CACHE_TTL_SECS",
                DEFAULT_CACHE_TTL_SECS,
            )),
        }
    }
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}

fn parse_or<T>(key: &str, raw: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    raw.trim().parse().unwrap_or_else(|err| {
        warn!("invalid {key} value '{raw}': {err}, using default: {default}");
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_accepts_valid_values() {
        assert_eq!(parse_or("PORT", " 9000 ", DEFAULT_PORT), 9000);
        assert_eq!(parse_or("DASHBOARD_CACHE_TTL_SECS", "0", 60u64), 0);
    }

    #[test]
    fn parse_or_falls_back_on_garbage() {
        assert_eq!(parse_or("PORT", "eighty", DEFAULT_PORT), DEFAULT_PORT);
        assert_eq!(parse_or("PORT", "70000", DEFAULT_PORT), DEFAULT_PORT);
    }
}
