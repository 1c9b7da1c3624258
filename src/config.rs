//! Service configuration read from the environment

use chrono_tz::Tz;
use std::time::Duration;
use crate::{Result, RevenueError};

const DEFAULT_PORT: u16 = 8083;
const DEFAULT_ORDERS_API_URL: &str = "http://localhost:8000/api/";
const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Manila;
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Base URL of the storefront REST API, always ending in `/`.
    pub orders_api_url: String,
    pub timezone: Tz,
    pub backend_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            orders_api_url: DEFAULT_ORDERS_API_URL.to_string(),
            timezone: DEFAULT_TIMEZONE,
            backend_timeout: Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Unset keys fall back to defaults;
    /// set but unparsable keys are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let port = match lookup("PORT") {
            Some(p) => p.trim().parse().map_err(|_| RevenueError::InvalidConfig(format!("PORT={p}")))?,
            None => defaults.port,
        };
        let orders_api_url = lookup("ORDERS_API_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .map(with_trailing_slash)
            .unwrap_or(defaults.orders_api_url);
        let timezone = match lookup("REPORT_TIMEZONE") {
            Some(name) => name.trim().parse::<Tz>().map_err(|_| RevenueError::InvalidTimezone(name.clone()))?,
            None => defaults.timezone,
        };
        let backend_timeout = match lookup("BACKEND_TIMEOUT_SECS") {
            Some(s) => Duration::from_secs(
                s.trim().parse().map_err(|_| RevenueError::InvalidConfig(format!("BACKEND_TIMEOUT_SECS={s}")))?,
            ),
            None => defaults.backend_timeout,
        };
        Ok(Self { port, orders_api_url, timezone, backend_timeout })
    }

    pub fn orders_endpoint(&self) -> String { format!("{}orders/", self.orders_api_url) }
}

fn with_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') { url.push('/'); }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8083);
        assert_eq!(config.orders_endpoint(), "http://localhost:8000/api/orders/");
        assert_eq!(config.timezone, chrono_tz::Asia::Manila);
        assert_eq!(config.backend_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "9090"),
            ("ORDERS_API_URL", "https://shop.example.com/api"),
            ("REPORT_TIMEZONE", "UTC"),
            ("BACKEND_TIMEOUT_SECS", "3"),
        ])).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.orders_endpoint(), "https://shop.example.com/api/orders/");
        assert_eq!(config.timezone, chrono_tz::UTC);
        assert_eq!(config.backend_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(Config::from_lookup(lookup(&[("PORT", "eighty")])), Err(RevenueError::InvalidConfig(_))));
        assert!(matches!(Config::from_lookup(lookup(&[("REPORT_TIMEZONE", "Mars/Olympus")])), Err(RevenueError::InvalidTimezone(_))));
    }
}
