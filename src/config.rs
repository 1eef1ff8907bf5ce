// Process configuration. Read once at startup from the environment, after an
// optional `.env` file has been loaded into it.

use std::time::Duration;

use crate::error::{Error, Result};

pub const URL_VAR: &str = "SUPABASE_URL";
pub const ANON_KEY_VAR: &str = "SUPABASE_ANON_KEY";
pub const AUTH_TIMEOUT_VAR: &str = "ZELLO_AUTH_TIMEOUT_SECS";

/// How long a sign-in may take before it is reported as failed.
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(12);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Project URL, without a trailing slash.
    pub url: String,
    /// Public (anon) API key sent with every request.
    pub anon_key: String,
    pub auth_timeout: Duration,
}

impl Config {
    /// Load `.env` (if present) and read the configuration from the process
    /// environment.
    pub fn load() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(err) if err.not_found() => {}
            Err(err) => return Err(Error::Config(format!("failed to read .env: {err}"))),
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any key lookup. `load` passes the environment;
    /// tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> Result<String> {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::Config(format!("{name} must be set")))
        };

        let url = required(URL_VAR)?.trim_end_matches('/').to_string();
        let anon_key = required(ANON_KEY_VAR)?;

        let auth_timeout = match lookup(AUTH_TIMEOUT_VAR) {
            None => DEFAULT_AUTH_TIMEOUT,
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    Error::Config(format!("{AUTH_TIMEOUT_VAR} must be a whole number of seconds, got {raw:?}"))
                })?;
                Duration::from_secs(secs)
            }
        };

        Ok(Config {
            url,
            anon_key,
            auth_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn reads_required_settings_and_defaults_timeout() {
        let config = Config::from_lookup(lookup(&[
            (URL_VAR, "https://demo.supabase.co/"),
            (ANON_KEY_VAR, "anon"),
        ]))
        .unwrap();

        assert_eq!(config.url, "https://demo.supabase.co");
        assert_eq!(config.anon_key, "anon");
        assert_eq!(config.auth_timeout, DEFAULT_AUTH_TIMEOUT);
    }

    #[test]
    fn missing_or_blank_settings_are_rejected() {
        let err = Config::from_lookup(lookup(&[(ANON_KEY_VAR, "anon")])).unwrap_err();
        assert!(err.to_string().contains(URL_VAR));

        let err = Config::from_lookup(lookup(&[(URL_VAR, "https://x"), (ANON_KEY_VAR, "  ")]))
            .unwrap_err();
        assert!(err.to_string().contains(ANON_KEY_VAR));
    }

    #[test]
    fn timeout_override_must_be_numeric() {
        let config = Config::from_lookup(lookup(&[
            (URL_VAR, "https://x"),
            (ANON_KEY_VAR, "anon"),
            (AUTH_TIMEOUT_VAR, "3"),
        ]))
        .unwrap();
        assert_eq!(config.auth_timeout, Duration::from_secs(3));

        let err = Config::from_lookup(lookup(&[
            (URL_VAR, "https://x"),
            (ANON_KEY_VAR, "anon"),
            (AUTH_TIMEOUT_VAR, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
