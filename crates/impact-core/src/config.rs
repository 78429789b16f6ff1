use thiserror::Error;

use crate::app_config::AppConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    MissingEnvVar(String),

    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a configured value fails to parse.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a configured value fails to parse.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let geocode_base_url = or_default(
        "IMPACT_GEOCODE_BASE_URL",
        "https://maps.googleapis.com/maps/api/geocode/json",
    );
    let geocode_api_key = lookup("IMPACT_GEOCODE_API_KEY").ok();
    let backend_base_url = or_default("IMPACT_BACKEND_BASE_URL", "http://localhost:8080");

    let request_timeout_secs = parse_u64("IMPACT_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("IMPACT_USER_AGENT", "impact/0.1 (network-impact-dashboard)");

    let poll_initial_wait_ms = parse_u64("IMPACT_POLL_INITIAL_WAIT_MS", "3000")?;
    let poll_max_attempts = parse_u32("IMPACT_POLL_MAX_ATTEMPTS", "10")?;
    let poll_transport_retries = parse_u32("IMPACT_POLL_TRANSPORT_RETRIES", "3")?;
    let poll_transport_backoff_ms = parse_u64("IMPACT_POLL_TRANSPORT_BACKOFF_MS", "1000")?;

    let log_level = or_default("IMPACT_LOG_LEVEL", "info");

    Ok(AppConfig {
        geocode_base_url,
        geocode_api_key,
        backend_base_url,
        request_timeout_secs,
        user_agent,
        poll_initial_wait_ms,
        poll_max_attempts,
        poll_transport_retries,
        poll_transport_backoff_ms,
        log_level,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn build_app_config_succeeds_with_empty_env() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(
            cfg.geocode_base_url,
            "https://maps.googleapis.com/maps/api/geocode/json"
        );
        assert!(cfg.geocode_api_key.is_none());
        assert_eq!(cfg.backend_base_url, "http://localhost:8080");
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.user_agent, "impact/0.1 (network-impact-dashboard)");
        assert_eq!(cfg.poll_initial_wait_ms, 3000);
        assert_eq!(cfg.poll_max_attempts, 10);
        assert_eq!(cfg.poll_transport_retries, 3);
        assert_eq!(cfg.poll_transport_backoff_ms, 1000);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn build_app_config_reads_overrides() {
        let mut map = HashMap::new();
        map.insert("IMPACT_BACKEND_BASE_URL", "https://impact.example.net");
        map.insert("IMPACT_GEOCODE_API_KEY", "k-123");
        map.insert("IMPACT_POLL_INITIAL_WAIT_MS", "500");
        map.insert("IMPACT_POLL_MAX_ATTEMPTS", "4");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.backend_base_url, "https://impact.example.net");
        assert_eq!(cfg.geocode_api_key.as_deref(), Some("k-123"));
        assert_eq!(cfg.poll_initial_wait_ms, 500);
        assert_eq!(cfg.poll_max_attempts, 4);
    }

    #[test]
    fn build_app_config_rejects_invalid_poll_wait() {
        let mut map = HashMap::new();
        map.insert("IMPACT_POLL_INITIAL_WAIT_MS", "soon");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "IMPACT_POLL_INITIAL_WAIT_MS"),
            "expected InvalidEnvVar(IMPACT_POLL_INITIAL_WAIT_MS), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_rejects_invalid_max_attempts() {
        let mut map = HashMap::new();
        map.insert("IMPACT_POLL_MAX_ATTEMPTS", "-1");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "IMPACT_POLL_MAX_ATTEMPTS"),
            "expected InvalidEnvVar(IMPACT_POLL_MAX_ATTEMPTS), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_rejects_invalid_timeout() {
        let mut map = HashMap::new();
        map.insert("IMPACT_REQUEST_TIMEOUT_SECS", "half a minute");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "IMPACT_REQUEST_TIMEOUT_SECS"),
            "expected InvalidEnvVar(IMPACT_REQUEST_TIMEOUT_SECS), got: {result:?}"
        );
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let mut map = HashMap::new();
        map.insert("IMPACT_GEOCODE_API_KEY", "super-secret");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("super-secret"), "{printed}");
        assert!(printed.contains("[redacted]"), "{printed}");
    }
}
