/// Runtime configuration for the impact pipeline.
///
/// Loaded from `IMPACT_*` environment variables by
/// [`crate::config::load_app_config`].
#[derive(Clone)]
pub struct AppConfig {
    pub geocode_base_url: String,
    pub geocode_api_key: Option<String>,
    pub backend_base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub poll_initial_wait_ms: u64,
    pub poll_max_attempts: u32,
    pub poll_transport_retries: u32,
    pub poll_transport_backoff_ms: u64,
    pub log_level: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("geocode_base_url", &self.geocode_base_url)
            .field(
                "geocode_api_key",
                &self.geocode_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("backend_base_url", &self.backend_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("poll_initial_wait_ms", &self.poll_initial_wait_ms)
            .field("poll_max_attempts", &self.poll_max_attempts)
            .field("poll_transport_retries", &self.poll_transport_retries)
            .field("poll_transport_backoff_ms", &self.poll_transport_backoff_ms)
            .field("log_level", &self.log_level)
            .finish()
    }
}
