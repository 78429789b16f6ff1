pub mod app_config;
pub mod config;
pub mod location;
pub mod query_result;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use location::{AdminLabel, AdminLabels, Endpoint, LocationSpec, ResolvedLocation};
pub use query_result::{MetricStats, NetworkData, NetworkStats, QueryFailure, QueryResult};
