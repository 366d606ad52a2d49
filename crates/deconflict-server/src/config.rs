//! Server configuration from environment.

use deconflict_core::DeconflictionRules;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub rules: DeconflictionRules,
    /// Logistic classifier weights; the pre-screen is off when unset
    pub model_path: Option<PathBuf>,
    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            rules: DeconflictionRules::default(),
            model_path: None,
            log_json: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = DeconflictionRules::default();
        Self {
            server_port: env_or("DECONFLICT_PORT", 3000),
            rules: DeconflictionRules {
                safety_buffer_m: env_or("DECONFLICT_SAFETY_BUFFER_M", defaults.safety_buffer_m),
                time_resolution_s: env_or(
                    "DECONFLICT_TIME_RESOLUTION_S",
                    defaults.time_resolution_s,
                ),
                dedup_threshold_s: env_or("DECONFLICT_DEDUP_THRESHOLD_S", defaults.dedup_threshold_s),
                ml_threshold: env_or("DECONFLICT_ML_THRESHOLD", defaults.ml_threshold),
            },
            model_path: env::var("DECONFLICT_MODEL_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            log_json: env::var("DECONFLICT_LOG_FORMAT")
                .map(|s| s.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
