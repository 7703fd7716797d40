//! Loads the static plug-in configuration file into a validated [`PluginConfig`].
//!
//! This is the only place where the untrusted configuration file is parsed.
//! JSON is the default format; a `.yaml`/`.yml` extension selects YAML.
//! The deploy credential may be injected from the environment
//! (`APPIAN_API_KEY`) instead of living in the checked-in file.
//!
//! Loading is fail-fast: a missing or mistyped field is reported immediately
//! and no stage runs against a partially parsed configuration.

use std::fs;
use std::path::Path;

use tracing::{error, info};

use crate::config::PluginConfig;
use crate::error::ConfigError;

/// Environment variable overriding `Deploy.ApiKey`.
pub const API_KEY_ENV: &str = "APPIAN_API_KEY";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PluginConfig, ConfigError> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(ConfigError::Read {
                path: path_ref.to_path_buf(),
                source: e,
            });
        }
    };

    let mut config = match parse_config(path_ref, &config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config successfully");
            conf
        }
        Err(e) => {
            error!(error = %e, config_path = ?path_ref, "Failed to parse config");
            return Err(e);
        }
    };

    if let Ok(api_key) = std::env::var(API_KEY_ENV) {
        info!(env = API_KEY_ENV, "Deploy API key taken from environment");
        config.deploy.api_key = api_key;
    }

    if let Err(e) = config.validate() {
        error!(error = %e, config_path = ?path_ref, "Config failed validation");
        return Err(e);
    }

    config.trace_loaded();
    Ok(config)
}

fn parse_config(path: &Path, content: &str) -> Result<PluginConfig, ConfigError> {
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        Ok(serde_yaml::from_str(content)?)
    } else {
        Ok(serde_json::from_str(content)?)
    }
}
