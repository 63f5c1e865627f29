//! Configuration loading and environment variable interpolation

use crate::error::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;

pub const CONFIG_FILENAME: &str = "idcdetect.toml";

/// Load configuration from idcdetect.toml
pub fn load_config() -> Result<Config> {
    let config_path = find_config_file()?;
    load_config_from_path(&config_path)
}

/// Load configuration, falling back to defaults when no file exists.
/// Parse errors in an existing file are still returned.
pub fn load_config_or_default() -> Result<(Config, Option<PathBuf>)> {
    match find_config_file() {
        Ok(path) => {
            let config = load_config_from_path(&path)?;
            Ok((config, Some(path)))
        }
        Err(Error::ConfigNotFound) => {
            tracing::warn!(
                "No {} found, using built-in defaults",
                CONFIG_FILENAME
            );
            Ok((Config::default(), None))
        }
        Err(e) => Err(e),
    }
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|_| Error::ConfigNotFound)?;
    let content = interpolate_env_vars(&content);
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Find the configuration file, searching upward from current directory
pub fn find_config_file() -> Result<PathBuf> {
    let mut current = env::current_dir().map_err(|e| Error::Config(e.to_string()))?;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(Error::ConfigNotFound);
        }
    }
}

/// Interpolate environment variables in the format ${VAR_NAME} or ${VAR_NAME:-default}
fn interpolate_env_vars(content: &str) -> String {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("Invalid regex pattern - this is a bug in the codebase");

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        env::var(var_name).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

/// Generate a default configuration file content
pub fn default_config_content() -> &'static str {
    r#"# IDC Detect Portal configuration

[server]
host = "127.0.0.1"
port = 8000
environment = "${APP_ENV:-development}"  # or "production"

[auth]
# Leave empty to read SECRET_KEY from the environment at startup.
# Production deployments should always set a secret of 32+ characters.
secret_key = "${SECRET_KEY:-}"
token_ttl_minutes = 60
bcrypt_cost = 12

[database]
url = "${DATABASE_URL:-sqlite://idcdetect.db}"
max_connections = 5

[storage]
upload_dir = "static/uploads"
max_upload_bytes = 20971520

[model]
# ONNX export of the ResNet50 IDC classifier. When the file is missing the
# classifier runs in demo mode and returns random predictions.
path = "breast_idc_resnet50.onnx"
input_size = 224
"#
}
