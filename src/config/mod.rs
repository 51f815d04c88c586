//! Configuration loading for migrate-lint
//!
//! Configuration lives in an optional `migrate.yaml`. Every field has a
//! default, so running without a config file lints with the built-in rules.

pub mod lint;

pub use lint::LintConfig;

use std::path::Path;
use tracing::debug;

use crate::error::ConfigError;

/// Config file picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "migrate.yaml";

/// Parse a config document
pub fn parse_config(content: &str, path: &Path) -> Result<LintConfig, ConfigError> {
    let config: LintConfig =
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    for pattern in &config.excluded_files {
        if glob::Pattern::new(pattern).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "excluded_files".to_string(),
                value: pattern.clone(),
            });
        }
    }

    if let Some(ref threshold) = config.check_after {
        if threshold.is_empty() || !threshold.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::InvalidValue {
                field: "check_after".to_string(),
                value: threshold.clone(),
            });
        }
    }

    Ok(config)
}

/// Load the lint configuration.
///
/// An explicit path must exist. Without one, `migrate.yaml` in the current
/// directory is used when present, otherwise the defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<LintConfig, ConfigError> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                });
            }
            path.to_path_buf()
        }
        None => {
            let candidate = Path::new(DEFAULT_CONFIG_FILE);
            if !candidate.exists() {
                debug!("No {} found, using default lint configuration", DEFAULT_CONFIG_FILE);
                return Ok(LintConfig::default());
            }
            candidate.to_path_buf()
        }
    };

    debug!("Loading lint configuration from {}", path.display());
    let content = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.display().to_string(),
    })?;
    parse_config(&content, &path)
}
