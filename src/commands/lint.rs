//! Lint a migration directory
//!
//! Prints nothing and exits 0 when every selected migration is safe.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

use crate::config::{load_config, LintConfig};
use crate::domain::Dialect;
use crate::error::{ConfigError, LintError};
use crate::infrastructure::resolve_dir;
use crate::report::{render, OutputFormat};
use crate::services::{LintRequest, LintService};

/// Execute the lint command, returning the process exit code
pub async fn execute(
    dir: String,
    dev_url: Option<String>,
    latest: Option<usize>,
    git_base: Option<String>,
    config: Option<PathBuf>,
    format: OutputFormat,
) -> Result<i32> {
    let config = load_config(config.as_deref()).map_err(LintError::from)?;
    let dialect = resolve_dialect(dev_url.as_deref(), &config).map_err(LintError::from)?;
    debug!("Using {} dialect", dialect.name());

    let request = LintRequest {
        dir: resolve_dir(&dir),
        dialect,
        latest,
        git_base,
    };

    let report = LintService::new(config)
        .run(&request)
        .await
        .with_context(|| format!("Failed to lint {}", request.dir.display()))?;

    let output = render(&report, format).context("Failed to render lint report")?;
    print!("{}", output);
    if format == OutputFormat::Json {
        println!();
    }

    Ok(report.exit_code)
}

/// `--dev-url` scheme wins over the config file, which wins over PostgreSQL
pub fn resolve_dialect(dev_url: Option<&str>, config: &LintConfig) -> Result<Dialect, ConfigError> {
    match dev_url {
        Some(url) => Dialect::from_dev_url(url).ok_or_else(|| ConfigError::InvalidValue {
            field: "dev-url".to_string(),
            value: url.to_string(),
        }),
        None => Ok(config.dialect.unwrap_or_default()),
    }
}
