//! Create a new, empty migration file
//!
//! Usage:
//!   migrate new --dir migrations --name add_users
//!   migrate new --dir migrations --name add_users --sql "CREATE TABLE users (id bigint);"
//!
//! The file is named `<UTC yyyymmddHHMMSS>_<name>.sql` and `migrate.sum` is
//! rewritten to include it.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::DirectoryError;
use crate::infrastructure::{
    read_sum_file, resolve_dir, verify_sum, write_sum_file, MigrationDirectory, SumFile,
};
use crate::ui;

/// Execute the new-migration command
pub async fn execute(dir: String, name: String, sql: Option<String>) -> Result<()> {
    let dir = resolve_dir(&dir);
    let path = create_migration(&dir, &name, sql.as_deref(), Utc::now()).await?;

    ui::print_success(&format!("Created {}", path.display()));
    ui::print_info("Updated migrate.sum");
    Ok(())
}

/// Lowercase, with every run of non-alphanumeric characters collapsed to `_`
pub fn sanitize_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            sanitized.push(c.to_ascii_lowercase());
        } else if !sanitized.ends_with('_') {
            sanitized.push('_');
        }
    }
    sanitized.trim_matches('_').to_string()
}

pub fn migration_file_name(now: DateTime<Utc>, name: &str) -> String {
    format!("{}_{}.sql", now.format("%Y%m%d%H%M%S"), sanitize_name(name))
}

/// Write the migration file and rehash the directory
pub async fn create_migration(
    dir: &Path,
    name: &str,
    sql: Option<&str>,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    if sanitize_name(name).is_empty() {
        anyhow::bail!("Migration name must contain at least one letter or digit: {:?}", name);
    }

    // Fails early on a missing directory or invalid existing files
    let existing = MigrationDirectory::load(dir).await?;

    // Never rehash over files edited since the last hash
    if let Some(recorded) = read_sum_file(dir).await? {
        verify_sum(&recorded, &existing.files)?;
    }

    let file_name = migration_file_name(now, name);
    let path = dir.join(&file_name);
    if path.exists() {
        return Err(DirectoryError::AlreadyExists { name: file_name }.into());
    }

    let mut body = sql.map(str::trim).unwrap_or_default().to_string();
    if !body.is_empty() {
        body.push('\n');
    }
    fs::write(&path, body)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    let directory = MigrationDirectory::load(dir).await?;
    write_sum_file(dir, &SumFile::compute(&directory.files)).await?;

    Ok(path)
}
