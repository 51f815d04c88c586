//! Migration domain types
//!
//! Defines migration files, their versions and the SQL dialect they are written in.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::OnceLock;

use super::statement::Statement;
use crate::error::DirectoryError;

/// SQL dialects supported by the statement parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// PostgreSQL
    #[default]
    #[serde(alias = "postgresql")]
    Postgres,
    /// MySQL / MariaDB
    #[serde(alias = "mariadb")]
    MySql,
    /// SQLite
    Sqlite,
    /// ANSI-ish generic SQL
    Generic,
}

impl Dialect {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            "mysql" | "maria" | "mariadb" => Some(Self::MySql),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            "generic" | "ansi" => Some(Self::Generic),
            _ => None,
        }
    }

    /// Derive the dialect from a dev database URL
    ///
    /// `postgres://...`, `mysql://...`, `sqlite://...` and the docker form
    /// `docker://postgres/15/dev` are recognised.
    pub fn from_dev_url(url: &str) -> Option<Self> {
        let (scheme, rest) = url.split_once("://")?;
        if scheme.eq_ignore_ascii_case("docker") {
            let driver = rest.split('/').next()?;
            return Self::from_str(driver);
        }
        Self::from_str(scheme)
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Postgres => "PostgreSQL",
            Self::MySql => "MySQL",
            Self::Sqlite => "SQLite",
            Self::Generic => "Generic SQL",
        }
    }
}

fn file_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)(?:_(.*))?\.sql$").expect("valid migration name regex"))
}

/// Compare two numeric version strings without parsing them into integers
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// A single migration file as committed to the migration directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// File name, e.g. `20240101120000_add_users.sql`
    pub name: String,
    /// Leading numeric version, e.g. `20240101120000`
    pub version: String,
    /// Human part of the name, e.g. `add_users`
    pub description: String,
    /// Raw SQL contents
    pub content: String,
}

impl MigrationFile {
    /// Create a migration file from its name and contents
    ///
    /// Fails when the name does not carry a leading numeric version.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Result<Self, DirectoryError> {
        let name = name.into();
        let (version, description) =
            Self::parse_name(&name).ok_or_else(|| DirectoryError::InvalidFileName {
                name: name.clone(),
            })?;

        Ok(Self {
            name,
            version,
            description,
            content: content.into(),
        })
    }

    /// Split `<version>_<description>.sql` into its parts
    pub fn parse_name(name: &str) -> Option<(String, String)> {
        let captures = file_name_regex().captures(name)?;
        let version = captures.get(1)?.as_str().to_string();
        let description = captures
            .get(2)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        Some((version, description))
    }

    /// Whether this file's version sorts before `threshold`
    ///
    /// The threshold is compared against the same number of leading digits,
    /// so `20240101` works as a date prefix for `20240101120000` versions.
    pub fn is_before(&self, threshold: &str) -> bool {
        let prefix: String = self.version.chars().take(threshold.len()).collect();
        compare_versions(&prefix, threshold) == Ordering::Less
    }
}

impl PartialOrd for MigrationFile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MigrationFile {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_versions(&self.version, &other.version).then_with(|| self.name.cmp(&other.name))
    }
}

/// A migration file together with its parsed statements, in file order
#[derive(Debug, Clone)]
pub struct ParsedMigration<'a> {
    pub file: &'a MigrationFile,
    pub statements: Vec<Statement>,
}
