//! CLI definitions for migrate
//!
//! This module contains all CLI argument parsing structures using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::report::OutputFormat;

#[derive(Parser)]
#[command(
    name = "migrate",
    version,
    about = "Migration directory safety linter",
    long_about = "Analyzes SQL migration files for destructive, data-dependent,\nbackward incompatible and locking schema changes before they run."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lint migration files for unsafe changes
    Lint {
        /// Migration directory (path or file:// URL)
        #[arg(long, env = "MIGRATE_DIR", default_value = "file://migrations")]
        dir: String,

        /// Dev database URL; its scheme selects the SQL dialect
        #[arg(long, env = "MIGRATE_DEV_URL")]
        dev_url: Option<String>,

        /// Only lint the latest N migration files
        #[arg(long)]
        latest: Option<usize>,

        /// Only lint migration files changed relative to this git ref
        #[arg(long, conflicts_with = "latest")]
        git_base: Option<String>,

        /// Config file (default: ./migrate.yaml when present)
        #[arg(long, env = "MIGRATE_CONFIG")]
        config: Option<PathBuf>,

        /// Report format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Write migrate.sum for a migration directory
    Hash {
        /// Migration directory (path or file:// URL)
        #[arg(long, env = "MIGRATE_DIR", default_value = "file://migrations")]
        dir: String,
    },

    /// Create a new migration file
    New {
        /// Migration directory (path or file:// URL)
        #[arg(long, env = "MIGRATE_DIR", default_value = "file://migrations")]
        dir: String,

        /// Migration name (e.g., add_users)
        #[arg(long, required = true)]
        name: String,

        /// Initial SQL statements
        #[arg(long)]
        sql: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_lint() {
        let cli = Cli::try_parse_from([
            "migrate",
            "lint",
            "--dev-url",
            "docker://postgres/15/dev",
            "--dir",
            "file://migrations",
            "--latest",
            "1",
        ])
        .unwrap();

        match cli.command {
            Commands::Lint {
                dir,
                dev_url,
                latest,
                git_base,
                format,
                ..
            } => {
                assert_eq!(dir, "file://migrations");
                assert_eq!(dev_url.as_deref(), Some("docker://postgres/15/dev"));
                assert_eq!(latest, Some(1));
                assert_eq!(git_base, None);
                assert_eq!(format, OutputFormat::Text);
            }
            _ => panic!("expected lint command"),
        }
    }

    #[test]
    fn test_latest_conflicts_with_git_base() {
        assert!(Cli::try_parse_from([
            "migrate",
            "lint",
            "--latest",
            "1",
            "--git-base",
            "main",
        ])
        .is_err());
    }
}
