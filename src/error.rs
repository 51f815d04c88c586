//! Centralized error types for migrate-lint
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for lint runs
#[derive(Error, Debug)]
pub enum LintError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Migration directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("Git error: {0}")]
    Git(#[from] GitError),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse config {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// Migration directory errors
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Migration directory not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Migration file name must start with a numeric version: {name}")]
    InvalidFileName { name: String },

    #[error("Duplicate migration version {version}: {first} and {second}")]
    DuplicateVersion {
        version: String,
        first: String,
        second: String,
    },

    #[error("Migration file already exists: {name}")]
    AlreadyExists { name: String },
}

/// Sum file (migrate.sum) errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("Malformed sum file at line {line}")]
    Malformed { line: usize },

    #[error("Checksum mismatch for {file}: file was modified after it was hashed")]
    ChecksumMismatch { file: String },

    #[error("Migration file {file} is not recorded in the sum file")]
    MissingEntry { file: String },

    #[error("Sum file records {file}, which no longer exists")]
    UnknownEntry { file: String },

    #[error("Directory checksum mismatch")]
    TotalMismatch,

    #[error("Sum file is required but was not found")]
    SumFileMissing,
}

/// Git operation errors
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository")]
    NotARepository,

    #[error("Git command failed: {command}: {message}")]
    CommandFailed { command: String, message: String },
}
