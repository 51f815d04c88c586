//! Migration directory access
//!
//! Reads `*.sql` migration files from disk in version order.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::domain::MigrationFile;
use crate::error::DirectoryError;

/// Accept both plain paths and `file://` URLs for `--dir`
pub fn resolve_dir(dir: &str) -> PathBuf {
    PathBuf::from(dir.strip_prefix("file://").unwrap_or(dir))
}

/// Find all SQL files in a directory (non-recursive), sorted by name
pub async fn find_sql_files(dir: &Path) -> Result<Vec<PathBuf>, DirectoryError> {
    let mut sql_files = Vec::new();

    let mut entries = fs::read_dir(dir).await.map_err(|source| DirectoryError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|source| DirectoryError::Io {
            path: dir.to_path_buf(),
            source,
        })?
    {
        let path = entry.path();

        if path.is_file() {
            if let Some(ext) = path.extension() {
                if ext == "sql" {
                    sql_files.push(path);
                }
            }
        }
    }

    sql_files.sort();

    Ok(sql_files)
}

/// A loaded migration directory
#[derive(Debug, Clone)]
pub struct MigrationDirectory {
    pub path: PathBuf,
    /// Files in version order
    pub files: Vec<MigrationFile>,
}

impl MigrationDirectory {
    /// Load every migration file of `dir`
    ///
    /// Fails on files without a numeric version and on duplicate versions.
    pub async fn load(dir: &Path) -> Result<Self, DirectoryError> {
        if !dir.is_dir() {
            return Err(DirectoryError::NotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut files = Vec::new();
        for path in find_sql_files(dir).await? {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let content = fs::read_to_string(&path)
                .await
                .map_err(|source| DirectoryError::Io {
                    path: path.clone(),
                    source,
                })?;
            files.push(MigrationFile::new(name, content)?);
        }

        files.sort();

        for pair in files.windows(2) {
            if pair[0].version == pair[1].version {
                return Err(DirectoryError::DuplicateVersion {
                    version: pair[0].version.clone(),
                    first: pair[0].name.clone(),
                    second: pair[1].name.clone(),
                });
            }
        }

        debug!(
            "Loaded {} migration files from {}",
            files.len(),
            dir.display()
        );

        Ok(Self {
            path: dir.to_path_buf(),
            files,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_dir() {
        assert_eq!(resolve_dir("file://migrations"), PathBuf::from("migrations"));
        assert_eq!(resolve_dir("db/migrations"), PathBuf::from("db/migrations"));
    }

    #[tokio::test]
    async fn test_load_orders_by_version_and_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("10_third.sql"), "SELECT 3;").unwrap();
        std::fs::write(dir.path().join("2_second.sql"), "SELECT 2;").unwrap();
        std::fs::write(dir.path().join("1_first.sql"), "SELECT 1;").unwrap();
        std::fs::write(dir.path().join("README.md"), "docs").unwrap();
        std::fs::write(dir.path().join("migrate.sum"), "h1:abc").unwrap();

        let directory = MigrationDirectory::load(dir.path()).await.unwrap();
        let names: Vec<_> = directory.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["1_first.sql", "2_second.sql", "10_third.sql"]);
        assert_eq!(directory.files[1].content, "SELECT 2;");
        assert_eq!(directory.files[2].version, "10");
    }

    #[tokio::test]
    async fn test_load_rejects_duplicate_versions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1_a.sql"), "").unwrap();
        std::fs::write(dir.path().join("1_b.sql"), "").unwrap();

        let err = MigrationDirectory::load(dir.path()).await.unwrap_err();
        assert!(matches!(err, DirectoryError::DuplicateVersion { .. }));
    }

    #[tokio::test]
    async fn test_load_rejects_unversioned_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("schema.sql"), "").unwrap();

        let err = MigrationDirectory::load(dir.path()).await.unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidFileName { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_file_name_is_named_in_error() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let name = OsStr::from_bytes(b"users_\xff.sql");
        if std::fs::write(dir.path().join(name), "").is_err() {
            // some filesystems reject non-UTF-8 names
            return;
        }

        let err = MigrationDirectory::load(dir.path()).await.unwrap_err();
        match err {
            DirectoryError::InvalidFileName { name } => {
                assert_eq!(name, "users_\u{FFFD}.sql");
            }
            other => panic!("Expected InvalidFileName, got {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_directory() {
        let err = tokio_test::block_on(MigrationDirectory::load(Path::new(
            "/nonexistent/migrations",
        )))
        .unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound { .. }));
    }
}
