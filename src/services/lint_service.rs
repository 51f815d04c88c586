//! Lint service - lints a migration directory
//!
//! Loads the directory, checks `migrate.sum`, replays every migration into
//! the schema catalog and analyzes the selected files.

use glob::Pattern;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::analysis::{analyze_migration, Catalog};
use crate::config::LintConfig;
use crate::domain::{Dialect, MigrationFile};
use crate::error::{IntegrityError, LintError};
use crate::infrastructure::{
    read_sum_file, verify_sum, GitClient, MigrationDirectory, SUM_FILE_NAME,
};
use crate::parser::parse_migration;
use crate::report::{FileReport, Report};

/// What to lint
#[derive(Debug, Clone)]
pub struct LintRequest {
    pub dir: PathBuf,
    pub dialect: Dialect,
    /// Only lint the last N files
    pub latest: Option<usize>,
    /// Only lint files changed relative to this git ref
    pub git_base: Option<String>,
}

/// Service for linting migration directories
pub struct LintService {
    config: LintConfig,
}

impl LintService {
    pub fn new(config: LintConfig) -> Self {
        Self { config }
    }

    /// Lint a migration directory
    pub async fn run(&self, request: &LintRequest) -> Result<Report, LintError> {
        let directory = MigrationDirectory::load(&request.dir).await?;
        if directory.is_empty() {
            debug!("No migration files in {}", request.dir.display());
        }

        if let Some(error) = self.check_integrity(&directory).await? {
            warn!("Integrity check failed for {}: {}", request.dir.display(), error);
            return Ok(Report::integrity_failure(error.to_string()));
        }

        let changed = match request.git_base {
            Some(ref base) => Some(GitClient::in_dir(&request.dir).changed_files(base).await?),
            None => None,
        };

        let selected = select_files(
            &directory.files,
            request.latest,
            changed.as_deref(),
            &self.config,
        );
        info!(
            "Linting {} of {} migration files ({})",
            selected.len(),
            directory.files.len(),
            request.dialect.name()
        );

        Ok(self.lint(&directory, &selected, request.dialect))
    }

    /// Compare `migrate.sum` with the directory contents
    ///
    /// Returns the integrity problem, if any. A missing sum file is only a
    /// problem when the config requires one.
    async fn check_integrity(
        &self,
        directory: &MigrationDirectory,
    ) -> Result<Option<IntegrityError>, LintError> {
        let Some(content) = read_sum_file(&directory.path).await? else {
            if self.config.require_sum {
                return Ok(Some(IntegrityError::SumFileMissing));
            }
            warn!(
                "No {} in {}, skipping integrity check (run `migrate hash` to create it)",
                SUM_FILE_NAME,
                directory.path.display()
            );
            return Ok(None);
        };

        Ok(verify_sum(&content, &directory.files).err())
    }

    /// Replay all migrations in order and analyze the selected ones
    ///
    /// Each selected file is analyzed against the catalog built from every
    /// migration before it, selected or not.
    pub fn lint(
        &self,
        directory: &MigrationDirectory,
        selected: &HashSet<String>,
        dialect: Dialect,
    ) -> Report {
        let mut catalog = Catalog::new();
        let mut files = Vec::new();

        for file in &directory.files {
            let parsed = parse_migration(file, dialect);

            if selected.contains(&file.name) {
                let findings = analyze_migration(&parsed, &catalog, dialect, &self.config);
                debug!("{}: {} findings", file.name, findings.len());
                files.push(FileReport {
                    name: file.name.clone(),
                    findings,
                });
            }

            catalog.replay(&parsed);
        }

        Report::new(files, None)
    }
}

/// Check if a file is excluded by `check_after` or `excluded_files`
fn should_exclude_file(file: &MigrationFile, config: &LintConfig) -> bool {
    if let Some(ref threshold) = config.check_after {
        if file.is_before(threshold) {
            return true;
        }
    }

    config.excluded_files.iter().any(|pattern| {
        Pattern::new(pattern)
            .map(|p| p.matches(&file.name))
            .unwrap_or(false)
            || file.name == *pattern
    })
}

/// Names of the files to lint
///
/// `latest` keeps the last N files of the directory, `changed` keeps files
/// present in the list; config exclusions apply on top of both.
pub fn select_files(
    files: &[MigrationFile],
    latest: Option<usize>,
    changed: Option<&[String]>,
    config: &LintConfig,
) -> HashSet<String> {
    let skip = latest.map_or(0, |n| files.len().saturating_sub(n));

    files
        .iter()
        .skip(skip)
        .filter(|f| changed.map_or(true, |names| names.contains(&f.name)))
        .filter(|f| {
            let excluded = should_exclude_file(f, config);
            if excluded {
                debug!("Excluded by config: {}", f.name);
            }
            !excluded
        })
        .map(|f| f.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Rule;
    use crate::infrastructure::{write_sum_file, SumFile};
    use std::path::Path;

    fn write(dir: &Path, name: &str, sql: &str) {
        std::fs::write(dir.join(name), sql).unwrap();
    }

    fn request(dir: &Path) -> LintRequest {
        LintRequest {
            dir: dir.to_path_buf(),
            dialect: Dialect::Postgres,
            latest: None,
            git_base: None,
        }
    }

    async fn hash(dir: &Path) {
        let directory = MigrationDirectory::load(dir).await.unwrap();
        write_sum_file(dir, &SumFile::compute(&directory.files))
            .await
            .unwrap();
    }

    fn users_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "20240101000000_users.sql",
            "CREATE TABLE users (id bigint PRIMARY KEY, email text);",
        );
        dir
    }

    fn sorted(selected: HashSet<String>) -> Vec<String> {
        let mut names: Vec<String> = selected.into_iter().collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_clean_directory_passes() {
        let dir = users_dir();
        write(
            dir.path(),
            "20240102000000_posts.sql",
            "CREATE TABLE posts (id bigint PRIMARY KEY, user_id bigint NOT NULL);\n\
             CREATE INDEX idx_posts_user ON posts (user_id);\n\
             ALTER TABLE users ADD COLUMN name text;",
        );
        hash(dir.path()).await;

        let report = LintService::new(LintConfig::default())
            .run(&request(dir.path()))
            .await
            .unwrap();

        assert_eq!(report.findings().count(), 0);
        assert_eq!(report.verdict.files_linted, 2);
        assert_eq!(report.exit_code, 0);
    }

    #[tokio::test]
    async fn test_not_null_without_backfill_fails() {
        let dir = users_dir();
        write(
            dir.path(),
            "20240102000000_email.sql",
            "ALTER TABLE users ALTER COLUMN email SET NOT NULL;",
        );

        let report = LintService::new(LintConfig::default())
            .run(&request(dir.path()))
            .await
            .unwrap();

        let findings: Vec<_> = report.findings().collect();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, Rule::MF102);
        assert_eq!(findings[0].file, "20240102000000_email.sql");
        assert_eq!(report.exit_code, 1);
    }

    #[tokio::test]
    async fn test_not_null_after_backfill_passes() {
        let dir = users_dir();
        write(
            dir.path(),
            "20240102000000_email.sql",
            "UPDATE users SET email = '' WHERE email IS NULL;\n\
             ALTER TABLE users ALTER COLUMN email SET NOT NULL;",
        );

        let report = LintService::new(LintConfig::default())
            .run(&request(dir.path()))
            .await
            .unwrap();

        assert_eq!(report.findings().count(), 0);
        assert!(report.verdict.passed());
    }

    #[tokio::test]
    async fn test_modified_file_fails_integrity() {
        let dir = users_dir();
        hash(dir.path()).await;
        write(
            dir.path(),
            "20240101000000_users.sql",
            "CREATE TABLE users (id bigint PRIMARY KEY);",
        );

        let report = LintService::new(LintConfig::default())
            .run(&request(dir.path()))
            .await
            .unwrap();

        assert!(report.files.is_empty());
        assert!(report
            .verdict
            .integrity_error
            .as_deref()
            .unwrap()
            .contains("20240101000000_users.sql"));
        assert_eq!(report.exit_code, 1);
    }

    #[tokio::test]
    async fn test_missing_sum_file_when_required() {
        let dir = users_dir();
        let config = LintConfig {
            require_sum: true,
            ..Default::default()
        };

        let report = LintService::new(config)
            .run(&request(dir.path()))
            .await
            .unwrap();
        assert!(report.verdict.integrity_error.is_some());

        let report = LintService::new(LintConfig::default())
            .run(&request(dir.path()))
            .await
            .unwrap();
        assert!(report.verdict.integrity_error.is_none());
    }

    #[tokio::test]
    async fn test_unselected_files_still_build_the_catalog() {
        let dir = users_dir();
        write(
            dir.path(),
            "20240102000000_rename.sql",
            "ALTER TABLE users RENAME COLUMN email TO mail;",
        );
        write(
            dir.path(),
            "20240103000000_mail.sql",
            "ALTER TABLE users ALTER COLUMN mail SET NOT NULL;",
        );

        let report = LintService::new(LintConfig::default())
            .run(&LintRequest {
                latest: Some(1),
                ..request(dir.path())
            })
            .await
            .unwrap();

        assert_eq!(report.verdict.files_linted, 1);
        let findings: Vec<_> = report.findings().collect();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, Rule::MF102);
        assert!(findings[0].message.contains("mail"));
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let err = LintService::new(LintConfig::default())
            .run(&request(Path::new("/nonexistent/migrations")))
            .await
            .unwrap_err();
        assert!(matches!(err, LintError::Directory(_)));
    }

    #[test]
    fn test_select_latest_and_changed() {
        let files = vec![
            MigrationFile::new("1_a.sql", "").unwrap(),
            MigrationFile::new("2_b.sql", "").unwrap(),
            MigrationFile::new("3_c.sql", "").unwrap(),
        ];
        let config = LintConfig::default();

        assert_eq!(
            sorted(select_files(&files, None, None, &config)),
            vec!["1_a.sql", "2_b.sql", "3_c.sql"]
        );
        assert_eq!(
            sorted(select_files(&files, Some(2), None, &config)),
            vec!["2_b.sql", "3_c.sql"]
        );
        assert_eq!(
            sorted(select_files(&files, Some(10), None, &config)).len(),
            3
        );
        assert!(select_files(&files, Some(0), None, &config).is_empty());

        let changed = vec!["1_a.sql".to_string(), "README.md".to_string()];
        assert_eq!(
            sorted(select_files(&files, None, Some(&changed), &config)),
            vec!["1_a.sql"]
        );
    }

    #[test]
    fn test_select_applies_config_exclusions() {
        let files = vec![
            MigrationFile::new("20230101000000_old.sql", "").unwrap(),
            MigrationFile::new("20240101000000_seed.sql", "").unwrap(),
            MigrationFile::new("20240201000000_users.sql", "").unwrap(),
            MigrationFile::new("20240301000000_posts.sql", "").unwrap(),
        ];
        let config = LintConfig {
            check_after: Some("20240101".to_string()),
            excluded_files: vec![
                "*_seed.sql".to_string(),
                "20240301000000_posts.sql".to_string(),
            ],
            ..Default::default()
        };

        assert_eq!(
            sorted(select_files(&files, None, None, &config)),
            vec!["20240201000000_users.sql"]
        );
    }
}
