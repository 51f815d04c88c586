//! Migration directory integrity file (`migrate.sum`)
//!
//! ```text
//! h1:<base64 sha256 over every entry>
//! 20240101000000_users.sql h1:<base64 sha256 of the file>
//! ```
//!
//! The directory hash is computed over each file's name followed by its
//! digest, in version order, so renames and reorders are detected as well
//! as edits.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs;

use crate::domain::MigrationFile;
use crate::error::{DirectoryError, IntegrityError};

pub const SUM_FILE_NAME: &str = "migrate.sum";

const HASH_PREFIX: &str = "h1:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SumEntry {
    pub name: String,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SumFile {
    pub total: String,
    pub entries: Vec<SumEntry>,
}

impl SumFile {
    /// Hash a set of migration files (expected in version order)
    pub fn compute(files: &[MigrationFile]) -> Self {
        let mut total = Sha256::new();
        let mut entries = Vec::with_capacity(files.len());

        for file in files {
            let digest = Sha256::digest(file.content.as_bytes());
            total.update(file.name.as_bytes());
            total.update(digest.as_slice());
            entries.push(SumEntry {
                name: file.name.clone(),
                hash: format!("{}{}", HASH_PREFIX, STANDARD.encode(digest.as_slice())),
            });
        }

        Self {
            total: format!("{}{}", HASH_PREFIX, STANDARD.encode(total.finalize().as_slice())),
            entries,
        }
    }

    pub fn parse(content: &str) -> Result<Self, IntegrityError> {
        let mut lines = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let total = match lines.next() {
            Some((_, line)) if line.trim().starts_with(HASH_PREFIX) => line.trim().to_string(),
            Some((i, _)) => return Err(IntegrityError::Malformed { line: i + 1 }),
            None => return Err(IntegrityError::Malformed { line: 1 }),
        };

        let mut entries = Vec::new();
        for (i, line) in lines {
            let (name, hash) = line
                .trim()
                .rsplit_once(' ')
                .filter(|(name, hash)| !name.is_empty() && hash.starts_with(HASH_PREFIX))
                .ok_or(IntegrityError::Malformed { line: i + 1 })?;
            entries.push(SumEntry {
                name: name.trim().to_string(),
                hash: hash.to_string(),
            });
        }

        Ok(Self { total, entries })
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.total);
        out.push('\n');
        for entry in &self.entries {
            out.push_str(&entry.name);
            out.push(' ');
            out.push_str(&entry.hash);
            out.push('\n');
        }
        out
    }

    /// Check the directory's current state (`actual`) against this recorded sum
    pub fn verify(&self, actual: &SumFile) -> Result<(), IntegrityError> {
        for entry in &actual.entries {
            match self.entries.iter().find(|e| e.name == entry.name) {
                None => {
                    return Err(IntegrityError::MissingEntry {
                        file: entry.name.clone(),
                    })
                }
                Some(recorded) if recorded.hash != entry.hash => {
                    return Err(IntegrityError::ChecksumMismatch {
                        file: entry.name.clone(),
                    })
                }
                Some(_) => {}
            }
        }

        if let Some(stale) = self
            .entries
            .iter()
            .find(|e| !actual.entries.iter().any(|a| a.name == e.name))
        {
            return Err(IntegrityError::UnknownEntry {
                file: stale.name.clone(),
            });
        }

        if self.total != actual.total {
            return Err(IntegrityError::TotalMismatch);
        }

        Ok(())
    }
}

/// Check recorded `migrate.sum` content against the current files
pub fn verify_sum(recorded: &str, files: &[MigrationFile]) -> Result<(), IntegrityError> {
    SumFile::parse(recorded)?.verify(&SumFile::compute(files))
}

/// Read `migrate.sum` from a migration directory, if present
pub async fn read_sum_file(dir: &Path) -> Result<Option<String>, DirectoryError> {
    let path = dir.join(SUM_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }
    fs::read_to_string(&path)
        .await
        .map(Some)
        .map_err(|source| DirectoryError::Io { path, source })
}

/// Write `migrate.sum` into a migration directory
pub async fn write_sum_file(dir: &Path, sum: &SumFile) -> Result<(), DirectoryError> {
    let path = dir.join(SUM_FILE_NAME);
    fs::write(&path, sum.render())
        .await
        .map_err(|source| DirectoryError::Io { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files() -> Vec<MigrationFile> {
        vec![
            MigrationFile::new("1_users.sql", "CREATE TABLE users (id int);").unwrap(),
            MigrationFile::new("2_posts.sql", "CREATE TABLE posts (id int);").unwrap(),
        ]
    }

    #[test]
    fn test_render_and_parse() {
        let sum = SumFile::compute(&files());
        let rendered = sum.render();
        assert!(rendered.starts_with("h1:"));
        assert_eq!(rendered.lines().count(), 3);
        assert!(rendered.lines().nth(1).unwrap().starts_with("1_users.sql h1:"));
        assert_eq!(SumFile::parse(&rendered).unwrap(), sum);
    }

    #[test]
    fn test_verify_unchanged_directory() {
        let sum = SumFile::compute(&files());
        assert_eq!(sum.verify(&SumFile::compute(&files())), Ok(()));
    }

    #[test]
    fn test_verify_detects_edit() {
        let recorded = SumFile::compute(&files());
        let mut edited = files();
        edited[0].content.push_str("\nDROP TABLE users;");

        assert_eq!(
            recorded.verify(&SumFile::compute(&edited)),
            Err(IntegrityError::ChecksumMismatch {
                file: "1_users.sql".to_string()
            })
        );
    }

    #[test]
    fn test_verify_detects_added_and_removed_files() {
        let recorded = SumFile::compute(&files());

        let mut added = files();
        added.push(MigrationFile::new("3_tags.sql", "SELECT 1;").unwrap());
        assert!(matches!(
            recorded.verify(&SumFile::compute(&added)),
            Err(IntegrityError::MissingEntry { .. })
        ));

        let removed = vec![files().remove(0)];
        assert!(matches!(
            recorded.verify(&SumFile::compute(&removed)),
            Err(IntegrityError::UnknownEntry { .. })
        ));
    }

    #[test]
    fn test_verify_detects_reorder() {
        let recorded = SumFile::compute(&files());
        let mut reordered = files();
        reordered.reverse();
        assert_eq!(
            recorded.verify(&SumFile::compute(&reordered)),
            Err(IntegrityError::TotalMismatch)
        );
    }

    #[test]
    fn test_verify_sum_content() {
        let recorded = SumFile::compute(&files()).render();
        assert_eq!(verify_sum(&recorded, &files()), Ok(()));
        assert_eq!(
            verify_sum("garbage", &files()),
            Err(IntegrityError::Malformed { line: 1 })
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(
            SumFile::parse("not a hash\n"),
            Err(IntegrityError::Malformed { line: 1 })
        );
        assert_eq!(
            SumFile::parse("h1:abc\n1_users.sql\n"),
            Err(IntegrityError::Malformed { line: 2 })
        );
        assert!(SumFile::parse("").is_err());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_sum_file(dir.path()).await.unwrap(), None);

        let sum = SumFile::compute(&files());
        write_sum_file(dir.path(), &sum).await.unwrap();
        let content = read_sum_file(dir.path()).await.unwrap().unwrap();
        assert_eq!(SumFile::parse(&content).unwrap(), sum);
    }
}
