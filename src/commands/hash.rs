//! Write `migrate.sum` for a migration directory

use anyhow::{Context, Result};

use crate::infrastructure::{resolve_dir, write_sum_file, MigrationDirectory, SumFile, SUM_FILE_NAME};
use crate::ui;

/// Execute the hash command
pub async fn execute(dir: String) -> Result<()> {
    let dir = resolve_dir(&dir);
    let directory = MigrationDirectory::load(&dir)
        .await
        .with_context(|| format!("Failed to load {}", dir.display()))?;

    write_sum_file(&dir, &SumFile::compute(&directory.files)).await?;

    ui::print_success(&format!(
        "Wrote {} ({} migration files)",
        dir.join(SUM_FILE_NAME).display(),
        directory.files.len()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::read_sum_file;

    #[tokio::test]
    async fn test_hash_writes_sum_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1_users.sql"), "CREATE TABLE users (id int);").unwrap();

        execute(dir.path().display().to_string()).await.unwrap();

        let content = read_sum_file(dir.path()).await.unwrap().unwrap();
        let sum = SumFile::parse(&content).unwrap();
        assert_eq!(sum.entries.len(), 1);
        assert_eq!(sum.entries[0].name, "1_users.sql");
    }
}
