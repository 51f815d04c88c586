//! Infrastructure layer - external I/O
//!
//! Filesystem and git adapters used by the services layer.

pub mod git;
pub mod migration_dir;
pub mod sum_file;

pub use git::GitClient;
pub use migration_dir::{resolve_dir, MigrationDirectory};
pub use sum_file::{read_sum_file, verify_sum, write_sum_file, SumFile, SUM_FILE_NAME};
