//! Domain layer - pure business logic
//!
//! This module contains business logic with no external I/O.
//! Types and functions here can be unit tested without mocking.

pub mod change;
pub mod finding;
pub mod migration;
pub mod statement;

// Re-export commonly used types
pub use change::{Change, ChangeKind};
pub use finding::{Finding, RiskLevel, Rule, Severity, Verdict};
pub use migration::{Dialect, MigrationFile, ParsedMigration};
pub use statement::{
    AlterOperation, ColumnDef, ConstraintKind, DropObject, Statement, StatementKind, Suppression,
};
