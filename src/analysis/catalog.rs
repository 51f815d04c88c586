//! Schema catalog
//!
//! In-memory model of tables and columns, built by replaying migrations in
//! version order. Stands in for the dev database: the analyzer asks it what
//! the schema looked like before the file under review.

use std::collections::BTreeMap;

use super::classifier::classify;
use crate::domain::{Change, ChangeKind, ColumnDef, ParsedMigration};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnState {
    pub data_type: String,
    pub nullable: bool,
}

impl From<&ColumnDef> for ColumnState {
    fn from(def: &ColumnDef) -> Self {
        Self {
            data_type: def.data_type.clone(),
            nullable: def.nullable,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableState {
    pub columns: BTreeMap<String, ColumnState>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: BTreeMap<String, TableState>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(&self, table: &str, column: &str) -> Option<&ColumnState> {
        self.tables.get(table)?.columns.get(column)
    }

    /// Apply one change to the catalog
    ///
    /// Changes to unknown tables or columns are ignored, except ADD COLUMN
    /// which creates the table entry.
    pub fn apply(&mut self, change: &Change) {
        let table = change.object.as_str();

        match &change.kind {
            ChangeKind::CreateTable { columns } => {
                self.tables.entry(table.to_string()).or_insert_with(|| TableState {
                    columns: columns
                        .iter()
                        .map(|def| (def.name.clone(), ColumnState::from(def)))
                        .collect(),
                });
            }
            ChangeKind::DropTable => {
                self.tables.remove(table);
            }
            ChangeKind::RenameTable { to } => {
                if let Some(state) = self.tables.remove(table) {
                    self.tables.insert(to.clone(), state);
                }
            }
            ChangeKind::DropSchema => {
                let prefix = format!("{}.", table);
                self.tables.retain(|name, _| !name.starts_with(&prefix));
            }
            ChangeKind::AddColumn { column } => {
                self.tables
                    .entry(table.to_string())
                    .or_default()
                    .columns
                    .insert(column.name.clone(), ColumnState::from(column));
            }
            ChangeKind::DropColumn { column } => {
                if let Some(state) = self.tables.get_mut(table) {
                    state.columns.remove(column);
                }
            }
            ChangeKind::RenameColumn { from, to } => {
                if let Some(state) = self.tables.get_mut(table) {
                    if let Some(column) = state.columns.remove(from) {
                        state.columns.insert(to.clone(), column);
                    }
                }
            }
            ChangeKind::SetNotNull { column } => {
                if let Some(state) = self.column_mut(table, column) {
                    state.nullable = false;
                }
            }
            ChangeKind::DropNotNull { column } => {
                if let Some(state) = self.column_mut(table, column) {
                    state.nullable = true;
                }
            }
            ChangeKind::ChangeColumnType { column, data_type } => {
                if let Some(state) = self.column_mut(table, column) {
                    state.data_type = data_type.clone();
                }
            }
            ChangeKind::CreateIndex { .. }
            | ChangeKind::AddConstraint { .. }
            | ChangeKind::Backfill { .. }
            | ChangeKind::DeleteRows { .. }
            | ChangeKind::Truncate
            | ChangeKind::Other { .. }
            | ChangeKind::Unparsed { .. } => {}
        }
    }

    /// Replay every change of a parsed migration
    pub fn replay(&mut self, migration: &ParsedMigration<'_>) {
        for (index, statement) in migration.statements.iter().enumerate() {
            for change in classify(statement, index) {
                self.apply(&change);
            }
        }
    }

    fn column_mut(&mut self, table: &str, column: &str) -> Option<&mut ColumnState> {
        self.tables.get_mut(table)?.columns.get_mut(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Dialect, MigrationFile};
    use crate::parser::parse_migration;

    fn replay(catalog: &mut Catalog, sql: &str) {
        let file = MigrationFile::new("1_test.sql", sql).unwrap();
        catalog.replay(&parse_migration(&file, Dialect::Postgres));
    }

    #[test]
    fn test_replay_create_and_alter() {
        let mut catalog = Catalog::new();
        replay(
            &mut catalog,
            "CREATE TABLE users (id int PRIMARY KEY, email text);\n\
             ALTER TABLE users ALTER COLUMN email SET NOT NULL;\n\
             ALTER TABLE users ADD COLUMN age int;",
        );

        assert!(!catalog.column("users", "id").unwrap().nullable);
        assert!(!catalog.column("users", "email").unwrap().nullable);
        assert!(catalog.column("users", "age").unwrap().nullable);
    }

    #[test]
    fn test_replay_renames_and_drops() {
        let mut catalog = Catalog::new();
        replay(
            &mut catalog,
            "CREATE TABLE users (id int, name text);\n\
             ALTER TABLE users RENAME COLUMN name TO full_name;\n\
             ALTER TABLE users RENAME TO accounts;\n\
             CREATE TABLE legacy (id int);\n\
             DROP TABLE legacy;",
        );

        assert_eq!(catalog.column("users", "id"), None);
        assert_eq!(catalog.column("legacy", "id"), None);
        assert!(catalog.column("accounts", "full_name").is_some());
        assert_eq!(catalog.column("accounts", "name"), None);
    }

    #[test]
    fn test_replay_mysql_modify_column() {
        let mut catalog = Catalog::new();
        let file = MigrationFile::new(
            "1_test.sql",
            "CREATE TABLE users (id int, email varchar(255));\n\
             ALTER TABLE users MODIFY COLUMN email varchar(320) NOT NULL;",
        )
        .unwrap();
        catalog.replay(&parse_migration(&file, Dialect::MySql));

        let email = catalog.column("users", "email").unwrap();
        assert!(!email.nullable);
        assert_eq!(email.data_type, "VARCHAR(320)");
    }

    #[test]
    fn test_drop_schema_removes_qualified_tables() {
        let mut catalog = Catalog::new();
        replay(
            &mut catalog,
            "CREATE TABLE billing.invoices (id int);\n\
             CREATE TABLE users (id int);\n\
             DROP SCHEMA billing CASCADE;",
        );

        assert_eq!(catalog.column("billing.invoices", "id"), None);
        assert!(catalog.column("users", "id").is_some());
    }
}
