//! Semantic changes derived from statements

use serde::Serialize;

use super::statement::{ColumnDef, ConstraintKind};

/// What a statement does to the schema or its data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum ChangeKind {
    CreateTable { columns: Vec<ColumnDef> },
    DropTable,
    RenameTable { to: String },
    DropSchema,
    AddColumn { column: ColumnDef },
    DropColumn { column: String },
    RenameColumn { from: String, to: String },
    /// nullable -> non-nullable
    SetNotNull { column: String },
    /// non-nullable -> nullable
    DropNotNull { column: String },
    ChangeColumnType { column: String, data_type: String },
    CreateIndex {
        name: Option<String>,
        unique: bool,
        concurrently: bool,
    },
    AddConstraint {
        kind: ConstraintKind,
        name: Option<String>,
        not_valid: bool,
    },
    /// UPDATE assigning the column
    Backfill { column: String },
    DeleteRows { filtered: bool },
    Truncate,
    /// Schema-neutral statement (INSERT, SET DEFAULT, DROP INDEX, ...)
    Other { description: String },
    Unparsed { error: String },
}

/// Semantic interpretation of a statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    /// Table (or schema, for DROP SCHEMA) the change applies to
    pub object: String,
    #[serde(flatten)]
    pub kind: ChangeKind,
    /// 1-based line of the originating statement
    pub line: usize,
    /// Position of the originating statement in its file
    pub statement: usize,
}

impl Change {
    pub fn new(object: impl Into<String>, kind: ChangeKind, line: usize, statement: usize) -> Self {
        Self {
            object: object.into(),
            kind,
            line,
            statement,
        }
    }
}
