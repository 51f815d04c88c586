//! Structured statements produced by the parser

use serde::Serialize;

/// Column definition as written in CREATE TABLE or ADD COLUMN
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub has_default: bool,
}

/// Kind of table constraint added by ALTER TABLE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    Check,
    ForeignKey,
    Other,
}

/// Object targeted by a DROP statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropObject {
    Table,
    Schema,
    Index,
    View,
    Other(String),
}

/// A single operation inside ALTER TABLE
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AlterOperation {
    AddColumn {
        column: ColumnDef,
    },
    DropColumn {
        columns: Vec<String>,
    },
    RenameColumn {
        from: String,
        to: String,
    },
    RenameTable {
        to: String,
    },
    SetNotNull {
        column: String,
    },
    DropNotNull {
        column: String,
    },
    SetDefault {
        column: String,
    },
    DropDefault {
        column: String,
    },
    SetDataType {
        column: String,
        data_type: String,
    },
    AddConstraint {
        kind: ConstraintKind,
        name: Option<String>,
        not_valid: bool,
    },
    DropConstraint {
        name: String,
    },
    /// MySQL `MODIFY COLUMN` / `CHANGE COLUMN`: the full definition is restated
    RedefineColumn {
        from: String,
        column: ColumnDef,
    },
    Other {
        sql: String,
    },
}

/// Kind of a statement together with the objects it affects
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatementKind {
    CreateTable {
        table: String,
        columns: Vec<ColumnDef>,
        if_not_exists: bool,
    },
    AlterTable {
        table: String,
        operations: Vec<AlterOperation>,
    },
    Drop {
        object: DropObject,
        names: Vec<String>,
        if_exists: bool,
    },
    CreateIndex {
        name: Option<String>,
        table: String,
        unique: bool,
        concurrently: bool,
    },
    Update {
        table: String,
        columns: Vec<String>,
        filtered: bool,
    },
    Delete {
        table: String,
        filtered: bool,
    },
    Truncate {
        tables: Vec<String>,
    },
    Insert {
        table: String,
    },
    /// Parsed, but nothing the linter reasons about (SELECT, BEGIN, GRANT, ...)
    Other {
        keyword: String,
    },
    /// The parser could not understand the statement
    Unparsed {
        error: String,
    },
}

/// `-- lint:ignore` directive attached to a statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Suppression {
    /// Suppress every finding on the statement
    All,
    /// Suppress only the listed rule codes
    Rules(Vec<String>),
}

impl Suppression {
    pub fn covers(&self, code: &str) -> bool {
        match self {
            Self::All => true,
            Self::Rules(codes) => codes.iter().any(|c| c.eq_ignore_ascii_case(code)),
        }
    }
}

/// A single statement of a migration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    /// 1-based line where the statement starts
    pub line: usize,
    /// Statement text without the terminating semicolon
    pub text: String,
    pub kind: StatementKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppression: Option<Suppression>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suppression_covers() {
        assert!(Suppression::All.covers("DS102"));

        let rules = Suppression::Rules(vec!["DS103".to_string(), "MF102".to_string()]);
        assert!(rules.covers("ds103"));
        assert!(rules.covers("MF102"));
        assert!(!rules.covers("DS102"));
    }
}
