//! Statement parser
//!
//! Turns raw SQL migration files into structured [`Statement`]s: the
//! splitter finds statement boundaries and lint directives, the sqlparser
//! adapter interprets each statement.

pub mod splitter;
pub mod sql;

pub use splitter::split_statements;
pub use sql::parse_statement;

use tracing::debug;

use crate::domain::{Dialect, MigrationFile, ParsedMigration, Statement, StatementKind};

/// Parse the contents of one migration file
pub fn parse_sql(content: &str, dialect: Dialect) -> Vec<Statement> {
    split_statements(content, dialect)
        .into_iter()
        .map(|raw| {
            let kind = parse_statement(&raw.text, dialect);
            if let StatementKind::Unparsed { ref error } = kind {
                debug!("Line {}: statement not understood: {}", raw.line, error);
            }
            Statement {
                line: raw.line,
                text: raw.text,
                kind,
                suppression: raw.suppression,
            }
        })
        .collect()
}

/// Parse a migration file into its ordered statements
pub fn parse_migration(file: &MigrationFile, dialect: Dialect) -> ParsedMigration<'_> {
    ParsedMigration {
        file,
        statements: parse_sql(&file.content, dialect),
    }
}
