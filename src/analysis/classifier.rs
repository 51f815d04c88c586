//! Change classifier
//!
//! Maps structured statements to semantic changes. One statement can carry
//! several changes (ALTER TABLE with several operations, DROP TABLE a, b).

use crate::domain::{AlterOperation, Change, ChangeKind, DropObject, Statement, StatementKind};

fn alter_changes(table: &str, operation: &AlterOperation, line: usize, index: usize) -> Vec<Change> {
    let change = |kind: ChangeKind| Change::new(table, kind, line, index);

    match operation {
        AlterOperation::AddColumn { column } => vec![change(ChangeKind::AddColumn {
            column: column.clone(),
        })],
        AlterOperation::DropColumn { columns } => columns
            .iter()
            .map(|column| {
                change(ChangeKind::DropColumn {
                    column: column.clone(),
                })
            })
            .collect(),
        AlterOperation::RenameColumn { from, to } => vec![change(ChangeKind::RenameColumn {
            from: from.clone(),
            to: to.clone(),
        })],
        AlterOperation::RenameTable { to } => {
            vec![change(ChangeKind::RenameTable { to: to.clone() })]
        }
        AlterOperation::SetNotNull { column } => vec![change(ChangeKind::SetNotNull {
            column: column.clone(),
        })],
        AlterOperation::DropNotNull { column } => vec![change(ChangeKind::DropNotNull {
            column: column.clone(),
        })],
        AlterOperation::SetDataType { column, data_type } => {
            vec![change(ChangeKind::ChangeColumnType {
                column: column.clone(),
                data_type: data_type.clone(),
            })]
        }
        AlterOperation::AddConstraint {
            kind,
            name,
            not_valid,
        } => vec![change(ChangeKind::AddConstraint {
            kind: *kind,
            name: name.clone(),
            not_valid: *not_valid,
        })],
        AlterOperation::SetDefault { column } => vec![change(ChangeKind::Other {
            description: format!("set default of column {}", column),
        })],
        AlterOperation::DropDefault { column } => vec![change(ChangeKind::Other {
            description: format!("drop default of column {}", column),
        })],
        AlterOperation::DropConstraint { name } => vec![change(ChangeKind::Other {
            description: format!("drop constraint {}", name),
        })],
        AlterOperation::RedefineColumn { from, column } => {
            let mut changes = Vec::new();
            if *from != column.name {
                changes.push(change(ChangeKind::RenameColumn {
                    from: from.clone(),
                    to: column.name.clone(),
                }));
            }
            changes.push(change(ChangeKind::ChangeColumnType {
                column: column.name.clone(),
                data_type: column.data_type.clone(),
            }));
            let nullability = if column.nullable {
                ChangeKind::DropNotNull {
                    column: column.name.clone(),
                }
            } else {
                ChangeKind::SetNotNull {
                    column: column.name.clone(),
                }
            };
            changes.push(change(nullability));
            changes
        }
        AlterOperation::Other { sql } => vec![change(ChangeKind::Other {
            description: sql.clone(),
        })],
    }
}

/// Semantic changes carried by a statement
///
/// `index` is the statement's position in its migration file.
pub fn classify(statement: &Statement, index: usize) -> Vec<Change> {
    let line = statement.line;
    let single = |object: &str, kind: ChangeKind| vec![Change::new(object, kind, line, index)];

    match &statement.kind {
        StatementKind::CreateTable { table, columns, .. } => single(
            table,
            ChangeKind::CreateTable {
                columns: columns.clone(),
            },
        ),
        StatementKind::AlterTable { table, operations } => operations
            .iter()
            .flat_map(|operation| alter_changes(table, operation, line, index))
            .collect(),
        StatementKind::Drop { object, names, .. } => names
            .iter()
            .map(|name| {
                let kind = match object {
                    DropObject::Table => ChangeKind::DropTable,
                    DropObject::Schema => ChangeKind::DropSchema,
                    DropObject::Index => ChangeKind::Other {
                        description: format!("drop index {}", name),
                    },
                    DropObject::View => ChangeKind::Other {
                        description: format!("drop view {}", name),
                    },
                    DropObject::Other(object_type) => ChangeKind::Other {
                        description: format!("drop {} {}", object_type.to_lowercase(), name),
                    },
                };
                Change::new(name.as_str(), kind, line, index)
            })
            .collect(),
        StatementKind::CreateIndex {
            name,
            table,
            unique,
            concurrently,
        } => single(
            table,
            ChangeKind::CreateIndex {
                name: name.clone(),
                unique: *unique,
                concurrently: *concurrently,
            },
        ),
        StatementKind::Update { table, columns, .. } => columns
            .iter()
            .map(|column| {
                Change::new(
                    table.as_str(),
                    ChangeKind::Backfill {
                        column: column.clone(),
                    },
                    line,
                    index,
                )
            })
            .collect(),
        StatementKind::Delete { table, filtered } => single(
            table,
            ChangeKind::DeleteRows {
                filtered: *filtered,
            },
        ),
        StatementKind::Truncate { tables } => tables
            .iter()
            .map(|table| Change::new(table.as_str(), ChangeKind::Truncate, line, index))
            .collect(),
        StatementKind::Insert { table } => single(
            table,
            ChangeKind::Other {
                description: "insert".to_string(),
            },
        ),
        StatementKind::Other { keyword } => single(
            "",
            ChangeKind::Other {
                description: keyword.to_lowercase(),
            },
        ),
        StatementKind::Unparsed { error } => single(
            "",
            ChangeKind::Unparsed {
                error: error.clone(),
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Dialect;
    use crate::parser::parse_sql;

    fn changes(sql: &str) -> Vec<Change> {
        parse_sql(sql, Dialect::Postgres)
            .iter()
            .enumerate()
            .flat_map(|(i, statement)| classify(statement, i))
            .collect()
    }

    #[test]
    fn test_alter_table_yields_one_change_per_operation() {
        let changes = changes("ALTER TABLE users DROP COLUMN a, ALTER COLUMN b SET NOT NULL;");
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].object, "users");
        assert_eq!(
            changes[0].kind,
            ChangeKind::DropColumn {
                column: "a".to_string()
            }
        );
        assert_eq!(
            changes[1].kind,
            ChangeKind::SetNotNull {
                column: "b".to_string()
            }
        );
    }

    #[test]
    fn test_drop_multiple_tables() {
        let changes = changes("DROP TABLE a, b;");
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.kind == ChangeKind::DropTable));
        assert_eq!(changes[1].object, "b");
    }

    #[test]
    fn test_update_is_a_backfill_per_column() {
        let changes = changes("SELECT 1;\nUPDATE users SET a = 1, b = 2 WHERE a IS NULL;");
        assert_eq!(changes.len(), 3);
        assert_eq!(
            changes[1].kind,
            ChangeKind::Backfill {
                column: "a".to_string()
            }
        );
        assert_eq!(changes[1].line, 2);
        assert_eq!(changes[1].statement, 1);
        assert_eq!(
            changes[2].kind,
            ChangeKind::Backfill {
                column: "b".to_string()
            }
        );
    }

    #[test]
    fn test_mysql_change_column_is_rename_retype_and_nullability() {
        let statements = parse_sql(
            "ALTER TABLE users CHANGE COLUMN email mail varchar(255) NOT NULL;",
            Dialect::MySql,
        );
        let changes = classify(&statements[0], 0);
        assert_eq!(changes.len(), 3);
        assert_eq!(
            changes[0].kind,
            ChangeKind::RenameColumn {
                from: "email".to_string(),
                to: "mail".to_string()
            }
        );
        assert!(matches!(
            &changes[1].kind,
            ChangeKind::ChangeColumnType { column, .. } if column == "mail"
        ));
        assert_eq!(
            changes[2].kind,
            ChangeKind::SetNotNull {
                column: "mail".to_string()
            }
        );
    }

    #[test]
    fn test_drop_schema_and_index() {
        let changes = changes("DROP SCHEMA billing;\nDROP INDEX idx_users_email;");
        assert_eq!(changes[0].kind, ChangeKind::DropSchema);
        assert_eq!(changes[0].object, "billing");
        assert!(matches!(changes[1].kind, ChangeKind::Other { .. }));
    }
}
