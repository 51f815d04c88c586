//! sqlparser adapter
//!
//! Converts `sqlparser` ASTs into the linter's own [`StatementKind`]. Only
//! the parts the linter reasons about are kept; everything else becomes
//! `Other`. Identifiers are normalized: unquoted names are lowercased,
//! quoted names keep their case, and a leading `public.` schema is dropped.

use sqlparser::ast as sql_ast;
use sqlparser::dialect::{
    Dialect as SqlDialect, GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect,
};
use sqlparser::parser::Parser;

use crate::domain::{
    AlterOperation, ColumnDef, ConstraintKind, Dialect, DropObject, StatementKind,
};

fn sql_dialect(dialect: Dialect) -> Box<dyn SqlDialect> {
    match dialect {
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::MySql => Box::new(MySqlDialect {}),
        Dialect::Sqlite => Box::new(SQLiteDialect {}),
        Dialect::Generic => Box::new(GenericDialect {}),
    }
}

/// Parse one statement's text into a [`StatementKind`]
///
/// Text that does not parse, or that parses into more than one statement,
/// becomes [`StatementKind::Unparsed`].
pub fn parse_statement(text: &str, dialect: Dialect) -> StatementKind {
    let sql_dialect = sql_dialect(dialect);
    match Parser::parse_sql(sql_dialect.as_ref(), text) {
        Ok(mut parsed) if parsed.len() == 1 => convert_statement(parsed.remove(0)),
        Ok(parsed) => StatementKind::Unparsed {
            error: format!("expected a single statement, found {}", parsed.len()),
        },
        Err(e) => StatementKind::Unparsed {
            error: e.to_string(),
        },
    }
}

/// Normalize a single identifier as rendered by sqlparser
pub fn normalize_ident(raw: &str) -> String {
    let raw = raw.trim();
    let quoted = raw.len() >= 2
        && ((raw.starts_with('"') && raw.ends_with('"'))
            || (raw.starts_with('`') && raw.ends_with('`'))
            || (raw.starts_with('[') && raw.ends_with(']')));
    if quoted {
        raw[1..raw.len() - 1].to_string()
    } else {
        raw.to_lowercase()
    }
}

fn ident(ident: &sql_ast::Ident) -> String {
    if ident.quote_style.is_some() {
        ident.value.clone()
    } else {
        ident.value.to_lowercase()
    }
}

fn object_name(name: &sql_ast::ObjectName) -> String {
    let parts: Vec<String> = name
        .0
        .iter()
        .map(|part| normalize_ident(&part.to_string()))
        .collect();
    match parts.as_slice() {
        [schema, rest @ ..] if schema == "public" && !rest.is_empty() => rest.join("."),
        _ => parts.join("."),
    }
}

fn table_factor_name(factor: &sql_ast::TableFactor) -> String {
    match factor {
        sql_ast::TableFactor::Table { name, .. } => object_name(name),
        other => other.to_string(),
    }
}

fn column_def(column: &sql_ast::ColumnDef) -> ColumnDef {
    column_from_parts(
        &column.name,
        &column.data_type,
        column.options.iter().map(|option| &option.option),
    )
}

fn column_from_parts<'a>(
    name: &sql_ast::Ident,
    data_type: &sql_ast::DataType,
    options: impl IntoIterator<Item = &'a sql_ast::ColumnOption>,
) -> ColumnDef {
    let mut nullable = true;
    let mut has_default = false;

    for option in options {
        match option {
            sql_ast::ColumnOption::NotNull => nullable = false,
            sql_ast::ColumnOption::Null => nullable = true,
            sql_ast::ColumnOption::Default(_) => has_default = true,
            other => {
                let rendered = other.to_string().to_uppercase();
                if rendered.starts_with("PRIMARY KEY") {
                    nullable = false;
                }
                if rendered.starts_with("GENERATED") || rendered.contains("AUTO_INCREMENT") {
                    has_default = true;
                }
            }
        }
    }

    // serial types fill themselves in
    let data_type = data_type.to_string();
    if data_type.to_uppercase().contains("SERIAL") {
        has_default = true;
    }

    ColumnDef {
        name: ident(name),
        data_type,
        nullable,
        has_default,
    }
}

fn constraint_kind(rendered: &str) -> ConstraintKind {
    if rendered.contains("PRIMARY KEY") {
        ConstraintKind::PrimaryKey
    } else if rendered.contains("UNIQUE") {
        ConstraintKind::Unique
    } else if rendered.contains("FOREIGN KEY") || rendered.contains("REFERENCES") {
        ConstraintKind::ForeignKey
    } else if rendered.contains("CHECK") {
        ConstraintKind::Check
    } else {
        ConstraintKind::Other
    }
}

/// Interpret an ALTER TABLE operation from its rendered SQL
///
/// Used for operations whose AST shape varies across dialects (constraints,
/// table renames).
fn rendered_operation(rendered: String) -> AlterOperation {
    let upper = rendered.to_uppercase();
    let words: Vec<&str> = rendered.split_whitespace().collect();

    if upper.starts_with("RENAME TO ") || upper.starts_with("RENAME AS ") {
        let to = words.last().map(|w| normalize_ident(w)).unwrap_or_default();
        return AlterOperation::RenameTable { to };
    }

    if upper.starts_with("ADD ") && !upper.starts_with("ADD COLUMN") {
        let kind = constraint_kind(&upper);
        if kind != ConstraintKind::Other || upper.starts_with("ADD CONSTRAINT") {
            let name = if upper.starts_with("ADD CONSTRAINT") {
                words.get(2).map(|w| normalize_ident(w))
            } else {
                None
            };
            return AlterOperation::AddConstraint {
                kind,
                name,
                not_valid: upper.contains("NOT VALID"),
            };
        }
    }

    if upper.starts_with("DROP CONSTRAINT ") {
        let name = words
            .iter()
            .skip(2)
            .find(|w| !w.eq_ignore_ascii_case("IF") && !w.eq_ignore_ascii_case("EXISTS"))
            .map(|w| normalize_ident(w))
            .unwrap_or_default();
        return AlterOperation::DropConstraint { name };
    }

    AlterOperation::Other { sql: rendered }
}

fn alter_operation(operation: &sql_ast::AlterTableOperation) -> Vec<AlterOperation> {
    match operation {
        sql_ast::AlterTableOperation::AddColumn { column_def: def, .. } => {
            vec![AlterOperation::AddColumn {
                column: column_def(def),
            }]
        }
        sql_ast::AlterTableOperation::DropColumn { column_names, .. } => {
            vec![AlterOperation::DropColumn {
                columns: column_names.iter().map(ident).collect(),
            }]
        }
        sql_ast::AlterTableOperation::RenameColumn {
            old_column_name,
            new_column_name,
            ..
        } => vec![AlterOperation::RenameColumn {
            from: ident(old_column_name),
            to: ident(new_column_name),
        }],
        sql_ast::AlterTableOperation::AlterColumn { column_name, op, .. } => {
            let column = ident(column_name);
            let converted = match op {
                sql_ast::AlterColumnOperation::SetNotNull => AlterOperation::SetNotNull { column },
                sql_ast::AlterColumnOperation::DropNotNull => {
                    AlterOperation::DropNotNull { column }
                }
                sql_ast::AlterColumnOperation::SetDefault { .. } => {
                    AlterOperation::SetDefault { column }
                }
                sql_ast::AlterColumnOperation::DropDefault => {
                    AlterOperation::DropDefault { column }
                }
                sql_ast::AlterColumnOperation::SetDataType { data_type, .. } => {
                    AlterOperation::SetDataType {
                        column,
                        data_type: data_type.to_string(),
                    }
                }
                _ => AlterOperation::Other {
                    sql: operation.to_string(),
                },
            };
            vec![converted]
        }
        sql_ast::AlterTableOperation::ModifyColumn {
            col_name,
            data_type,
            options,
            ..
        } => vec![AlterOperation::RedefineColumn {
            from: ident(col_name),
            column: column_from_parts(col_name, data_type, options),
        }],
        sql_ast::AlterTableOperation::ChangeColumn {
            old_name,
            new_name,
            data_type,
            options,
            ..
        } => vec![AlterOperation::RedefineColumn {
            from: ident(old_name),
            column: column_from_parts(new_name, data_type, options),
        }],
        other => vec![rendered_operation(other.to_string())],
    }
}

fn drop_object(object_type: &sql_ast::ObjectType) -> DropObject {
    match object_type {
        sql_ast::ObjectType::Table => DropObject::Table,
        sql_ast::ObjectType::Schema => DropObject::Schema,
        sql_ast::ObjectType::Index => DropObject::Index,
        sql_ast::ObjectType::View => DropObject::View,
        other => DropObject::Other(other.to_string()),
    }
}

/// Column names assigned by an UPDATE target (`a` or `(a, b)`)
fn assignment_columns(target: &str) -> Vec<String> {
    target
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .filter_map(|column| column.trim().rsplit('.').next())
        .filter(|column| !column.is_empty())
        .map(normalize_ident)
        .collect()
}

fn convert_statement(stmt: sql_ast::Statement) -> StatementKind {
    match stmt {
        sql_ast::Statement::CreateTable(create) => StatementKind::CreateTable {
            table: object_name(&create.name),
            columns: create.columns.iter().map(column_def).collect(),
            if_not_exists: create.if_not_exists,
        },
        sql_ast::Statement::AlterTable {
            name, operations, ..
        } => StatementKind::AlterTable {
            table: object_name(&name),
            operations: operations.iter().flat_map(alter_operation).collect(),
        },
        sql_ast::Statement::Drop {
            object_type,
            if_exists,
            names,
            ..
        } => StatementKind::Drop {
            object: drop_object(&object_type),
            names: names.iter().map(object_name).collect(),
            if_exists,
        },
        sql_ast::Statement::CreateIndex(index) => StatementKind::CreateIndex {
            name: index.name.as_ref().map(object_name),
            table: object_name(&index.table_name),
            unique: index.unique,
            concurrently: index.concurrently,
        },
        sql_ast::Statement::Update {
            table,
            assignments,
            selection,
            ..
        } => StatementKind::Update {
            table: table_factor_name(&table.relation),
            columns: assignments
                .iter()
                .flat_map(|assignment| assignment_columns(&assignment.target.to_string()))
                .collect(),
            filtered: selection.is_some(),
        },
        sql_ast::Statement::Delete(delete) => {
            let tables = match &delete.from {
                sql_ast::FromTable::WithFromKeyword(tables)
                | sql_ast::FromTable::WithoutKeyword(tables) => tables,
            };
            StatementKind::Delete {
                table: tables
                    .first()
                    .map(|t| table_factor_name(&t.relation))
                    .unwrap_or_default(),
                filtered: delete.selection.is_some(),
            }
        }
        sql_ast::Statement::Truncate { table_names, .. } => StatementKind::Truncate {
            tables: table_names.iter().map(|t| object_name(&t.name)).collect(),
        },
        sql_ast::Statement::Insert(insert) => StatementKind::Insert {
            table: normalize_ident(&insert.table.to_string()),
        },
        other => StatementKind::Other {
            keyword: other
                .to_string()
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_uppercase(),
        },
    }
}
