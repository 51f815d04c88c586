//! Risk analyzer
//!
//! Classifies each change of a migration file as safe, locking, backward
//! incompatible, data-dependent or destructive. The analyzer sees the schema
//! as it was before the file (through the catalog) plus everything earlier in
//! the same file: a table created a few statements above is empty, so
//! dropping or constraining it is safe, and an UPDATE of a column backfills
//! it for a later SET NOT NULL.

use std::collections::{HashMap, HashSet};

use super::catalog::Catalog;
use crate::domain::{Change, ChangeKind, ConstraintKind, Dialect, RiskLevel, Rule};

/// Outcome of assessing one change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub risk: RiskLevel,
    /// Rule that fired; `None` for safe changes
    pub rule: Option<Rule>,
    pub message: String,
}

impl Assessment {
    fn safe() -> Self {
        Self {
            risk: RiskLevel::Safe,
            rule: None,
            message: String::new(),
        }
    }

    fn flagged(risk: RiskLevel, rule: Rule, message: String) -> Self {
        Self {
            risk,
            rule: Some(rule),
            message,
        }
    }
}

type ColumnKey = (String, String);

fn key(table: &str, column: &str) -> ColumnKey {
    (table.to_string(), column.to_string())
}

fn rename_table(key: ColumnKey, from: &str, to: &str) -> ColumnKey {
    if key.0 == from {
        (to.to_string(), key.1)
    } else {
        key
    }
}

/// Per-file risk analyzer
pub struct RiskAnalyzer {
    dialect: Dialect,
    /// Schema as of the current statement
    schema: Catalog,
    /// Tables created earlier in this file
    created_tables: HashSet<String>,
    /// Columns added earlier in this file, with whether they had a default
    added_columns: HashMap<ColumnKey, bool>,
    /// Columns assigned by an UPDATE earlier in this file
    backfilled: HashSet<ColumnKey>,
}

impl RiskAnalyzer {
    /// Start analyzing a file whose preceding schema is `catalog`
    pub fn new(catalog: &Catalog, dialect: Dialect) -> Self {
        Self {
            dialect,
            schema: catalog.clone(),
            created_tables: HashSet::new(),
            added_columns: HashMap::new(),
            backfilled: HashSet::new(),
        }
    }

    /// Risk of a change given everything observed so far
    pub fn classify(&self, change: &Change) -> RiskLevel {
        self.assess(change).risk
    }

    fn created(&self, table: &str) -> bool {
        self.created_tables.contains(table)
    }

    fn added(&self, table: &str, column: &str) -> bool {
        self.added_columns.contains_key(&key(table, column))
    }

    fn not_null_is_safe(&self, table: &str, column: &str) -> bool {
        self.created(table)
            || self.backfilled.contains(&key(table, column))
            || self.added_columns.get(&key(table, column)) == Some(&true)
            || self
                .schema
                .column(table, column)
                .map(|state| !state.nullable)
                .unwrap_or(false)
    }

    /// Assess a change given everything observed so far
    pub fn assess(&self, change: &Change) -> Assessment {
        let table = change.object.as_str();

        match &change.kind {
            ChangeKind::DropSchema => Assessment::flagged(
                RiskLevel::Destructive,
                Rule::DS101,
                format!("Dropping schema \"{}\" and every object in it", table),
            ),
            ChangeKind::DropTable if !self.created(table) => Assessment::flagged(
                RiskLevel::Destructive,
                Rule::DS102,
                format!("Dropping table \"{}\"", table),
            ),
            ChangeKind::DropColumn { column }
                if !self.created(table) && !self.added(table, column) =>
            {
                Assessment::flagged(
                    RiskLevel::Destructive,
                    Rule::DS103,
                    format!("Dropping column \"{}\" of table \"{}\"", column, table),
                )
            }
            ChangeKind::DeleteRows { filtered: false } if !self.created(table) => {
                Assessment::flagged(
                    RiskLevel::Destructive,
                    Rule::DS104,
                    format!("Deleting all rows of table \"{}\" (DELETE without WHERE)", table),
                )
            }
            ChangeKind::Truncate if !self.created(table) => Assessment::flagged(
                RiskLevel::Destructive,
                Rule::DS104,
                format!("Truncating table \"{}\" removes all of its rows", table),
            ),
            ChangeKind::SetNotNull { column } if !self.not_null_is_safe(table, column) => {
                Assessment::flagged(
                    RiskLevel::DataDependent,
                    Rule::MF102,
                    format!(
                        "Modifying nullable column \"{}\" of table \"{}\" to non-nullable \
                         might fail in case it contains NULL values",
                        column, table
                    ),
                )
            }
            ChangeKind::AddColumn { column }
                if !column.nullable && !column.has_default && !self.created(table) =>
            {
                Assessment::flagged(
                    RiskLevel::DataDependent,
                    Rule::MF103,
                    format!(
                        "Adding a non-nullable \"{}\" column \"{}\" without a default value \
                         will fail in case table \"{}\" is not empty",
                        column.data_type, column.name, table
                    ),
                )
            }
            ChangeKind::ChangeColumnType { column, data_type }
                if !self.created(table) && !self.added(table, column) =>
            {
                let unchanged = self
                    .schema
                    .column(table, column)
                    .map(|state| state.data_type.eq_ignore_ascii_case(data_type))
                    .unwrap_or(false);
                if unchanged {
                    return Assessment::safe();
                }
                Assessment::flagged(
                    RiskLevel::DataDependent,
                    Rule::MF104,
                    format!(
                        "Changing the type of column \"{}\" of table \"{}\" to {} \
                         might fail for existing rows",
                        column, table, data_type
                    ),
                )
            }
            ChangeKind::CreateIndex {
                name,
                unique,
                concurrently,
            } if !self.created(table) => {
                let name = name.as_deref().unwrap_or("<unnamed>");
                if *unique {
                    Assessment::flagged(
                        RiskLevel::DataDependent,
                        Rule::MF101,
                        format!(
                            "Adding unique index \"{}\" on table \"{}\" might fail in case \
                             the indexed columns contain duplicates",
                            name, table
                        ),
                    )
                } else if self.dialect == Dialect::Postgres && !concurrently {
                    Assessment::flagged(
                        RiskLevel::Locking,
                        Rule::PG101,
                        format!(
                            "Creating index \"{}\" non-concurrently blocks writes to table \
                             \"{}\" until it completes; use CREATE INDEX CONCURRENTLY",
                            name, table
                        ),
                    )
                } else {
                    Assessment::safe()
                }
            }
            ChangeKind::AddConstraint {
                kind,
                name,
                not_valid,
            } if !self.created(table) => {
                let name = name.as_deref().unwrap_or("<unnamed>");
                match kind {
                    ConstraintKind::Unique | ConstraintKind::PrimaryKey => Assessment::flagged(
                        RiskLevel::DataDependent,
                        Rule::MF101,
                        format!(
                            "Adding unique constraint \"{}\" on table \"{}\" might fail in \
                             case the columns contain duplicates",
                            name, table
                        ),
                    ),
                    ConstraintKind::Check | ConstraintKind::ForeignKey if !not_valid => {
                        Assessment::flagged(
                            RiskLevel::DataDependent,
                            Rule::MF105,
                            format!(
                                "Adding constraint \"{}\" validates every existing row of \
                                 table \"{}\" and might fail; add it NOT VALID and validate \
                                 it separately",
                                name, table
                            ),
                        )
                    }
                    _ => Assessment::safe(),
                }
            }
            ChangeKind::RenameTable { to } if !self.created(table) => Assessment::flagged(
                RiskLevel::BackwardIncompatible,
                Rule::BC101,
                format!(
                    "Renaming table \"{}\" to \"{}\" breaks code still using the old name",
                    table, to
                ),
            ),
            ChangeKind::RenameColumn { from, to }
                if !self.created(table) && !self.added(table, from) =>
            {
                Assessment::flagged(
                    RiskLevel::BackwardIncompatible,
                    Rule::BC102,
                    format!(
                        "Renaming column \"{}\" of table \"{}\" to \"{}\" breaks code still \
                         using the old name",
                        from, table, to
                    ),
                )
            }
            ChangeKind::Unparsed { error } => Assessment::flagged(
                RiskLevel::Unknown,
                Rule::SQ100,
                format!("Statement could not be parsed and was not analyzed: {}", error),
            ),
            _ => Assessment::safe(),
        }
    }

    /// Record a change so later statements of the same file see it
    pub fn observe(&mut self, change: &Change) {
        let table = change.object.as_str();

        match &change.kind {
            ChangeKind::CreateTable { .. } => {
                self.created_tables.insert(table.to_string());
            }
            ChangeKind::DropTable => {
                self.created_tables.remove(table);
            }
            ChangeKind::RenameTable { to } => {
                if self.created_tables.remove(table) {
                    self.created_tables.insert(to.clone());
                }
                self.added_columns = std::mem::take(&mut self.added_columns)
                    .into_iter()
                    .map(|(k, default)| (rename_table(k, table, to), default))
                    .collect();
                self.backfilled = std::mem::take(&mut self.backfilled)
                    .into_iter()
                    .map(|k| rename_table(k, table, to))
                    .collect();
            }
            ChangeKind::RenameColumn { from, to } => {
                if let Some(default) = self.added_columns.remove(&key(table, from)) {
                    self.added_columns.insert(key(table, to), default);
                }
                if self.backfilled.remove(&key(table, from)) {
                    self.backfilled.insert(key(table, to));
                }
            }
            ChangeKind::AddColumn { column } => {
                self.added_columns
                    .insert(key(table, &column.name), column.has_default);
            }
            ChangeKind::Backfill { column } => {
                self.backfilled.insert(key(table, column));
            }
            _ => {}
        }

        self.schema.apply(change);
    }
}
