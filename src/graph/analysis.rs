//! Read-only checks for common schema smells.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{ColumnId, Database, TableId};

static NUMBERED_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?[^0-9])[0-9]+$").expect("numbered column pattern is valid")
});

/// Everything suspicious found in one schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Anomalies {
    /// Tables without any relationship, implied ones ignored.
    pub orphans: Vec<TableId>,
    pub without_indexes: Vec<TableId>,
    pub single_column: Vec<TableId>,
    /// Nullable columns that are nevertheless required to be unique.
    pub unique_nullable: Vec<ColumnId>,
    /// Columns that default to the string `'NULL'` rather than to null.
    pub default_null_string: Vec<ColumnId>,
    /// Tables with column runs like `phone1`, `phone2`.
    pub incrementing_columns: Vec<TableId>,
}

impl Anomalies {
    pub fn is_empty(&self) -> bool {
        *self == Anomalies::default()
    }
}

pub fn analyze(db: &Database) -> Anomalies {
    Anomalies {
        orphans: orphan_tables(db, false),
        without_indexes: tables_without_indexes(db),
        single_column: single_column_tables(db),
        unique_nullable: unique_nullable_columns(db),
        default_null_string: default_null_string_columns(db),
        incrementing_columns: tables_with_incrementing_columns(db),
    }
}

pub fn orphan_tables(db: &Database, include_implied: bool) -> Vec<TableId> {
    db.tables()
        .filter(|t| t.is_orphan(include_implied))
        .map(|t| t.id())
        .collect()
}

pub fn tables_without_indexes(db: &Database) -> Vec<TableId> {
    db.tables()
        .filter(|t| t.indexes().is_empty())
        .map(|t| t.id())
        .collect()
}

pub fn single_column_tables(db: &Database) -> Vec<TableId> {
    db.tables()
        .filter(|t| t.columns().len() == 1)
        .map(|t| t.id())
        .collect()
}

pub fn unique_nullable_columns(db: &Database) -> Vec<ColumnId> {
    let mut found = Vec::new();
    for table in db.tables() {
        for (pos, column) in table.columns().iter().enumerate() {
            if column.nullable && table.is_column_unique(pos) {
                found.push(table.column_id(pos));
            }
        }
    }
    found
}

pub fn default_null_string_columns(db: &Database) -> Vec<ColumnId> {
    let mut found = Vec::new();
    for table in db.tables() {
        for (pos, column) in table.columns().iter().enumerate() {
            if column.default_value.as_deref().is_some_and(is_null_string) {
                found.push(table.column_id(pos));
            }
        }
    }
    found
}

/// `'NULL'`, `('null')` or `'NULL'::character varying`.
fn is_null_string(default: &str) -> bool {
    let literal = default.split("::").next().unwrap_or_default();
    let literal = literal.trim().trim_start_matches('(').trim_end_matches(')');
    literal.eq_ignore_ascii_case("'null'")
}

pub fn tables_with_incrementing_columns(db: &Database) -> Vec<TableId> {
    db.tables()
        .filter(|table| {
            let mut runs: BTreeMap<String, usize> = BTreeMap::new();
            for column in table.columns() {
                if let Some(caps) = NUMBERED_COLUMN.captures(&column.name) {
                    *runs.entry(caps[1].to_lowercase()).or_default() += 1;
                }
            }
            runs.values().any(|&n| n > 1)
        })
        .map(|t| t.id())
        .collect()
}
