use std::collections::BTreeSet;

use super::column::Column;
use super::ident::IdentMap;
use super::index::TableIndex;
use super::{ColumnId, ConstraintId, TableId};
use crate::error::SchemaLinkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Table,
    View,
}

#[derive(Debug, Clone)]
pub struct CheckConstraint {
    pub name: String,
    pub definition: String,
}

/// A table or view: the node type of the schema graph.
///
/// Columns are kept in ordinal order and looked up by name without regard to
/// case; a table never holds two columns whose names differ only in case.
#[derive(Debug, Clone)]
pub struct Table {
    pub(crate) id: TableId,
    pub schema: String,
    pub name: String,
    pub kind: TableKind,
    /// Lives outside the schema under analysis; only columns and primary key
    /// are known.
    pub remote: bool,
    pub comment: Option<String>,
    pub view_definition: Option<String>,
    row_count: Option<u64>,
    columns: Vec<Column>,
    column_index: IdentMap<usize>,
    primary_key: Vec<usize>,
    indexes: IdentMap<TableIndex>,
    check_constraints: IdentMap<CheckConstraint>,
    foreign_keys: IdentMap<ConstraintId>,
}

impl Table {
    pub fn new(schema: &str, name: &str, kind: TableKind) -> Self {
        Self {
            id: TableId(0),
            schema: schema.to_string(),
            name: name.to_string(),
            kind,
            remote: false,
            comment: None,
            view_definition: None,
            row_count: None,
            columns: Vec::new(),
            column_index: IdentMap::new(),
            primary_key: Vec::new(),
            indexes: IdentMap::new(),
            check_constraints: IdentMap::new(),
            foreign_keys: IdentMap::new(),
        }
    }

    /// Arena id, assigned when the table is added to a [`Database`](super::Database).
    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    pub fn is_view(&self) -> bool {
        self.kind == TableKind::View
    }

    pub fn is_remote(&self) -> bool {
        self.remote
    }

    /// Append a column. Fails if a column with the same name (ignoring case)
    /// already exists.
    pub fn add_column(&mut self, column: Column) -> Result<usize, SchemaLinkError> {
        if self.column_index.contains_key(&column.name) {
            return Err(SchemaLinkError::DuplicateColumn {
                table: self.full_name(),
                column: column.name,
            });
        }
        let position = self.columns.len();
        self.column_index.insert(&column.name, position);
        self.columns.push(column);
        Ok(position)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.column_position(name).map(|i| &self.columns[i])
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.column_index.get(name).copied()
    }

    pub fn column_at(&self, position: usize) -> &Column {
        &self.columns[position]
    }

    pub(crate) fn column_at_mut(&mut self, position: usize) -> &mut Column {
        &mut self.columns[position]
    }

    pub fn column_id(&self, position: usize) -> ColumnId {
        ColumnId {
            table: self.id,
            index: position,
        }
    }

    /// Replace the primary key with the columns at `positions`, in key order.
    pub fn set_primary_key(&mut self, positions: Vec<usize>) {
        for col in &mut self.columns {
            col.primary = false;
        }
        for &p in &positions {
            self.columns[p].primary = true;
        }
        self.primary_key = positions;
    }

    pub fn primary_key(&self) -> &[usize] {
        &self.primary_key
    }

    pub fn primary_columns(&self) -> impl Iterator<Item = &Column> {
        self.primary_key.iter().map(|&p| &self.columns[p])
    }

    pub fn add_index(&mut self, index: TableIndex) {
        let name = index.name.clone();
        self.indexes.insert(&name, index);
    }

    pub fn index(&self, name: &str) -> Option<&TableIndex> {
        self.indexes.get(name)
    }

    /// Indexes in listing order (primary key first).
    pub fn indexes(&self) -> Vec<&TableIndex> {
        let mut indexes: Vec<&TableIndex> = self.indexes.values().collect();
        indexes.sort_by(|a, b| a.display_cmp(b));
        indexes
    }

    pub fn add_check_constraint(&mut self, name: &str, definition: &str) {
        self.check_constraints.insert(
            name,
            CheckConstraint {
                name: name.to_string(),
                definition: definition.to_string(),
            },
        );
    }

    pub fn check_constraints(&self) -> impl Iterator<Item = &CheckConstraint> {
        self.check_constraints.values()
    }

    pub(crate) fn register_foreign_key(&mut self, name: &str, constraint: ConstraintId) {
        self.foreign_keys.insert(name, constraint);
    }

    pub fn foreign_key(&self, name: &str) -> Option<ConstraintId> {
        self.foreign_keys.get(name).copied()
    }

    /// Constraints owned by this table as the child, ordered by name.
    pub fn foreign_keys(&self) -> impl Iterator<Item = ConstraintId> + '_ {
        self.foreign_keys.values().copied()
    }

    /// Row count, `None` when unknown. Views always report zero.
    pub fn row_count(&self) -> Option<u64> {
        if self.is_view() {
            Some(0)
        } else {
            self.row_count
        }
    }

    pub fn set_row_count(&mut self, rows: Option<u64>) {
        self.row_count = rows;
    }

    /// True if the column is the sole primary-key column or is covered by a
    /// single-column unique index.
    pub fn is_column_unique(&self, position: usize) -> bool {
        if self.primary_key == [position] {
            return true;
        }
        self.indexes
            .values()
            .any(|idx| idx.is_unique && idx.is_single_column() && idx.covers_column(position))
    }

    /// Number of distinct constraints through which this table references others.
    pub fn num_parents(&self, include_implied: bool) -> usize {
        self.distinct_constraints(include_implied, |c| c.parents().values())
    }

    /// Number of distinct constraints through which others reference this table.
    pub fn num_children(&self, include_implied: bool) -> usize {
        self.distinct_constraints(include_implied, |c| c.children().values())
    }

    fn distinct_constraints<'a, F, I>(&'a self, include_implied: bool, links: F) -> usize
    where
        F: Fn(&'a Column) -> I,
        I: Iterator<Item = &'a super::Link>,
    {
        self.columns
            .iter()
            .flat_map(links)
            .filter(|l| include_implied || !l.implied)
            .map(|l| l.constraint)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// No column references another column.
    pub fn is_root(&self) -> bool {
        self.columns.iter().all(|c| !c.is_foreign_key())
    }

    /// No column is referenced by another column.
    pub fn is_leaf(&self) -> bool {
        self.columns.iter().all(|c| c.children().is_empty())
    }

    /// A table with no relationships at all. When `include_implied` is false,
    /// implied relationships are ignored.
    pub fn is_orphan(&self, include_implied: bool) -> bool {
        if include_implied {
            self.is_root() && self.is_leaf()
        } else {
            self.columns.iter().all(|c| !c.has_real_links())
        }
    }

    /// A constraint whose parent is this same table, if any.
    pub fn self_referencing_constraint(&self) -> Option<ConstraintId> {
        let mut found: Vec<ConstraintId> = self
            .columns
            .iter()
            .flat_map(|c| c.parents().iter())
            .filter(|(parent, _)| parent.table == self.id)
            .map(|(_, link)| link.constraint)
            .collect();
        found.sort();
        found.into_iter().next()
    }
}
