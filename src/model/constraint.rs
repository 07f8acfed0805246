use std::fmt;

use super::{ColumnId, TableId};

/// What happens to child rows when the referenced parent row changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferentialAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    /// Parse an information-schema rule name (`NO ACTION`, `SET_NULL`, ...).
    /// Unknown names map to `NoAction`.
    pub fn from_rule_name(rule: &str) -> Self {
        match rule.trim().replace('_', " ").to_uppercase().as_str() {
            "RESTRICT" => ReferentialAction::Restrict,
            "CASCADE" => ReferentialAction::Cascade,
            "SET NULL" => ReferentialAction::SetNull,
            "SET DEFAULT" => ReferentialAction::SetDefault,
            _ => ReferentialAction::NoAction,
        }
    }

    /// Parse a `pg_constraint.confupdtype`/`confdeltype` code.
    pub fn from_pg_code(code: &str) -> Self {
        match code {
            "r" => ReferentialAction::Restrict,
            "c" => ReferentialAction::Cascade,
            "n" => ReferentialAction::SetNull,
            "d" => ReferentialAction::SetDefault,
            _ => ReferentialAction::NoAction,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Where a constraint came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Declared in the database catalog.
    Declared,
    /// Inferred from matching name, type and size against a primary key.
    Implied,
    /// Inferred from the `<singular>_id` naming convention.
    Convention,
}

/// A foreign key from child columns in one table to parent columns in another
/// (or the same) table. Columns are paired by position.
#[derive(Debug, Clone)]
pub struct ForeignKeyConstraint {
    pub name: String,
    pub child_table: TableId,
    pub parent_table: TableId,
    pub update_rule: ReferentialAction,
    pub delete_rule: ReferentialAction,
    pub kind: ConstraintKind,
    child_columns: Vec<ColumnId>,
    parent_columns: Vec<ColumnId>,
}

impl ForeignKeyConstraint {
    pub(crate) fn new(
        name: &str,
        child_table: TableId,
        parent_table: TableId,
        update_rule: ReferentialAction,
        delete_rule: ReferentialAction,
        kind: ConstraintKind,
    ) -> Self {
        Self {
            name: name.to_string(),
            child_table,
            parent_table,
            update_rule,
            delete_rule,
            kind,
            child_columns: Vec::new(),
            parent_columns: Vec::new(),
        }
    }

    pub(crate) fn push_pair(&mut self, child: ColumnId, parent: ColumnId) {
        self.child_columns.push(child);
        self.parent_columns.push(parent);
    }

    pub fn child_columns(&self) -> &[ColumnId] {
        &self.child_columns
    }

    pub fn parent_columns(&self) -> &[ColumnId] {
        &self.parent_columns
    }

    /// `(child, parent)` column pairs in key order.
    pub fn pairs(&self) -> impl Iterator<Item = (ColumnId, ColumnId)> + '_ {
        self.child_columns
            .iter()
            .copied()
            .zip(self.parent_columns.iter().copied())
    }

    pub fn is_implied(&self) -> bool {
        self.kind != ConstraintKind::Declared
    }

    pub fn is_self_referencing(&self) -> bool {
        self.child_table == self.parent_table
    }

    pub fn is_cascade_on_delete(&self) -> bool {
        self.delete_rule == ReferentialAction::Cascade
    }

    pub fn is_null_on_delete(&self) -> bool {
        self.delete_rule == ReferentialAction::SetNull
    }

    pub fn is_restrict_delete(&self) -> bool {
        matches!(
            self.delete_rule,
            ReferentialAction::Restrict | ReferentialAction::NoAction
        )
    }
}
