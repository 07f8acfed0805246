use std::collections::HashMap;

use super::{ColumnId, ConstraintId};
use crate::schema::ColumnMeta;

/// One end of a foreign-key edge as seen from a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub constraint: ConstraintId,
    pub implied: bool,
}

/// A column of a table, together with its foreign-key links.
///
/// `parents` maps each referenced column to the constraint doing the
/// referencing; `children` maps each referencing column to its constraint.
/// Every entry has a mirror on the other endpoint, maintained by
/// [`Database`](super::Database).
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub type_name: String,
    pub length: i32,
    pub decimal_digits: Option<i32>,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub auto_increment: bool,
    pub comment: Option<String>,
    /// Hidden from diagrams that show indirect relationships.
    pub excluded: bool,
    /// Hidden from every diagram.
    pub all_excluded: bool,
    pub allows_implied_parents: bool,
    pub allows_implied_children: bool,
    pub(crate) primary: bool,
    parents: HashMap<ColumnId, Link>,
    children: HashMap<ColumnId, Link>,
}

impl Column {
    pub fn new(name: &str, type_name: &str, length: i32) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            length,
            decimal_digits: None,
            nullable: true,
            default_value: None,
            auto_increment: false,
            comment: None,
            excluded: false,
            all_excluded: false,
            allows_implied_parents: true,
            allows_implied_children: true,
            primary: false,
            parents: HashMap::new(),
            children: HashMap::new(),
        }
    }

    pub fn from_meta(meta: ColumnMeta) -> Self {
        Self {
            decimal_digits: meta.decimal_digits,
            nullable: meta.is_nullable,
            default_value: meta.default_value,
            auto_increment: meta.is_auto_increment,
            comment: meta.comment,
            ..Column::new(&meta.name, &meta.type_name, meta.length)
        }
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary
    }

    pub fn is_foreign_key(&self) -> bool {
        !self.parents.is_empty()
    }

    /// True if any declared (non-implied) foreign key references or is
    /// referenced by this column.
    pub fn has_real_links(&self) -> bool {
        self.parents.values().chain(self.children.values()).any(|l| !l.implied)
    }

    pub fn parents(&self) -> &HashMap<ColumnId, Link> {
        &self.parents
    }

    pub fn children(&self) -> &HashMap<ColumnId, Link> {
        &self.children
    }

    /// The constraint through which this column references `parent`.
    pub fn parent_constraint(&self, parent: ColumnId) -> Option<ConstraintId> {
        self.parents.get(&parent).map(|l| l.constraint)
    }

    /// The constraint through which `child` references this column.
    pub fn child_constraint(&self, child: ColumnId) -> Option<ConstraintId> {
        self.children.get(&child).map(|l| l.constraint)
    }

    pub(crate) fn add_parent(&mut self, parent: ColumnId, link: Link) {
        self.parents.insert(parent, link);
    }

    pub(crate) fn add_child(&mut self, child: ColumnId, link: Link) {
        self.children.insert(child, link);
    }

    pub(crate) fn remove_parent(&mut self, parent: ColumnId) -> Option<Link> {
        self.parents.remove(&parent)
    }

    pub(crate) fn remove_child(&mut self, child: ColumnId) -> Option<Link> {
        self.children.remove(&child)
    }
}
