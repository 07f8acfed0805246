use std::collections::BTreeSet;

use chrono::{DateTime, Local};

use super::column::{Column, Link};
use super::constraint::{ConstraintKind, ForeignKeyConstraint, ReferentialAction};
use super::ident::IdentMap;
use super::routine::Routine;
use super::table::{Table, TableKind};
use super::{ColumnId, ConstraintId, TableId};

/// The aggregate root: every table, view, remote table, routine and
/// foreign-key constraint discovered for one schema.
///
/// Tables and constraints live in arenas addressed by [`TableId`] and
/// [`ConstraintId`]; the name registries are case-insensitive.
#[derive(Debug, Clone)]
pub struct Database {
    pub name: String,
    pub schema: String,
    pub generated_at: DateTime<Local>,
    entities: Vec<Table>,
    constraints: Vec<ForeignKeyConstraint>,
    tables: IdentMap<TableId>,
    views: IdentMap<TableId>,
    remote_tables: IdentMap<TableId>,
    procedures: IdentMap<Routine>,
    functions: IdentMap<Routine>,
    keywords: BTreeSet<String>,
}

impl Database {
    pub fn new(name: &str, schema: &str) -> Self {
        Self {
            name: name.to_string(),
            schema: schema.to_string(),
            generated_at: Local::now(),
            entities: Vec::new(),
            constraints: Vec::new(),
            tables: IdentMap::new(),
            views: IdentMap::new(),
            remote_tables: IdentMap::new(),
            procedures: IdentMap::new(),
            functions: IdentMap::new(),
            keywords: BTreeSet::new(),
        }
    }

    /// Add a table, view or remote table and return its id. Remote tables
    /// are registered under `schema.name`, everything else under its name.
    pub fn add_table(&mut self, mut table: Table) -> TableId {
        let id = TableId(self.entities.len());
        table.id = id;
        if table.remote {
            self.remote_tables.insert(&table.full_name(), id);
        } else if table.kind == TableKind::View {
            self.views.insert(&table.name, id);
        } else {
            self.tables.insert(&table.name, id);
        }
        self.entities.push(table);
        id
    }

    pub fn table(&self, id: TableId) -> &Table {
        &self.entities[id.0]
    }

    pub fn table_mut(&mut self, id: TableId) -> &mut Table {
        &mut self.entities[id.0]
    }

    pub fn column(&self, id: ColumnId) -> &Column {
        self.table(id.table).column_at(id.index)
    }

    fn column_mut(&mut self, id: ColumnId) -> &mut Column {
        self.entities[id.table.0].column_at_mut(id.index)
    }

    /// `table.column` label for diagnostics and reports.
    pub fn column_label(&self, id: ColumnId) -> String {
        let table = self.table(id.table);
        format!("{}.{}", table.name, table.column_at(id.index).name)
    }

    pub fn find_table(&self, name: &str) -> Option<TableId> {
        self.tables.get(name).copied()
    }

    pub fn find_view(&self, name: &str) -> Option<TableId> {
        self.views.get(name).copied()
    }

    pub fn find_remote_table(&self, schema: &str, name: &str) -> Option<TableId> {
        self.remote_tables.get(&format!("{schema}.{name}")).copied()
    }

    /// Base-schema tables in name order.
    pub fn table_ids(&self) -> Vec<TableId> {
        self.tables.values().copied().collect()
    }

    /// Views in name order.
    pub fn view_ids(&self) -> Vec<TableId> {
        self.views.values().copied().collect()
    }

    /// Remote tables in `schema.name` order.
    pub fn remote_table_ids(&self) -> Vec<TableId> {
        self.remote_tables.values().copied().collect()
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values().map(|&id| self.table(id))
    }

    pub fn views(&self) -> impl Iterator<Item = &Table> {
        self.views.values().map(|&id| self.table(id))
    }

    pub fn remote_tables(&self) -> impl Iterator<Item = &Table> {
        self.remote_tables.values().map(|&id| self.table(id))
    }

    /// True when the schema produced neither tables nor views.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.views.is_empty()
    }

    pub fn constraint(&self, id: ConstraintId) -> &ForeignKeyConstraint {
        &self.constraints[id.0]
    }

    /// Every constraint in creation order.
    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintId, &ForeignKeyConstraint)> {
        self.constraints
            .iter()
            .enumerate()
            .map(|(i, c)| (ConstraintId(i), c))
    }

    pub fn implied_constraints(&self) -> impl Iterator<Item = (ConstraintId, &ForeignKeyConstraint)> {
        self.constraints().filter(|(_, c)| c.is_implied())
    }

    /// Add one `child -> parent` column pair to the constraint named `name`
    /// on the child's table, creating the constraint on first use, and link
    /// both columns to it.
    ///
    /// This is the only way constraints come into existence, so a constraint
    /// is never observable without its column links.
    #[allow(clippy::too_many_arguments)]
    pub fn add_foreign_key(
        &mut self,
        name: &str,
        child: ColumnId,
        parent: ColumnId,
        update_rule: ReferentialAction,
        delete_rule: ReferentialAction,
        kind: ConstraintKind,
    ) -> ConstraintId {
        let id = match self.table(child.table).foreign_key(name) {
            Some(id) => id,
            None => {
                let id = ConstraintId(self.constraints.len());
                self.constraints.push(ForeignKeyConstraint::new(
                    name,
                    child.table,
                    parent.table,
                    update_rule,
                    delete_rule,
                    kind,
                ));
                self.table_mut(child.table).register_foreign_key(name, id);
                id
            }
        };

        let constraint = &mut self.constraints[id.0];
        constraint.push_pair(child, parent);
        let link = Link {
            constraint: id,
            implied: constraint.is_implied(),
        };
        self.column_mut(child).add_parent(parent, link);
        self.column_mut(parent).add_child(child, link);
        id
    }

    /// Remove every column link of a constraint. The constraint itself stays
    /// in the arena so it can still be reported.
    pub fn unlink_constraint(&mut self, id: ConstraintId) {
        let pairs: Vec<(ColumnId, ColumnId)> = self.constraint(id).pairs().collect();
        for (child, parent) in pairs {
            self.column_mut(child).remove_parent(parent);
            self.column_mut(parent).remove_child(child);
        }
    }

    /// True while at least one column pair of the constraint is still linked.
    pub fn is_linked(&self, id: ConstraintId) -> bool {
        self.constraint(id)
            .pairs()
            .any(|(child, parent)| self.column(child).parent_constraint(parent) == Some(id))
    }

    pub fn set_keywords<I: IntoIterator<Item = String>>(&mut self, keywords: I) {
        self.keywords = keywords.into_iter().map(|k| k.to_uppercase()).collect();
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords.contains(&word.to_uppercase())
    }

    pub fn keywords(&self) -> &BTreeSet<String> {
        &self.keywords
    }

    pub fn add_routine(&mut self, routine: Routine) {
        let name = routine.name.clone();
        if routine.is_procedure() {
            self.procedures.insert(&name, routine);
        } else {
            self.functions.insert(&name, routine);
        }
    }

    pub fn procedures(&self) -> impl Iterator<Item = &Routine> {
        self.procedures.values()
    }

    pub fn functions(&self) -> impl Iterator<Item = &Routine> {
        self.functions.values()
    }
}
