//! Referential-integrity ordering of tables.
//!
//! Tables are placed in rounds: every table whose remaining parents are all
//! placed becomes ready, and each round is placed in name order. When no
//! table is ready the remaining tables form a cycle. Implied dependencies
//! among them are dropped first, silently. If that isn't enough, one declared
//! dependency is severed and recorded as recursive.

use std::collections::HashMap;

use crate::model::{ConstraintId, Database, TableId};

/// The result of ordering: insertion order plus the constraints that had to
/// be severed to get there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableOrdering {
    /// Parents before children.
    pub insertion: Vec<TableId>,
    /// Severed constraints, in the order they were severed.
    pub recursive_constraints: Vec<ConstraintId>,
}

impl TableOrdering {
    pub fn insertion_order(&self) -> &[TableId] {
        &self.insertion
    }

    /// Children before parents: the exact reverse of the insertion order.
    pub fn deletion_order(&self) -> Vec<TableId> {
        self.insertion.iter().rev().copied().collect()
    }
}

#[derive(Debug, Clone)]
struct Dependency {
    child: usize,
    parent: usize,
    constraint: ConstraintId,
    name: String,
    implied: bool,
}

/// A disposable copy of the child-to-parent dependencies between a set of
/// tables. Ordering consumes it, so cycle breaking never touches the
/// [`Database`] it was built from.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    tables: Vec<TableId>,
    sort_keys: Vec<String>,
    dependencies: Vec<Dependency>,
}

impl DependencyGraph {
    /// Capture the still-linked constraints among `tables`, implied ones
    /// included.
    ///
    /// Self references never constrain the order and are left out.
    /// Constraints to tables outside the set (remote tables, views) are
    /// ignored.
    pub fn new(db: &Database, tables: &[TableId]) -> Self {
        let mut ids = tables.to_vec();
        ids.sort_by(|&a, &b| {
            db.table(a)
                .name
                .to_lowercase()
                .cmp(&db.table(b).name.to_lowercase())
                .then(a.cmp(&b))
        });
        ids.dedup();

        let position: HashMap<TableId, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let dependencies = db
            .constraints()
            .filter(|(id, c)| !c.is_self_referencing() && db.is_linked(*id))
            .filter_map(|(id, c)| {
                let child = *position.get(&c.child_table)?;
                let parent = *position.get(&c.parent_table)?;
                Some(Dependency {
                    child,
                    parent,
                    constraint: id,
                    name: c.name.clone(),
                    implied: c.is_implied(),
                })
            })
            .collect();

        Self {
            sort_keys: ids.iter().map(|&id| db.table(id).name.to_lowercase()).collect(),
            tables: ids,
            dependencies,
        }
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Order the tables, severing dependencies as needed to break cycles.
    ///
    /// On a deadlock every live implied dependency between unplaced tables
    /// is dropped without being reported. Only when no implied dependency is
    /// left is a declared one severed. The cycle victim is the remaining table with the most remaining
    /// children relative to remaining parents (ties by name); its parent
    /// dependency with the lowest constraint name is severed.
    pub fn order(self) -> TableOrdering {
        let n = self.tables.len();
        let mut placed = vec![false; n];
        let mut severed = vec![false; self.dependencies.len()];
        let mut ordering = TableOrdering {
            insertion: Vec::with_capacity(n),
            recursive_constraints: Vec::new(),
        };

        while ordering.insertion.len() < n {
            let mut parents = vec![0i64; n];
            let mut children = vec![0i64; n];
            for (i, dep) in self.dependencies.iter().enumerate() {
                if severed[i] || placed[dep.child] || placed[dep.parent] {
                    continue;
                }
                parents[dep.child] += 1;
                children[dep.parent] += 1;
            }

            // already in name order
            let ready: Vec<usize> = (0..n).filter(|&t| !placed[t] && parents[t] == 0).collect();
            if !ready.is_empty() {
                for t in ready {
                    placed[t] = true;
                    ordering.insertion.push(self.tables[t]);
                }
                continue;
            }

            let live = |i: usize, dep: &Dependency| {
                !severed[i] && !placed[dep.child] && !placed[dep.parent]
            };
            let implied: Vec<usize> = self
                .dependencies
                .iter()
                .enumerate()
                .filter(|&(i, dep)| dep.implied && live(i, dep))
                .map(|(i, _)| i)
                .collect();
            if !implied.is_empty() {
                tracing::debug!(
                    "Dropping {} implied dependencies to resolve a cycle",
                    implied.len()
                );
                for i in implied {
                    severed[i] = true;
                }
                continue;
            }

            let Some(victim) = (0..n).filter(|&t| !placed[t]).max_by(|&a, &b| {
                (children[a] - parents[a])
                    .cmp(&(children[b] - parents[b]))
                    .then_with(|| self.sort_keys[b].cmp(&self.sort_keys[a]))
                    .then_with(|| b.cmp(&a))
            }) else {
                break;
            };

            let edge = self
                .dependencies
                .iter()
                .enumerate()
                .filter(|(i, dep)| !severed[*i] && dep.child == victim && !placed[dep.parent])
                .min_by(|(_, a), (_, b)| a.name.cmp(&b.name).then(a.constraint.cmp(&b.constraint)))
                .map(|(i, _)| i);

            match edge {
                Some(i) => {
                    severed[i] = true;
                    tracing::warn!(
                        "Breaking dependency cycle by severing constraint {}",
                        self.dependencies[i].name
                    );
                    ordering.recursive_constraints.push(self.dependencies[i].constraint);
                }
                None => {
                    placed[victim] = true;
                    ordering.insertion.push(self.tables[victim]);
                }
            }
        }

        ordering
    }
}

/// Order the base tables of `db` without changing it.
pub fn order_tables(db: &Database) -> TableOrdering {
    DependencyGraph::new(db, &db.table_ids()).order()
}

/// Order the base tables of `db` and unlink every severed constraint from
/// the live graph, so that afterwards the columns no longer reference each
/// other through them. Use [`order_tables`] to keep the graph intact.
pub fn order_tables_by_ri(db: &mut Database) -> TableOrdering {
    let ordering = order_tables(db);
    for &constraint in &ordering.recursive_constraints {
        db.unlink_constraint(constraint);
    }
    ordering
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConstraintKind, ReferentialAction, Table, TableKind};
    use crate::testutil::{add_test_table, link};

    fn names(db: &Database, ids: &[TableId]) -> Vec<String> {
        ids.iter().map(|&id| db.table(id).name.clone()).collect()
    }

    /// Every surviving cross-table dependency points backwards in the order.
    fn assert_valid(db: &Database, ordering: &TableOrdering) {
        let index: HashMap<TableId, usize> = ordering
            .insertion
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i))
            .collect();
        for (id, c) in db.constraints() {
            if c.is_self_referencing() || ordering.recursive_constraints.contains(&id) {
                continue;
            }
            let (Some(child), Some(parent)) = (index.get(&c.child_table), index.get(&c.parent_table))
            else {
                continue;
            };
            assert!(parent < child, "{} must precede its child", db.table(c.parent_table).name);
        }
    }

    fn imply(db: &mut Database, child: TableId, child_col: &str, parent: TableId, parent_col: &str) {
        let child_pos = db.table(child).column_position(child_col).unwrap();
        let parent_pos = db.table(parent).column_position(parent_col).unwrap();
        let name = format!("implied_{}_{}", db.table(child).name, child_col);
        db.add_foreign_key(
            &name,
            db.table(child).column_id(child_pos),
            db.table(parent).column_id(parent_pos),
            ReferentialAction::NoAction,
            ReferentialAction::NoAction,
            ConstraintKind::Implied,
        );
    }

    fn chain() -> Database {
        let mut db = Database::new("shop", "public");
        let customer = add_test_table(&mut db, "Customer", &["id"], &["id"]);
        let order = add_test_table(&mut db, "Order", &["id", "customer_id"], &["id"]);
        let line_item = add_test_table(&mut db, "LineItem", &["id", "order_id"], &["id"]);
        link(&mut db, order, "customer_id", customer, "id");
        link(&mut db, line_item, "order_id", order, "id");
        db
    }

    fn cycle() -> Database {
        let mut db = Database::new("loop", "public");
        let a = add_test_table(&mut db, "A", &["id", "b_id"], &["id"]);
        let b = add_test_table(&mut db, "B", &["id", "c_id"], &["id"]);
        let c = add_test_table(&mut db, "C", &["id", "a_id"], &["id"]);
        link(&mut db, a, "b_id", b, "id");
        link(&mut db, b, "c_id", c, "id");
        link(&mut db, c, "a_id", a, "id");
        db
    }

    #[test]
    fn test_simple_chain() {
        let db = chain();
        let ordering = order_tables(&db);

        assert_eq!(names(&db, &ordering.insertion), vec!["Customer", "Order", "LineItem"]);
        assert_eq!(
            names(&db, &ordering.deletion_order()),
            vec!["LineItem", "Order", "Customer"]
        );
        assert!(ordering.recursive_constraints.is_empty());
        assert_valid(&db, &ordering);
    }

    #[test]
    fn test_deletion_is_reverse_of_insertion() {
        let db = cycle();
        let ordering = order_tables(&db);
        let mut reversed = ordering.insertion.clone();
        reversed.reverse();
        assert_eq!(ordering.deletion_order(), reversed);
    }

    #[test]
    fn test_three_table_cycle() {
        let db = cycle();
        let ordering = order_tables(&db);

        assert_eq!(ordering.insertion.len(), 3);
        let mut unique = ordering.insertion.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 3);

        // equal deltas everywhere, so the lexically first table gives way
        assert_eq!(names(&db, &ordering.insertion), vec!["A", "C", "B"]);
        let severed: Vec<_> = ordering
            .recursive_constraints
            .iter()
            .map(|&id| db.constraint(id).name.clone())
            .collect();
        assert_eq!(severed, vec!["fk_a_b_id"]);
        assert_valid(&db, &ordering);
    }

    #[test]
    fn test_self_reference_does_not_block() {
        let mut db = Database::new("hr", "public");
        let department = add_test_table(&mut db, "Department", &["id"], &["id"]);
        let employee = add_test_table(&mut db, "Employee", &["id", "manager_id", "dept_id"], &["id"]);
        link(&mut db, employee, "manager_id", employee, "id");
        link(&mut db, employee, "dept_id", department, "id");

        let ordering = order_tables(&db);
        assert_eq!(names(&db, &ordering.insertion), vec!["Department", "Employee"]);
        assert!(ordering.recursive_constraints.is_empty());
    }

    #[test]
    fn test_ordering_is_deterministic() {
        let build = || {
            let mut db = cycle();
            let d = add_test_table(&mut db, "D", &["id", "a_id", "c_id"], &["id"]);
            let a = db.find_table("A").unwrap();
            let c = db.find_table("C").unwrap();
            link(&mut db, d, "a_id", a, "id");
            link(&mut db, d, "c_id", c, "id");
            db
        };
        let first = order_tables(&build());
        for _ in 0..5 {
            assert_eq!(order_tables(&build()), first);
        }
        assert_valid(&build(), &first);
    }

    #[test]
    fn test_mutating_order_unlinks_severed_constraints() {
        let mut db = cycle();
        let ordering = order_tables_by_ri(&mut db);

        assert_eq!(ordering.recursive_constraints.len(), 1);
        let severed = ordering.recursive_constraints[0];
        assert!(!db.is_linked(severed));
        // the constraint itself remains reportable
        assert_eq!(db.constraint(severed).name, "fk_a_b_id");

        // a second pass sees no cycle left
        let again = order_tables_by_ri(&mut db);
        assert!(again.recursive_constraints.is_empty());
        assert_eq!(again.insertion, ordering.insertion);
    }

    #[test]
    fn test_non_mutating_order_keeps_links() {
        let db = cycle();
        let ordering = order_tables(&db);
        assert!(db.is_linked(ordering.recursive_constraints[0]));
    }

    #[test]
    fn test_implied_parent_is_placed_first() {
        let mut db = Database::new("shop", "public");
        let customer = add_test_table(&mut db, "customer", &["customer_id"], &["customer_id"]);
        let orders = add_test_table(&mut db, "a_orders", &["order_id", "customer_id"], &["order_id"]);
        imply(&mut db, orders, "customer_id", customer, "customer_id");

        let ordering = order_tables(&db);
        assert_eq!(names(&db, &ordering.insertion), vec!["customer", "a_orders"]);
        assert!(ordering.recursive_constraints.is_empty());
        assert_valid(&db, &ordering);
    }

    #[test]
    fn test_implied_cycle_is_dropped_without_reporting() {
        let mut db = Database::new("shop", "public");
        let a = add_test_table(&mut db, "a", &["id", "b_id"], &["id"]);
        let b = add_test_table(&mut db, "b", &["id", "a_id"], &["id"]);
        link(&mut db, a, "b_id", b, "id");
        imply(&mut db, b, "a_id", a, "id");

        let ordering = order_tables(&db);
        assert_eq!(names(&db, &ordering.insertion), vec!["b", "a"]);
        assert!(ordering.recursive_constraints.is_empty());
    }

    #[test]
    fn test_implied_edges_go_before_declared_ones() {
        let mut db = Database::new("loop", "public");
        let a = add_test_table(&mut db, "A", &["id", "b_id", "d_id"], &["id"]);
        let b = add_test_table(&mut db, "B", &["id", "c_id"], &["id"]);
        let c = add_test_table(&mut db, "C", &["id", "a_id"], &["id"]);
        let d = add_test_table(&mut db, "D", &["id", "a_id"], &["id"]);
        link(&mut db, a, "b_id", b, "id");
        link(&mut db, b, "c_id", c, "id");
        link(&mut db, c, "a_id", a, "id");
        link(&mut db, d, "a_id", a, "id");
        imply(&mut db, a, "d_id", d, "id");

        let ordering = order_tables(&db);
        let severed: Vec<_> = ordering
            .recursive_constraints
            .iter()
            .map(|&id| db.constraint(id).name.clone())
            .collect();
        // the implied A -> D edge goes silently, then one declared edge is cut
        assert_eq!(severed, vec!["fk_a_b_id"]);
        assert_eq!(names(&db, &ordering.insertion), vec!["A", "C", "D", "B"]);
    }

    #[test]
    fn test_remote_parents_are_ignored() {
        let mut db = Database::new("corp", "sales");
        let orders = add_test_table(&mut db, "orders", &["id", "employee_id"], &["id"]);
        let mut employees = Table::new("hr", "employees", TableKind::Table);
        employees.remote = true;
        employees.add_column(crate::testutil::test_column("id")).unwrap();
        let employees = db.add_table(employees);
        link(&mut db, orders, "employee_id", employees, "id");

        let ordering = order_tables(&db);
        assert_eq!(ordering.insertion, vec![orders]);
    }

    #[test]
    fn test_mutual_pair_with_two_constraints() {
        let mut db = Database::new("loop", "public");
        let a = add_test_table(&mut db, "a", &["id", "b1", "b2"], &["id"]);
        let b = add_test_table(&mut db, "b", &["id", "a_id"], &["id"]);
        link(&mut db, a, "b1", b, "id");
        link(&mut db, a, "b2", b, "id");
        link(&mut db, b, "a_id", a, "id");

        let ordering = order_tables(&db);
        assert_eq!(ordering.insertion.len(), 2);
        assert_valid(&db, &ordering);
    }

    #[test]
    fn test_empty_graph() {
        let db = Database::new("empty", "public");
        let graph = DependencyGraph::new(&db, &db.table_ids());
        assert!(graph.is_empty());
        assert_eq!(graph.order(), TableOrdering::default());
    }
}
