//! Rails-style conventions: a column `<singular>_id` references the `id`
//! column of the table named `<plural>`.

use std::collections::BTreeMap;

use heck::ToSnakeCase;
use inflector::Inflector;

use crate::model::{ConstraintId, ConstraintKind, Database, ReferentialAction, TableId};

const ID_SUFFIX: &str = "_id";

/// Link every eligible `*_id` column of `tables` to the `id` column of the
/// pluralized table. Table names are compared in snake case, so
/// `LineItems` answers to `line_item_id`.
pub fn find_rails_constraints(db: &mut Database, tables: &[TableId]) -> Vec<ConstraintId> {
    let by_name: BTreeMap<String, TableId> = tables
        .iter()
        .map(|&id| (db.table(id).name.to_snake_case(), id))
        .collect();

    let mut pairs = Vec::new();
    for &id in tables {
        let table = db.table(id);
        for (pos, column) in table.columns().iter().enumerate() {
            let name = column.name.to_lowercase();
            if column.is_foreign_key() || !column.allows_implied_parents {
                continue;
            }
            let Some(singular) = name.strip_suffix(ID_SUFFIX).filter(|s| !s.is_empty()) else {
                continue;
            };
            let Some(&parent_table) = by_name.get(&singular.to_plural()) else {
                continue;
            };
            let parent = db.table(parent_table);
            let Some(parent_pos) = parent.column_position("id") else {
                continue;
            };
            pairs.push((table.column_id(pos), parent.column_id(parent_pos)));
        }
    }

    let mut found = Vec::with_capacity(pairs.len());
    for (child, parent) in pairs {
        if child == parent {
            continue;
        }
        let name = format!("rails_{}_{}", db.table(child.table).name, db.column(child).name);
        tracing::debug!(
            "Rails convention {} -> {}",
            db.column_label(child),
            db.column_label(parent)
        );
        found.push(db.add_foreign_key(
            &name,
            child,
            parent,
            ReferentialAction::NoAction,
            ReferentialAction::NoAction,
            ConstraintKind::Convention,
        ));
    }
    found
}
