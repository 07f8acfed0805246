//! Relationships inferred from matching column name, type and length against
//! single-column primary keys.

use std::collections::BTreeMap;

use crate::model::ident::normalize;
use crate::model::{ColumnId, ConstraintId, ConstraintKind, Database, ReferentialAction, TableId};

/// Name, type and length of a column, compared without case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct KeySignature {
    name: String,
    type_name: String,
    length: i32,
}

impl KeySignature {
    fn of(db: &Database, column: ColumnId) -> Self {
        let col = db.column(column);
        Self {
            name: col.name.to_lowercase(),
            type_name: col.type_name.to_lowercase(),
            length: col.length,
        }
    }
}

/// Link columns that look like foreign keys to the single-column primary key
/// with the same name, type and length in another of `tables`.
///
/// Columns already referencing something are skipped, as are columns whose
/// implied parents are disabled. When more primary keys collide on a
/// signature than there are distinct signatures, the schema most likely
/// names every key the same (`id`) and nothing is inferred. That threshold is
/// a heuristic; small schemas with a few genuine collisions can trip it.
///
/// Returns the new constraints in creation order. Running this again adds
/// nothing.
pub fn find_implied_constraints(db: &mut Database, tables: &[TableId]) -> Vec<ConstraintId> {
    let mut keyed: BTreeMap<KeySignature, ColumnId> = BTreeMap::new();
    let mut duplicates = 0usize;
    let mut candidates: Vec<ColumnId> = Vec::new();

    for &id in tables {
        let table = db.table(id);
        if let [pk] = table.primary_key() {
            let pk = table.column_id(*pk);
            if db.column(pk).allows_implied_children
                && keyed.insert(KeySignature::of(db, pk), pk).is_some()
            {
                duplicates += 1;
            }
        }
        for (pos, column) in table.columns().iter().enumerate() {
            if !column.is_foreign_key() && column.allows_implied_parents {
                candidates.push(table.column_id(pos));
            }
        }
    }

    if duplicates > keyed.len() {
        tracing::info!(
            "Not inferring relationships: {duplicates} primary keys share a name with {} others",
            keyed.len()
        );
        return Vec::new();
    }

    candidates.sort_by(|a, b| {
        let (ta, tb) = (db.table(a.table), db.table(b.table));
        normalize(&ta.name)
            .cmp(&normalize(&tb.name))
            .then_with(|| {
                normalize(&ta.column_at(a.index).name).cmp(&normalize(&tb.column_at(b.index).name))
            })
            .then(a.cmp(b))
    });

    let mut implied = Vec::new();
    for child in candidates {
        let Some(&parent) = keyed.get(&KeySignature::of(db, child)) else {
            continue;
        };
        if parent.table == child.table {
            continue;
        }
        // an edge either way between the two columns already relates them
        if db.column(parent).parent_constraint(child).is_some()
            || db.column(child).parent_constraint(parent).is_some()
        {
            continue;
        }

        let name = format!(
            "implied_{}_{}",
            db.table(child.table).name,
            db.column(child).name
        );
        tracing::debug!(
            "Implying {} -> {}",
            db.column_label(child),
            db.column_label(parent)
        );
        implied.push(db.add_foreign_key(
            &name,
            child,
            parent,
            ReferentialAction::NoAction,
            ReferentialAction::NoAction,
            ConstraintKind::Implied,
        ));
    }
    implied
}
