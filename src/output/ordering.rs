use crate::graph::TableOrdering;
use crate::model::{Database, TableId};
use crate::output::Generator;

/// One `schema.table` per line, parents first.
pub struct InsertionOrderGenerator;

/// One `schema.table` per line, children first.
pub struct DeletionOrderGenerator;

impl Generator for InsertionOrderGenerator {
    fn generate(&self, db: &Database, ordering: &TableOrdering) -> String {
        render(db, ordering.insertion_order())
    }
}

impl Generator for DeletionOrderGenerator {
    fn generate(&self, db: &Database, ordering: &TableOrdering) -> String {
        render(db, &ordering.deletion_order())
    }
}

fn render(db: &Database, tables: &[TableId]) -> String {
    let mut output = String::new();
    for &id in tables {
        output.push_str(&db.table(id).full_name());
        output.push('\n');
    }
    output
}
