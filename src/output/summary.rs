use crate::graph::{analyze, TableOrdering};
use crate::model::{ColumnId, ConstraintKind, Database, ForeignKeyConstraint, TableId};
use crate::output::Generator;

/// Plain-text overview: counts, insertion order, inferred and severed
/// relationships, anomalies.
pub struct SummaryGenerator;

impl Generator for SummaryGenerator {
    fn generate(&self, db: &Database, ordering: &TableOrdering) -> String {
        let mut lines: Vec<String> = Vec::new();

        lines.push(format!("Database: {}", db.name));
        lines.push(format!("Schema: {}", db.schema));
        lines.push(format!(
            "Generated: {}",
            db.generated_at.format("%Y-%m-%d %H:%M:%S")
        ));
        lines.push(String::new());

        let count = |kind: ConstraintKind| db.constraints().filter(|(_, c)| c.kind == kind).count();
        lines.push(format!("Tables: {}", db.table_ids().len()));
        lines.push(format!("Views: {}", db.view_ids().len()));
        lines.push(format!("Remote tables: {}", db.remote_table_ids().len()));
        lines.push(format!("Procedures: {}", db.procedures().count()));
        lines.push(format!("Functions: {}", db.functions().count()));
        lines.push(format!(
            "Constraints: {} declared, {} implied, {} convention",
            count(ConstraintKind::Declared),
            count(ConstraintKind::Implied),
            count(ConstraintKind::Convention)
        ));

        section(
            &mut lines,
            "Insertion order",
            ordering
                .insertion_order()
                .iter()
                .enumerate()
                .map(|(i, &id)| format!("{}. {}", i + 1, db.table(id).full_name()))
                .collect(),
        );

        section(
            &mut lines,
            "Implied relationships",
            db.implied_constraints()
                .map(|(_, c)| match c.kind {
                    ConstraintKind::Convention => format!("{} [convention]", describe(db, c)),
                    _ => describe(db, c),
                })
                .collect(),
        );

        section(
            &mut lines,
            "Recursive constraints",
            ordering
                .recursive_constraints
                .iter()
                .map(|&id| {
                    let c = db.constraint(id);
                    format!("{}: {}", c.name, describe(db, c))
                })
                .collect(),
        );

        let anomalies = analyze(db);
        let mut found = Vec::new();
        let mut report = |label: &str, items: Vec<String>| {
            if !items.is_empty() {
                found.push(format!("{label}: {}", items.join(", ")));
            }
        };
        report("Orphan tables", table_names(db, &anomalies.orphans));
        report("Tables without indexes", table_names(db, &anomalies.without_indexes));
        report("Single-column tables", table_names(db, &anomalies.single_column));
        report("Unique nullable columns", column_labels(db, &anomalies.unique_nullable));
        report(
            "Columns defaulting to 'NULL'",
            column_labels(db, &anomalies.default_null_string),
        );
        report(
            "Tables with incrementing column names",
            table_names(db, &anomalies.incrementing_columns),
        );
        section(&mut lines, "Anomalies", found);

        let mut output = lines.join("\n");
        output.push('\n');
        output
    }
}

fn section(lines: &mut Vec<String>, title: &str, items: Vec<String>) {
    lines.push(String::new());
    lines.push(format!("{title}:"));
    if items.is_empty() {
        lines.push("  (none)".to_string());
    }
    for item in items {
        lines.push(format!("  {item}"));
    }
}

/// `child(a, b) -> parent(x, y)`
fn describe(db: &Database, c: &ForeignKeyConstraint) -> String {
    let columns = |ids: &[ColumnId]| {
        ids.iter()
            .map(|&id| db.column(id).name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "{}({}) -> {}({})",
        db.table(c.child_table).name,
        columns(c.child_columns()),
        db.table(c.parent_table).name,
        columns(c.parent_columns())
    )
}

fn table_names(db: &Database, ids: &[TableId]) -> Vec<String> {
    ids.iter().map(|&id| db.table(id).name.clone()).collect()
}

fn column_labels(db: &Database, ids: &[ColumnId]) -> Vec<String> {
    ids.iter().map(|&id| db.column_label(id)).collect()
}
