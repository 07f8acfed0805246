pub mod ordering;
pub mod summary;

use std::path::Path;

use crate::error::SchemaLinkError;
use crate::graph::TableOrdering;
use crate::model::Database;

pub use ordering::{DeletionOrderGenerator, InsertionOrderGenerator};
pub use summary::SummaryGenerator;

/// Trait for text renderers of a resolved schema.
pub trait Generator {
    fn generate(&self, db: &Database, ordering: &TableOrdering) -> String;
}

/// Write `insertionOrder.txt` and `deletionOrder.txt` into `dir`, creating it
/// if needed.
pub fn write_order_files(
    dir: &Path,
    db: &Database,
    ordering: &TableOrdering,
) -> Result<(), SchemaLinkError> {
    std::fs::create_dir_all(dir)?;
    let files: [(&str, &dyn Generator); 2] = [
        ("insertionOrder.txt", &InsertionOrderGenerator),
        ("deletionOrder.txt", &DeletionOrderGenerator),
    ];
    for (name, generator) in files {
        let path = dir.join(name);
        std::fs::write(&path, generator.generate(db, ordering))?;
        tracing::info!("Wrote {}", path.display());
    }
    Ok(())
}
