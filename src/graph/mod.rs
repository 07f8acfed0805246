//! Relationship resolution, inference and ordering over a [`Database`](crate::model::Database).

pub mod analysis;
pub mod implied;
pub mod order;
pub mod rails;
pub mod relationships;

pub use analysis::{analyze, Anomalies};
pub use order::{order_tables, order_tables_by_ri, DependencyGraph, TableOrdering};
pub use relationships::RelationshipResolver;
