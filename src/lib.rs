//! Schema relationship resolution.
//!
//! Reads catalog metadata through a [`MetadataProvider`](introspect::MetadataProvider),
//! builds a [`Database`](model::Database) whose columns are linked through
//! declared, remote and inferred foreign keys, and orders its tables so that
//! parents are always inserted before their children.

pub mod cli;
pub mod config;
pub mod dialect;
pub mod error;
pub mod filter;
pub mod graph;
pub mod introspect;
pub mod loader;
pub mod model;
pub mod output;
pub mod schema;
#[cfg(test)]
mod testutil;

pub use config::AnalysisConfig;
pub use error::SchemaLinkError;
pub use loader::load_database;
