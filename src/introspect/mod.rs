//! Access to catalog metadata.
//!
//! A [`MetadataProvider`] answers flat questions about one table at a time.
//! Everything relational (joining keys to tables, remote tables, implied keys)
//! happens above it, in [`crate::graph`].

pub mod mssql;
pub mod pg;

use async_trait::async_trait;

use crate::error::SchemaLinkError;
use crate::schema::{
    CheckConstraintMeta, ColumnMeta, ImportedKeyMeta, IndexColumnMeta, PrimaryKeyMeta,
    RoutineMeta, TableMeta,
};

pub use mssql::MssqlProvider;
pub use pg::PgProvider;

pub type MetadataResult<T> = Result<T, SchemaLinkError>;

/// Catalog introspection for one connected database.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Name of the connected database (catalog).
    fn database_name(&self) -> &str;

    /// Tables and views of a schema.
    async fn tables(&self, schema: &str) -> MetadataResult<Vec<TableMeta>>;

    /// Columns of a table in ordinal order.
    async fn columns(&self, schema: &str, table: &str) -> MetadataResult<Vec<ColumnMeta>>;

    /// One row per indexed column.
    async fn indexes(&self, schema: &str, table: &str) -> MetadataResult<Vec<IndexColumnMeta>>;

    async fn primary_keys(&self, schema: &str, table: &str)
        -> MetadataResult<Vec<PrimaryKeyMeta>>;

    /// Foreign keys of `table` (the child side), one row per column pair.
    async fn imported_keys(
        &self,
        schema: &str,
        table: &str,
    ) -> MetadataResult<Vec<ImportedKeyMeta>>;

    async fn check_constraints(
        &self,
        schema: &str,
        table: &str,
    ) -> MetadataResult<Vec<CheckConstraintMeta>>;

    async fn row_count(&self, schema: &str, table: &str) -> MetadataResult<u64>;

    async fn view_definition(&self, schema: &str, view: &str) -> MetadataResult<Option<String>>;

    /// Stored procedures and functions of a schema.
    async fn routines(&self, schema: &str) -> MetadataResult<Vec<RoutineMeta>>;

    /// Reserved words of the backend, used for quoting decisions.
    async fn keywords(&self) -> MetadataResult<Vec<String>> {
        Ok(Vec::new())
    }
}
