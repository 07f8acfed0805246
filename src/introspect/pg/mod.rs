mod columns;
mod constraints;
mod indexes;
mod routines;
mod tables;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::{MetadataProvider, MetadataResult};
use crate::dialect::Dialect;
use crate::schema::{
    CheckConstraintMeta, ColumnMeta, ImportedKeyMeta, IndexColumnMeta, PrimaryKeyMeta,
    RoutineMeta, TableMeta,
};

/// PostgreSQL catalog access over a sqlx pool.
pub struct PgProvider {
    pool: PgPool,
    database: String,
}

impl PgProvider {
    /// Connect with up to `max_connections` pooled connections, one per
    /// concurrent metadata fetch.
    pub async fn connect(url: &str, max_connections: u32) -> MetadataResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(url)
            .await?;
        let database: String = sqlx::query_scalar("SELECT current_database()::text")
            .fetch_one(&pool)
            .await?;
        Ok(Self { pool, database })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl MetadataProvider for PgProvider {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn tables(&self, schema: &str) -> MetadataResult<Vec<TableMeta>> {
        tables::query_tables(&self.pool, schema).await
    }

    async fn columns(&self, schema: &str, table: &str) -> MetadataResult<Vec<ColumnMeta>> {
        columns::query_columns(&self.pool, schema, table).await
    }

    async fn indexes(&self, schema: &str, table: &str) -> MetadataResult<Vec<IndexColumnMeta>> {
        indexes::query_indexes(&self.pool, schema, table).await
    }

    async fn primary_keys(
        &self,
        schema: &str,
        table: &str,
    ) -> MetadataResult<Vec<PrimaryKeyMeta>> {
        constraints::query_primary_keys(&self.pool, schema, table).await
    }

    async fn imported_keys(
        &self,
        schema: &str,
        table: &str,
    ) -> MetadataResult<Vec<ImportedKeyMeta>> {
        constraints::query_imported_keys(&self.pool, schema, table).await
    }

    async fn check_constraints(
        &self,
        schema: &str,
        table: &str,
    ) -> MetadataResult<Vec<CheckConstraintMeta>> {
        constraints::query_check_constraints(&self.pool, schema, table).await
    }

    async fn row_count(&self, schema: &str, table: &str) -> MetadataResult<u64> {
        let sql = format!(
            "SELECT count(*) FROM {}.{}",
            Dialect::Postgres.quote_identifier(schema),
            Dialect::Postgres.quote_identifier(table)
        );
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn view_definition(&self, schema: &str, view: &str) -> MetadataResult<Option<String>> {
        tables::query_view_definition(&self.pool, schema, view).await
    }

    async fn routines(&self, schema: &str) -> MetadataResult<Vec<RoutineMeta>> {
        routines::query_routines(&self.pool, schema).await
    }

    async fn keywords(&self) -> MetadataResult<Vec<String>> {
        let words: Vec<String> =
            sqlx::query_scalar("SELECT word FROM pg_get_keywords() WHERE catcode = 'R'")
                .fetch_all(&self.pool)
                .await?;
        Ok(words)
    }
}
