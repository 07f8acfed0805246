use sqlx::PgPool;

use crate::error::SchemaLinkError;
use crate::schema::IndexColumnMeta;

pub async fn query_indexes(
    pool: &PgPool,
    schema: &str,
    table_name: &str,
) -> Result<Vec<IndexColumnMeta>, SchemaLinkError> {
    let rows = sqlx::query_as::<_, IndexRow>(
        r#"
        SELECT i.relname::text AS index_name, i.oid::int8 AS index_id,
               ix.indisunique AS is_unique, ix.indisprimary AS is_primary,
               a.attname::text AS column_name,
               NOT coalesce(pg_index_column_has_property(ix.indexrelid, k.pos::int4, 'desc'), false)
                   AS ascending,
               k.pos::int4 AS position
        FROM pg_index ix
        JOIN pg_class t ON t.oid = ix.indrelid
        JOIN pg_class i ON i.oid = ix.indexrelid
        JOIN pg_namespace n ON n.oid = t.relnamespace
        CROSS JOIN LATERAL unnest(ix.indkey::int2[]) WITH ORDINALITY AS k(attnum, pos)
        JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum
        WHERE n.nspname = $1 AND t.relname = $2
        ORDER BY i.relname, k.pos
        "#,
    )
    .bind(schema)
    .bind(table_name)
    .fetch_all(pool)
    .await?;

    let indexes = rows
        .into_iter()
        .map(|row| IndexColumnMeta {
            index_name: row.index_name,
            index_id: Some(row.index_id),
            is_unique: row.is_unique,
            is_primary: row.is_primary,
            column_name: row.column_name,
            ascending: row.ascending,
            position: row.position,
        })
        .collect();

    Ok(indexes)
}

#[derive(sqlx::FromRow)]
struct IndexRow {
    index_name: String,
    index_id: i64,
    is_unique: bool,
    is_primary: bool,
    column_name: String,
    ascending: bool,
    position: i32,
}
