use sqlx::PgPool;

use crate::error::SchemaLinkError;
use crate::schema::{TableMeta, TableType};

pub async fn query_tables(pool: &PgPool, schema: &str) -> Result<Vec<TableMeta>, SchemaLinkError> {
    let rows = sqlx::query_as::<_, TableRow>(
        r#"
        SELECT t.table_schema::text, t.table_name::text, t.table_type::text,
               obj_description(
                   (quote_ident(t.table_schema) || '.' || quote_ident(t.table_name))::regclass
               ) AS comment
        FROM information_schema.tables t
        WHERE t.table_schema = $1
          AND t.table_type IN ('BASE TABLE', 'VIEW')
        ORDER BY t.table_name
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await?;

    let tables = rows
        .into_iter()
        .filter_map(|row| {
            let table_type = match row.table_type.as_str() {
                "BASE TABLE" => TableType::Table,
                "VIEW" => TableType::View,
                _ => return None,
            };
            Some(TableMeta {
                schema: row.table_schema,
                name: row.table_name,
                table_type,
                comment: row.comment,
            })
        })
        .collect();

    Ok(tables)
}

pub async fn query_view_definition(
    pool: &PgPool,
    schema: &str,
    view: &str,
) -> Result<Option<String>, SchemaLinkError> {
    let definition: Option<Option<String>> = sqlx::query_scalar(
        r#"
        SELECT v.view_definition::text
        FROM information_schema.views v
        WHERE v.table_schema = $1 AND v.table_name = $2
        "#,
    )
    .bind(schema)
    .bind(view)
    .fetch_optional(pool)
    .await?;

    Ok(definition.flatten())
}

#[derive(sqlx::FromRow)]
struct TableRow {
    table_schema: String,
    table_name: String,
    table_type: String,
    comment: Option<String>,
}
