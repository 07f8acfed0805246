use sqlx::PgPool;

use crate::error::SchemaLinkError;
use crate::model::ReferentialAction;
use crate::schema::{CheckConstraintMeta, ImportedKeyMeta, PrimaryKeyMeta};

pub async fn query_primary_keys(
    pool: &PgPool,
    schema: &str,
    table_name: &str,
) -> Result<Vec<PrimaryKeyMeta>, SchemaLinkError> {
    let rows = sqlx::query_as::<_, PkRow>(
        r#"
        SELECT kcu.column_name::text, tc.constraint_name::text, kcu.ordinal_position::int4
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
            USING (constraint_name, table_schema, table_name)
        WHERE tc.table_schema = $1 AND tc.table_name = $2
            AND tc.constraint_type = 'PRIMARY KEY'
        ORDER BY kcu.ordinal_position
        "#,
    )
    .bind(schema)
    .bind(table_name)
    .fetch_all(pool)
    .await?;

    let keys = rows
        .into_iter()
        .map(|row| PrimaryKeyMeta {
            constraint_name: Some(row.constraint_name),
            column_name: row.column_name,
            key_seq: row.ordinal_position,
        })
        .collect();

    Ok(keys)
}

/// Foreign keys of a table, one row per column pair.
///
/// Pairs come from `conkey`/`confkey` unnested together, so composite keys
/// keep their positional pairing.
pub async fn query_imported_keys(
    pool: &PgPool,
    schema: &str,
    table_name: &str,
) -> Result<Vec<ImportedKeyMeta>, SchemaLinkError> {
    let rows = sqlx::query_as::<_, FkRow>(
        r#"
        SELECT con.conname::text AS constraint_name,
               ca.attname::text AS column_name,
               pn.nspname::text AS ref_schema,
               pc.relname::text AS ref_table,
               pa.attname::text AS ref_column,
               con.confupdtype::text AS update_rule,
               con.confdeltype::text AS delete_rule,
               k.seq::int4 AS key_seq
        FROM pg_constraint con
        JOIN pg_class c ON c.oid = con.conrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        JOIN pg_class pc ON pc.oid = con.confrelid
        JOIN pg_namespace pn ON pn.oid = pc.relnamespace
        CROSS JOIN LATERAL unnest(con.conkey, con.confkey)
            WITH ORDINALITY AS k(child_attnum, parent_attnum, seq)
        JOIN pg_attribute ca ON ca.attrelid = con.conrelid AND ca.attnum = k.child_attnum
        JOIN pg_attribute pa ON pa.attrelid = con.confrelid AND pa.attnum = k.parent_attnum
        WHERE con.contype = 'f' AND n.nspname = $1 AND c.relname = $2
        ORDER BY con.conname, k.seq
        "#,
    )
    .bind(schema)
    .bind(table_name)
    .fetch_all(pool)
    .await?;

    let keys = rows
        .into_iter()
        .map(|row| ImportedKeyMeta {
            constraint_name: Some(row.constraint_name),
            column_name: row.column_name,
            ref_schema: Some(row.ref_schema),
            ref_table: row.ref_table,
            ref_column: row.ref_column,
            update_rule: ReferentialAction::from_pg_code(&row.update_rule)
                .as_sql()
                .to_string(),
            delete_rule: ReferentialAction::from_pg_code(&row.delete_rule)
                .as_sql()
                .to_string(),
            key_seq: row.key_seq,
        })
        .collect();

    Ok(keys)
}

pub async fn query_check_constraints(
    pool: &PgPool,
    schema: &str,
    table_name: &str,
) -> Result<Vec<CheckConstraintMeta>, SchemaLinkError> {
    let rows = sqlx::query_as::<_, CheckRow>(
        r#"
        SELECT con.conname::text AS name, pg_get_constraintdef(con.oid) AS definition
        FROM pg_constraint con
        JOIN pg_class c ON c.oid = con.conrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        WHERE con.contype = 'c' AND n.nspname = $1 AND c.relname = $2
        ORDER BY con.conname
        "#,
    )
    .bind(schema)
    .bind(table_name)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| CheckConstraintMeta {
            name: row.name,
            definition: row.definition,
        })
        .collect())
}

#[derive(sqlx::FromRow)]
struct PkRow {
    column_name: String,
    constraint_name: String,
    ordinal_position: i32,
}

#[derive(sqlx::FromRow)]
struct FkRow {
    constraint_name: String,
    column_name: String,
    ref_schema: String,
    ref_table: String,
    ref_column: String,
    update_rule: String,
    delete_rule: String,
    key_seq: i32,
}

#[derive(sqlx::FromRow)]
struct CheckRow {
    name: String,
    definition: String,
}
