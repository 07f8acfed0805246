use sqlx::PgPool;

use crate::error::SchemaLinkError;
use crate::schema::ColumnMeta;

pub async fn query_columns(
    pool: &PgPool,
    schema: &str,
    table_name: &str,
) -> Result<Vec<ColumnMeta>, SchemaLinkError> {
    let rows = sqlx::query_as::<_, ColumnRow>(
        r#"
        SELECT c.column_name::text, c.ordinal_position::int4, c.is_nullable = 'YES' AS is_nullable,
               c.udt_name::text, c.character_maximum_length::int4,
               c.numeric_precision::int4, c.numeric_scale::int4, c.column_default::text,
               c.is_identity = 'YES' AS is_identity,
               col_description(
                   (quote_ident(c.table_schema) || '.' || quote_ident(c.table_name))::regclass,
                   c.ordinal_position
               ) AS comment
        FROM information_schema.columns c
        WHERE c.table_schema = $1 AND c.table_name = $2
        ORDER BY c.ordinal_position
        "#,
    )
    .bind(schema)
    .bind(table_name)
    .fetch_all(pool)
    .await?;

    let columns = rows.into_iter().map(ColumnRow::into_meta).collect();
    Ok(columns)
}

#[derive(sqlx::FromRow)]
struct ColumnRow {
    column_name: String,
    ordinal_position: i32,
    is_nullable: bool,
    udt_name: String,
    character_maximum_length: Option<i32>,
    numeric_precision: Option<i32>,
    numeric_scale: Option<i32>,
    column_default: Option<String>,
    is_identity: bool,
    comment: Option<String>,
}

impl ColumnRow {
    fn into_meta(self) -> ColumnMeta {
        // serial columns are backed by a sequence default rather than identity
        let is_serial = self
            .column_default
            .as_deref()
            .is_some_and(|d| d.starts_with("nextval("));
        ColumnMeta {
            name: self.column_name,
            ordinal_position: self.ordinal_position,
            type_name: self.udt_name,
            length: self
                .character_maximum_length
                .or(self.numeric_precision)
                .unwrap_or(0),
            decimal_digits: self.numeric_scale,
            is_nullable: self.is_nullable,
            default_value: self.column_default,
            is_auto_increment: self.is_identity || is_serial,
            comment: self.comment,
        }
    }
}
