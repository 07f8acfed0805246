use super::MssqlClient;
use crate::error::SchemaLinkError;
use crate::schema::IndexColumnMeta;

pub async fn query_indexes(
    client: &mut MssqlClient,
    schema: &str,
    table_name: &str,
) -> Result<Vec<IndexColumnMeta>, SchemaLinkError> {
    let query = r#"
        SELECT
            i.name AS index_name,
            i.index_id,
            i.is_unique,
            i.is_primary_key,
            COL_NAME(ic.object_id, ic.column_id) AS column_name,
            ic.is_descending_key,
            CAST(ic.key_ordinal AS INT) AS key_ordinal
        FROM sys.indexes i
        JOIN sys.index_columns ic
            ON ic.object_id = i.object_id AND ic.index_id = i.index_id
        WHERE i.object_id = OBJECT_ID(QUOTENAME(@P1) + '.' + QUOTENAME(@P2))
          AND i.type <> 0
          AND ic.key_ordinal > 0
        ORDER BY i.name, ic.key_ordinal
    "#;

    let stream = client.query(query, &[&schema, &table_name]).await?;
    let rows = stream.into_first_result().await?;

    let indexes = rows
        .into_iter()
        .map(|row| IndexColumnMeta {
            index_name: row
                .get::<&str, _>("index_name")
                .unwrap_or("")
                .to_string(),
            index_id: row.get::<i32, _>("index_id").map(i64::from),
            is_unique: row.get::<bool, _>("is_unique").unwrap_or(false),
            is_primary: row.get::<bool, _>("is_primary_key").unwrap_or(false),
            column_name: row
                .get::<&str, _>("column_name")
                .unwrap_or("")
                .to_string(),
            ascending: !row.get::<bool, _>("is_descending_key").unwrap_or(false),
            position: row.get::<i32, _>("key_ordinal").unwrap_or(0),
        })
        .collect();

    Ok(indexes)
}
