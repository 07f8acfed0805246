use super::MssqlClient;
use crate::error::SchemaLinkError;
use crate::schema::{CheckConstraintMeta, ImportedKeyMeta, PrimaryKeyMeta};

pub async fn query_primary_keys(
    client: &mut MssqlClient,
    schema: &str,
    table_name: &str,
) -> Result<Vec<PrimaryKeyMeta>, SchemaLinkError> {
    let query = r#"
        SELECT
            tc.CONSTRAINT_NAME,
            kcu.COLUMN_NAME,
            kcu.ORDINAL_POSITION
        FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc
        JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
            ON kcu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME
            AND kcu.TABLE_SCHEMA = tc.TABLE_SCHEMA
            AND kcu.TABLE_NAME = tc.TABLE_NAME
        WHERE tc.TABLE_SCHEMA = @P1
          AND tc.TABLE_NAME = @P2
          AND tc.CONSTRAINT_TYPE = 'PRIMARY KEY'
        ORDER BY kcu.ORDINAL_POSITION
    "#;

    let stream = client.query(query, &[&schema, &table_name]).await?;
    let rows = stream.into_first_result().await?;

    Ok(rows
        .into_iter()
        .map(|row| PrimaryKeyMeta {
            constraint_name: row.get::<&str, _>("CONSTRAINT_NAME").map(|s| s.to_string()),
            column_name: row
                .get::<&str, _>("COLUMN_NAME")
                .unwrap_or("")
                .to_string(),
            key_seq: row.get::<i32, _>("ORDINAL_POSITION").unwrap_or(0),
        })
        .collect())
}

pub async fn query_imported_keys(
    client: &mut MssqlClient,
    schema: &str,
    table_name: &str,
) -> Result<Vec<ImportedKeyMeta>, SchemaLinkError> {
    let query = r#"
        SELECT
            fk.name AS constraint_name,
            COL_NAME(fkc.parent_object_id, fkc.parent_column_id) AS column_name,
            SCHEMA_NAME(ref_t.schema_id) AS ref_schema,
            ref_t.name AS ref_table,
            COL_NAME(fkc.referenced_object_id, fkc.referenced_column_id) AS ref_column,
            fk.update_referential_action_desc AS update_rule,
            fk.delete_referential_action_desc AS delete_rule,
            fkc.constraint_column_id AS key_seq
        FROM sys.foreign_keys fk
        JOIN sys.foreign_key_columns fkc ON fkc.constraint_object_id = fk.object_id
        JOIN sys.tables ref_t ON ref_t.object_id = fk.referenced_object_id
        WHERE fk.parent_object_id = OBJECT_ID(QUOTENAME(@P1) + '.' + QUOTENAME(@P2))
        ORDER BY fk.name, fkc.constraint_column_id
    "#;

    let stream = client.query(query, &[&schema, &table_name]).await?;
    let rows = stream.into_first_result().await?;

    let mut keys = Vec::new();
    for row in rows {
        // MSSQL uses underscores in action names: NO_ACTION -> NO ACTION
        let update_rule = row
            .get::<&str, _>("update_rule")
            .unwrap_or("NO_ACTION")
            .replace('_', " ");
        let delete_rule = row
            .get::<&str, _>("delete_rule")
            .unwrap_or("NO_ACTION")
            .replace('_', " ");

        keys.push(ImportedKeyMeta {
            constraint_name: row.get::<&str, _>("constraint_name").map(|s| s.to_string()),
            column_name: row
                .get::<&str, _>("column_name")
                .unwrap_or("")
                .to_string(),
            ref_schema: row.get::<&str, _>("ref_schema").map(|s| s.to_string()),
            ref_table: row.get::<&str, _>("ref_table").unwrap_or("").to_string(),
            ref_column: row.get::<&str, _>("ref_column").unwrap_or("").to_string(),
            update_rule,
            delete_rule,
            key_seq: row.get::<i32, _>("key_seq").unwrap_or(0),
        });
    }

    Ok(keys)
}

pub async fn query_check_constraints(
    client: &mut MssqlClient,
    schema: &str,
    table_name: &str,
) -> Result<Vec<CheckConstraintMeta>, SchemaLinkError> {
    let query = r#"
        SELECT cc.name, cc.definition
        FROM sys.check_constraints cc
        WHERE cc.parent_object_id = OBJECT_ID(QUOTENAME(@P1) + '.' + QUOTENAME(@P2))
        ORDER BY cc.name
    "#;

    let stream = client.query(query, &[&schema, &table_name]).await?;
    let rows = stream.into_first_result().await?;

    Ok(rows
        .into_iter()
        .map(|row| CheckConstraintMeta {
            name: row.get::<&str, _>("name").unwrap_or("").to_string(),
            definition: row.get::<&str, _>("definition").unwrap_or("").to_string(),
        })
        .collect())
}
