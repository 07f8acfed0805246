use super::MssqlClient;
use crate::error::SchemaLinkError;
use crate::schema::ColumnMeta;

pub async fn query_columns(
    client: &mut MssqlClient,
    schema: &str,
    table_name: &str,
) -> Result<Vec<ColumnMeta>, SchemaLinkError> {
    let query = r#"
        SELECT
            c.COLUMN_NAME,
            c.ORDINAL_POSITION,
            CASE WHEN c.IS_NULLABLE = 'YES' THEN 1 ELSE 0 END AS is_nullable,
            c.DATA_TYPE,
            c.CHARACTER_MAXIMUM_LENGTH,
            CAST(c.NUMERIC_PRECISION AS INT) AS NUMERIC_PRECISION,
            c.NUMERIC_SCALE,
            c.COLUMN_DEFAULT,
            COLUMNPROPERTY(OBJECT_ID(QUOTENAME(c.TABLE_SCHEMA) + '.' + QUOTENAME(c.TABLE_NAME)), c.COLUMN_NAME, 'IsIdentity') AS is_identity,
            CAST(ep.value AS NVARCHAR(MAX)) AS comment
        FROM INFORMATION_SCHEMA.COLUMNS c
        LEFT JOIN sys.columns sc
            ON sc.object_id = OBJECT_ID(QUOTENAME(c.TABLE_SCHEMA) + '.' + QUOTENAME(c.TABLE_NAME))
            AND sc.name = c.COLUMN_NAME
        LEFT JOIN sys.extended_properties ep
            ON ep.major_id = sc.object_id
            AND ep.minor_id = sc.column_id
            AND ep.name = 'MS_Description'
        WHERE c.TABLE_SCHEMA = @P1 AND c.TABLE_NAME = @P2
        ORDER BY c.ORDINAL_POSITION
    "#;

    let stream = client.query(query, &[&schema, &table_name]).await?;
    let rows = stream.into_first_result().await?;

    let mut columns = Vec::new();
    for row in rows {
        // CHARACTER_MAXIMUM_LENGTH is -1 for varchar(max)/nvarchar(max)
        let char_max_len = row
            .get::<i32, _>("CHARACTER_MAXIMUM_LENGTH")
            .filter(|&n| n > 0);
        let numeric_precision = row.get::<i32, _>("NUMERIC_PRECISION");

        columns.push(ColumnMeta {
            name: row
                .get::<&str, _>("COLUMN_NAME")
                .unwrap_or("")
                .to_string(),
            ordinal_position: row.get::<i32, _>("ORDINAL_POSITION").unwrap_or(0),
            type_name: row
                .get::<&str, _>("DATA_TYPE")
                .unwrap_or("")
                .to_lowercase(),
            length: char_max_len.or(numeric_precision).unwrap_or(0),
            decimal_digits: row.get::<i32, _>("NUMERIC_SCALE"),
            is_nullable: row.get::<i32, _>("is_nullable").unwrap_or(0) == 1,
            default_value: row
                .get::<&str, _>("COLUMN_DEFAULT")
                .map(|s| s.to_string()),
            is_auto_increment: row.get::<i32, _>("is_identity").unwrap_or(0) == 1,
            comment: row.get::<&str, _>("comment").map(|s| s.to_string()),
        });
    }

    Ok(columns)
}
