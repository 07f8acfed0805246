use std::collections::BTreeMap;

use super::MssqlClient;
use crate::error::SchemaLinkError;
use crate::schema::{RoutineMeta, RoutineParameterMeta, RoutineType};

pub async fn query_routines(
    client: &mut MssqlClient,
    schema: &str,
) -> Result<Vec<RoutineMeta>, SchemaLinkError> {
    let routine_query = r#"
        SELECT
            r.SPECIFIC_NAME,
            r.ROUTINE_NAME,
            r.ROUTINE_TYPE,
            r.DATA_TYPE,
            OBJECT_DEFINITION(OBJECT_ID(QUOTENAME(r.ROUTINE_SCHEMA) + '.' + QUOTENAME(r.SPECIFIC_NAME))) AS definition,
            CASE WHEN r.IS_DETERMINISTIC = 'YES' THEN 1 ELSE 0 END AS is_deterministic,
            CAST(ep.value AS NVARCHAR(MAX)) AS comment
        FROM INFORMATION_SCHEMA.ROUTINES r
        LEFT JOIN sys.extended_properties ep
            ON ep.major_id = OBJECT_ID(QUOTENAME(r.ROUTINE_SCHEMA) + '.' + QUOTENAME(r.SPECIFIC_NAME))
            AND ep.minor_id = 0
            AND ep.name = 'MS_Description'
        WHERE r.ROUTINE_SCHEMA = @P1
        ORDER BY r.ROUTINE_NAME
    "#;

    let rows = client
        .query(routine_query, &[&schema])
        .await?
        .into_first_result()
        .await?;

    let param_query = r#"
        SELECT p.SPECIFIC_NAME, p.PARAMETER_NAME, p.DATA_TYPE, p.PARAMETER_MODE
        FROM INFORMATION_SCHEMA.PARAMETERS p
        WHERE p.SPECIFIC_SCHEMA = @P1 AND p.ORDINAL_POSITION > 0
        ORDER BY p.SPECIFIC_NAME, p.ORDINAL_POSITION
    "#;

    let param_rows = client
        .query(param_query, &[&schema])
        .await?
        .into_first_result()
        .await?;

    let mut params: BTreeMap<String, Vec<RoutineParameterMeta>> = BTreeMap::new();
    for row in param_rows {
        let specific = row.get::<&str, _>("SPECIFIC_NAME").unwrap_or("").to_string();
        params.entry(specific).or_default().push(RoutineParameterMeta {
            name: row.get::<&str, _>("PARAMETER_NAME").map(|s| s.to_string()),
            type_name: row.get::<&str, _>("DATA_TYPE").unwrap_or("").to_string(),
            mode: row.get::<&str, _>("PARAMETER_MODE").unwrap_or("IN").to_string(),
        });
    }

    let mut routines = Vec::new();
    for row in rows {
        let specific = row.get::<&str, _>("SPECIFIC_NAME").unwrap_or("");
        let routine_type = match row.get::<&str, _>("ROUTINE_TYPE") {
            Some("PROCEDURE") => RoutineType::Procedure,
            _ => RoutineType::Function,
        };
        routines.push(RoutineMeta {
            parameters: params.remove(specific).unwrap_or_default(),
            name: row.get::<&str, _>("ROUTINE_NAME").unwrap_or("").to_string(),
            routine_type,
            return_type: row.get::<&str, _>("DATA_TYPE").map(|s| s.to_string()),
            language: Some("SQL".to_string()),
            definition: row.get::<&str, _>("definition").map(|s| s.to_string()),
            is_deterministic: row.get::<i32, _>("is_deterministic").unwrap_or(0) == 1,
            security_type: None,
            comment: row.get::<&str, _>("comment").map(|s| s.to_string()),
        });
    }

    Ok(routines)
}
