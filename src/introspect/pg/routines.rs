use std::collections::BTreeMap;

use sqlx::PgPool;

use crate::error::SchemaLinkError;
use crate::schema::{RoutineMeta, RoutineParameterMeta, RoutineType};

pub async fn query_routines(
    pool: &PgPool,
    schema: &str,
) -> Result<Vec<RoutineMeta>, SchemaLinkError> {
    let rows = sqlx::query_as::<_, RoutineRow>(
        r#"
        SELECT r.specific_name::text, r.routine_name::text, r.routine_type::text,
               r.data_type::text AS return_type, r.external_language::text AS language,
               r.routine_definition::text AS definition,
               r.is_deterministic = 'YES' AS is_deterministic,
               r.security_type::text,
               obj_description(p.oid, 'pg_proc') AS comment
        FROM information_schema.routines r
        LEFT JOIN pg_proc p
            ON r.specific_name = p.proname || '_' || p.oid
        WHERE r.routine_schema = $1
        ORDER BY r.routine_name, r.specific_name
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await?;

    let param_rows = sqlx::query_as::<_, ParameterRow>(
        r#"
        SELECT p.specific_name::text, p.parameter_name::text,
               p.udt_name::text AS type_name, p.parameter_mode::text AS mode
        FROM information_schema.parameters p
        WHERE p.specific_schema = $1
        ORDER BY p.specific_name, p.ordinal_position
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await?;

    let mut params: BTreeMap<String, Vec<RoutineParameterMeta>> = BTreeMap::new();
    for row in param_rows {
        params
            .entry(row.specific_name)
            .or_default()
            .push(RoutineParameterMeta {
                name: row.parameter_name,
                type_name: row.type_name,
                mode: row.mode.unwrap_or_else(|| "IN".to_string()),
            });
    }

    let routines = rows
        .into_iter()
        .map(|row| RoutineMeta {
            parameters: params.remove(&row.specific_name).unwrap_or_default(),
            name: row.routine_name,
            routine_type: match row.routine_type.as_deref() {
                Some("PROCEDURE") => RoutineType::Procedure,
                _ => RoutineType::Function,
            },
            return_type: row.return_type,
            language: row.language,
            definition: row.definition,
            is_deterministic: row.is_deterministic.unwrap_or(false),
            security_type: row.security_type,
            comment: row.comment,
        })
        .collect();

    Ok(routines)
}

#[derive(sqlx::FromRow)]
struct RoutineRow {
    specific_name: String,
    routine_name: String,
    routine_type: Option<String>,
    return_type: Option<String>,
    language: Option<String>,
    definition: Option<String>,
    is_deterministic: Option<bool>,
    security_type: Option<String>,
    comment: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ParameterRow {
    specific_name: String,
    parameter_name: Option<String>,
    type_name: String,
    mode: Option<String>,
}
