//! Builds a [`Database`] from a [`MetadataProvider`].
//!
//! Table details are fetched concurrently, up to `threads` at a time. Each
//! fetch owns its own [`Table`] until every fetch has finished; only then are
//! the tables added to the database and related to each other.

use futures::stream::{self, StreamExt};

use crate::config::{AnalysisConfig, ColumnExclusions};
use crate::error::SchemaLinkError;
use crate::graph::{implied, rails, RelationshipResolver};
use crate::introspect::MetadataProvider;
use crate::model::{Column, Database, Routine, Table, TableIndex, TableKind};
use crate::schema::{
    ColumnMeta, IndexColumnMeta, PrimaryKeyMeta, RoutineType, TableMeta, TableType,
};

/// Read the configured schema and resolve its relationships.
///
/// Returns [`SchemaLinkError::EmptySchema`] when no table or view survives
/// filtering and fetching.
pub async fn load_database(
    provider: &dyn MetadataProvider,
    config: &AnalysisConfig,
) -> Result<Database, SchemaLinkError> {
    let mut db = Database::new(provider.database_name(), &config.schema);

    match provider.keywords().await {
        Ok(words) => db.set_keywords(words),
        Err(e) => tracing::warn!("Failed to fetch SQL keywords: {e}"),
    }

    let metas: Vec<TableMeta> = provider
        .tables(&config.schema)
        .await?
        .into_iter()
        .filter(|meta| config.include_views || meta.table_type != TableType::View)
        .filter(|meta| config.table_filter.is_valid(&meta.name, meta.table_type.label()))
        .collect();

    tracing::info!(
        "Loading {} tables/views from schema {}",
        metas.len(),
        config.schema
    );

    let results: Vec<(String, Result<Table, SchemaLinkError>)> = stream::iter(metas)
        .map(|meta| async move {
            let name = meta.name.clone();
            (name, load_table(provider, config, meta).await)
        })
        .buffer_unordered(config.threads.max(1))
        .collect()
        .await;

    let mut tables = Vec::with_capacity(results.len());
    let mut failed = Vec::new();
    for (name, result) in results {
        match result {
            Ok(table) => tables.push(table),
            Err(e) => {
                tracing::error!("Failed to load table {name}, skipping: {e}");
                failed.push(name);
            }
        }
    }

    // completion order is arbitrary; arena ids must not be
    tables.sort_by(|a, b| a.name.cmp(&b.name));
    for table in tables {
        db.add_table(table);
    }

    if db.is_empty() {
        return Err(SchemaLinkError::EmptySchema(config.schema.clone()));
    }

    match provider.routines(&config.schema).await {
        Ok(routines) => {
            for meta in routines {
                let kind = match meta.routine_type {
                    RoutineType::Procedure => "PROCEDURE",
                    RoutineType::Function => "FUNCTION",
                };
                if config.routine_filter.is_valid(&meta.name, kind) {
                    db.add_routine(Routine::from(meta));
                }
            }
        }
        Err(e) => tracing::warn!("Failed to fetch routines of {}: {e}", config.schema),
    }

    RelationshipResolver::new(provider, config)
        .skip_tables(&failed)
        .connect_all(&mut db)
        .await?;

    let table_ids = db.table_ids();
    if config.rails_constraints {
        let found = rails::find_rails_constraints(&mut db, &table_ids);
        tracing::info!("Found {} Rails-convention relationships", found.len());
    }
    if config.implied_constraints {
        let found = implied::find_implied_constraints(&mut db, &table_ids);
        tracing::info!("Found {} implied relationships", found.len());
    }

    tracing::info!(
        "Loaded {} tables, {} views, {} remote tables, {} constraints",
        db.table_ids().len(),
        db.view_ids().len(),
        db.remote_table_ids().len(),
        db.constraints().count()
    );

    Ok(db)
}

async fn load_table(
    provider: &dyn MetadataProvider,
    config: &AnalysisConfig,
    meta: TableMeta,
) -> Result<Table, SchemaLinkError> {
    let kind = match meta.table_type {
        TableType::Table => TableKind::Table,
        TableType::View => TableKind::View,
    };
    let mut table = Table::new(&meta.schema, &meta.name, kind);
    table.comment = meta.comment;

    let columns = provider.columns(&meta.schema, &meta.name).await?;
    populate_columns(&mut table, columns, &config.column_exclusions)?;

    let primary_keys = provider.primary_keys(&meta.schema, &meta.name).await?;
    apply_primary_key(&mut table, primary_keys);

    let indexes = provider.indexes(&meta.schema, &meta.name).await?;
    apply_indexes(&mut table, indexes);

    for check in provider.check_constraints(&meta.schema, &meta.name).await? {
        table.add_check_constraint(&check.name, &check.definition);
    }

    if table.is_view() {
        table.view_definition = provider.view_definition(&meta.schema, &meta.name).await?;
    } else if config.count_rows {
        match provider.row_count(&meta.schema, &meta.name).await {
            Ok(rows) => table.set_row_count(Some(rows)),
            Err(e) => tracing::warn!("Unable to count rows of {}: {e}", table.full_name()),
        }
    }

    tracing::debug!("Loaded {} with {} columns", table.full_name(), table.columns().len());
    Ok(table)
}

/// Add columns in ordinal order, applying the configured exclusion patterns.
pub(crate) fn populate_columns(
    table: &mut Table,
    mut columns: Vec<ColumnMeta>,
    exclusions: &ColumnExclusions,
) -> Result<(), SchemaLinkError> {
    columns.sort_by_key(|c| c.ordinal_position);
    for meta in columns {
        let mut column = Column::from_meta(meta);
        exclusions.apply(&table.name, &mut column);
        table.add_column(column)?;
    }
    Ok(())
}

pub(crate) fn apply_primary_key(table: &mut Table, mut rows: Vec<PrimaryKeyMeta>) {
    rows.sort_by_key(|r| r.key_seq);
    let mut positions = Vec::with_capacity(rows.len());
    for row in rows {
        match table.column_position(&row.column_name) {
            Some(p) => positions.push(p),
            None => tracing::warn!(
                "Primary key of {} names unknown column {}",
                table.full_name(),
                row.column_name
            ),
        }
    }
    table.set_primary_key(positions);
}

/// Group per-column index rows into indexes. Expression columns that don't
/// name a real column are skipped.
fn apply_indexes(table: &mut Table, mut rows: Vec<IndexColumnMeta>) {
    rows.sort_by(|a, b| {
        a.index_name
            .cmp(&b.index_name)
            .then(a.position.cmp(&b.position))
    });

    let mut current: Option<TableIndex> = None;
    for row in rows {
        if current.as_ref().is_some_and(|idx| idx.name != row.index_name) {
            if let Some(done) = current.take() {
                table.add_index(done);
            }
        }
        let index = current.get_or_insert_with(|| {
            TableIndex::new(&row.index_name, row.index_id, row.is_unique, row.is_primary)
        });
        match table.column_position(&row.column_name) {
            Some(p) => index.add_column(p, row.ascending),
            None => tracing::debug!(
                "Index {} on {} has non-column key {}",
                row.index_name,
                table.name,
                row.column_name
            ),
        }
    }
    if let Some(done) = current {
        table.add_index(done);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::compile_optional;
    use crate::filter::NameFilter;
    use crate::schema::RoutineMeta;
    use crate::testutil::StaticProvider;

    fn shop() -> StaticProvider {
        StaticProvider::new("shop")
            .table("public", "customer", &["id", "name"], &["id"])
            .table("public", "orders", &["id", "customer_id"], &["id"])
            .table("public", "line_item", &["id", "orders_id", "qty"], &["id"])
            .view("public", "big_customers", &["id"], "SELECT id FROM customer")
            .foreign_key("public", "orders", Some("orders_customer_fk"), "customer_id", "public", "customer", "id")
            .rows("public", "customer", 3)
    }

    #[tokio::test]
    async fn test_load_resolves_relationships() {
        let config = AnalysisConfig::new("public");
        let db = load_database(&shop(), &config).await.unwrap();

        assert_eq!(db.name, "shop");
        assert_eq!(db.table_ids().len(), 3);
        assert_eq!(db.view_ids().len(), 1);

        let orders = db.table(db.find_table("orders").unwrap());
        let fk = orders.foreign_key("orders_customer_fk").unwrap();
        assert!(!db.constraint(fk).is_implied());
        assert!(orders.column("customer_id").unwrap().is_foreign_key());

        let customer = db.table(db.find_table("customer").unwrap());
        assert_eq!(customer.row_count(), Some(3));
        assert!(customer.column("id").unwrap().is_primary_key());
        assert!(customer.index("customer_pkey").unwrap().is_primary);

        let view = db.table(db.find_view("big_customers").unwrap());
        assert_eq!(view.view_definition.as_deref(), Some("SELECT id FROM customer"));
    }

    #[tokio::test]
    async fn test_failed_table_is_dropped() {
        let provider = shop().fail_columns("public", "line_item");
        let mut config = AnalysisConfig::new("public");
        config.threads = 4;

        let db = load_database(&provider, &config).await.unwrap();
        assert!(db.find_table("line_item").is_none());
        assert!(db.find_table("customer").is_some());
        assert!(db.find_table("orders").is_some());
    }

    #[tokio::test]
    async fn test_failed_parent_does_not_fail_the_load() {
        let provider = shop().fail_columns("public", "customer");
        let mut config = AnalysisConfig::new("public");
        config.threads = 4;

        let db = load_database(&provider, &config).await.unwrap();
        assert!(db.find_table("customer").is_none());
        assert!(db.remote_table_ids().is_empty());
        let orders = db.table(db.find_table("orders").unwrap());
        assert!(orders.foreign_key("orders_customer_fk").is_none());
        assert!(!orders.column("customer_id").unwrap().is_foreign_key());
    }

    #[tokio::test]
    async fn test_failed_row_count_is_unknown() {
        let provider = shop().fail_row_count("public", "customer");
        let db = load_database(&provider, &AnalysisConfig::new("public"))
            .await
            .unwrap();
        let customer = db.table(db.find_table("customer").unwrap());
        assert_eq!(customer.row_count(), None);
    }

    #[tokio::test]
    async fn test_threaded_load_is_deterministic() {
        let mut config = AnalysisConfig::new("public");
        let sequential = load_database(&shop(), &config).await.unwrap();
        config.threads = 8;
        let threaded = load_database(&shop(), &config).await.unwrap();

        let names = |db: &Database| db.tables().map(|t| t.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&sequential), names(&threaded));
        assert_eq!(sequential.table_ids(), threaded.table_ids());
    }

    #[tokio::test]
    async fn test_empty_schema() {
        let err = load_database(&shop(), &AnalysisConfig::new("nothing_here"))
            .await
            .unwrap_err();
        assert!(err.is_empty_schema());
    }

    #[tokio::test]
    async fn test_filters_and_views_flag() {
        let mut config = AnalysisConfig::new("public");
        config.include_views = false;
        config.table_filter = NameFilter::new(
            None,
            compile_optional("exclude", Some("line_.*")).unwrap(),
            None,
        );

        let db = load_database(&shop(), &config).await.unwrap();
        assert!(db.find_table("line_item").is_none());
        assert!(db.find_view("big_customers").is_none());
        assert_eq!(db.table_ids().len(), 2);
    }

    #[tokio::test]
    async fn test_implied_and_rails_passes() {
        let provider = StaticProvider::new("shop")
            .table("public", "customers", &["id", "name"], &["id"])
            .table("public", "orders", &["order_no", "customer_id"], &["order_no"])
            .table("public", "invoice", &["invoice_no", "order_no"], &["invoice_no"]);
        let mut config = AnalysisConfig::new("public");
        config.rails_constraints = true;

        let db = load_database(&provider, &config).await.unwrap();
        let kinds: Vec<_> = db
            .constraints()
            .map(|(_, c)| (c.name.clone(), c.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("rails_orders_customer_id".to_string(), crate::model::ConstraintKind::Convention),
                ("implied_invoice_order_no".to_string(), crate::model::ConstraintKind::Implied),
            ]
        );
    }

    #[tokio::test]
    async fn test_routines_are_filtered() {
        let routine = |name: &str, routine_type| RoutineMeta {
            name: name.to_string(),
            routine_type,
            return_type: None,
            language: Some("plpgsql".to_string()),
            definition: None,
            is_deterministic: false,
            security_type: None,
            comment: None,
            parameters: Vec::new(),
        };
        let provider = shop()
            .routine("public", routine("refresh_totals", RoutineType::Procedure))
            .routine("public", routine("order_total", RoutineType::Function))
            .routine("public", routine("tmp$calc", RoutineType::Function));

        let db = load_database(&provider, &AnalysisConfig::new("public"))
            .await
            .unwrap();
        assert_eq!(db.procedures().count(), 1);
        let functions: Vec<_> = db.functions().map(|f| f.name.as_str()).collect();
        assert_eq!(functions, vec!["order_total"]);
    }

    #[test]
    fn test_apply_indexes_groups_rows() {
        let mut table = Table::new("public", "orders", TableKind::Table);
        populate_columns(
            &mut table,
            vec![
                crate::testutil::column_meta("customer_id", 2),
                crate::testutil::column_meta("id", 1),
            ],
            &ColumnExclusions::default(),
        )
        .unwrap();
        assert_eq!(table.column_at(0).name, "id");

        let row = |index: &str, column: &str, position| IndexColumnMeta {
            index_name: index.to_string(),
            index_id: None,
            is_unique: false,
            is_primary: false,
            column_name: column.to_string(),
            ascending: true,
            position,
        };
        apply_indexes(
            &mut table,
            vec![
                row("orders_multi", "customer_id", 2),
                row("orders_expr", "lower(name)", 1),
                row("orders_multi", "id", 1),
            ],
        );

        let multi = table.index("orders_multi").unwrap();
        let cols: Vec<usize> = multi.columns().iter().map(|c| c.column).collect();
        assert_eq!(cols, vec![0, 1]);
        assert!(table.index("orders_expr").unwrap().columns().is_empty());
    }
}
