use crate::config::AnalysisConfig;
use crate::error::SchemaLinkError;
use crate::introspect::MetadataProvider;
use crate::loader::{apply_primary_key, populate_columns};
use crate::model::{
    ConstraintId, ConstraintKind, Database, IdentMap, ReferentialAction, Table, TableId,
    TableKind,
};
use crate::schema::ImportedKeyMeta;

/// Turns imported-key rows into linked foreign-key constraints.
///
/// Rows that can't be resolved (unnamed constraints, unknown columns) are
/// logged and skipped, and so are keys referencing analyzed-schema tables
/// that failed to load. Other provider failures are returned: there is no
/// useful graph without the keys.
pub struct RelationshipResolver<'a> {
    provider: &'a dyn MetadataProvider,
    config: &'a AnalysisConfig,
    unavailable: IdentMap<()>,
}

impl<'a> RelationshipResolver<'a> {
    pub fn new(provider: &'a dyn MetadataProvider, config: &'a AnalysisConfig) -> Self {
        Self {
            provider,
            config,
            unavailable: IdentMap::new(),
        }
    }

    /// Tables of the analyzed schema whose metadata couldn't be loaded.
    /// Keys referencing them are skipped rather than fetched again.
    pub fn skip_tables<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.unavailable.insert(name.as_ref(), ());
        }
        self
    }

    /// Resolve the foreign keys of every base table, in name order.
    pub async fn connect_all(&self, db: &mut Database) -> Result<(), SchemaLinkError> {
        for id in db.table_ids() {
            self.connect_foreign_keys(db, id).await?;
        }
        Ok(())
    }

    /// Resolve the imported keys of one table, pulling in remote parents as
    /// they're encountered.
    pub async fn connect_foreign_keys(
        &self,
        db: &mut Database,
        table: TableId,
    ) -> Result<(), SchemaLinkError> {
        let (schema, name) = {
            let t = db.table(table);
            (t.schema.clone(), t.name.clone())
        };
        let rows = self.provider.imported_keys(&schema, &name).await?;

        for row in rows {
            let Some(fk_name) = row.constraint_name.as_deref() else {
                tracing::debug!(
                    "Skipping unnamed foreign key {}.{} -> {}.{}",
                    name,
                    row.column_name,
                    row.ref_table,
                    row.ref_column
                );
                continue;
            };

            if self.is_unavailable(db, &row) {
                tracing::warn!(
                    "Skipping foreign key {fk_name} on {name}.{}: table {} failed to load",
                    row.column_name,
                    row.ref_table
                );
                continue;
            }

            let Some(parent) = self.parent_table(db, &row).await? else {
                tracing::warn!(
                    "Foreign key {fk_name} on {name} references unknown table {}",
                    row.ref_table
                );
                continue;
            };

            link_row(db, fk_name, table, parent, &row);
        }
        Ok(())
    }

    fn is_unavailable(&self, db: &Database, row: &ImportedKeyMeta) -> bool {
        let in_schema = row
            .ref_schema
            .as_deref()
            .is_none_or(|schema| self.config.is_analyzed_schema(schema));
        in_schema
            && self.unavailable.contains_key(&row.ref_table)
            && db.find_table(&row.ref_table).is_none()
    }

    /// Where the row's referenced table lives: a base table when it is known
    /// and in the analyzed schema, otherwise a remote table.
    async fn parent_table(
        &self,
        db: &mut Database,
        row: &ImportedKeyMeta,
    ) -> Result<Option<TableId>, SchemaLinkError> {
        let local = db.find_table(&row.ref_table);
        match (local, row.ref_schema.as_deref()) {
            (Some(id), None) => Ok(Some(id)),
            (Some(id), Some(schema)) if self.config.is_analyzed_schema(schema) => Ok(Some(id)),
            (_, Some(schema)) => self.remote_table(db, schema, &row.ref_table).await.map(Some),
            (None, None) => Ok(None),
        }
    }

    /// Find or materialize the remote table `schema.name`.
    ///
    /// A new remote table gets its columns and primary key, then its own
    /// imported keys are linked, but only those pointing back into the
    /// analyzed schema. Remote tables of remote tables are never fetched.
    pub async fn remote_table(
        &self,
        db: &mut Database,
        schema: &str,
        name: &str,
    ) -> Result<TableId, SchemaLinkError> {
        if let Some(id) = db.find_remote_table(schema, name) {
            return Ok(id);
        }

        tracing::debug!("Adding remote table {schema}.{name}");
        let mut table = Table::new(schema, name, TableKind::Table);
        table.remote = true;
        let columns = self.provider.columns(schema, name).await?;
        populate_columns(&mut table, columns, &self.config.column_exclusions)?;
        let primary_keys = self.provider.primary_keys(schema, name).await?;
        apply_primary_key(&mut table, primary_keys);
        let id = db.add_table(table);

        let rows = self.provider.imported_keys(schema, name).await?;
        for row in rows {
            let points_back = row
                .ref_schema
                .as_deref()
                .is_some_and(|s| self.config.is_analyzed_schema(s));
            if !points_back {
                continue;
            }
            let (Some(fk_name), Some(parent)) =
                (row.constraint_name.as_deref(), db.find_table(&row.ref_table))
            else {
                continue;
            };
            link_row(db, fk_name, id, parent, &row);
        }

        Ok(id)
    }
}

/// Link one column pair of `fk_name` from `child` to `parent`. Unknown
/// columns are logged and skipped.
fn link_row(
    db: &mut Database,
    fk_name: &str,
    child: TableId,
    parent: TableId,
    row: &ImportedKeyMeta,
) -> Option<ConstraintId> {
    let child_table = db.table(child);
    let Some(child_pos) = child_table.column_position(&row.column_name) else {
        tracing::warn!(
            "Foreign key {fk_name}: column {}.{} not found",
            child_table.full_name(),
            row.column_name
        );
        return None;
    };
    let parent_table = db.table(parent);
    let Some(parent_pos) = parent_table.column_position(&row.ref_column) else {
        tracing::warn!(
            "Foreign key {fk_name} on {}.{}: referenced column {}.{} not found",
            child_table.full_name(),
            row.column_name,
            parent_table.full_name(),
            row.ref_column
        );
        return None;
    };

    let child_col = child_table.column_id(child_pos);
    let parent_col = parent_table.column_id(parent_pos);
    Some(db.add_foreign_key(
        fk_name,
        child_col,
        parent_col,
        ReferentialAction::from_rule_name(&row.update_rule),
        ReferentialAction::from_rule_name(&row.delete_rule),
        ConstraintKind::Declared,
    ))
}
