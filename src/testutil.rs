use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use crate::error::SchemaLinkError;
use crate::introspect::{MetadataProvider, MetadataResult};
use crate::model::{
    Column, ConstraintId, ConstraintKind, Database, ReferentialAction, Table, TableId, TableKind,
};
use crate::schema::{
    CheckConstraintMeta, ColumnMeta, ImportedKeyMeta, IndexColumnMeta, PrimaryKeyMeta,
    RoutineMeta, TableMeta, TableType,
};

/// Create a Column with sensible defaults for testing.
/// Returns a non-nullable int4 column of length 10 with no default and no comment.
pub fn test_column(name: &str) -> Column {
    let mut column = Column::new(name, "int4", 10);
    column.nullable = false;
    column
}

/// Add a base table in schema `public` with `test_column`s and the given
/// primary key.
pub fn add_test_table(db: &mut Database, name: &str, columns: &[&str], pk: &[&str]) -> TableId {
    let mut table = Table::new("public", name, TableKind::Table);
    for col in columns {
        table.add_column(test_column(col)).unwrap();
    }
    let positions = pk
        .iter()
        .map(|c| table.column_position(c).unwrap())
        .collect();
    table.set_primary_key(positions);
    db.add_table(table)
}

/// Declare `child.child_col -> parent.parent_col` as a constraint named
/// `fk_<child>_<child_col>`.
pub fn link(
    db: &mut Database,
    child: TableId,
    child_col: &str,
    parent: TableId,
    parent_col: &str,
) -> ConstraintId {
    let child_pos = db.table(child).column_position(child_col).unwrap();
    let parent_pos = db.table(parent).column_position(parent_col).unwrap();
    let name = format!("fk_{}_{}", db.table(child).name.to_lowercase(), child_col);
    db.add_foreign_key(
        &name,
        db.table(child).column_id(child_pos),
        db.table(parent).column_id(parent_pos),
        ReferentialAction::NoAction,
        ReferentialAction::NoAction,
        ConstraintKind::Declared,
    )
}

pub fn column_meta(name: &str, position: i32) -> ColumnMeta {
    ColumnMeta {
        name: name.to_string(),
        ordinal_position: position,
        type_name: "int4".to_string(),
        length: 10,
        decimal_digits: Some(0),
        is_nullable: false,
        default_value: None,
        is_auto_increment: false,
        comment: None,
    }
}

#[derive(Debug, Clone)]
struct StaticTable {
    meta: TableMeta,
    columns: Vec<ColumnMeta>,
    primary_keys: Vec<PrimaryKeyMeta>,
    indexes: Vec<IndexColumnMeta>,
    imported_keys: Vec<ImportedKeyMeta>,
    check_constraints: Vec<CheckConstraintMeta>,
    row_count: u64,
    view_definition: Option<String>,
}

/// In-memory [`MetadataProvider`] for tests. Tables are addressed by
/// `schema.name`; failures can be injected per table.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    database: String,
    tables: BTreeMap<String, StaticTable>,
    routines: BTreeMap<String, Vec<RoutineMeta>>,
    keywords: Vec<String>,
    failing_columns: BTreeSet<String>,
    failing_row_counts: BTreeSet<String>,
}

fn key(schema: &str, table: &str) -> String {
    format!("{schema}.{table}")
}

impl StaticProvider {
    pub fn new(database: &str) -> Self {
        Self {
            database: database.to_string(),
            ..Default::default()
        }
    }

    /// Add a base table of int4 columns with the given primary key.
    pub fn table(mut self, schema: &str, name: &str, columns: &[&str], pk: &[&str]) -> Self {
        self.insert(schema, name, TableType::Table, columns, pk);
        self
    }

    pub fn view(mut self, schema: &str, name: &str, columns: &[&str], sql: &str) -> Self {
        self.insert(schema, name, TableType::View, columns, &[]);
        if let Some(t) = self.tables.get_mut(&key(schema, name)) {
            t.view_definition = Some(sql.to_string());
        }
        self
    }

    fn insert(&mut self, schema: &str, name: &str, table_type: TableType, columns: &[&str], pk: &[&str]) {
        let table = StaticTable {
            meta: TableMeta {
                schema: schema.to_string(),
                name: name.to_string(),
                table_type,
                comment: None,
            },
            columns: columns
                .iter()
                .enumerate()
                .map(|(i, c)| column_meta(c, i as i32 + 1))
                .collect(),
            primary_keys: pk
                .iter()
                .enumerate()
                .map(|(i, c)| PrimaryKeyMeta {
                    constraint_name: Some(format!("{name}_pkey")),
                    column_name: c.to_string(),
                    key_seq: i as i32 + 1,
                })
                .collect(),
            indexes: pk
                .iter()
                .enumerate()
                .map(|(i, c)| IndexColumnMeta {
                    index_name: format!("{name}_pkey"),
                    index_id: None,
                    is_unique: true,
                    is_primary: true,
                    column_name: c.to_string(),
                    ascending: true,
                    position: i as i32 + 1,
                })
                .collect(),
            imported_keys: Vec::new(),
            check_constraints: Vec::new(),
            row_count: 0,
            view_definition: None,
        };
        self.tables.insert(key(schema, name), table);
    }

    /// Declare one column pair of a foreign key on `schema.table`. Passing
    /// `None` as the name models a backend that doesn't name constraints.
    #[allow(clippy::too_many_arguments)]
    pub fn foreign_key(
        mut self,
        schema: &str,
        table: &str,
        name: Option<&str>,
        column: &str,
        ref_schema: &str,
        ref_table: &str,
        ref_column: &str,
    ) -> Self {
        if let Some(t) = self.tables.get_mut(&key(schema, table)) {
            let key_seq = t.imported_keys.len() as i32 + 1;
            t.imported_keys.push(ImportedKeyMeta {
                constraint_name: name.map(|n| n.to_string()),
                column_name: column.to_string(),
                ref_schema: Some(ref_schema.to_string()),
                ref_table: ref_table.to_string(),
                ref_column: ref_column.to_string(),
                update_rule: "NO ACTION".to_string(),
                delete_rule: "CASCADE".to_string(),
                key_seq,
            });
        }
        self
    }

    pub fn unique_index(mut self, schema: &str, table: &str, index: &str, columns: &[&str]) -> Self {
        if let Some(t) = self.tables.get_mut(&key(schema, table)) {
            for (i, c) in columns.iter().enumerate() {
                t.indexes.push(IndexColumnMeta {
                    index_name: index.to_string(),
                    index_id: None,
                    is_unique: true,
                    is_primary: false,
                    column_name: c.to_string(),
                    ascending: true,
                    position: i as i32 + 1,
                });
            }
        }
        self
    }

    pub fn check(mut self, schema: &str, table: &str, name: &str, definition: &str) -> Self {
        if let Some(t) = self.tables.get_mut(&key(schema, table)) {
            t.check_constraints.push(CheckConstraintMeta {
                name: name.to_string(),
                definition: definition.to_string(),
            });
        }
        self
    }

    pub fn rows(mut self, schema: &str, table: &str, rows: u64) -> Self {
        if let Some(t) = self.tables.get_mut(&key(schema, table)) {
            t.row_count = rows;
        }
        self
    }

    pub fn routine(mut self, schema: &str, routine: RoutineMeta) -> Self {
        self.routines.entry(schema.to_string()).or_default().push(routine);
        self
    }

    pub fn keywords(mut self, words: &[&str]) -> Self {
        self.keywords = words.iter().map(|w| w.to_string()).collect();
        self
    }

    /// Make column fetches for the table fail.
    pub fn fail_columns(mut self, schema: &str, table: &str) -> Self {
        self.failing_columns.insert(key(schema, table));
        self
    }

    pub fn fail_row_count(mut self, schema: &str, table: &str) -> Self {
        self.failing_row_counts.insert(key(schema, table));
        self
    }

    fn get(&self, schema: &str, table: &str) -> Option<&StaticTable> {
        self.tables.get(&key(schema, table))
    }
}

#[async_trait]
impl MetadataProvider for StaticProvider {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn tables(&self, schema: &str) -> MetadataResult<Vec<TableMeta>> {
        Ok(self
            .tables
            .values()
            .filter(|t| t.meta.schema == schema)
            .map(|t| t.meta.clone())
            .collect())
    }

    async fn columns(&self, schema: &str, table: &str) -> MetadataResult<Vec<ColumnMeta>> {
        if self.failing_columns.contains(&key(schema, table)) {
            return Err(SchemaLinkError::Metadata(format!(
                "permission denied for table {table}"
            )));
        }
        Ok(self.get(schema, table).map(|t| t.columns.clone()).unwrap_or_default())
    }

    async fn indexes(&self, schema: &str, table: &str) -> MetadataResult<Vec<IndexColumnMeta>> {
        Ok(self.get(schema, table).map(|t| t.indexes.clone()).unwrap_or_default())
    }

    async fn primary_keys(
        &self,
        schema: &str,
        table: &str,
    ) -> MetadataResult<Vec<PrimaryKeyMeta>> {
        Ok(self
            .get(schema, table)
            .map(|t| t.primary_keys.clone())
            .unwrap_or_default())
    }

    async fn imported_keys(
        &self,
        schema: &str,
        table: &str,
    ) -> MetadataResult<Vec<ImportedKeyMeta>> {
        Ok(self
            .get(schema, table)
            .map(|t| t.imported_keys.clone())
            .unwrap_or_default())
    }

    async fn check_constraints(
        &self,
        schema: &str,
        table: &str,
    ) -> MetadataResult<Vec<CheckConstraintMeta>> {
        Ok(self
            .get(schema, table)
            .map(|t| t.check_constraints.clone())
            .unwrap_or_default())
    }

    async fn row_count(&self, schema: &str, table: &str) -> MetadataResult<u64> {
        if self.failing_row_counts.contains(&key(schema, table)) {
            return Err(SchemaLinkError::Metadata(format!("cannot count {table}")));
        }
        Ok(self.get(schema, table).map(|t| t.row_count).unwrap_or_default())
    }

    async fn view_definition(&self, schema: &str, view: &str) -> MetadataResult<Option<String>> {
        Ok(self.get(schema, view).and_then(|t| t.view_definition.clone()))
    }

    async fn routines(&self, schema: &str) -> MetadataResult<Vec<RoutineMeta>> {
        Ok(self.routines.get(schema).cloned().unwrap_or_default())
    }

    async fn keywords(&self) -> MetadataResult<Vec<String>> {
        Ok(self.keywords.clone())
    }
}
