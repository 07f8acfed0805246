//! Raw metadata rows as returned by a [`MetadataProvider`](crate::introspect::MetadataProvider).
//!
//! These are flat, unresolved records. The model in [`crate::model`] is built
//! from them.

/// A table or view discovered in a schema.
#[derive(Debug, Clone)]
pub struct TableMeta {
    pub schema: String,
    pub name: String,
    pub table_type: TableType,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableType {
    Table,
    View,
}

impl TableType {
    /// Name used by type filters (`TABLE`, `VIEW`).
    pub fn label(&self) -> &'static str {
        match self {
            TableType::Table => "TABLE",
            TableType::View => "VIEW",
        }
    }
}

/// Metadata for a single column.
#[derive(Debug, Clone)]
pub struct ColumnMeta {
    pub name: String,
    pub ordinal_position: i32,
    pub type_name: String,
    /// Character length or numeric precision; 0 when the type has neither.
    pub length: i32,
    pub decimal_digits: Option<i32>,
    pub is_nullable: bool,
    pub default_value: Option<String>,
    pub is_auto_increment: bool,
    pub comment: Option<String>,
}

/// One column of one index. Multi-column indexes produce several rows that
/// share `index_name`.
#[derive(Debug, Clone)]
pub struct IndexColumnMeta {
    pub index_name: String,
    /// Catalog id of the index (oid / index_id), when the backend has one.
    pub index_id: Option<i64>,
    pub is_unique: bool,
    pub is_primary: bool,
    pub column_name: String,
    pub ascending: bool,
    pub position: i32,
}

#[derive(Debug, Clone)]
pub struct PrimaryKeyMeta {
    pub constraint_name: Option<String>,
    pub column_name: String,
    pub key_seq: i32,
}

/// One child-column/parent-column pair of a foreign key.
///
/// Composite keys produce one row per column pair, all sharing the same
/// `constraint_name`.
#[derive(Debug, Clone)]
pub struct ImportedKeyMeta {
    /// `None` when the backend doesn't name its constraints.
    pub constraint_name: Option<String>,
    pub column_name: String,
    pub ref_schema: Option<String>,
    pub ref_table: String,
    pub ref_column: String,
    pub update_rule: String,
    pub delete_rule: String,
    pub key_seq: i32,
}

#[derive(Debug, Clone)]
pub struct CheckConstraintMeta {
    pub name: String,
    pub definition: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineType {
    Procedure,
    Function,
}

#[derive(Debug, Clone)]
pub struct RoutineMeta {
    pub name: String,
    pub routine_type: RoutineType,
    pub return_type: Option<String>,
    pub language: Option<String>,
    pub definition: Option<String>,
    pub is_deterministic: bool,
    pub security_type: Option<String>,
    pub comment: Option<String>,
    pub parameters: Vec<RoutineParameterMeta>,
}

#[derive(Debug, Clone)]
pub struct RoutineParameterMeta {
    pub name: Option<String>,
    pub type_name: String,
    /// IN, OUT or INOUT.
    pub mode: String,
}
