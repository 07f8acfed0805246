use regex::Regex;

use crate::error::SchemaLinkError;
use crate::filter::NameFilter;
use crate::model::ident::normalize;
use crate::model::Column;

/// Everything the loader and resolvers need to know, passed explicitly.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// The schema under analysis. Tables referenced from other schemas are
    /// treated as remote.
    pub schema: String,
    pub table_filter: NameFilter,
    pub routine_filter: NameFilter,
    pub column_exclusions: ColumnExclusions,
    pub include_views: bool,
    pub count_rows: bool,
    pub implied_constraints: bool,
    pub rails_constraints: bool,
    /// Upper bound on concurrent per-table metadata fetches.
    pub threads: usize,
}

impl AnalysisConfig {
    pub fn new(schema: &str) -> Self {
        Self {
            schema: schema.to_string(),
            table_filter: NameFilter::default(),
            routine_filter: NameFilter::default(),
            column_exclusions: ColumnExclusions::default(),
            include_views: true,
            count_rows: true,
            implied_constraints: true,
            rails_constraints: false,
            threads: 1,
        }
    }

    /// Whether `schema` names the schema under analysis. Identifiers
    /// compare without case.
    pub fn is_analyzed_schema(&self, schema: &str) -> bool {
        normalize(schema) == normalize(&self.schema)
    }

    /// Connection pool size for the fetch bound, saturating at `u32::MAX`.
    pub fn pool_size(&self) -> u32 {
        u32::try_from(self.threads.max(1)).unwrap_or(u32::MAX)
    }
}

/// Patterns matched against `table.column`.
#[derive(Debug, Clone, Default)]
pub struct ColumnExclusions {
    /// Columns hidden from every diagram.
    pub all: Option<Regex>,
    /// Columns hidden only from diagrams of indirect relationships.
    pub indirect: Option<Regex>,
    /// Columns that never take part in implied relationships.
    pub implied_disabled: Option<Regex>,
}

impl ColumnExclusions {
    /// Set the exclusion and implied-key flags of a column of `table`.
    pub fn apply(&self, table: &str, column: &mut Column) {
        let qualified = format!("{table}.{}", column.name);
        let matches = |re: &Option<Regex>| re.as_ref().is_some_and(|re| re.is_match(&qualified));

        column.all_excluded = matches(&self.all);
        column.excluded = column.all_excluded || matches(&self.indirect);
        if matches(&self.implied_disabled) {
            column.allows_implied_parents = false;
            column.allows_implied_children = false;
        }
    }
}

/// Compile a user-supplied pattern so it must match the whole input,
/// ignoring case.
pub fn compile_pattern(option: &'static str, pattern: &str) -> Result<Regex, SchemaLinkError> {
    Regex::new(&format!("(?i)^(?:{pattern})$"))
        .map_err(|source| SchemaLinkError::InvalidPattern { option, source })
}

/// Compile an optional pattern; empty strings count as absent.
pub fn compile_optional(
    option: &'static str,
    pattern: Option<&str>,
) -> Result<Option<Regex>, SchemaLinkError> {
    match pattern {
        Some(p) if !p.is_empty() => compile_pattern(option, p).map(Some),
        _ => Ok(None),
    }
}
