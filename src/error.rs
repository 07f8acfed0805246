use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaLinkError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("MSSQL error: {0}")]
    Mssql(#[from] tiberius::error::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid --{option} pattern: {source}")]
    InvalidPattern {
        option: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Table '{table}' already has a column named '{column}'")]
    DuplicateColumn { table: String, column: String },

    /// The base schema yielded no tables and no views. Callers decide whether
    /// this ends the run.
    #[error("Schema '{0}' contains no tables or views")]
    EmptySchema(String),
}

impl SchemaLinkError {
    pub fn is_empty_schema(&self) -> bool {
        matches!(self, SchemaLinkError::EmptySchema(_))
    }
}
