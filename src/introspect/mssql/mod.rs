mod columns;
mod constraints;
mod indexes;
mod routines;
mod tables;

use async_trait::async_trait;
use tiberius::{Client, Config, EncryptionLevel};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use super::{MetadataProvider, MetadataResult};
use crate::dialect::Dialect;
use crate::error::SchemaLinkError;
use crate::schema::{
    CheckConstraintMeta, ColumnMeta, ImportedKeyMeta, IndexColumnMeta, PrimaryKeyMeta,
    RoutineMeta, TableMeta,
};

pub type MssqlClient = Client<Compat<TcpStream>>;

/// SQL Server catalog access over a single TDS connection.
///
/// The connection is serialized behind a mutex, so concurrent fetches queue
/// up rather than run in parallel.
pub struct MssqlProvider {
    client: Mutex<MssqlClient>,
    database: String,
}

impl MssqlProvider {
    /// Establish a connection to a MSSQL server.
    pub async fn connect(
        host: &str,
        port: u16,
        database: &str,
        user: &str,
        password: &str,
        trust_cert: bool,
    ) -> MetadataResult<Self> {
        let mut config = Config::new();
        config.host(host);
        config.port(port);
        config.database(database);
        config.authentication(tiberius::AuthMethod::sql_server(user, password));
        config.encryption(EncryptionLevel::Required);
        if trust_cert {
            config.trust_cert();
        }

        let tcp = TcpStream::connect(config.get_addr()).await.map_err(|e| {
            SchemaLinkError::Connection(format!("TCP connection to {host}:{port} failed: {e}"))
        })?;
        tcp.set_nodelay(true)
            .map_err(|e| SchemaLinkError::Connection(format!("Failed to set TCP_NODELAY: {e}")))?;

        let client = Client::connect(config, tcp.compat_write()).await?;
        Ok(Self {
            client: Mutex::new(client),
            database: database.to_string(),
        })
    }
}

#[async_trait]
impl MetadataProvider for MssqlProvider {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn tables(&self, schema: &str) -> MetadataResult<Vec<TableMeta>> {
        let mut client = self.client.lock().await;
        tables::query_tables(&mut client, schema).await
    }

    async fn columns(&self, schema: &str, table: &str) -> MetadataResult<Vec<ColumnMeta>> {
        let mut client = self.client.lock().await;
        columns::query_columns(&mut client, schema, table).await
    }

    async fn indexes(&self, schema: &str, table: &str) -> MetadataResult<Vec<IndexColumnMeta>> {
        let mut client = self.client.lock().await;
        indexes::query_indexes(&mut client, schema, table).await
    }

    async fn primary_keys(
        &self,
        schema: &str,
        table: &str,
    ) -> MetadataResult<Vec<PrimaryKeyMeta>> {
        let mut client = self.client.lock().await;
        constraints::query_primary_keys(&mut client, schema, table).await
    }

    async fn imported_keys(
        &self,
        schema: &str,
        table: &str,
    ) -> MetadataResult<Vec<ImportedKeyMeta>> {
        let mut client = self.client.lock().await;
        constraints::query_imported_keys(&mut client, schema, table).await
    }

    async fn check_constraints(
        &self,
        schema: &str,
        table: &str,
    ) -> MetadataResult<Vec<CheckConstraintMeta>> {
        let mut client = self.client.lock().await;
        constraints::query_check_constraints(&mut client, schema, table).await
    }

    async fn row_count(&self, schema: &str, table: &str) -> MetadataResult<u64> {
        let sql = format!(
            "SELECT COUNT_BIG(*) AS row_count FROM {}.{}",
            Dialect::Mssql.quote_identifier(schema),
            Dialect::Mssql.quote_identifier(table)
        );
        let mut client = self.client.lock().await;
        let row = client.simple_query(sql).await?.into_row().await?;
        let count = row
            .and_then(|r| r.get::<i64, _>("row_count"))
            .unwrap_or_default();
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn view_definition(&self, schema: &str, view: &str) -> MetadataResult<Option<String>> {
        let mut client = self.client.lock().await;
        tables::query_view_definition(&mut client, schema, view).await
    }

    async fn routines(&self, schema: &str) -> MetadataResult<Vec<RoutineMeta>> {
        let mut client = self.client.lock().await;
        routines::query_routines(&mut client, schema).await
    }
}
