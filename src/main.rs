use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use schemalink::cli::{Cli, ConnectionConfig};
use schemalink::graph::order_tables;
use schemalink::introspect::{MetadataProvider, MssqlProvider, PgProvider};
use schemalink::output::{write_order_files, Generator, SummaryGenerator};
use schemalink::{load_database, AnalysisConfig, SchemaLinkError};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let connection = cli.parse_connection()?;
    let config = cli.analysis_config(connection.dialect())?;

    tracing::debug!("Connecting to database...");

    match connection {
        ConnectionConfig::Postgres(url) => {
            let provider = PgProvider::connect(&url, config.pool_size()).await?;
            let result = run(&cli, &provider, &config).await;
            provider.close().await;
            result
        }
        ConnectionConfig::Mssql {
            host,
            port,
            database,
            user,
            password,
            trust_cert,
        } => {
            let provider =
                MssqlProvider::connect(&host, port, &database, &user, &password, trust_cert)
                    .await?;
            run(&cli, &provider, &config).await
        }
    }
}

async fn run(cli: &Cli, provider: &dyn MetadataProvider, config: &AnalysisConfig) -> Result<()> {
    tracing::debug!("Analyzing schema {}...", config.schema);

    let db = match load_database(provider, config).await {
        Ok(db) => db,
        Err(SchemaLinkError::EmptySchema(schema)) => {
            tracing::warn!("Schema {schema} has no tables or views matching the filters");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let ordering = order_tables(&db);
    if !ordering.recursive_constraints.is_empty() {
        tracing::info!(
            "Severed {} constraints to break dependency cycles",
            ordering.recursive_constraints.len()
        );
    }

    write_order_files(&cli.output_dir, &db, &ordering)?;
    print!("{}", SummaryGenerator.generate(&db, &ordering));

    Ok(())
}
