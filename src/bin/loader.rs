//! Fetches generated sales data and bulk-loads it into the database.

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use salesr::config::LoaderConfig;
use salesr::loader::{prepare, BatchLoader, DataSource, MockarooSource};
use salesr::observability::init_tracing;
use salesr::storage::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = LoaderConfig::parse();

    init_tracing(&config.log_level, config.log_format);

    let db = &config.database;
    let store = PgStore::connect(
        &db.database_url,
        db.db_min_connections,
        db.db_max_connections,
    )
    .await?;

    if db.init_schema {
        store.init_schema().await?;
        info!("Sales schema initialized");
    }

    let source = MockarooSource::new(&config.generator_url, &config.generator_api_key)?;
    let raw = source.fetch_batch(config.count).await?;

    info!(generated = raw.len(), "Fetched generated sales data");

    for record in raw.iter().take(config.sample_size) {
        info!(
            sale_date = %record.sale_date,
            product = %record.product,
            region = %record.region,
            amount = record.amount,
            "Sample record"
        );
    }

    let sales = prepare(&raw);

    let loader = BatchLoader::new(Arc::new(store)).with_chunk_size(config.chunk_size);
    let inserted = loader.load(&sales).await?;

    info!(
        generated = raw.len(),
        valid = sales.len(),
        inserted,
        "Load complete"
    );

    Ok(())
}
