use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::NewSale;
use crate::service::validate;
use crate::storage::SalesStore;

use super::source::RawSale;

/// Rows per bulk insert.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Best-effort chunked loader.
///
/// Each chunk is a separate bulk insert that commits on its own. A chunk
/// that inserts fewer rows than it was given does not stop the load;
/// only store errors do.
pub struct BatchLoader {
    store: Arc<dyn SalesStore>,
    chunk_size: usize,
}

impl BatchLoader {
    pub fn new(store: Arc<dyn SalesStore>) -> Self {
        BatchLoader {
            store,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the chunk size. Zero is treated as one.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Insert `sales` in order, one chunk at a time. Returns the total inserted.
    pub async fn load(&self, sales: &[NewSale]) -> anyhow::Result<u64> {
        if sales.is_empty() {
            info!("No sales records to load");
            return Ok(0);
        }

        let total = sales.len();
        let mut inserted_total = 0u64;

        info!(total, chunk_size = self.chunk_size, "Starting chunked load");

        for (index, chunk) in sales.chunks(self.chunk_size).enumerate() {
            let start = index * self.chunk_size;
            let end = start + chunk.len();

            let inserted = self.store.bulk_insert(chunk).await?;
            inserted_total += inserted;

            if inserted < chunk.len() as u64 {
                warn!(
                    first = start + 1,
                    last = end,
                    requested = chunk.len(),
                    inserted,
                    "Chunk inserted fewer rows than requested"
                );
            }

            info!(
                first = start + 1,
                last = end,
                progress = %format_args!("{end}/{total}"),
                "Chunk loaded"
            );
        }

        info!(inserted = inserted_total, total, "Chunked load complete");

        Ok(inserted_total)
    }
}

/// Convert and validate generated records, skipping any that fail.
pub fn prepare(records: &[RawSale]) -> Vec<NewSale> {
    let mut prepared = Vec::with_capacity(records.len());

    for (index, raw) in records.iter().enumerate() {
        let result = raw
            .to_draft()
            .map_err(|e| e.to_string())
            .and_then(|draft| validate(Some(&draft)).map_err(|e| e.to_string()));

        match result {
            Ok(sale) => prepared.push(sale),
            Err(reason) => warn!(index, reason = %reason, "Skipping generated record"),
        }
    }

    prepared
}
