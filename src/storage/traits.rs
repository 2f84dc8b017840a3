use async_trait::async_trait;

use crate::domain::{NewSale, SalesRecord, SalesSummary, SummaryFilter};

/// Storage trait for the sales table.
///
/// Reads and chunked bulk loads run directly against the store.
/// Everything the service writes goes through a [`SalesTransaction`].
#[async_trait]
pub trait SalesStore: Send + Sync {
    // Reads
    async fn find_all(&self) -> anyhow::Result<Vec<SalesRecord>>;
    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<SalesRecord>>;

    /// Group the filtered rows by (date, product, region), summing in the datastore.
    async fn aggregate(&self, filter: &SummaryFilter) -> anyhow::Result<Vec<SalesSummary>>;

    /// Insert rows in a single autocommitted unit. Returns the inserted row count.
    async fn bulk_insert(&self, sales: &[NewSale]) -> anyhow::Result<u64>;

    /// Open a transaction.
    async fn begin(&self) -> anyhow::Result<Box<dyn SalesTransaction>>;

    /// Check the store is reachable.
    async fn ping(&self) -> anyhow::Result<()>;
}

/// A unit of work against the sales table.
///
/// Dropping a transaction without calling [`commit`](Self::commit)
/// discards every write made through it.
#[async_trait]
pub trait SalesTransaction: Send {
    async fn find_by_id(&mut self, id: i32) -> anyhow::Result<Option<SalesRecord>>;

    /// Insert a row and return its assigned id.
    async fn insert(&mut self, sale: &NewSale) -> anyhow::Result<i32>;

    /// Replace every field of row `id`. Returns the affected row count.
    async fn update(&mut self, id: i32, sale: &NewSale) -> anyhow::Result<u64>;

    /// Delete row `id`. Returns the removed row count.
    async fn delete(&mut self, id: i32) -> anyhow::Result<u64>;

    async fn bulk_insert(&mut self, sales: &[NewSale]) -> anyhow::Result<u64>;

    async fn commit(self: Box<Self>) -> anyhow::Result<()>;
    async fn rollback(self: Box<Self>) -> anyhow::Result<()>;
}
