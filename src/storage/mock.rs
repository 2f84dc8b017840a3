use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{format_date, NewSale, SalesRecord, SalesSummary, SummaryFilter};

use super::traits::{SalesStore, SalesTransaction};

/// Calls observed by a MockStore, for assertions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub begins: usize,
    pub commits: usize,
    pub find_by_id: usize,
    pub inserts: usize,
    pub updates: usize,
    pub deletes: usize,
    /// Row count passed to each bulk insert, in call order
    pub bulk_inserts: Vec<usize>,
}

/// Failure injected into MockStore transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Updates match no row, as if a concurrent transaction deleted it
    UpdateMissesRow,
    /// Writes reach the staged table, then fail with a store error
    WriteError,
}

#[derive(Debug, Clone)]
struct Table {
    rows: BTreeMap<i32, SalesRecord>,
    next_id: i32,
}

impl Default for Table {
    fn default() -> Self {
        Table {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl Table {
    fn insert(&mut self, sale: &NewSale) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.insert(id, SalesRecord::from_new(id, sale.clone()));
        id
    }

    fn update(&mut self, id: i32, sale: &NewSale) -> u64 {
        match self.rows.get_mut(&id) {
            Some(row) => {
                *row = SalesRecord::from_new(id, sale.clone());
                1
            }
            None => 0,
        }
    }

    fn delete(&mut self, id: i32) -> u64 {
        self.rows.remove(&id).map_or(0, |_| 1)
    }

    fn bulk_insert(&mut self, sales: &[NewSale], cap: Option<u64>) -> u64 {
        let limit = cap.map_or(sales.len(), |cap| sales.len().min(cap as usize));
        for sale in &sales[..limit] {
            self.insert(sale);
        }
        limit as u64
    }

    fn aggregate(&self, filter: &SummaryFilter) -> Vec<SalesSummary> {
        let mut groups: BTreeMap<(chrono::NaiveDate, &str, &str), (Decimal, i64)> = BTreeMap::new();

        let matching = self.rows.values().filter(|row| {
            filter.date.map_or(true, |d| row.sale_date == d)
                && filter.product.as_deref().map_or(true, |p| row.product == p)
                && filter.region.as_deref().map_or(true, |r| row.region == r)
        });

        for row in matching {
            let entry = groups
                .entry((row.sale_date, row.product.as_str(), row.region.as_str()))
                .or_insert((Decimal::ZERO, 0));
            entry.0 += row.amount;
            entry.1 += 1;
        }

        groups
            .into_iter()
            .map(|((date, product, region), (total_amount, count))| SalesSummary {
                date: format_date(date),
                product: product.to_string(),
                region: region.to_string(),
                total_amount,
                count,
            })
            .collect()
    }
}

/// In-memory store for testing.
///
/// Transactions work on a private copy of the table which replaces the
/// shared table on commit, so concurrent transactions are last-writer-wins.
#[derive(Debug, Default)]
pub struct MockStore {
    table: Arc<Mutex<Table>>,
    calls: Arc<Mutex<StoreCalls>>,
    bulk_insert_cap: Arc<Mutex<Option<u64>>>,
    fault: Arc<Mutex<Option<Fault>>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert records directly, bypassing call tracking (for test setup).
    pub fn seed(&self, sales: &[NewSale]) -> Vec<i32> {
        let mut table = self.table.lock();
        sales.iter().map(|sale| table.insert(sale)).collect()
    }

    /// Limit how many rows each bulk insert actually writes (for testing shortfalls).
    pub fn set_bulk_insert_cap(&self, cap: Option<u64>) {
        *self.bulk_insert_cap.lock() = cap;
    }

    /// Inject a failure into transactions begun after this call.
    pub fn set_fault(&self, fault: Option<Fault>) {
        *self.fault.lock() = fault;
    }

    /// Get observed calls (for assertions).
    pub fn calls(&self) -> StoreCalls {
        self.calls.lock().clone()
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.table.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SalesStore for MockStore {
    async fn find_all(&self) -> anyhow::Result<Vec<SalesRecord>> {
        Ok(self.table.lock().rows.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<SalesRecord>> {
        self.calls.lock().find_by_id += 1;
        Ok(self.table.lock().rows.get(&id).cloned())
    }

    async fn aggregate(&self, filter: &SummaryFilter) -> anyhow::Result<Vec<SalesSummary>> {
        Ok(self.table.lock().aggregate(filter))
    }

    async fn bulk_insert(&self, sales: &[NewSale]) -> anyhow::Result<u64> {
        self.calls.lock().bulk_inserts.push(sales.len());
        let cap = *self.bulk_insert_cap.lock();
        Ok(self.table.lock().bulk_insert(sales, cap))
    }

    async fn begin(&self) -> anyhow::Result<Box<dyn SalesTransaction>> {
        self.calls.lock().begins += 1;
        let staged = self.table.lock().clone();

        Ok(Box::new(MockTransaction {
            shared: Arc::clone(&self.table),
            staged,
            calls: Arc::clone(&self.calls),
            bulk_insert_cap: *self.bulk_insert_cap.lock(),
            fault: *self.fault.lock(),
        }))
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Transaction over a MockStore.
struct MockTransaction {
    shared: Arc<Mutex<Table>>,
    staged: Table,
    calls: Arc<Mutex<StoreCalls>>,
    bulk_insert_cap: Option<u64>,
    fault: Option<Fault>,
}

impl MockTransaction {
    fn check_write(&self) -> anyhow::Result<()> {
        if self.fault == Some(Fault::WriteError) {
            anyhow::bail!("injected write failure");
        }
        Ok(())
    }
}

#[async_trait]
impl SalesTransaction for MockTransaction {
    async fn find_by_id(&mut self, id: i32) -> anyhow::Result<Option<SalesRecord>> {
        self.calls.lock().find_by_id += 1;
        Ok(self.staged.rows.get(&id).cloned())
    }

    async fn insert(&mut self, sale: &NewSale) -> anyhow::Result<i32> {
        self.calls.lock().inserts += 1;
        let id = self.staged.insert(sale);
        self.check_write()?;
        Ok(id)
    }

    async fn update(&mut self, id: i32, sale: &NewSale) -> anyhow::Result<u64> {
        self.calls.lock().updates += 1;
        if self.fault == Some(Fault::UpdateMissesRow) {
            return Ok(0);
        }
        let updated = self.staged.update(id, sale);
        self.check_write()?;
        Ok(updated)
    }

    async fn delete(&mut self, id: i32) -> anyhow::Result<u64> {
        self.calls.lock().deletes += 1;
        let removed = self.staged.delete(id);
        self.check_write()?;
        Ok(removed)
    }

    async fn bulk_insert(&mut self, sales: &[NewSale]) -> anyhow::Result<u64> {
        self.calls.lock().bulk_inserts.push(sales.len());
        let inserted = self.staged.bulk_insert(sales, self.bulk_insert_cap);
        self.check_write()?;
        Ok(inserted)
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        let MockTransaction {
            shared,
            staged,
            calls,
            ..
        } = *self;

        calls.lock().commits += 1;
        *shared.lock() = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        Ok(())
    }
}
