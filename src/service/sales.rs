use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{parse_date, SalesDraft, SalesRecord, SalesSummary, SummaryFilter};
use crate::storage::SalesStore;

use super::error::ServiceError;
use super::validation::{validate, validate_all};

/// Business rules for sales records.
///
/// Stateless: every call goes straight to the store. Each write runs in
/// its own store transaction; an early return drops the transaction,
/// which rolls it back.
#[derive(Clone)]
pub struct SalesService {
    store: Arc<dyn SalesStore>,
}

impl SalesService {
    pub fn new(store: Arc<dyn SalesStore>) -> Self {
        SalesService { store }
    }

    /// All records in store order.
    pub async fn list_all(&self) -> Result<Vec<SalesRecord>, ServiceError> {
        Ok(self.store.find_all().await?)
    }

    /// Look up a record. A missing record is `Ok(None)`, not an error.
    pub async fn get_by_id(&self, id: Option<i32>) -> Result<Option<SalesRecord>, ServiceError> {
        let id = id.ok_or_else(|| ServiceError::validation("ID cannot be null"))?;
        Ok(self.store.find_by_id(id).await?)
    }

    /// Validate and persist a new record.
    pub async fn create(&self, draft: Option<&SalesDraft>) -> Result<SalesRecord, ServiceError> {
        let sale = validate(draft)?;

        let mut tx = self.store.begin().await?;
        let id = tx.insert(&sale).await?;
        tx.commit().await?;

        info!(id, product = %sale.product, region = %sale.region, "Sales record created");

        Ok(SalesRecord::from_new(id, sale))
    }

    /// Replace every field of an existing record.
    ///
    /// `id` wins over any id carried in the draft.
    pub async fn update(
        &self,
        id: Option<i32>,
        draft: Option<&SalesDraft>,
    ) -> Result<SalesRecord, ServiceError> {
        let id = id.ok_or_else(|| ServiceError::validation("Sales ID cannot be null for update"))?;
        let sale = validate(draft)?;

        let mut tx = self.store.begin().await?;

        if tx.find_by_id(id).await?.is_none() {
            tx.rollback().await?;
            warn!(id, "Update of missing sales record");
            return Err(ServiceError::NotFound(id));
        }

        // The row can vanish between the check and the update
        if tx.update(id, &sale).await? == 0 {
            tx.rollback().await?;
            warn!(id, "Sales record removed before update");
            return Err(ServiceError::NotFound(id));
        }
        tx.commit().await?;

        info!(id, "Sales record updated");

        Ok(SalesRecord::from_new(id, sale))
    }

    /// Delete a record. Returns false if it did not exist.
    pub async fn delete(&self, id: Option<i32>) -> Result<bool, ServiceError> {
        let id = id.ok_or_else(|| ServiceError::validation("ID cannot be null"))?;

        let mut tx = self.store.begin().await?;

        if tx.find_by_id(id).await?.is_none() {
            tx.rollback().await?;
            debug!(id, "Delete of missing sales record");
            return Ok(false);
        }

        let removed = tx.delete(id).await?;
        tx.commit().await?;

        info!(id, removed, "Sales record deleted");

        Ok(removed > 0)
    }

    /// Summaries grouped by (date, product, region).
    ///
    /// Blank filters count as absent. Grouping and summing happen in the store.
    pub async fn aggregate(
        &self,
        date: Option<&str>,
        product: Option<&str>,
        region: Option<&str>,
    ) -> Result<Vec<SalesSummary>, ServiceError> {
        let date = match date {
            Some(s) => parse_date(s)
                .map_err(|_| ServiceError::validation(format!("Invalid date '{s}', expected YYYY-MM-DD")))?,
            None => None,
        };

        let filter = SummaryFilter {
            date,
            product: non_blank(product),
            region: non_blank(region),
        };

        let summaries = self.store.aggregate(&filter).await?;

        debug!(?filter, groups = summaries.len(), "Sales aggregated");

        Ok(summaries)
    }

    /// Validate every draft, then insert them all in one transaction.
    ///
    /// Returns `Ok(false)` if the store inserted fewer rows than given.
    pub async fn batch_import(&self, drafts: Option<&[SalesDraft]>) -> Result<bool, ServiceError> {
        let drafts = match drafts {
            Some(d) if !d.is_empty() => d,
            _ => return Err(ServiceError::validation("Sales list cannot be empty")),
        };

        let sales = validate_all(drafts)?;

        let mut tx = self.store.begin().await?;
        let inserted = tx.bulk_insert(&sales).await?;
        tx.commit().await?;

        let complete = inserted == sales.len() as u64;
        if complete {
            info!(count = inserted, "Batch import completed");
        } else {
            warn!(
                expected = sales.len(),
                inserted, "Batch import inserted fewer rows than requested"
            );
        }

        Ok(complete)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
