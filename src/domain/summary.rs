use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregated sales for one (date, product, region) group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    /// Sale date as `YYYY-MM-DD`
    pub date: String,

    pub product: String,

    pub region: String,

    /// Sum of amounts in the group
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub total_amount: Decimal,

    /// Number of records in the group
    pub count: i64,
}

/// Optional narrowing applied before grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryFilter {
    pub date: Option<NaiveDate>,
    pub product: Option<String>,
    pub region: Option<String>,
}
