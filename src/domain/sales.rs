use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Candidate sales record as it arrives from a client or data source.
///
/// Every field is optional so that missing values can be reported
/// by validation instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesDraft {
    /// Ignored on create; overridden by the path id on update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,

    #[serde(default)]
    pub sale_date: Option<NaiveDate>,

    #[serde(default)]
    pub product: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    pub amount: Option<Decimal>,
}

impl SalesDraft {
    /// Build a fully populated draft.
    pub fn new(
        sale_date: NaiveDate,
        product: impl Into<String>,
        region: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        SalesDraft {
            id: None,
            sale_date: Some(sale_date),
            product: Some(product.into()),
            region: Some(region.into()),
            amount: Some(amount),
        }
    }
}

/// A validated sales record that has not been persisted yet.
///
/// Produced by `service::validation::validate`; amount is always
/// positive with a scale of 2 and product/region are trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSale {
    pub sale_date: NaiveDate,
    pub product: String,
    pub region: String,
    pub amount: Decimal,
}

/// A persisted sales record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesRecord {
    /// Store-assigned identifier
    pub id: i32,

    pub sale_date: NaiveDate,

    pub product: String,

    pub region: String,

    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
}

impl SalesRecord {
    /// Attach a store-assigned id to a validated sale.
    pub fn from_new(id: i32, sale: NewSale) -> Self {
        SalesRecord {
            id,
            sale_date: sale.sale_date,
            product: sale.product,
            region: sale.region,
            amount: sale.amount,
        }
    }
}

impl fmt::Display for SalesRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} {} {} {}",
            self.id, self.sale_date, self.product, self.region, self.amount
        )
    }
}
