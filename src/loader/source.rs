use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::domain::SalesDraft;
use crate::service::validation::round_amount;

/// Default Mockaroo generate endpoint.
pub const MOCKAROO_URL: &str = "https://api.mockaroo.com/api/generate.json";

const PRODUCTS: [&str; 10] = [
    "Product A", "Product B", "Product C", "Product D", "Product E", "Product F", "Product G",
    "Product H", "Product I", "Product J",
];

const REGIONS: [&str; 7] = [
    "East", "North", "South", "Central", "Southwest", "Northwest", "Northeast",
];

/// Errors from an upstream data source.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Generator returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid sale date: {0}")]
    InvalidDate(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),
}

/// A record as produced by the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSale {
    /// RFC 3339 datetime or plain date
    pub sale_date: String,
    pub product: String,
    pub region: String,
    pub amount: f64,
}

impl RawSale {
    /// Convert to a draft: datetime truncated to its date, amount rounded to cents.
    pub fn to_draft(&self) -> Result<SalesDraft, SourceError> {
        let sale_date = parse_sale_date(&self.sale_date)
            .ok_or_else(|| SourceError::InvalidDate(self.sale_date.clone()))?;

        // Display gives the shortest round-trip form, so 0.1 stays 0.1
        let amount: Decimal = self
            .amount
            .to_string()
            .parse()
            .map_err(|_| SourceError::InvalidAmount(self.amount))?;

        Ok(SalesDraft::new(
            sale_date,
            self.product.clone(),
            self.region.clone(),
            round_amount(amount),
        ))
    }
}

fn parse_sale_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    ["%Y-%m-%d", "%m/%d/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Upstream supplier of raw sales records.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_batch(&self, count: usize) -> Result<Vec<RawSale>, SourceError>;
}

/// Mockaroo test data generator client.
pub struct MockarooSource {
    client: Client,
    url: String,
    api_key: String,
}

impl MockarooSource {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(MockarooSource {
            client,
            url: url.into(),
            api_key: api_key.into(),
        })
    }

    /// Field schema sent as the request body.
    fn schema() -> serde_json::Value {
        json!([
            { "name": "sale_date", "type": "Datetime" },
            { "name": "product", "type": "Custom List", "values": PRODUCTS },
            { "name": "region", "type": "Custom List", "values": REGIONS },
            { "name": "amount", "type": "Number", "min": 100, "max": 10000, "decimals": 2 }
        ])
    }
}

#[async_trait]
impl DataSource for MockarooSource {
    async fn fetch_batch(&self, count: usize) -> Result<Vec<RawSale>, SourceError> {
        info!(count, url = %self.url, "Requesting generated sales data");

        let count = count.to_string();
        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str()), ("count", count.as_str())])
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&Self::schema())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let records: Vec<RawSale> = response.json().await?;

        info!(received = records.len(), "Generated sales data received");

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(sale_date: &str, amount: f64) -> RawSale {
        RawSale {
            sale_date: sale_date.to_string(),
            product: "Product A".to_string(),
            region: "East".to_string(),
            amount,
        }
    }

    #[test]
    fn test_generator_response_parsing() {
        let body = r#"[
            {"sale_date": "2025-05-15T14:22:17+00:00", "product": "Product C", "region": "North", "amount": 4521.37},
            {"sale_date": "2025-01-02", "product": "Product J", "region": "Central", "amount": 100}
        ]"#;

        let records: Vec<RawSale> = serde_json::from_str(body).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].product, "Product C");
        assert_eq!(records[1].amount, 100.0);
    }

    #[test]
    fn test_datetime_truncated_to_date() {
        let draft = raw("2025-05-15T23:22:17+00:00", 10.0).to_draft().unwrap();
        assert_eq!(draft.sale_date, NaiveDate::from_ymd_opt(2025, 5, 15));
    }

    #[test]
    fn test_other_date_formats() {
        for s in ["2025-05-15", "2025-05-15T08:00:00", "05/15/2025"] {
            let draft = raw(s, 10.0).to_draft().unwrap();
            assert_eq!(draft.sale_date, NaiveDate::from_ymd_opt(2025, 5, 15), "{s}");
        }
        assert!(matches!(
            raw("yesterday", 10.0).to_draft(),
            Err(SourceError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_amount_rounding() {
        let draft = raw("2025-05-15", 1234.565).to_draft().unwrap();
        assert_eq!(draft.amount, Some(Decimal::new(123457, 2)));

        let draft = raw("2025-05-15", 0.1).to_draft().unwrap();
        assert_eq!(draft.amount.unwrap().to_string(), "0.10");
    }

    #[test]
    fn test_non_finite_amount() {
        assert!(matches!(
            raw("2025-05-15", f64::NAN).to_draft(),
            Err(SourceError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_schema_lists() {
        let schema = MockarooSource::schema();
        assert_eq!(schema[1]["values"].as_array().unwrap().len(), 10);
        assert_eq!(schema[2]["values"].as_array().unwrap().len(), 7);
        assert_eq!(schema[3]["decimals"], 2);
    }

    #[test]
    fn test_new_keeps_endpoint_and_key() {
        let source = MockarooSource::new(MOCKAROO_URL, "secret").unwrap();

        assert_eq!(source.url, MOCKAROO_URL);
        assert_eq!(source.api_key, "secret");
    }
}
