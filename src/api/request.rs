use serde::{Deserialize, Serialize};

/// Query string of `GET /api/sales/summary`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SummaryQuery {
    /// Sale date, `YYYY-MM-DD`
    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub product: Option<String>,

    #[serde(default)]
    pub region: Option<String>,
}
