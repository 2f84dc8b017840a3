pub mod date;
pub mod sales;
pub mod summary;

pub use date::{format_date, is_valid_date, parse_date};
pub use sales::{NewSale, SalesDraft, SalesRecord};
pub use summary::{SalesSummary, SummaryFilter};
