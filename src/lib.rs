pub mod api;
pub mod config;
pub mod domain;
pub mod loader;
pub mod observability;
pub mod service;
pub mod storage;

pub use config::{Config, LoaderConfig};
pub use domain::{NewSale, SalesDraft, SalesRecord, SalesSummary};
pub use service::{SalesService, ServiceError, ValidationError};
pub use storage::{SalesStore, SalesTransaction};
