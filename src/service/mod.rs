pub mod error;
pub mod sales;
pub mod validation;

pub use error::{ServiceError, ValidationError};
pub use sales::SalesService;
pub use validation::{validate, validate_all};
