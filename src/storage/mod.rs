// src/storage/mod.rs
pub mod mock;
pub mod postgres;
pub mod traits;

pub use mock::{Fault, MockStore, StoreCalls};
pub use postgres::PgStore;
pub use traits::{SalesStore, SalesTransaction};
