pub mod batch;
pub mod source;

pub use batch::{prepare, BatchLoader, DEFAULT_CHUNK_SIZE};
pub use source::{DataSource, MockarooSource, RawSale, SourceError, MOCKAROO_URL};
