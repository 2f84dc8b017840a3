use clap::{Args, Parser, ValueEnum};

use crate::loader::{DEFAULT_CHUNK_SIZE, MOCKAROO_URL};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Database connection options shared by the server and the loader.
#[derive(Debug, Clone, Args)]
pub struct DatabaseArgs {
    /// PostgreSQL connection URL
    #[arg(long, default_value = "postgres://localhost/sales", env = "DATABASE_URL")]
    pub database_url: String,

    /// Minimum pooled connections
    #[arg(long, default_value = "1", env = "SALESR_DB_MIN_CONNECTIONS")]
    pub db_min_connections: u32,

    /// Maximum pooled connections
    #[arg(long, default_value = "10", env = "SALESR_DB_MAX_CONNECTIONS")]
    pub db_max_connections: u32,

    /// Create the sales table on startup if it is missing
    #[arg(long, default_value = "false", env = "SALESR_INIT_SCHEMA")]
    pub init_schema: bool,
}

impl Default for DatabaseArgs {
    fn default() -> Self {
        DatabaseArgs {
            database_url: "postgres://localhost/sales".to_string(),
            db_min_connections: 1,
            db_max_connections: 10,
            init_schema: false,
        }
    }
}

/// Sales service configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "salesr")]
#[command(about = "Sales transaction recording and aggregation service")]
pub struct Config {
    /// HTTP server listen address
    #[arg(long, default_value = "0.0.0.0:8080", env = "SALESR_LISTEN_ADDR")]
    pub listen_addr: String,

    #[command(flatten)]
    pub database: DatabaseArgs,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value = "text", env = "SALESR_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Enable graceful shutdown
    #[arg(long, default_value = "true", env = "SALESR_GRACEFUL_SHUTDOWN")]
    pub graceful_shutdown: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_addr: "0.0.0.0:8080".to_string(),
            database: DatabaseArgs::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            graceful_shutdown: true,
        }
    }
}

/// Test data loader configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "salesr-loader")]
#[command(about = "Fetch generated sales data and bulk-load it into the database")]
pub struct LoaderConfig {
    #[command(flatten)]
    pub database: DatabaseArgs,

    /// Generator endpoint
    #[arg(long, default_value = MOCKAROO_URL, env = "SALESR_GENERATOR_URL")]
    pub generator_url: String,

    /// Generator API key
    #[arg(long, env = "SALESR_GENERATOR_API_KEY")]
    pub generator_api_key: String,

    /// Number of records to generate
    #[arg(long, default_value = "1000", env = "SALESR_LOAD_COUNT")]
    pub count: usize,

    /// Records per bulk insert
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE, env = "SALESR_CHUNK_SIZE")]
    pub chunk_size: usize,

    /// Generated records to echo before loading
    #[arg(long, default_value = "5")]
    pub sample_size: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value = "text", env = "SALESR_LOG_FORMAT")]
    pub log_format: LogFormat,
}
