//! # Domain Expiry Library
//!
//! Resolves domain registration expiry timestamps from WHOIS and renders
//! them as metric lines.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_expiry_lib::{ExpiryPipeline, WhoisClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = ExpiryPipeline::new(Arc::new(WhoisClient::new()));
//!     let expiry = pipeline.check_domain("example.com").await?;
//!
//!     println!("example.com expires at {}", expiry);
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! For every domain: skip it if it is not Latin-1, pick the registry text
//! convention, run one WHOIS lookup, extract the expiry field, parse it as
//! RFC 3339. Domains are processed one at a time with a fixed pause between
//! lookups, and a failure on one domain never stops the batch.

// Re-export main public API types and functions
pub use config::{
    check_pacing_interval, load_env_config, load_env_config_from, parse_duration_string,
    ConfigManager, ConfigOverrides, ExporterConfig, FileConfig,
};
pub use error::{ErrorKind, ExpiryError};
pub use exposition::{render_line, render_result};
pub use extract::extract;
pub use pipeline::{parse_expiry, ExpiryPipeline, MIN_PACING_INTERVAL};
pub use protocols::{is_whois_available, resolve, WhoisClient, WhoisQuery, ZoneClient, ZoneSource};
pub use server::{router, serve, AppState};
pub use types::{ExpiryResult, RegistryConvention, WhoisRecord, Zone};
pub use utils::{is_latin1, validate_domain};

// Public modules
pub mod exposition;

// Internal modules - these are not part of the public API
mod config;
mod error;
mod extract;
mod pipeline;
mod protocols;
mod server;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ExpiryError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
