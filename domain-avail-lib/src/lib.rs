//! # Domain Availability Library
//!
//! Resolves whether domain names are free to register, using a DNS existence
//! pre-check and the WHOIS protocol.
//!
//! Every domain in a batch is looked up concurrently and independently. A
//! domain whose lookup fails is reported as unknown; it never fails the
//! batch. Only malformed input is an error.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_avail_lib::DomainChecker;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let checker = DomainChecker::new()?;
//!     let results = checker.check_param(Some("example.com;example.org")).await?;
//!
//!     for result in &results {
//!         println!("{}: {:?}", result.domain, result.available);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **DNS pre-check**: an address record means the domain is taken
//! - **WHOIS**: per-TLD server selection with a single referral hop
//! - **Pluggable detection**: structured status fields, then text signatures
//! - **Configurable**: TOML files, `DA_*` environment variables, builders

// Re-export main public API types and functions
// This makes them available as domain_avail_lib::TypeName
pub use checker::DomainChecker;
pub use config::{
    load_env_config, parse_duration_string, ConfigManager, EnvConfig, FileConfig, ServerConfig,
    DEFAULT_HOST, DEFAULT_PORT,
};
pub use error::DomainCheckError;
pub use protocols::{
    resolve_whois_server, AddressResolver, AvailabilityDetector, DnsProbe, HickoryDnsChecker,
    Referral, SignatureDetector, StructuredStatusDetector, WhoisClassifier, WhoisClient,
    WhoisRecord, WhoisSource, IANA_WHOIS_SERVER, WHOIS_PORT,
};
pub use types::{CheckConfig, CheckMethod, DomainQuery, LookupOutcome, ResultBatch, FAILED_TO_CHECK};
pub use utils::{parse_domains_param, validate_domain, DOMAINS_PARAM, DOMAIN_SEPARATOR};

// Internal modules - these are not part of the public API
mod checker;
mod concurrent;
mod config;
mod error;
mod protocols;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, DomainCheckError>;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
