//! Protocol implementations for domain availability checks.
//!
//! DNS gives a fast positive signal, WHOIS gives the verdict when DNS cannot.

/// DNS existence pre-check
pub mod dns;

/// Availability detectors over WHOIS records
pub mod detect;

/// WHOIS server selection per TLD
pub mod registry;

/// WHOIS protocol implementation
pub mod whois;

// Re-export commonly used functions and types
pub use detect::{
    AvailabilityDetector, SignatureDetector, StructuredStatusDetector, WhoisClassifier,
};
pub use dns::{AddressResolver, DnsProbe, HickoryDnsChecker};
pub use registry::{resolve_whois_server, IANA_WHOIS_SERVER};
pub use whois::{Referral, WhoisClient, WhoisRecord, WhoisSource, WHOIS_PORT};
