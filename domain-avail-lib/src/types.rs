//! Core data types for domain availability resolution.
//!
//! This module defines the validated query type, the per-domain outcome that
//! forms the response payload, and the configuration struct that is handed to
//! the orchestrator at construction.

use crate::protocols::detect::{DEFAULT_AVAILABILITY_SIGNATURES, DEFAULT_AVAILABLE_STATUSES};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Reason reported for every domain whose lookup could not produce a signal.
pub const FAILED_TO_CHECK: &str = "Failed to check domain";

/// A single candidate domain that passed syntax validation.
///
/// Only the validator constructs these, so holding one means the value is
/// trimmed, non-empty, contains a dot and parses as a URL authority.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainQuery(String);

impl DomainQuery {
    pub(crate) fn new_unchecked(value: String) -> Self {
        Self(value)
    }

    /// The domain exactly as it was supplied (after trimming).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last label of the domain, lowercased (e.g. `"com"` for `"Example.COM"`).
    pub fn tld(&self) -> String {
        self.0
            .trim_end_matches('.')
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }
}

impl fmt::Display for DomainQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DomainQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Result of resolving one domain.
///
/// Serializes to the wire shape `{"domain": ..., "available": ..., "error"?: ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupOutcome {
    /// The domain name that was checked, echoed verbatim
    pub domain: String,

    /// Whether the domain is available for registration.
    /// - `Some(true)`: Domain is available
    /// - `Some(false)`: Domain is registered
    /// - `None`: No signal could be obtained
    pub available: Option<bool>,

    /// Human-readable cause, present only when `available` is `None`
    #[serde(rename = "error", skip_serializing_if = "Option::is_none", default)]
    pub error_reason: Option<String>,

    /// Which strategy produced the verdict
    #[serde(skip)]
    pub method: CheckMethod,

    /// How long the lookup took
    #[serde(skip)]
    pub check_duration: Option<Duration>,
}

impl LookupOutcome {
    /// Outcome with a definite verdict.
    pub fn resolved(domain: &DomainQuery, available: bool, method: CheckMethod) -> Self {
        Self {
            domain: domain.as_str().to_string(),
            available: Some(available),
            error_reason: None,
            method,
            check_duration: None,
        }
    }

    /// Outcome for a lookup that failed without producing any signal.
    pub fn unknown(domain: &DomainQuery) -> Self {
        Self {
            domain: domain.as_str().to_string(),
            available: None,
            error_reason: Some(FAILED_TO_CHECK.to_string()),
            method: CheckMethod::Unknown,
            check_duration: None,
        }
    }

    pub(crate) fn with_duration(mut self, duration: Duration) -> Self {
        self.check_duration = Some(duration);
        self
    }
}

/// Ordered outcomes, one per input domain. This is the whole response payload.
pub type ResultBatch = Vec<LookupOutcome>;

/// Strategy that produced a verdict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CheckMethod {
    /// An address record was found, WHOIS was skipped
    #[serde(rename = "dns")]
    Dns,

    /// The WHOIS classifier decided
    #[serde(rename = "whois")]
    Whois,

    /// Lookup failed
    #[serde(rename = "unknown")]
    #[default]
    Unknown,
}

impl fmt::Display for CheckMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckMethod::Dns => write!(f, "DNS"),
            CheckMethod::Whois => write!(f, "WHOIS"),
            CheckMethod::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Configuration for the resolution engine.
///
/// Passed explicitly to [`crate::DomainChecker`]; nothing is read from
/// global state.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckConfig {
    /// Run the DNS existence pre-check before WHOIS.
    /// Default: true
    pub dns_precheck: bool,

    /// Number of WHOIS referrals to follow (0 or 1).
    /// Default: 1
    pub follow: u8,

    /// Upper bound on one whole per-domain lookup (DNS + WHOIS).
    /// Default: 30 seconds
    pub lookup_timeout: Duration,

    /// Timeout for the DNS pre-check.
    /// Default: 3 seconds
    pub dns_timeout: Duration,

    /// Timeout for a full WHOIS exchange, referral included.
    /// Default: 10 seconds
    pub whois_timeout: Duration,

    /// TCP port WHOIS servers are contacted on.
    /// Default: 43
    pub whois_port: u16,

    /// Optional bound on in-flight lookups per batch.
    /// Default: None (one task per domain, no cap)
    pub max_concurrency: Option<usize>,

    /// Case-insensitive regular expressions meaning "this domain is free"
    pub availability_signatures: Vec<String>,

    /// Structured status values meaning "this domain is free"
    pub available_statuses: Vec<String>,

    /// Per-TLD WHOIS server overrides (TLD -> host)
    pub whois_servers: HashMap<String, String>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            dns_precheck: true,
            follow: 1,
            lookup_timeout: Duration::from_secs(30),
            dns_timeout: Duration::from_secs(3),
            whois_timeout: Duration::from_secs(10),
            whois_port: 43,
            max_concurrency: None,
            availability_signatures: DEFAULT_AVAILABILITY_SIGNATURES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            available_statuses: DEFAULT_AVAILABLE_STATUSES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            whois_servers: HashMap::new(),
        }
    }
}

impl CheckConfig {
    /// Enable or disable the DNS existence pre-check.
    pub fn with_dns_precheck(mut self, enabled: bool) -> Self {
        self.dns_precheck = enabled;
        self
    }

    /// Set the referral follow depth. Anything above 1 is capped at 1.
    pub fn with_follow(mut self, follow: u8) -> Self {
        self.follow = follow.min(1);
        self
    }

    /// Set the per-domain lookup timeout.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Set the DNS pre-check timeout.
    pub fn with_dns_timeout(mut self, timeout: Duration) -> Self {
        self.dns_timeout = timeout;
        self
    }

    /// Set the WHOIS exchange timeout.
    pub fn with_whois_timeout(mut self, timeout: Duration) -> Self {
        self.whois_timeout = timeout;
        self
    }

    /// Set the TCP port used for WHOIS queries.
    pub fn with_whois_port(mut self, port: u16) -> Self {
        self.whois_port = port;
        self
    }

    /// Bound the number of in-flight lookups. Zero is treated as one.
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit.max(1));
        self
    }

    /// Replace the availability signature list.
    pub fn with_signatures(mut self, signatures: Vec<String>) -> Self {
        self.availability_signatures = signatures;
        self
    }

    /// Append signatures to the current list.
    pub fn with_extra_signatures<I, S>(mut self, signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.availability_signatures
            .extend(signatures.into_iter().map(Into::into));
        self
    }

    /// Route WHOIS queries for a TLD to a specific server.
    pub fn with_whois_server<T: Into<String>, H: Into<String>>(mut self, tld: T, host: H) -> Self {
        self.whois_servers
            .insert(tld.into().to_lowercase(), host.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_wire_shape() {
        let query = DomainQuery::new_unchecked("example.com".to_string());

        let taken = LookupOutcome::resolved(&query, false, CheckMethod::Dns);
        assert_eq!(
            serde_json::to_string(&taken).unwrap(),
            r#"{"domain":"example.com","available":false}"#
        );

        let unknown = LookupOutcome::unknown(&query);
        assert_eq!(
            serde_json::to_string(&unknown).unwrap(),
            r#"{"domain":"example.com","available":null,"error":"Failed to check domain"}"#
        );
    }

    #[test]
    fn test_duration_is_not_serialized() {
        let query = DomainQuery::new_unchecked("a.org".to_string());
        let outcome = LookupOutcome::resolved(&query, true, CheckMethod::Whois)
            .with_duration(Duration::from_millis(120));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"domain": "a.org", "available": true})
        );
    }

    #[test]
    fn test_query_tld() {
        let tld = |domain: &str| DomainQuery::new_unchecked(domain.to_string()).tld();
        assert_eq!(tld("Example.COM"), "com");
        assert_eq!(tld("a.b.co.uk"), "uk");
        assert_eq!(tld("example.org."), "org");
    }

    #[test]
    fn test_config_defaults() {
        let config = CheckConfig::default();
        assert!(config.dns_precheck);
        assert_eq!(config.follow, 1);
        assert_eq!(config.whois_port, 43);
        assert_eq!(config.max_concurrency, None);
        assert!(config
            .availability_signatures
            .iter()
            .any(|s| s == "no match for"));
    }

    #[test]
    fn test_config_builders() {
        let config = CheckConfig::default()
            .with_dns_precheck(false)
            .with_follow(5)
            .with_max_concurrency(0)
            .with_whois_server("IO", "whois.nic.io")
            .with_extra_signatures(["is free"]);

        assert!(!config.dns_precheck);
        assert_eq!(config.follow, 1);
        assert_eq!(config.max_concurrency, Some(1));
        assert_eq!(
            config.whois_servers.get("io").map(String::as_str),
            Some("whois.nic.io")
        );
        assert_eq!(
            config.availability_signatures.last().map(String::as_str),
            Some("is free")
        );
    }
}
